//! Submission Orchestrator - High-Level Grading Pipeline
//!
//! **Responsibility:**
//! Validate a request, hand it to the judge, classify and aggregate the
//! results, and persist graded submissions.
//!
//! **Pipeline (submit):**
//! Received → Validated → Executed → Classified → Persisted → Returned
//!
//! Any stage may exit with an [`EvaluationError`]. Validation failures never
//! reach the judge. Nothing is retried here.
//!
//! **Run vs Submit:**
//! - run: public test cases only, nothing graded or stored
//! - submit: every test case, graded and stored

use crate::judge_client::{ExecutionBackend, ExecutionError, ExecutionRequest};
use crate::metrics;
use forge_common::error::EvaluationError;
use forge_common::evaluator::{build_test_result, classify};
use forge_common::stats::aggregate;
use forge_common::store::{StoreError, SubmissionStore};
use forge_common::types::{
    Action, ExecutionStats, Language, NewSubmission, TestCase, TestResult, Verdict,
};
use forge_common::validation::{validate_code_and_language, validate_identity, validate_test_cases};
use futures_util::FutureExt;
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};

/// Practice run against public cases
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub code: String,
    pub language: String,
    pub test_cases: Vec<TestCase>,
}

/// Graded submission
#[derive(Debug, Clone)]
pub struct SubmitRequest {
    pub uid: String,
    pub problem_id: String,
    pub code: String,
    pub language: String,
    pub test_cases: Vec<TestCase>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunOutcome {
    pub test_results: Vec<TestResult>,
    pub execution_stats: ExecutionStats,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationOutcome {
    pub submission_id: String,
    pub verdict: Verdict,
    pub details: String,
    pub test_results: Vec<TestResult>,
    pub execution_stats: ExecutionStats,
}

impl From<ExecutionError> for EvaluationError {
    fn from(err: ExecutionError) -> Self {
        EvaluationError::Execution(err.to_string())
    }
}

fn database_error(err: StoreError) -> EvaluationError {
    EvaluationError::Database(err.to_string())
}

#[derive(Clone)]
pub struct Orchestrator {
    backend: Arc<dyn ExecutionBackend>,
    store: Arc<dyn SubmissionStore>,
}

impl Orchestrator {
    pub fn new(backend: Arc<dyn ExecutionBackend>, store: Arc<dyn SubmissionStore>) -> Self {
        Self { backend, store }
    }

    /// Execute against public cases only; results are neither graded nor stored
    #[instrument(skip(self, request), fields(language = %request.language))]
    pub async fn run_code(&self, request: RunRequest) -> Result<RunOutcome, EvaluationError> {
        let outcome = guarded("run", self.run_code_inner(request)).await;
        metrics::record_evaluation("run", outcome_label(&outcome));
        outcome
    }

    async fn run_code_inner(&self, request: RunRequest) -> Result<RunOutcome, EvaluationError> {
        let mut errors = Vec::new();
        let language = validate_code_and_language(&request.code, &request.language, &mut errors);
        errors.extend(validate_test_cases(&request.test_cases).errors);

        let language = match language {
            Some(lang) if errors.is_empty() => lang,
            _ => {
                warn!(errors = ?errors, "Run request rejected");
                return Err(EvaluationError::Validation(errors));
            }
        };

        // Hidden cases must never leave the server on a practice run
        let public_cases: Vec<TestCase> = request
            .test_cases
            .into_iter()
            .filter(|tc| !tc.is_hidden)
            .collect();

        let test_results = self
            .execute(request.code, language, public_cases, Action::Run)
            .await?;
        let execution_stats = aggregate(&test_results);

        info!(
            test_cases = test_results.len(),
            passed = test_results.iter().filter(|r| r.passed).count(),
            "Run completed"
        );

        Ok(RunOutcome {
            test_results,
            execution_stats,
        })
    }

    /// Grade against every test case and persist the result
    #[instrument(
        skip(self, request),
        fields(uid = %request.uid, problem_id = %request.problem_id, language = %request.language)
    )]
    pub async fn evaluate_submission(
        &self,
        request: SubmitRequest,
    ) -> Result<EvaluationOutcome, EvaluationError> {
        let outcome = guarded("submit", self.evaluate_submission_inner(request)).await;
        metrics::record_evaluation("submit", outcome_label(&outcome));
        outcome
    }

    async fn evaluate_submission_inner(
        &self,
        request: SubmitRequest,
    ) -> Result<EvaluationOutcome, EvaluationError> {
        // Validated
        let mut errors = Vec::new();
        validate_identity(&request.uid, &request.problem_id, &mut errors);
        let language = validate_code_and_language(&request.code, &request.language, &mut errors);
        errors.extend(validate_test_cases(&request.test_cases).errors);

        let language = match language {
            Some(lang) if errors.is_empty() => lang,
            _ => {
                warn!(errors = ?errors, "Submission rejected");
                return Err(EvaluationError::Validation(errors));
            }
        };

        // Executed
        let test_results = self
            .execute(request.code.clone(), language, request.test_cases, Action::Submit)
            .await?;

        // Classified
        let classification = classify(&test_results);
        let execution_stats = aggregate(&test_results);
        metrics::record_verdict(classification.verdict.as_str());

        info!(
            verdict = %classification.verdict,
            details = %classification.details,
            avg_ms = execution_stats.average_execution_time,
            "Submission graded"
        );

        // Persisted
        let submission = NewSubmission {
            uid: request.uid,
            problem_id: request.problem_id,
            code: request.code,
            language,
            status: classification.verdict,
            execution_time: execution_stats.average_execution_time,
            memory_usage: execution_stats.average_memory_usage,
            test_results: test_results.clone(),
        };

        let submission_id = self.store.create_submission(submission).await.map_err(|e| {
            error!(error = %e, "Graded submission could not be persisted");
            database_error(e)
        })?;

        // Returned
        Ok(EvaluationOutcome {
            submission_id,
            verdict: classification.verdict,
            details: classification.details,
            test_results,
            execution_stats,
        })
    }

    /// Call the judge and rebuild each result from the case that was sent
    async fn execute(
        &self,
        code: String,
        language: Language,
        test_cases: Vec<TestCase>,
        action: Action,
    ) -> Result<Vec<TestResult>, EvaluationError> {
        let request = ExecutionRequest {
            code,
            language,
            test_cases,
            action,
        };

        let started = Instant::now();
        let response = self.backend.execute(&request).await;
        metrics::JUDGE_LATENCY_SECONDS.observe(started.elapsed().as_secs_f64());

        let response = response.map_err(|e| {
            error!(error = %e, action = %action, "Judge call failed");
            EvaluationError::from(e)
        })?;

        debug!(
            results = response.test_results.len(),
            judge_time_ms = response.execution_time,
            judge_memory = response.memory_usage,
            "Judge responded"
        );
        check_response_shape(&request.test_cases, &response.test_results)?;

        Ok(request
            .test_cases
            .iter()
            .zip(response.test_results)
            .map(|(case, raw)| {
                build_test_result(
                    case,
                    &raw.actual_output,
                    raw.execution_time,
                    raw.memory_usage,
                    raw.error,
                )
            })
            .collect())
    }

    pub fn store(&self) -> &Arc<dyn SubmissionStore> {
        &self.store
    }
}

/// Turn a panic anywhere below the orchestrator into an UNKNOWN_ERROR
async fn guarded<T>(
    action: &'static str,
    pipeline: impl Future<Output = Result<T, EvaluationError>>,
) -> Result<T, EvaluationError> {
    match AssertUnwindSafe(pipeline).catch_unwind().await {
        Ok(outcome) => outcome,
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            error!(action, panic = %message, "Evaluation pipeline panicked");
            Err(EvaluationError::Unknown(format!("Internal error: {}", message)))
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unexpected panic".to_string()
    }
}

fn check_response_shape(sent: &[TestCase], results: &[TestResult]) -> Result<(), EvaluationError> {
    if results.is_empty() {
        return Err(ExecutionError::MalformedPayload("no test results returned".to_string()).into());
    }
    if results.len() != sent.len() {
        return Err(ExecutionError::MalformedPayload(format!(
            "expected {} test results, got {}",
            sent.len(),
            results.len()
        ))
        .into());
    }

    let valid = |v: f64| v.is_finite() && v >= 0.0;
    if let Some(index) = results
        .iter()
        .position(|r| !valid(r.execution_time) || !valid(r.memory_usage))
    {
        return Err(ExecutionError::MalformedPayload(format!(
            "test result {} has invalid execution time or memory usage",
            index
        ))
        .into());
    }

    Ok(())
}

fn outcome_label<T>(outcome: &Result<T, EvaluationError>) -> &'static str {
    match outcome {
        Ok(_) => "success",
        Err(EvaluationError::Validation(_)) => "validation_error",
        Err(EvaluationError::Execution(_)) => "execution_error",
        Err(EvaluationError::Database(_)) => "database_error",
        Err(EvaluationError::Unknown(_)) => "unknown_error",
    }
}
