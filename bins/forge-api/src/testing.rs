// In-memory judge and store used by the API tests

use crate::judge_client::{ExecutionBackend, ExecutionError, ExecutionRequest, ExecutionResponse};
use async_trait::async_trait;
use forge_common::store::{StoreError, StoreResult, SubmissionStore};
use forge_common::types::{NewSubmission, Submission, TestResult};
use std::sync::{Arc, Mutex};

/// What the stub judge reports for one case
#[derive(Clone)]
pub(crate) struct Outcome {
    actual_output: String,
    time: f64,
    memory: f64,
    error: Option<&'static str>,
}

pub(crate) fn ok(actual_output: &str, time: f64, memory: f64) -> Outcome {
    Outcome {
        actual_output: actual_output.to_string(),
        time,
        memory,
        error: None,
    }
}

pub(crate) fn failed(error: &'static str) -> Outcome {
    Outcome {
        actual_output: String::new(),
        time: 10.0,
        memory: 512.0,
        error: Some(error),
    }
}

pub(crate) enum Behaviour {
    Outcomes(Vec<Outcome>),
    /// Echo the expected output for every case sent
    EchoExpected,
    HttpStatus(u16),
    Panic,
}

pub(crate) struct StubJudge {
    behaviour: Behaviour,
    requests: Mutex<Vec<ExecutionRequest>>,
}

impl StubJudge {
    pub(crate) fn new(behaviour: Behaviour) -> Arc<Self> {
        Arc::new(Self {
            behaviour,
            requests: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn requests(&self) -> Vec<ExecutionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ExecutionBackend for StubJudge {
    async fn execute(&self, request: &ExecutionRequest) -> Result<ExecutionResponse, ExecutionError> {
        self.requests.lock().unwrap().push(request.clone());

        let outcomes: Vec<Outcome> = match &self.behaviour {
            Behaviour::HttpStatus(status) => {
                return Err(ExecutionError::Status {
                    status: *status,
                    body: "judge unavailable".to_string(),
                })
            }
            Behaviour::Panic => panic!("judge client bug"),
            Behaviour::Outcomes(outcomes) => outcomes.clone(),
            Behaviour::EchoExpected => request
                .test_cases
                .iter()
                .map(|tc| Outcome {
                    actual_output: tc.expected_output.clone(),
                    time: 5.0,
                    memory: 256.0,
                    error: None,
                })
                .collect(),
        };

        let test_results = request
            .test_cases
            .iter()
            .zip(outcomes.iter())
            .map(|(tc, o)| TestResult {
                // The judge's own flag is deliberately optimistic
                passed: true,
                input: tc.input.clone(),
                expected_output: tc.expected_output.clone(),
                actual_output: o.actual_output.clone(),
                execution_time: o.time,
                memory_usage: o.memory,
                error: o.error.map(str::to_string),
            })
            .chain(outcomes.iter().skip(request.test_cases.len()).map(|o| TestResult {
                passed: true,
                input: "extra".to_string(),
                expected_output: "extra".to_string(),
                actual_output: o.actual_output.clone(),
                execution_time: o.time,
                memory_usage: o.memory,
                error: None,
            }))
            .collect();

        Ok(ExecutionResponse {
            test_results,
            execution_time: 0.0,
            memory_usage: 0.0,
        })
    }
}

#[derive(Default)]
pub(crate) struct StubStore {
    fail: bool,
    pub(crate) saved: Mutex<Vec<NewSubmission>>,
}

impl StubStore {
    pub(crate) fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail: true,
            ..Default::default()
        })
    }
}

#[async_trait]
impl SubmissionStore for StubStore {
    async fn create_submission(&self, submission: NewSubmission) -> StoreResult<String> {
        if self.fail {
            return Err(StoreError::Rejected("store offline".to_string()));
        }
        let mut saved = self.saved.lock().unwrap();
        saved.push(submission);
        Ok(format!("sub-{}", saved.len()))
    }

    async fn get_submission(&self, _id: &str) -> StoreResult<Option<Submission>> {
        Ok(None)
    }

    async fn get_user_submissions(&self, _uid: &str) -> StoreResult<Vec<Submission>> {
        Ok(Vec::new())
    }

    async fn get_problem_submissions(&self, _problem_id: &str) -> StoreResult<Vec<Submission>> {
        Ok(Vec::new())
    }
}
