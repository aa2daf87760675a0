// HTTP route handlers for the Forge API

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use forge_common::error::{ErrorBody, ErrorCode, EvaluationError};
use forge_common::stats::create_submission_summary;
use forge_common::store::StoreResult;
use forge_common::types::{ExecutionStats, Submission, TestResult, Verdict};
use forge_common::validation::{parse_test_cases, validate_code_and_language, validate_identity};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info};

use crate::metrics;
use crate::orchestrator::{RunRequest, SubmitRequest};
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunBody {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub test_cases: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitBody {
    #[serde(default)]
    pub uid: String,
    #[serde(default)]
    pub problem_id: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub test_cases: Value,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submission_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verdict: Option<Verdict>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_results: Option<Vec<TestResult>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_stats: Option<ExecutionStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

pub fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::ValidationError => StatusCode::BAD_REQUEST,
        ErrorCode::ExecutionError => StatusCode::BAD_GATEWAY,
        ErrorCode::DatabaseError => StatusCode::SERVICE_UNAVAILABLE,
        ErrorCode::UnknownError => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn failure(err: &EvaluationError) -> Response {
    (
        status_for(err.code()),
        Json(EvaluationResponse {
            success: false,
            error: Some(err.to_body()),
            ..Default::default()
        }),
    )
        .into_response()
}

fn bad_body(rejection: JsonRejection) -> Response {
    failure(&EvaluationError::validation(rejection.body_text()))
}

/// Test cases that fail to parse never reach the orchestrator, so the other
/// request fields are checked here to report every problem at once.
fn rejected_run(body: &RunBody, case_errors: Vec<String>) -> Response {
    let mut errors = Vec::new();
    validate_code_and_language(&body.code, &body.language, &mut errors);
    errors.extend(case_errors);
    metrics::record_evaluation("run", "validation_error");
    failure(&EvaluationError::Validation(errors))
}

fn rejected_submission(body: &SubmitBody, case_errors: Vec<String>) -> Response {
    let mut errors = Vec::new();
    validate_identity(&body.uid, &body.problem_id, &mut errors);
    validate_code_and_language(&body.code, &body.language, &mut errors);
    errors.extend(case_errors);
    metrics::record_evaluation("submit", "validation_error");
    failure(&EvaluationError::Validation(errors))
}

/// POST /run - Execute against public test cases without grading
pub async fn run_code(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RunBody>, JsonRejection>,
) -> Response {
    let Json(body) = match payload {
        Ok(body) => body,
        Err(rejection) => return bad_body(rejection),
    };

    let test_cases = match parse_test_cases(&body.test_cases) {
        Ok(cases) => cases,
        Err(report) => return rejected_run(&body, report.errors),
    };

    let request = RunRequest {
        code: body.code,
        language: body.language,
        test_cases,
    };

    match state.orchestrator.run_code(request).await {
        Ok(outcome) => (
            StatusCode::OK,
            Json(EvaluationResponse {
                success: true,
                test_results: Some(outcome.test_results),
                execution_stats: Some(outcome.execution_stats),
                ..Default::default()
            }),
        )
            .into_response(),
        Err(e) => failure(&e),
    }
}

/// POST /submissions - Grade and persist a submission
pub async fn submit(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SubmitBody>, JsonRejection>,
) -> Response {
    let Json(body) = match payload {
        Ok(body) => body,
        Err(rejection) => return bad_body(rejection),
    };

    let test_cases = match parse_test_cases(&body.test_cases) {
        Ok(cases) => cases,
        Err(report) => return rejected_submission(&body, report.errors),
    };

    let request = SubmitRequest {
        uid: body.uid,
        problem_id: body.problem_id,
        code: body.code,
        language: body.language,
        test_cases,
    };

    match state.orchestrator.evaluate_submission(request).await {
        Ok(outcome) => {
            info!(
                submission_id = %outcome.submission_id,
                verdict = %outcome.verdict,
                "Submission evaluated"
            );
            (
                StatusCode::CREATED,
                Json(EvaluationResponse {
                    success: true,
                    submission_id: Some(outcome.submission_id),
                    verdict: Some(outcome.verdict),
                    details: Some(outcome.details),
                    test_results: Some(outcome.test_results),
                    execution_stats: Some(outcome.execution_stats),
                    error: None,
                }),
            )
                .into_response()
        }
        Err(e) => failure(&e),
    }
}

fn read_failure(context: &str, e: impl std::fmt::Display) -> Response {
    error!(error = %e, "Failed to read {}", context);
    failure(&EvaluationError::Database(format!(
        "Failed to read {}: {}",
        context, e
    )))
}

fn list_response(context: &str, result: StoreResult<Vec<Submission>>) -> Response {
    match result {
        Ok(submissions) => (StatusCode::OK, Json(submissions)).into_response(),
        Err(e) => read_failure(context, e),
    }
}

fn summary_response(context: &str, result: StoreResult<Vec<Submission>>) -> Response {
    match result {
        Ok(submissions) => {
            (StatusCode::OK, Json(create_submission_summary(&submissions))).into_response()
        }
        Err(e) => read_failure(context, e),
    }
}

/// GET /submissions/{id} - One persisted submission
pub async fn get_submission(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Response {
    match state.orchestrator.store().get_submission(&id).await {
        Ok(Some(submission)) => (StatusCode::OK, Json(submission)).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({
                "error": "Submission not found"
            })),
        )
            .into_response(),
        Err(e) => read_failure("submission", e),
    }
}

/// GET /users/{uid}/submissions
pub async fn user_submissions(
    State(state): State<Arc<AppState>>,
    Path(uid): Path<String>,
) -> Response {
    let result = state.orchestrator.store().get_user_submissions(&uid).await;
    list_response("user submissions", result)
}

/// GET /problems/{problem_id}/submissions
pub async fn problem_submissions(
    State(state): State<Arc<AppState>>,
    Path(problem_id): Path<String>,
) -> Response {
    let result = state.orchestrator.store().get_problem_submissions(&problem_id).await;
    list_response("problem submissions", result)
}

/// GET /users/{uid}/summary
pub async fn user_summary(
    State(state): State<Arc<AppState>>,
    Path(uid): Path<String>,
) -> Response {
    let result = state.orchestrator.store().get_user_submissions(&uid).await;
    summary_response("user submissions", result)
}

/// GET /problems/{problem_id}/summary
pub async fn problem_summary(
    State(state): State<Arc<AppState>>,
    Path(problem_id): Path<String>,
) -> Response {
    let result = state.orchestrator.store().get_problem_submissions(&problem_id).await;
    summary_response("problem submissions", result)
}

/// GET /health - Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// GET /metrics - Prometheus exposition
pub async fn metrics_endpoint() -> Response {
    match metrics::render() {
        Ok(text) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            text,
        )
            .into_response(),
        Err(e) => failure(&EvaluationError::Unknown(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_for(ErrorCode::ValidationError), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(ErrorCode::ExecutionError), StatusCode::BAD_GATEWAY);
        assert_eq!(status_for(ErrorCode::DatabaseError), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(status_for(ErrorCode::UnknownError), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_failure_envelope_shape() {
        let response = EvaluationResponse {
            success: false,
            error: Some(EvaluationError::validation("uid is required").to_body()),
            ..Default::default()
        };
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["success"], false);
        assert_eq!(json["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(json["error"]["message"], "uid is required");
        assert!(json.get("verdict").is_none());
        assert!(json.get("submissionId").is_none());
    }

    #[test]
    fn test_missing_test_cases_field_is_not_an_array() {
        let body: SubmitBody = serde_json::from_str(r#"{"uid": "u", "code": "x"}"#).unwrap();
        let report = parse_test_cases(&body.test_cases).unwrap_err();
        assert_eq!(report.errors, vec!["Test cases must be an array"]);
    }
}
