use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::handlers;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/run", post(handlers::run_code))
        .route("/submissions", post(handlers::submit))
        .route("/submissions/:id", get(handlers::get_submission))
        .route("/users/:uid/submissions", get(handlers::user_submissions))
        .route("/users/:uid/summary", get(handlers::user_summary))
        .route("/problems/:problem_id/submissions", get(handlers::problem_submissions))
        .route("/problems/:problem_id/summary", get(handlers::problem_summary))
        .route("/health", get(handlers::health_check))
        .route("/metrics", get(handlers::metrics_endpoint))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::Orchestrator;
    use crate::testing::{Behaviour, StubJudge, StubStore};
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn app(judge: Arc<StubJudge>) -> Router {
        let state = Arc::new(AppState {
            orchestrator: Orchestrator::new(judge, Arc::new(StubStore::default())),
        });
        routes().with_state(state)
    }

    fn post(uri: &str, body: impl Into<Body>) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(body.into())
            .unwrap()
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn square_cases() -> Value {
        json!([
            {"input": "5", "expectedOutput": "25"},
            {"input": "3", "expectedOutput": "9"},
            {"input": "7", "expectedOutput": "49", "isHidden": true},
        ])
    }

    #[tokio::test]
    async fn test_malformed_body_is_validation_error() {
        let (status, body) = send(
            app(StubJudge::new(Behaviour::EchoExpected)),
            post("/submissions", "{not json"),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_run_returns_results_without_verdict() {
        let judge = StubJudge::new(Behaviour::EchoExpected);
        let request = json!({
            "code": "print(int(input()) ** 2)",
            "language": "Python",
            "testCases": square_cases(),
            "action": "run",
        });

        let (status, body) = send(app(judge.clone()), post("/run", request.to_string())).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["testResults"].as_array().unwrap().len(), 2);
        assert_eq!(body["executionStats"]["totalExecutionTime"], 10.0);
        assert!(body.get("verdict").is_none());
        assert!(body.get("submissionId").is_none());
        assert!(body.get("details").is_none());
        assert_eq!(judge.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_submit_returns_created() {
        let request = json!({
            "uid": "user-1",
            "problemId": "square",
            "code": "print(int(input()) ** 2)",
            "language": "Python",
            "testCases": square_cases(),
        });

        let (status, body) = send(
            app(StubJudge::new(Behaviour::EchoExpected)),
            post("/submissions", request.to_string()),
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["success"], true);
        assert_eq!(body["submissionId"], "sub-1");
        assert_eq!(body["verdict"], "Accepted");
        assert_eq!(body["details"], "All 3 test cases passed");
        assert_eq!(body["testResults"].as_array().unwrap().len(), 3);
        assert!(body.get("error").is_none());
    }

    #[tokio::test]
    async fn test_submit_reports_field_and_test_case_errors_together() {
        let judge = StubJudge::new(Behaviour::EchoExpected);
        let request = json!({
            "uid": "",
            "code": "",
            "language": "Cobol",
            "testCases": "nope",
        });

        let (status, body) =
            send(app(judge.clone()), post("/submissions", request.to_string())).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(
            body["error"]["message"],
            "uid is required; problemId is required; code is required; \
             Unsupported language: Cobol; Test cases must be an array"
        );
        assert!(judge.requests().is_empty());
    }

    #[tokio::test]
    async fn test_run_reports_code_and_test_case_errors_together() {
        let request = json!({
            "code": "",
            "language": "Python",
            "testCases": [{"input": 5, "expectedOutput": "25"}],
        });

        let (status, body) = send(
            app(StubJudge::new(Behaviour::EchoExpected)),
            post("/run", request.to_string()),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["error"]["message"],
            "code is required; testCases[0].input must be a string"
        );
    }

    #[tokio::test]
    async fn test_panic_becomes_unknown_error() {
        let request = json!({
            "uid": "user-1",
            "problemId": "square",
            "code": "print(1)",
            "language": "C",
            "testCases": square_cases(),
        });

        let (status, body) = send(
            app(StubJudge::new(Behaviour::Panic)),
            post("/submissions", request.to_string()),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["code"], "UNKNOWN_ERROR");
    }
}
