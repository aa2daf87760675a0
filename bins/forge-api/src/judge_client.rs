//! Judge Client - Boundary to the External Execution Service
//!
//! **Responsibility:**
//! Ship code plus test cases to the sandboxed judge and bring back raw
//! per-case outcomes.
//!
//! **Critical Architectural Boundary:**
//! - The judge knows HOW to execute
//! - The judge does NOT decide verdicts
//! - Whatever pass flags it reports are recomputed by the evaluator

use crate::language_config::LanguageRegistry;
use async_trait::async_trait;
use forge_common::types::{Action, Language, TestCase, TestResult};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionRequest {
    pub code: String,
    pub language: Language,
    pub test_cases: Vec<TestCase>,
    pub action: Action,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResponse {
    pub test_results: Vec<TestResult>,
    #[serde(default)]
    pub execution_time: f64,
    #[serde(default)]
    pub memory_usage: f64,
}

#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("Judge request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Judge returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed judge response: {0}")]
    MalformedPayload(String),
}

#[async_trait]
pub trait ExecutionBackend: Send + Sync {
    async fn execute(&self, request: &ExecutionRequest) -> Result<ExecutionResponse, ExecutionError>;
}

/// Wire body sent to the judge; adds the concrete runtime
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct JudgePayload<'a> {
    #[serde(flatten)]
    request: &'a ExecutionRequest,
    runtime: String,
    version: String,
}

/// HTTP judge client
pub struct HttpJudgeClient {
    client: Client,
    base_url: String,
    languages: LanguageRegistry,
}

impl HttpJudgeClient {
    pub fn new(
        base_url: &str,
        timeout: Duration,
        languages: LanguageRegistry,
    ) -> Result<Self, ExecutionError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            languages,
        })
    }

    fn execute_url(&self) -> String {
        format!("{}/execute", self.base_url)
    }
}

#[async_trait]
impl ExecutionBackend for HttpJudgeClient {
    async fn execute(&self, request: &ExecutionRequest) -> Result<ExecutionResponse, ExecutionError> {
        let runtime = self.languages.runtime(request.language);
        let payload = JudgePayload {
            request,
            runtime: runtime.name,
            version: runtime.version,
        };

        debug!(
            url = %self.execute_url(),
            language = %request.language,
            action = %request.action,
            test_cases = request.test_cases.len(),
            "Sending code to judge"
        );

        let response = self
            .client
            .post(self.execute_url())
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = status.as_u16(), "Judge rejected request");
            return Err(ExecutionError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| ExecutionError::MalformedPayload(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_shape() {
        let request = ExecutionRequest {
            code: "print(input())".to_string(),
            language: Language::Cpp,
            test_cases: vec![TestCase {
                input: "1".to_string(),
                expected_output: "1".to_string(),
                is_hidden: false,
            }],
            action: Action::Run,
        };
        let payload = JudgePayload {
            request: &request,
            runtime: "c++".to_string(),
            version: "10.2.0".to_string(),
        };

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["language"], "C++");
        assert_eq!(json["action"], "run");
        assert_eq!(json["runtime"], "c++");
        assert_eq!(json["testCases"][0]["expectedOutput"], "1");
        assert_eq!(json["testCases"][0]["isHidden"], false);
    }

    #[test]
    fn test_response_decoding() {
        let response: ExecutionResponse = serde_json::from_str(
            r#"{
                "testResults": [{
                    "passed": true, "input": "5", "expectedOutput": "25",
                    "actualOutput": "25", "executionTime": 12.5, "memoryUsage": 2048
                }],
                "executionTime": 12.5
            }"#,
        )
        .unwrap();

        assert_eq!(response.test_results.len(), 1);
        assert_eq!(response.test_results[0].memory_usage, 2048.0);
        assert!(response.test_results[0].error.is_none());
        assert_eq!(response.memory_usage, 0.0);
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let client = HttpJudgeClient::new(
            "http://judge:2358/",
            Duration::from_secs(1),
            LanguageRegistry::default(),
        )
        .unwrap();
        assert_eq!(client.execute_url(), "http://judge:2358/execute");
    }
}
