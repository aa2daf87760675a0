//! Error taxonomy surfaced to callers as a `{code, message}` pair

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    ValidationError,
    ExecutionError,
    DatabaseError,
    UnknownError,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self {
            ErrorCode::ValidationError => "VALIDATION_ERROR",
            ErrorCode::ExecutionError => "EXECUTION_ERROR",
            ErrorCode::DatabaseError => "DATABASE_ERROR",
            ErrorCode::UnknownError => "UNKNOWN_ERROR",
        };
        f.write_str(code)
    }
}

/// Failure of a run or submit request. None of these are retried here.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvaluationError {
    /// Malformed request; every problem found, in order
    #[error("{}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("{0}")]
    Execution(String),

    /// Grading finished but the record could not be saved
    #[error("{0}")]
    Database(String),

    #[error("{0}")]
    Unknown(String),
}

impl EvaluationError {
    pub fn validation(message: impl Into<String>) -> Self {
        EvaluationError::Validation(vec![message.into()])
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            EvaluationError::Validation(_) => ErrorCode::ValidationError,
            EvaluationError::Execution(_) => ErrorCode::ExecutionError,
            EvaluationError::Database(_) => ErrorCode::DatabaseError,
            EvaluationError::Unknown(_) => ErrorCode::UnknownError,
        }
    }

    pub fn to_body(&self) -> ErrorBody {
        ErrorBody {
            code: self.code(),
            message: self.to_string(),
        }
    }
}

/// Wire shape of an error
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: ErrorCode,
    pub message: String,
}

impl From<&EvaluationError> for ErrorBody {
    fn from(err: &EvaluationError) -> Self {
        err.to_body()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_serialize_screaming() {
        let body = EvaluationError::Database("redis down".to_string()).to_body();
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["code"], "DATABASE_ERROR");
        assert_eq!(json["message"], "redis down");
    }

    #[test]
    fn test_validation_message_lists_every_problem() {
        let err = EvaluationError::Validation(vec![
            "uid is required".to_string(),
            "code is required".to_string(),
        ]);
        assert_eq!(err.code(), ErrorCode::ValidationError);
        assert_eq!(err.to_string(), "uid is required; code is required");
    }

    #[test]
    fn test_display_matches_wire() {
        assert_eq!(ErrorCode::ExecutionError.to_string(), "EXECUTION_ERROR");
        assert_eq!(ErrorCode::UnknownError.to_string(), "UNKNOWN_ERROR");
    }
}
