//! Persistence collaborator seam

use crate::types::{NewSubmission, Submission};
use async_trait::async_trait;
use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The record breaks a persistence-time rule
    #[error("Submission rejected: {0}")]
    Rejected(String),
}

/// Durable storage for graded submissions. Records are append-only.
#[async_trait]
pub trait SubmissionStore: Send + Sync {
    /// Persist a submission; the store assigns id and timestamp
    async fn create_submission(&self, submission: NewSubmission) -> StoreResult<String>;

    async fn get_submission(&self, id: &str) -> StoreResult<Option<Submission>>;

    /// Oldest first
    async fn get_user_submissions(&self, uid: &str) -> StoreResult<Vec<Submission>>;

    /// Oldest first
    async fn get_problem_submissions(&self, problem_id: &str) -> StoreResult<Vec<Submission>>;
}
