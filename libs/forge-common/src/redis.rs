use crate::store::{StoreError, StoreResult, SubmissionStore};
use crate::types::{NewSubmission, Submission};
use crate::validation::MAX_STORED_CODE_CHARS;
use async_trait::async_trait;
use chrono::Utc;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tracing::{debug, info};
use uuid::Uuid;

/// Redis key semantics for submission records
/// Keys are deterministic so the API and offline tooling never drift

pub const SUBMISSION_PREFIX: &str = "forge:submission";
pub const USER_PREFIX: &str = "forge:user";
pub const PROBLEM_PREFIX: &str = "forge:problem";

/// Key holding one submission record as JSON
pub fn submission_key(id: &str) -> String {
    format!("{}:{}", SUBMISSION_PREFIX, id)
}

/// List of a user's submission ids, oldest first
pub fn user_index_key(uid: &str) -> String {
    format!("{}:{}:submissions", USER_PREFIX, uid)
}

/// List of a problem's submission ids, oldest first
pub fn problem_index_key(problem_id: &str) -> String {
    format!("{}:{}:submissions", PROBLEM_PREFIX, problem_id)
}

/// Persistence-time rules, stricter than the pre-execution request checks
pub fn check_storable(submission: &NewSubmission) -> StoreResult<()> {
    if submission.code.chars().count() > MAX_STORED_CODE_CHARS {
        return Err(StoreError::Rejected(format!(
            "code must be at most {} characters to be stored",
            MAX_STORED_CODE_CHARS
        )));
    }
    if submission.test_results.is_empty() {
        return Err(StoreError::Rejected("submission has no test results".to_string()));
    }
    Ok(())
}

/// MULTI/EXEC writing one record and its index entries
///
/// With a TTL, each index list is re-expired on every push so it lives
/// exactly as long as its newest record.
fn write_pipeline(record: &Submission, payload: &str, ttl_seconds: Option<u64>) -> redis::Pipeline {
    let key = submission_key(&record.id);
    let indexes = [user_index_key(&record.uid), problem_index_key(&record.problem_id)];

    let mut pipe = redis::pipe();
    pipe.atomic();
    match ttl_seconds {
        Some(ttl) => pipe.cmd("SET").arg(&key).arg(payload).arg("EX").arg(ttl).ignore(),
        None => pipe.cmd("SET").arg(&key).arg(payload).ignore(),
    };
    for index in &indexes {
        pipe.cmd("RPUSH").arg(index).arg(&record.id).ignore();
        if let Some(ttl) = ttl_seconds {
            pipe.cmd("EXPIRE").arg(index).arg(ttl).ignore();
        }
    }
    pipe
}

/// Submission store backed by Redis
///
/// Records are written once with SET and indexed with RPUSH in a single
/// MULTI/EXEC, so a record is never visible without its index entries.
#[derive(Clone)]
pub struct RedisSubmissionStore {
    conn: ConnectionManager,
    ttl_seconds: Option<u64>,
}

impl RedisSubmissionStore {
    pub fn new(conn: ConnectionManager, ttl_seconds: Option<u64>) -> Self {
        Self { conn, ttl_seconds }
    }

    async fn load_many(&self, index_key: &str) -> StoreResult<Vec<Submission>> {
        let mut conn = self.conn.clone();
        let ids: Vec<String> = conn.lrange(index_key, 0, -1).await?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let keys: Vec<String> = ids.iter().map(|id| submission_key(id)).collect();
        let payloads: Vec<Option<String>> = redis::cmd("MGET")
            .arg(&keys)
            .query_async(&mut conn)
            .await?;

        let mut submissions = Vec::with_capacity(payloads.len());
        // Expired records leave dangling ids behind; skip them
        for payload in payloads.into_iter().flatten() {
            submissions.push(serde_json::from_str(&payload)?);
        }

        debug!(index = index_key, count = submissions.len(), "Loaded submissions");
        Ok(submissions)
    }
}

#[async_trait]
impl SubmissionStore for RedisSubmissionStore {
    async fn create_submission(&self, submission: NewSubmission) -> StoreResult<String> {
        check_storable(&submission)?;

        let id = Uuid::new_v4().to_string();
        let record = Submission::from_new(id.clone(), submission, Utc::now());
        let payload = serde_json::to_string(&record)?;

        let pipe = write_pipeline(&record, &payload, self.ttl_seconds);
        let mut conn = self.conn.clone();
        pipe.query_async::<_, ()>(&mut conn).await?;

        info!(
            submission_id = %id,
            uid = %record.uid,
            problem_id = %record.problem_id,
            status = %record.status,
            "Submission persisted"
        );
        Ok(id)
    }

    async fn get_submission(&self, id: &str) -> StoreResult<Option<Submission>> {
        let mut conn = self.conn.clone();
        let payload: Option<String> = conn.get(submission_key(id)).await?;

        match payload {
            Some(data) => Ok(Some(serde_json::from_str(&data)?)),
            None => Ok(None),
        }
    }

    async fn get_user_submissions(&self, uid: &str) -> StoreResult<Vec<Submission>> {
        self.load_many(&user_index_key(uid)).await
    }

    async fn get_problem_submissions(&self, problem_id: &str) -> StoreResult<Vec<Submission>> {
        self.load_many(&problem_index_key(problem_id)).await
    }
}
