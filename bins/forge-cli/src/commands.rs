// CLI commands for offline grading work
use anyhow::{bail, Context, Result};
use forge_common::config::Config;
use forge_common::evaluator::{classify, compare_outputs, regrade, Classification};
use forge_common::redis::RedisSubmissionStore;
use forge_common::stats::{aggregate, create_submission_summary};
use forge_common::store::SubmissionStore;
use forge_common::types::{ExecutionStats, Submission, TestResult};
use forge_common::validation::parse_test_cases;
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Validate a test case file, printing every problem found
pub fn validate_file(path: &Path) -> Result<()> {
    let value: Value = read_json(path)?;

    match parse_test_cases(&value) {
        Ok(cases) => {
            let hidden = cases.iter().filter(|tc| tc.is_hidden).count();
            println!("✓ {} is valid", path.display());
            println!("  Test cases: {} ({} public, {} hidden)", cases.len(), cases.len() - hidden, hidden);
            Ok(())
        }
        Err(report) => {
            println!("✗ {} is invalid", path.display());
            for err in &report.errors {
                println!("  - {}", err);
            }
            bail!("{} validation error(s)", report.errors.len())
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeReport {
    #[serde(flatten)]
    pub classification: Classification,
    pub execution_stats: ExecutionStats,
    pub test_results: Vec<TestResult>,
}

/// Re-derive pass flags, then classify and aggregate
pub fn grade(results: Vec<TestResult>) -> GradeReport {
    let test_results: Vec<TestResult> = results.into_iter().map(regrade).collect();
    GradeReport {
        classification: classify(&test_results),
        execution_stats: aggregate(&test_results),
        test_results,
    }
}

pub fn grade_file(path: &Path) -> Result<()> {
    let results: Vec<TestResult> = read_json(path)?;
    if results.is_empty() {
        bail!("{} contains no test results", path.display());
    }

    let report = grade(results);
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

pub fn compare_files(expected: &Path, actual: &Path, strict: bool) -> Result<()> {
    let expected_text = fs::read_to_string(expected)
        .with_context(|| format!("Failed to read {}", expected.display()))?;
    let actual_text = fs::read_to_string(actual)
        .with_context(|| format!("Failed to read {}", actual.display()))?;

    if compare_outputs(&expected_text, &actual_text, strict) {
        println!("✓ Outputs match");
        Ok(())
    } else {
        println!("✗ Outputs differ");
        bail!("outputs differ")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SummarySource {
    File(PathBuf),
    User(String),
    Problem(String),
}

impl SummarySource {
    pub fn from_args(
        file: Option<PathBuf>,
        user: Option<String>,
        problem: Option<String>,
    ) -> Result<Self> {
        match (file, user, problem) {
            (Some(path), None, None) => Ok(SummarySource::File(path)),
            (None, Some(uid), None) => Ok(SummarySource::User(uid)),
            (None, None, Some(problem_id)) => Ok(SummarySource::Problem(problem_id)),
            _ => bail!("Pass exactly one of --file, --user or --problem"),
        }
    }
}

pub async fn summarize(source: SummarySource, redis_url: Option<&str>) -> Result<()> {
    let submissions: Vec<Submission> = match source {
        SummarySource::File(path) => read_json(&path)?,
        SummarySource::User(uid) => open_store(redis_url).await?.get_user_submissions(&uid).await?,
        SummarySource::Problem(problem_id) => {
            open_store(redis_url)
                .await?
                .get_problem_submissions(&problem_id)
                .await?
        }
    };

    let summary = create_submission_summary(&submissions);
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

async fn open_store(redis_url: Option<&str>) -> Result<RedisSubmissionStore> {
    let url = match redis_url {
        Some(url) => url.to_string(),
        None => Config::from_env()?.redis_url,
    };

    let client = redis::Client::open(url.as_str()).context("Failed to create Redis client")?;
    let conn = redis::aio::ConnectionManager::new(client)
        .await
        .with_context(|| format!("Failed to connect to Redis at {}", url))?;
    Ok(RedisSubmissionStore::new(conn, None))
}
