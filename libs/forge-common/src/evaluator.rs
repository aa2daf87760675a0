//! Test Evaluator - Language-Agnostic Verdict Logic
//!
//! **Core Responsibility:**
//! Turn raw per-case execution outcomes into pass/fail results and a single
//! overall verdict.
//!
//! **Critical Properties:**
//! - Knows nothing about the judge service
//! - Knows nothing about language runtimes
//! - Knows nothing about Redis
//! - Pure functions: (execution outcomes, expected outputs) → verdict
//!
//! **Normalization Rules (non-strict comparison):**
//! - Line endings: `\r\n` and `\r` become `\n`
//! - Leading/trailing whitespace on each line: ignored
//! - Trailing empty lines: ignored
//! - Case sensitivity: YES (exact match required)
//! - Floating-point tolerance: NO
//!
//! **Verdict Priority (first match wins, over the whole result set):**
//! 1. Compilation Error
//! 2. Time Limit Exceeded
//! 3. Runtime Error
//! 4. Wrong Answer
//! 5. Accepted

use crate::types::{TestCase, TestResult, Verdict};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Results slower than this are treated as timeouts even without an error tag
pub const TIME_LIMIT_MS: f64 = 5000.0;

const COMPILATION_ERROR_MARKER: &str = "compilation error";
const TIME_LIMIT_MARKER: &str = "time limit";

/// Normalize output into comparable lines
///
/// **Preserves:**
/// - Internal whitespace within a line
/// - Case
/// - Empty lines before the last non-empty line
fn normalize_output(output: &str) -> Vec<String> {
    let unified = output.replace("\r\n", "\n").replace('\r', "\n");
    let mut lines: Vec<String> = unified
        .split('\n')
        .map(|line| line.trim().to_string())
        .collect();

    while lines.last().is_some_and(|line| line.is_empty()) {
        lines.pop();
    }

    lines
}

/// Decide whether `actual` matches `expected`
///
/// Strict mode is byte-for-byte equality. Otherwise both sides go through
/// [`normalize_output`] and the resulting line sequences must be equal.
pub fn compare_outputs(expected: &str, actual: &str, strict: bool) -> bool {
    if strict {
        return expected == actual;
    }
    normalize_output(expected) == normalize_output(actual)
}

/// Combine a test case with what the judge observed for it
///
/// A non-blank `error` fails the case no matter what was printed.
pub fn build_test_result(
    test_case: &TestCase,
    actual_output: &str,
    execution_time: f64,
    memory_usage: f64,
    error: Option<String>,
) -> TestResult {
    let error = error.filter(|e| !e.trim().is_empty());
    let passed = match error {
        Some(_) => false,
        None => compare_outputs(&test_case.expected_output, actual_output, false),
    };

    TestResult {
        passed,
        input: test_case.input.clone(),
        expected_output: test_case.expected_output.clone(),
        actual_output: actual_output.to_string(),
        execution_time,
        memory_usage,
        error,
    }
}

/// Recompute `passed` for a result produced elsewhere
///
/// The judge's own pass flag is not trusted; the comparison rules here are
/// the only ones that grade.
pub fn regrade(result: TestResult) -> TestResult {
    let test_case = TestCase {
        input: result.input,
        expected_output: result.expected_output,
        is_hidden: false,
    };
    build_test_result(
        &test_case,
        &result.actual_output,
        result.execution_time,
        result.memory_usage,
        result.error,
    )
}

/// Overall verdict plus a human-readable pass count
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub verdict: Verdict,
    pub details: String,
}

fn error_contains(result: &TestResult, marker: &str) -> bool {
    result
        .error_message()
        .is_some_and(|e| e.to_lowercase().contains(marker))
}

fn is_compilation_error(result: &TestResult) -> bool {
    error_contains(result, COMPILATION_ERROR_MARKER)
}

fn is_time_limit(result: &TestResult) -> bool {
    error_contains(result, TIME_LIMIT_MARKER) || result.execution_time > TIME_LIMIT_MS
}

/// Classify a full result set into exactly one verdict
///
/// Rules are evaluated over every result before moving to the next rule,
/// so a compilation failure anywhere outranks a timeout anywhere.
pub fn classify(test_results: &[TestResult]) -> Classification {
    let total = test_results.len();
    let passed = test_results.iter().filter(|r| r.passed).count();

    let verdict = if test_results.iter().any(is_compilation_error) {
        Verdict::CompilationError
    } else if test_results.iter().any(is_time_limit) {
        Verdict::TimeLimitExceeded
    } else if test_results.iter().any(|r| r.error_message().is_some()) {
        Verdict::RuntimeError
    } else if test_results.iter().any(|r| !r.passed) {
        Verdict::WrongAnswer
    } else {
        Verdict::Accepted
    };

    let details = match verdict {
        Verdict::Accepted => format!("All {} test cases passed", total),
        _ => format!("{}/{} test cases passed", passed, total),
    };

    debug!(verdict = %verdict, passed, total, "Classified test results");

    Classification { verdict, details }
}
