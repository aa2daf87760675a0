//! Timing and memory roll-ups, per submission and across submission history

use crate::types::{ExecutionStats, Submission, SubmissionSummary, TestResult};
use std::collections::BTreeMap;

/// Aggregate execution figures over every result, failed ones included
///
/// An empty slice yields all zeros.
pub fn aggregate(test_results: &[TestResult]) -> ExecutionStats {
    if test_results.is_empty() {
        return ExecutionStats::default();
    }

    let count = test_results.len() as f64;
    let mut stats = ExecutionStats::default();

    for result in test_results {
        stats.total_execution_time += result.execution_time;
        stats.max_execution_time = stats.max_execution_time.max(result.execution_time);
        stats.total_memory_usage += result.memory_usage;
        stats.max_memory_usage = stats.max_memory_usage.max(result.memory_usage);
    }

    stats.average_execution_time = stats.total_execution_time / count;
    stats.average_memory_usage = stats.total_memory_usage / count;
    stats
}

/// Summarize a set of persisted submissions
pub fn create_submission_summary(submissions: &[Submission]) -> SubmissionSummary {
    if submissions.is_empty() {
        return SubmissionSummary::default();
    }

    let total = submissions.len();
    let accepted = submissions.iter().filter(|s| s.status.is_accepted()).count();

    let mut language_distribution = BTreeMap::new();
    let mut status_distribution = BTreeMap::new();
    let mut time_sum = 0.0;
    let mut memory_sum = 0.0;

    for submission in submissions {
        *language_distribution
            .entry(submission.language.to_string())
            .or_insert(0) += 1;
        *status_distribution
            .entry(submission.status.to_string())
            .or_insert(0) += 1;
        time_sum += submission.execution_time;
        memory_sum += submission.memory_usage;
    }

    SubmissionSummary {
        total_submissions: total,
        accepted_submissions: accepted,
        success_rate: ((accepted as f64 / total as f64) * 100.0).round() as u32,
        language_distribution,
        status_distribution,
        average_execution_time: time_sum / total as f64,
        average_memory_usage: memory_sum / total as f64,
    }
}
