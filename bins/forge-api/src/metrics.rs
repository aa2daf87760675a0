// Prometheus metrics for grading traffic

use lazy_static::lazy_static;
use prometheus::{
    register_histogram, register_int_counter_vec, Encoder, Histogram, IntCounterVec, TextEncoder,
};

lazy_static! {
    pub static ref EVALUATIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "forge_evaluations_total",
        "Run and submit requests by outcome",
        &["action", "outcome"]
    )
    .expect("forge_evaluations_total registers once");

    pub static ref VERDICTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "forge_verdicts_total",
        "Graded submissions by verdict",
        &["verdict"]
    )
    .expect("forge_verdicts_total registers once");

    pub static ref JUDGE_LATENCY_SECONDS: Histogram = register_histogram!(
        "forge_judge_latency_seconds",
        "Round-trip time of judge service calls",
        vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]
    )
    .expect("forge_judge_latency_seconds registers once");
}

pub fn record_evaluation(action: &str, outcome: &str) {
    EVALUATIONS_TOTAL.with_label_values(&[action, outcome]).inc();
}

pub fn record_verdict(verdict: &str) {
    VERDICTS_TOTAL.with_label_values(&[verdict]).inc();
}

/// Render the default registry in the text exposition format
pub fn render() -> Result<String, String> {
    let mut buffer = Vec::new();
    TextEncoder::new()
        .encode(&prometheus::gather(), &mut buffer)
        .map_err(|e| e.to_string())?;
    String::from_utf8(buffer).map_err(|e| e.to_string())
}
