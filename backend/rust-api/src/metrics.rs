use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter, register_int_counter_vec, Encoder,
    HistogramVec, IntCounter, IntCounterVec, TextEncoder,
};

lazy_static! {
    // HTTP Metrics
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "http_requests_total",
        "Total number of HTTP requests",
        &["method", "path", "status"]
    )
    .unwrap();

    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "http_request_duration_seconds",
        "HTTP request duration in seconds",
        &["method", "path"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
    )
    .unwrap();

    // Survey Metrics
    pub static ref ANSWERS_RECORDED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "survey_answers_recorded_total",
        "Total number of answers appended to result logs",
        &["correct"]
    )
    .unwrap();

    pub static ref ANSWER_WRITE_FAILURES_TOTAL: IntCounter = register_int_counter!(
        "survey_answer_write_failures_total",
        "Answers that could not be persisted"
    )
    .unwrap();

    pub static ref TRIALS_SERVED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "survey_trials_served_total",
        "Next-trial lookups by participant state",
        &["state"]
    )
    .unwrap();

    pub static ref LOG_READ_FALLBACKS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "survey_log_read_fallbacks_total",
        "Result logs that could not be used and were treated as empty",
        &["reason"]
    )
    .unwrap();
}

/// Renders all metrics in Prometheus text format
pub fn render_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer)
        .map_err(|e| prometheus::Error::Msg(format!("Failed to convert metrics to UTF-8: {}", e)))
}
