use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;

use crate::metrics::{HTTP_REQUESTS_TOTAL, HTTP_REQUEST_DURATION_SECONDS};

/// Records request count and latency per normalized route.
pub async fn metrics_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().to_string();
    let path = normalize_path(req.uri().path());

    let response = next.run(req).await;

    let duration = start.elapsed().as_secs_f64();
    let status = response.status().as_u16().to_string();

    HTTP_REQUESTS_TOTAL
        .with_label_values(&[&method, &path, &status])
        .inc();

    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[&method, &path])
        .observe(duration);

    response
}

/// Collapses participant ids so every participant shares one label set.
fn normalize_path(path: &str) -> String {
    let mut normalized = Vec::new();
    let mut after_participants = false;

    for segment in path.split('/') {
        if after_participants && !segment.is_empty() {
            normalized.push("{id}");
        } else {
            normalized.push(segment);
        }
        after_participants = segment == "participants";
    }

    normalized.join("/")
}
