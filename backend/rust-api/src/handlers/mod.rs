use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use base64::{engine::general_purpose, Engine as _};
use serde_json::json;
use std::sync::Arc;

use crate::error::SurveyError;
use crate::metrics;
use crate::services::AppState;

pub mod participants;

pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let images_ok = state.catalog.is_available();
    let results_ok = state.result_log.results_dir().is_dir();

    let availability = |ok: bool| if ok { "available" } else { "missing" };
    let (status_code, status) = if images_ok && results_ok {
        (StatusCode::OK, "healthy")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };

    (
        status_code,
        Json(json!({
            "status": status,
            "service": "regionsurvey-api",
            "version": env!("CARGO_PKG_VERSION"),
            "dependencies": {
                "image_source": availability(images_ok),
                "results_dir": availability(results_ok),
            }
        })),
    )
}

pub async fn list_regions(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({ "regions": state.vocabulary.regions() }))
}

pub async fn metrics_handler() -> impl IntoResponse {
    match metrics::render_metrics() {
        Ok(metrics_text) => (StatusCode::OK, metrics_text),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to render metrics: {}", e),
        ),
    }
}

/// Protects `/metrics` with HTTP Basic auth against `Config::metrics_auth`.
pub async fn metrics_auth_middleware(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let encoded = auth_header
        .strip_prefix("Basic ")
        .ok_or(StatusCode::UNAUTHORIZED)?;
    let decoded = general_purpose::STANDARD
        .decode(encoded)
        .map_err(|_| StatusCode::UNAUTHORIZED)?;
    let credentials = String::from_utf8(decoded).map_err(|_| StatusCode::UNAUTHORIZED)?;

    if credentials != state.config.metrics_auth {
        return Err(StatusCode::UNAUTHORIZED);
    }

    Ok(next.run(request).await)
}

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Conflict(String),
    ServiceUnavailable(String),
    Internal(String),
}

impl ApiError {
    fn service_unavailable(message: impl Into<String>) -> Self {
        ApiError::ServiceUnavailable(message.into())
    }

    fn internal(message: impl Into<String>) -> Self {
        ApiError::Internal(message.into())
    }
}

impl From<SurveyError> for ApiError {
    fn from(err: SurveyError) -> Self {
        let message = err.to_string();
        match err {
            ref e if e.is_configuration() => {
                ApiError::ServiceUnavailable(format!("Configuration error: {}", message))
            }
            SurveyError::InvalidParticipant(_)
            | SurveyError::InvalidStimulus(_)
            | SurveyError::UnknownStimulus(_)
            | SurveyError::UnknownRegion(_) => ApiError::BadRequest(message),
            SurveyError::AlreadyAnswered { .. } => ApiError::Conflict(message),
            _ => ApiError::Internal(message),
        }
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        ApiError::internal(format!("Background task failed: {}", err))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::Conflict(message) => (StatusCode::CONFLICT, message),
            ApiError::ServiceUnavailable(message) => (StatusCode::SERVICE_UNAVAILABLE, message),
            ApiError::Internal(message) => (StatusCode::INTERNAL_SERVER_ERROR, message),
        };

        if status.is_server_error() {
            tracing::error!("Request failed: {}", message);
        }

        (
            status,
            Json(json!({
                "message": message,
                "status": status.as_u16()
            })),
        )
            .into_response()
    }
}
