use axum::{
    http::{header, Method},
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod metrics;
pub mod middlewares;
pub mod models;
pub mod services;
pub mod telemetry;

pub use config::Config;
pub use error::SurveyError;
pub use services::AppState;

pub fn create_router(app_state: Arc<AppState>) -> Router {
    // The presentation layer is served from elsewhere and calls in from the browser.
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
        .allow_origin(tower_http::cors::Any);

    Router::new()
        .route("/health", get(handlers::health_check))
        // Metrics endpoint with Basic Auth protection
        .route(
            "/metrics",
            get(handlers::metrics_handler).layer(middleware::from_fn_with_state(
                app_state.clone(),
                handlers::metrics_auth_middleware,
            )),
        )
        .nest("/api/v1", survey_routes().layer(cors))
        .with_state(app_state)
        .layer(middleware::from_fn(
            middlewares::metrics::metrics_middleware,
        ))
        .layer(middleware::from_fn(
            middlewares::trace::trace_context_middleware,
        ))
        .layer(TraceLayer::new_for_http())
}

fn survey_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/regions", get(handlers::list_regions))
        .route(
            "/participants/{id}/trial",
            get(handlers::participants::next_trial),
        )
        .route(
            "/participants/{id}/progress",
            get(handlers::participants::progress),
        )
        .route(
            "/participants/{id}/answers",
            post(handlers::participants::submit_answer),
        )
}
