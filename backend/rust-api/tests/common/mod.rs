#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use regionsurvey_api::{config::Config, create_router, services::AppState};
use std::{fs, path::PathBuf, sync::Arc};
use tempfile::TempDir;
use tower::ServiceExt;

pub const STIMULI: [&str; 6] = [
    "saga_simple_001.png",
    "miyazaki_hard_004.png",
    "osaka_simple_002.jpg",
    "nara_detailed_003.jpeg",
    "shiga_simple_005.png",
    "saitama_hard_006.png",
];

pub struct TestSurvey {
    pub root: TempDir,
    pub app: Router,
}

impl TestSurvey {
    pub fn image_dir(&self) -> PathBuf {
        self.root.path().join("images")
    }

    pub fn results_dir(&self) -> PathBuf {
        self.root.path().join("results")
    }

    pub fn log_path(&self, participant: &str) -> PathBuf {
        self.results_dir().join(format!("result_{}.csv", participant))
    }

    pub fn log_lines(&self, participant: &str) -> Vec<String> {
        fs::read_to_string(self.log_path(participant))
            .map(|c| c.lines().map(str::to_string).collect())
            .unwrap_or_default()
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, serde_json::Value) {
        let request = Request::builder()
            .method("GET")
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        send(&self.app, request).await
    }

    pub async fn answer(
        &self,
        participant: &str,
        image_file: &str,
        selected_region: &str,
    ) -> (StatusCode, serde_json::Value) {
        let body = serde_json::json!({
            "image_file": image_file,
            "selected_region": selected_region,
        });
        let request = Request::builder()
            .method("POST")
            .uri(format!("/api/v1/participants/{}/answers", participant))
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        send(&self.app, request).await
    }
}

pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
    (status, json)
}

/// Builds the router over fresh temp directories holding `stimuli`.
pub fn create_test_survey(stimuli: &[&str]) -> TestSurvey {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();

    let root = tempfile::tempdir().unwrap();
    let images = root.path().join("images");
    let results = root.path().join("results");
    fs::create_dir_all(&images).unwrap();
    fs::create_dir_all(&results).unwrap();
    for name in stimuli {
        fs::write(images.join(name), b"\x89PNG").unwrap();
    }

    let app = build_app(images, results);
    TestSurvey { root, app }
}

pub fn build_app(image_dir: PathBuf, results_dir: PathBuf) -> Router {
    let config = Config {
        image_dir,
        results_dir,
        metrics_auth: "admin:secret".to_string(),
        ..Config::default()
    };
    let state = Arc::new(AppState::new(config).expect("Failed to initialize test app state"));
    create_router(state)
}
