use serde::Deserialize;
use std::{env, path::PathBuf};

use crate::models::{Region, RegionVocabulary};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub image_dir: PathBuf,
    pub results_dir: PathBuf,
    pub bind_addr: String,
    /// `username:password` expected on `/metrics`.
    pub metrics_auth: String,
    pub otlp_endpoint: Option<String>,
    /// Emit logs as JSON lines instead of the human-readable format.
    pub json_logs: bool,
    pub regions: Option<Vec<Region>>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            image_dir: PathBuf::from("images"),
            results_dir: PathBuf::from("results"),
            bind_addr: "0.0.0.0:8081".to_string(),
            metrics_auth: "admin:changeme".to_string(),
            otlp_endpoint: None,
            json_logs: false,
            regions: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();

        // Determine environment (defaults to dev)
        let env = env::var("APP_ENV").unwrap_or_else(|_| "dev".to_string());

        // Build configuration from config/*.toml + ENV overrides
        let settings = config::Config::builder()
            .add_source(config::File::with_name(&format!("config/{}", env)).required(false))
            // Override with environment variables (prefix: APP_)
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .build()?;

        Self::from_settings(&settings, &env)
    }

    fn from_settings(settings: &config::Config, env: &str) -> Result<Self, config::ConfigError> {
        let defaults = Self::default();

        let image_dir = settings
            .get_string("survey.image_dir")
            .or_else(|_| env::var("IMAGE_DIR"))
            .map(PathBuf::from)
            .unwrap_or(defaults.image_dir);

        let results_dir = settings
            .get_string("survey.results_dir")
            .or_else(|_| env::var("RESULTS_DIR"))
            .map(PathBuf::from)
            .unwrap_or(defaults.results_dir);

        let bind_addr = settings
            .get_string("server.bind_addr")
            .unwrap_or(defaults.bind_addr);

        let metrics_auth = settings
            .get_string("metrics.auth")
            .or_else(|_| env::var("METRICS_AUTH"))
            .unwrap_or_else(|_| {
                if env == "prod" {
                    tracing::warn!("METRICS_AUTH not set in production, using default");
                }
                defaults.metrics_auth
            });

        let otlp_endpoint = settings
            .get_string("telemetry.otlp_endpoint")
            .or_else(|_| env::var("OTEL_EXPORTER_OTLP_ENDPOINT"))
            .ok()
            .filter(|v| !v.trim().is_empty());

        let json_logs = settings
            .get_bool("telemetry.json_logs")
            .unwrap_or_else(|_| {
                env::var("LOG_FORMAT")
                    .map(|v| v.eq_ignore_ascii_case("json"))
                    .unwrap_or(defaults.json_logs)
            });

        let regions = match settings.get::<Vec<Region>>("survey.regions") {
            Ok(regions) => Some(regions),
            Err(config::ConfigError::NotFound(_)) => None,
            Err(e) => return Err(e),
        };

        Ok(Config {
            image_dir,
            results_dir,
            bind_addr,
            metrics_auth,
            otlp_endpoint,
            json_logs,
            regions,
        })
    }

    /// The configured vocabulary, or the built-in six regions.
    pub fn vocabulary(&self) -> Result<RegionVocabulary, crate::error::SurveyError> {
        match &self.regions {
            Some(regions) => RegionVocabulary::from_regions(regions.clone()),
            None => Ok(RegionVocabulary::default()),
        }
    }
}
