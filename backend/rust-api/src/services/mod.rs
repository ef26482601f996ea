use crate::config::Config;
use crate::models::RegionVocabulary;

use self::{
    participant_locks::ParticipantLocks, result_log::ResultLog, stimulus_catalog::StimulusCatalog,
};

pub struct AppState {
    pub config: Config,
    pub vocabulary: RegionVocabulary,
    pub catalog: StimulusCatalog,
    pub result_log: ResultLog,
    pub participant_locks: ParticipantLocks,
}

impl AppState {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let vocabulary = config.vocabulary()?;
        let catalog = StimulusCatalog::new(config.image_dir.clone(), vocabulary.clone());
        let result_log = ResultLog::new(config.results_dir.clone());

        // Missing directories are reported per request, not fatal at startup.
        if !catalog.is_available() {
            tracing::warn!(
                "Image source {} not found; trials will fail until it exists",
                catalog.image_dir().display()
            );
        }
        if !config.results_dir.is_dir() {
            tracing::warn!(
                "Results directory {} not found; answers cannot be saved until it exists",
                config.results_dir.display()
            );
        }

        tracing::info!(
            "Survey state ready: images={}, results={}, regions={}",
            config.image_dir.display(),
            config.results_dir.display(),
            vocabulary.regions().len()
        );

        Ok(Self {
            config,
            vocabulary,
            catalog,
            result_log,
            participant_locks: ParticipantLocks::new(),
        })
    }
}

pub mod answer_service;
pub mod participant_locks;
pub mod result_log;
pub mod stimulus_catalog;
pub mod trial_service;
