use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::{participant::ParticipantId, stimulus::Stimulus, ProgressSummary};

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Deserialize)]
pub struct SubmitAnswerRequest {
    pub image_file: String,
    /// Region code, or its display label.
    pub selected_region: String,
}

/// A persisted answer and the participant's progress right after it.
#[derive(Debug, Serialize)]
pub struct SubmitAnswerResponse {
    pub record: AnswerRecord,
    pub progress: ProgressSummary,
}

/// One row of a participant's result log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnswerRecord {
    pub timestamp: String,
    pub user: String,
    pub image_file: String,
    pub true_region: String,
    pub prompt_type: String,
    pub selected_region: String,
    pub is_correct: bool,
}

impl AnswerRecord {
    /// Scores `selected_code` against the region encoded in the stimulus
    /// filename. Exact string comparison.
    pub fn score(
        participant: &ParticipantId,
        stimulus: &Stimulus,
        selected_code: &str,
        answered_at: NaiveDateTime,
    ) -> Self {
        let (true_region, prompt_type) = stimulus.labels();
        Self {
            timestamp: answered_at.format(TIMESTAMP_FORMAT).to_string(),
            user: participant.as_str().to_string(),
            image_file: stimulus.file_name.clone(),
            true_region: true_region.to_string(),
            prompt_type: prompt_type.to_string(),
            selected_region: selected_code.to_string(),
            is_correct: selected_code == true_region,
        }
    }

    pub fn correctness_flag(&self) -> u8 {
        u8::from(self.is_correct)
    }
}
