use serde::Serialize;
use std::collections::HashSet;

pub mod answer;
pub mod participant;
pub mod region;
pub mod stimulus;

pub use participant::ParticipantId;
pub use region::{Region, RegionVocabulary};
pub use stimulus::Stimulus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantState {
    NotStarted,
    InProgress,
    Complete,
}

impl ParticipantState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParticipantState::NotStarted => "not_started",
            ParticipantState::InProgress => "in_progress",
            ParticipantState::Complete => "complete",
        }
    }
}

/// How the participant's existing result log was read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum PriorLogStatus {
    /// No log file, or an empty one.
    NoPriorData,
    Loaded,
    /// The log exists but could not be used; treated as no prior answers.
    Unreadable(String),
}

/// Answers already persisted for one participant.
#[derive(Debug, Clone)]
pub struct PriorAnswers {
    pub answered: HashSet<String>,
    pub correct: usize,
    pub status: PriorLogStatus,
}

impl PriorAnswers {
    pub fn none() -> Self {
        Self {
            answered: HashSet::new(),
            correct: 0,
            status: PriorLogStatus::NoPriorData,
        }
    }

    pub fn unreadable(reason: impl Into<String>) -> Self {
        Self {
            status: PriorLogStatus::Unreadable(reason.into()),
            ..Self::none()
        }
    }

    pub fn contains(&self, image_file: &str) -> bool {
        self.answered.contains(image_file)
    }
}

/// Stimuli still to be shown to a participant, recomputed from disk.
#[derive(Debug, Clone)]
pub struct TrialPlan {
    pub remaining: Vec<Stimulus>,
    pub total: usize,
    pub prior: PriorAnswers,
}

impl TrialPlan {
    /// Keeps the order of `eligible`, dropping everything `prior` contains.
    pub fn from_eligible(eligible: Vec<Stimulus>, prior: PriorAnswers) -> Self {
        let total = eligible.len();
        let remaining = eligible
            .into_iter()
            .filter(|stimulus| !prior.contains(&stimulus.file_name))
            .collect();
        Self {
            remaining,
            total,
            prior,
        }
    }

    pub fn done(&self) -> usize {
        self.total.saturating_sub(self.remaining.len())
    }

    pub fn next(&self) -> Option<&Stimulus> {
        self.remaining.first()
    }

    pub fn state(&self) -> ParticipantState {
        if self.remaining.is_empty() {
            ParticipantState::Complete
        } else if self.done() == 0 {
            ParticipantState::NotStarted
        } else {
            ParticipantState::InProgress
        }
    }

    pub fn summary(&self) -> ProgressSummary {
        ProgressSummary {
            done: self.done(),
            total: self.total,
            correct: self.prior.correct,
            state: self.state(),
            prior_log: self.prior.status.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProgressSummary {
    pub done: usize,
    pub total: usize,
    pub correct: usize,
    pub state: ParticipantState,
    pub prior_log: PriorLogStatus,
}

#[derive(Debug, Serialize)]
pub struct NextTrialResponse {
    pub participant: String,
    pub stimulus: Option<StimulusInfo>,
    pub done: usize,
    pub total: usize,
    pub state: ParticipantState,
}

#[derive(Debug, Serialize)]
pub struct StimulusInfo {
    pub image_file: String,
    /// 1-based position of this trial, for "N / total" displays.
    pub position: usize,
}
