use chrono::{Local, NaiveDateTime};

use crate::error::SurveyError;
use crate::metrics::{ANSWERS_RECORDED_TOTAL, ANSWER_WRITE_FAILURES_TOTAL};
use crate::models::{
    answer::{AnswerRecord, SubmitAnswerResponse},
    ParticipantId, RegionVocabulary, Stimulus, TrialPlan,
};

use super::{
    participant_locks::ParticipantLocks, result_log::ResultLog, stimulus_catalog::StimulusCatalog,
};

pub struct AnswerRecorder<'a> {
    catalog: &'a StimulusCatalog,
    vocabulary: &'a RegionVocabulary,
    log: &'a ResultLog,
    locks: &'a ParticipantLocks,
}

impl<'a> AnswerRecorder<'a> {
    pub fn new(
        catalog: &'a StimulusCatalog,
        vocabulary: &'a RegionVocabulary,
        log: &'a ResultLog,
        locks: &'a ParticipantLocks,
    ) -> Self {
        Self {
            catalog,
            vocabulary,
            log,
            locks,
        }
    }

    pub fn record(
        &self,
        participant: &ParticipantId,
        image_file: &str,
        selected_region: &str,
    ) -> Result<SubmitAnswerResponse, SurveyError> {
        self.record_at(
            participant,
            image_file,
            selected_region,
            Local::now().naive_local(),
        )
    }

    /// Scores the answer and appends it to the participant's log. Only
    /// stimuli currently in the image source can be answered, each once.
    /// The record is returned only once the append is on disk; on any error
    /// nothing is considered answered and the stimulus stays in the
    /// remaining set.
    pub fn record_at(
        &self,
        participant: &ParticipantId,
        image_file: &str,
        selected_region: &str,
        answered_at: NaiveDateTime,
    ) -> Result<SubmitAnswerResponse, SurveyError> {
        tracing::info!(
            "Recording answer: participant={}, image={}, selected={}",
            participant,
            image_file,
            selected_region
        );

        let stimulus = parse_stimulus(image_file)?;
        let selected_code = self.vocabulary.resolve(selected_region)?;

        self.locks.with_lock(participant, || {
            let eligible = self.catalog.list_eligible()?;
            if !eligible.contains(&stimulus) {
                tracing::warn!(
                    "Answer for unknown stimulus rejected: participant={}, image={}",
                    participant,
                    stimulus.file_name
                );
                return Err(SurveyError::UnknownStimulus(stimulus.file_name.clone()));
            }

            if self.log.load(participant).contains(&stimulus.file_name) {
                tracing::warn!(
                    "Duplicate answer rejected: participant={}, image={}",
                    participant,
                    stimulus.file_name
                );
                return Err(SurveyError::AlreadyAnswered {
                    participant: participant.to_string(),
                    image_file: stimulus.file_name.clone(),
                });
            }

            let record = AnswerRecord::score(participant, &stimulus, selected_code, answered_at);

            if let Err(e) = self.log.append(participant, &record) {
                ANSWER_WRITE_FAILURES_TOTAL.inc();
                tracing::error!("Failed to persist answer: {}", e);
                return Err(e);
            }

            let correct_label = if record.is_correct { "true" } else { "false" };
            ANSWERS_RECORDED_TOTAL
                .with_label_values(&[correct_label])
                .inc();

            tracing::info!(
                "Answer recorded: participant={}, image={}, true_region={}, correct={}",
                participant,
                record.image_file,
                record.true_region,
                record.correctness_flag()
            );

            // Progress reuses this listing; the log is re-read to include the new row.
            let plan = TrialPlan::from_eligible(eligible, self.log.load(participant));
            Ok(SubmitAnswerResponse {
                record,
                progress: plan.summary(),
            })
        })
    }
}

fn parse_stimulus(image_file: &str) -> Result<Stimulus, SurveyError> {
    if image_file.is_empty()
        || image_file == "."
        || image_file == ".."
        || image_file.contains(['/', '\\'])
        || image_file.chars().any(char::is_control)
    {
        return Err(SurveyError::InvalidStimulus(
            image_file.escape_default().to_string(),
        ));
    }
    Ok(Stimulus::new(image_file))
}
