use rand::{seq::SliceRandom, Rng};

use crate::{
    error::SurveyError,
    models::{ParticipantId, TrialPlan},
};

use super::{result_log::ResultLog, stimulus_catalog::StimulusCatalog};

/// Works out which stimuli a participant still has to answer. Nothing is
/// cached: every call re-reads the image source and the participant's log.
pub struct TrialSequencer<'a> {
    catalog: &'a StimulusCatalog,
    log: &'a ResultLog,
}

impl<'a> TrialSequencer<'a> {
    pub fn new(catalog: &'a StimulusCatalog, log: &'a ResultLog) -> Self {
        Self { catalog, log }
    }

    pub fn remaining(&self, participant: &ParticipantId) -> Result<TrialPlan, SurveyError> {
        self.remaining_with_rng(participant, &mut rand::rng())
    }

    /// Shuffles the full eligible set, then drops everything already in the
    /// participant's log. `total` is the size of the eligible set.
    pub fn remaining_with_rng<R: Rng + ?Sized>(
        &self,
        participant: &ParticipantId,
        rng: &mut R,
    ) -> Result<TrialPlan, SurveyError> {
        let mut eligible = self.catalog.list_eligible()?;
        let prior = self.log.load(participant);

        eligible.shuffle(rng);
        let plan = TrialPlan::from_eligible(eligible, prior);

        tracing::debug!(
            "Trial plan for {}: {}/{} done, state={}",
            participant,
            plan.done(),
            plan.total,
            plan.state().as_str()
        );

        Ok(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ParticipantState, PriorLogStatus, RegionVocabulary};
    use rand::{rngs::StdRng, SeedableRng};
    use std::fs;

    struct Fixture {
        _images: tempfile::TempDir,
        results: tempfile::TempDir,
        catalog: StimulusCatalog,
        log: ResultLog,
    }

    fn fixture(files: &[&str]) -> Fixture {
        let images = tempfile::tempdir().unwrap();
        let results = tempfile::tempdir().unwrap();
        for f in files {
            fs::write(images.path().join(f), b"img").unwrap();
        }
        Fixture {
            catalog: StimulusCatalog::new(images.path(), RegionVocabulary::default()),
            log: ResultLog::new(results.path()),
            _images: images,
            results,
        }
    }

    const FILES: [&str; 4] = [
        "saga_simple_001.png",
        "miyazaki_hard_004.png",
        "osaka_simple_002.jpg",
        "nara_detailed_003.jpeg",
    ];

    #[test]
    fn excludes_answered_but_keeps_total() {
        let fx = fixture(&FILES);
        let taro = ParticipantId::parse("taro").unwrap();
        fs::write(
            fx.results.path().join("result_taro.csv"),
            "timestamp,user,image_file,true_region,prompt_type,selected_region,is_correct\n\
             2025-01-01 10:00:00,taro,miyazaki_hard_004.png,miyazaki,hard,saga,0\n",
        )
        .unwrap();

        let plan = TrialSequencer::new(&fx.catalog, &fx.log)
            .remaining(&taro)
            .unwrap();

        assert_eq!(plan.total, 4);
        assert_eq!(plan.remaining.len(), 3);
        assert_eq!(plan.done(), 1);
        assert!(plan
            .remaining
            .iter()
            .all(|s| s.file_name != "miyazaki_hard_004.png"));
        assert_eq!(plan.state(), ParticipantState::InProgress);
        assert_eq!(plan.prior.status, PriorLogStatus::Loaded);
    }

    #[test]
    fn repeated_calls_have_stable_size() {
        let fx = fixture(&FILES);
        let taro = ParticipantId::parse("taro").unwrap();
        let sequencer = TrialSequencer::new(&fx.catalog, &fx.log);

        let first = sequencer.remaining(&taro).unwrap();
        let second = sequencer.remaining(&taro).unwrap();
        assert_eq!(first.remaining.len(), second.remaining.len());
        assert_eq!(first.total, second.total);
        assert_eq!(first.state(), ParticipantState::NotStarted);
    }

    #[test]
    fn seeded_rng_gives_reproducible_order() {
        let fx = fixture(&FILES);
        let taro = ParticipantId::parse("taro").unwrap();
        let sequencer = TrialSequencer::new(&fx.catalog, &fx.log);

        let order = |seed| {
            sequencer
                .remaining_with_rng(&taro, &mut StdRng::seed_from_u64(seed))
                .unwrap()
                .remaining
                .into_iter()
                .map(|s| s.file_name)
                .collect::<Vec<_>>()
        };
        assert_eq!(order(7), order(7));

        let mut sorted = order(7);
        sorted.sort();
        let mut expected: Vec<String> = FILES.iter().map(|f| f.to_string()).collect();
        expected.sort();
        assert_eq!(sorted, expected);
    }

    #[test]
    fn corrupt_log_falls_back_to_full_set() {
        let fx = fixture(&FILES);
        let taro = ParticipantId::parse("taro").unwrap();
        fs::write(fx.results.path().join("result_taro.csv"), "garbage\nmore\n").unwrap();

        let plan = TrialSequencer::new(&fx.catalog, &fx.log)
            .remaining(&taro)
            .unwrap();
        assert_eq!(plan.remaining.len(), 4);
        assert!(matches!(plan.prior.status, PriorLogStatus::Unreadable(_)));
    }

    #[test]
    fn answers_for_removed_images_do_not_count() {
        let fx = fixture(&FILES[..1]);
        let taro = ParticipantId::parse("taro").unwrap();
        fs::write(
            fx.results.path().join("result_taro.csv"),
            "image_file,is_correct\nnara_gone_009.png,1\n",
        )
        .unwrap();

        let plan = TrialSequencer::new(&fx.catalog, &fx.log)
            .remaining(&taro)
            .unwrap();
        assert_eq!(plan.total, 1);
        assert_eq!(plan.done(), 0);
    }

    #[test]
    fn missing_image_source_is_reported() {
        let results = tempfile::tempdir().unwrap();
        let catalog = StimulusCatalog::new(
            results.path().join("no-images"),
            RegionVocabulary::default(),
        );
        let log = ResultLog::new(results.path());
        let taro = ParticipantId::parse("taro").unwrap();

        let err = TrialSequencer::new(&catalog, &log)
            .remaining(&taro)
            .unwrap_err();
        assert!(matches!(err, SurveyError::ImageSourceMissing(_)));
    }
}
