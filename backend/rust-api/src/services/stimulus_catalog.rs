use std::{fs, io, path::PathBuf};

use crate::{
    error::SurveyError,
    models::{RegionVocabulary, Stimulus},
};

/// Read-only view of the image source directory.
#[derive(Debug, Clone)]
pub struct StimulusCatalog {
    image_dir: PathBuf,
    vocabulary: RegionVocabulary,
}

impl StimulusCatalog {
    pub fn new(image_dir: impl Into<PathBuf>, vocabulary: RegionVocabulary) -> Self {
        Self {
            image_dir: image_dir.into(),
            vocabulary,
        }
    }

    pub fn image_dir(&self) -> &std::path::Path {
        &self.image_dir
    }

    pub fn is_available(&self) -> bool {
        self.image_dir.is_dir()
    }

    /// All eligible stimuli, sorted by filename. A file is eligible when it
    /// is a regular image file whose name starts with a known region code.
    pub fn list_eligible(&self) -> Result<Vec<Stimulus>, SurveyError> {
        let entries = match fs::read_dir(&self.image_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(SurveyError::ImageSourceMissing(self.image_dir.clone()));
            }
            Err(source) => {
                return Err(SurveyError::ImageSourceUnreadable {
                    path: self.image_dir.clone(),
                    source,
                });
            }
        };

        let mut stimuli = Vec::new();
        let mut skipped = 0usize;
        for entry in entries {
            let entry = entry.map_err(|source| SurveyError::ImageSourceUnreadable {
                path: self.image_dir.clone(),
                source,
            })?;

            if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
                continue;
            }

            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                skipped += 1;
                continue;
            };

            let stimulus = Stimulus::new(name);
            if stimulus.has_image_extension() && self.vocabulary.recognizes(&stimulus.file_name) {
                stimuli.push(stimulus);
            } else {
                skipped += 1;
            }
        }

        stimuli.sort_by(|a, b| a.file_name.cmp(&b.file_name));
        tracing::debug!(
            "Listed {} eligible stimuli in {} ({} skipped)",
            stimuli.len(),
            self.image_dir.display(),
            skipped
        );
        Ok(stimuli)
    }
}
