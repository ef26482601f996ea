use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SurveyError {
    #[error("image source directory not found: {}", .0.display())]
    ImageSourceMissing(PathBuf),

    #[error("failed to list image source {}: {source}", path.display())]
    ImageSourceUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid participant id: {0}")]
    InvalidParticipant(String),

    #[error("invalid stimulus file name: {0}")]
    InvalidStimulus(String),

    #[error("image {0} is not in the image source")]
    UnknownStimulus(String),

    #[error("unknown region: {0}")]
    UnknownRegion(String),

    #[error("invalid region vocabulary: {0}")]
    InvalidVocabulary(String),

    #[error("participant {participant} already answered {image_file}")]
    AlreadyAnswered {
        participant: String,
        image_file: String,
    },

    #[error("failed to append to result log {}: {source}", path.display())]
    LogWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SurveyError {
    /// Errors caused by deployment setup rather than by the request.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            SurveyError::ImageSourceMissing(_)
                | SurveyError::ImageSourceUnreadable { .. }
                | SurveyError::InvalidVocabulary(_)
        )
    }
}
