use std::fmt;

use crate::error::SurveyError;

const MAX_PARTICIPANT_ID_CHARS: usize = 100;

/// Participant identifier, safe to embed in a result log filename.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParticipantId(String);

impl ParticipantId {
    pub fn parse(raw: &str) -> Result<Self, SurveyError> {
        let id = raw.trim();
        if id.is_empty() {
            return Err(SurveyError::InvalidParticipant(
                "participant id must not be empty".to_string(),
            ));
        }
        if id.chars().count() > MAX_PARTICIPANT_ID_CHARS {
            return Err(SurveyError::InvalidParticipant(format!(
                "participant id longer than {} characters",
                MAX_PARTICIPANT_ID_CHARS
            )));
        }
        if id.contains(['/', '\\']) || id.contains("..") || id.chars().any(char::is_control) {
            return Err(SurveyError::InvalidParticipant(format!(
                "participant id '{}' contains forbidden characters",
                id.escape_default()
            )));
        }
        Ok(Self(id.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
