use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::SurveyError;

/// Number of answer choices offered to a participant.
pub const REGION_COUNT: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    /// Label shown on the answer button.
    pub label: String,
    /// Code embedded in stimulus filenames and stored in the result log.
    pub code: String,
}

impl Region {
    pub fn new(label: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            code: code.into(),
        }
    }
}

/// Bidirectional label <-> code mapping, kept in display order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegionVocabulary {
    regions: Vec<Region>,
}

impl Default for RegionVocabulary {
    fn default() -> Self {
        Self {
            regions: vec![
                Region::new("佐賀", "saga"),
                Region::new("宮崎", "miyazaki"),
                Region::new("大阪", "osaka"),
                Region::new("奈良", "nara"),
                Region::new("滋賀", "shiga"),
                Region::new("埼玉", "saitama"),
            ],
        }
    }
}

impl RegionVocabulary {
    /// Builds a vocabulary from configuration. Exactly six entries with
    /// unique, non-empty labels and codes are required.
    pub fn from_regions(regions: Vec<Region>) -> Result<Self, SurveyError> {
        if regions.len() != REGION_COUNT {
            return Err(SurveyError::InvalidVocabulary(format!(
                "expected {} regions, got {}",
                REGION_COUNT,
                regions.len()
            )));
        }

        let mut codes = HashSet::new();
        let mut labels = HashSet::new();
        for region in &regions {
            if region.code.trim().is_empty() || region.label.trim().is_empty() {
                return Err(SurveyError::InvalidVocabulary(
                    "region label and code must not be empty".to_string(),
                ));
            }
            if region.code.contains('_') {
                return Err(SurveyError::InvalidVocabulary(format!(
                    "region code '{}' must not contain '_'",
                    region.code
                )));
            }
            if !codes.insert(region.code.as_str()) {
                return Err(SurveyError::InvalidVocabulary(format!(
                    "duplicate region code '{}'",
                    region.code
                )));
            }
            if !labels.insert(region.label.as_str()) {
                return Err(SurveyError::InvalidVocabulary(format!(
                    "duplicate region label '{}'",
                    region.label
                )));
            }
        }

        Ok(Self { regions })
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.regions.iter().map(|r| r.code.as_str())
    }

    /// Resolves a submitted choice to its canonical code. Codes match first,
    /// then display labels. Matching is exact.
    pub fn resolve(&self, selected: &str) -> Result<&str, SurveyError> {
        self.regions
            .iter()
            .find(|r| r.code == selected)
            .or_else(|| self.regions.iter().find(|r| r.label == selected))
            .map(|r| r.code.as_str())
            .ok_or_else(|| SurveyError::UnknownRegion(selected.to_string()))
    }

    /// True when the filename starts with one of the known codes.
    pub fn recognizes(&self, file_name: &str) -> bool {
        self.codes().any(|code| file_name.starts_with(code))
    }
}
