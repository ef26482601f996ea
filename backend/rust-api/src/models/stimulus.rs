use serde::Serialize;

/// Sentinel stored when a filename does not carry region/prompt tokens.
pub const UNKNOWN: &str = "unknown";

pub const IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// One image shown to a participant, identified by its filename
/// `<regionCode>_<promptType>_<serial>.<ext>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Stimulus {
    pub file_name: String,
}

impl Stimulus {
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
        }
    }

    /// Ground truth region and prompt type. Fewer than two `_` tokens
    /// degrades to the `unknown` sentinel for both.
    pub fn labels(&self) -> (&str, &str) {
        let mut parts = self.file_name.split('_');
        match (parts.next(), parts.next()) {
            (Some(region), Some(prompt)) => (region, prompt),
            _ => (UNKNOWN, UNKNOWN),
        }
    }

    pub fn extension(&self) -> Option<&str> {
        self.file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext)
            .filter(|ext| !ext.is_empty())
    }

    pub fn has_image_extension(&self) -> bool {
        self.extension().is_some_and(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
    }
}
