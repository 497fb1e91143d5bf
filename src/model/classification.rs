//! Vision-model verdicts on extracted images.

use serde::{Deserialize, Serialize};

/// Describes an image and whether it is worth keeping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageClassification {
    pub is_important: bool,
    pub image_type: String,
    pub description: String,
    /// 0..=10
    pub relevance_score: u8,
    /// At most [`ImageClassification::MAX_TAGS`] tags.
    pub tags: Vec<String>,
}

impl ImageClassification {
    pub const MAX_TAGS: usize = 5;
    pub const MAX_SCORE: u8 = 10;
    pub const DEFAULT_SCORE: u8 = 5;

    /// Verdict used when the model could not be consulted or understood.
    ///
    /// Images are kept rather than silently dropped.
    pub fn fallback(description: impl Into<String>) -> Self {
        Self {
            is_important: true,
            image_type: "unknown".to_string(),
            description: description.into(),
            relevance_score: Self::DEFAULT_SCORE,
            tags: Vec::new(),
        }
    }
}
