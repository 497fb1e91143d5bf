//! Headings identified by a language model.

use serde::{Deserialize, Serialize};

/// A heading and the page where its section starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadingEntry {
    pub heading: String,
    #[serde(default = "default_level")]
    pub level: u8,
    /// 1-based page number
    pub start_page: u32,
    #[serde(default)]
    pub context: String,
}

fn default_level() -> u8 {
    1
}

impl HeadingEntry {
    pub fn new(heading: impl Into<String>, level: u8, start_page: u32) -> Self {
        Self {
            heading: heading.into(),
            level,
            start_page,
            context: String::new(),
        }
    }
}
