//! Counters reported by the AI-assisted pipelines.

use serde::{Deserialize, Serialize};

/// Image classification and table extraction counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationStats {
    pub total_images_found: usize,
    pub images_classified_important: usize,
    pub images_classified_decorative: usize,
    pub images_saved: usize,
    pub total_tables: usize,
}

impl ClassificationStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count images discovered on a page.
    pub fn add_found(&mut self, count: usize) {
        self.total_images_found += count;
    }

    /// Count an image judged important and written to disk.
    pub fn add_saved_important(&mut self) {
        self.images_classified_important += 1;
        self.images_saved += 1;
    }

    /// Count an image judged decorative.
    pub fn add_decorative(&mut self) {
        self.images_classified_decorative += 1;
    }

    pub fn add_table(&mut self) {
        self.total_tables += 1;
    }

    /// Merge another stats instance into this one.
    pub fn merge(&mut self, other: &ClassificationStats) {
        self.total_images_found += other.total_images_found;
        self.images_classified_important += other.images_classified_important;
        self.images_classified_decorative += other.images_classified_decorative;
        self.images_saved += other.images_saved;
        self.total_tables += other.total_tables;
    }

    /// Log a summary at info level.
    pub fn log_summary(&self) {
        log::info!("AI classification statistics:");
        log::info!("  Total images found: {}", self.total_images_found);
        log::info!("  Classified as important: {}", self.images_classified_important);
        log::info!("  Classified as decorative: {}", self.images_classified_decorative);
        log::info!("  Images saved: {}", self.images_saved);
        log::info!("  Tables extracted: {}", self.total_tables);
    }
}
