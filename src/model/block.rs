//! Content blocks: the smallest classified unit of a section.

use serde::{Deserialize, Serialize};

use super::classification::ImageClassification;
use super::geometry::BoundingBox;

/// Kind of content a block carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockKind {
    Text,
    Image,
    Table,
}

/// A text, image or table block within a section.
///
/// For image and table blocks `content` is the saved file name (or, for
/// tables that could not be rasterized, the table's cell text).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    #[serde(rename = "type")]
    pub kind: BlockKind,
    pub content: String,
    pub order: usize,
    pub bbox: BoundingBox,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<BlockMetadata>,
}

impl Block {
    /// Create a text block.
    pub fn text(content: impl Into<String>, bbox: BoundingBox) -> Self {
        Self {
            kind: BlockKind::Text,
            content: content.into(),
            order: 0,
            bbox,
            metadata: None,
        }
    }

    /// Create an image block referring to a saved file.
    pub fn image(filename: impl Into<String>, bbox: BoundingBox, metadata: BlockMetadata) -> Self {
        Self {
            kind: BlockKind::Image,
            content: filename.into(),
            order: 0,
            bbox,
            metadata: Some(metadata),
        }
    }

    /// Create a table block.
    pub fn table(content: impl Into<String>, bbox: BoundingBox, rows: usize, cols: usize) -> Self {
        Self {
            kind: BlockKind::Table,
            content: content.into(),
            order: 0,
            bbox,
            metadata: Some(BlockMetadata::table(rows, cols)),
        }
    }

    /// Set the position of this block within its section.
    pub fn with_order(mut self, order: usize) -> Self {
        self.order = order;
        self
    }

    pub fn is_text(&self) -> bool {
        self.kind == BlockKind::Text
    }
}

/// Extra facts attached to image and table blocks.
///
/// Only the fields relevant to the block are serialized.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlockMetadata {
    #[serde(default)]
    pub is_table: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cols: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_classified: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relevance_score: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

impl BlockMetadata {
    /// Metadata for a saved image.
    pub fn image(format: impl Into<String>, size_bytes: usize) -> Self {
        Self {
            is_table: false,
            format: Some(format.into()),
            size_bytes: Some(size_bytes),
            ..Default::default()
        }
    }

    /// Metadata for a detected table.
    pub fn table(rows: usize, cols: usize) -> Self {
        Self {
            is_table: true,
            rows: Some(rows),
            cols: Some(cols),
            ..Default::default()
        }
    }

    /// Attach a vision-model verdict.
    pub fn with_classification(mut self, classification: &ImageClassification) -> Self {
        self.ai_classified = Some(true);
        self.image_type = Some(classification.image_type.clone());
        self.description = Some(classification.description.clone());
        self.relevance_score = Some(classification.relevance_score);
        self.tags = Some(classification.tags.clone());
        self
    }
}
