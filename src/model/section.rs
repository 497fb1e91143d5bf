//! Sections: spans of a document between two detected headings.

use serde::{Deserialize, Serialize};

use super::block::Block;

/// A section whose body is plain text.
///
/// Produced by the regex line segmenter and by the markdown segmenter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextSection {
    pub order: usize,
    pub heading: String,
    pub content: String,
    /// File names of images belonging to the section's pages.
    pub images: Vec<String>,
    pub tables: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
}

impl TextSection {
    pub fn new(order: usize, heading: impl Into<String>, page: Option<u32>) -> Self {
        Self {
            order,
            heading: heading.into(),
            content: String::new(),
            images: Vec::new(),
            tables: Vec::new(),
            page,
        }
    }

    /// Add image file names, skipping ones already present.
    pub fn add_images<'a>(&mut self, names: impl IntoIterator<Item = &'a String>) {
        for name in names {
            if !self.images.contains(name) {
                self.images.push(name.clone());
            }
        }
    }

    /// Whether the content is only whitespace.
    pub fn is_blank(&self) -> bool {
        self.content.trim().is_empty()
    }
}

/// A section whose body is an ordered list of blocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockSection {
    pub order: usize,
    pub heading: String,
    pub page: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u8>,
    pub blocks: Vec<Block>,
}

impl BlockSection {
    pub fn new(order: usize, heading: impl Into<String>, page: u32, level: Option<u8>) -> Self {
        Self {
            order,
            heading: heading.into(),
            page,
            level,
            blocks: Vec::new(),
        }
    }

    /// Append a block, numbering it by its position in the section.
    pub fn push(&mut self, block: Block) {
        let order = self.blocks.len();
        self.blocks.push(block.with_order(order));
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::BoundingBox;

    #[test]
    fn test_add_images_dedupes() {
        let mut section = TextSection::new(0, "INTRODUCTION TO SAFETY", Some(1));
        let page_images = vec!["page_1_img_1.png".to_string()];
        section.add_images(&page_images);
        section.add_images(&page_images);
        assert_eq!(section.images.len(), 1);
    }

    #[test]
    fn test_push_numbers_blocks() {
        let mut section = BlockSection::new(0, "1. Basics", 1, Some(1));
        section.push(Block::text("a", BoundingBox::default()));
        section.push(Block::text("b", BoundingBox::default()));
        assert_eq!(section.blocks[0].order, 0);
        assert_eq!(section.blocks[1].order, 1);
    }

    #[test]
    fn test_text_section_without_page() {
        let section = TextSection::new(2, "Overview", None);
        let json = serde_json::to_value(&section).unwrap();
        assert!(json.get("page").is_none());
        assert_eq!(json["tables"], serde_json::json!([]));
    }
}
