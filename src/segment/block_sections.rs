//! Block sectioning: headings open sections made of text, image and table
//! blocks, fed in reading order.

use crate::model::{Block, BlockSection, BoundingBox};

use super::headings::{is_metadata, HeadingRules};

/// How consecutive text lines become blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Assembly {
    /// Every line is its own block
    #[default]
    PerLine,
    /// Lines between two non-text blocks are merged into one paragraph
    Paragraphs,
}

/// Block sectioning settings.
#[derive(Debug, Clone)]
pub struct BlockOptions {
    pub assembly: Assembly,
    /// Pages (counted from the first) that may hold front matter
    pub front_matter_pages: u32,
    /// A closed section is kept when it has more blocks than this
    pub min_section_blocks: usize,
    /// Final filter: sections need at least this many blocks
    pub min_output_blocks: usize,
    /// Text lines of this many chars or fewer are ignored
    pub min_line_chars: usize,
}

impl Default for BlockOptions {
    fn default() -> Self {
        Self {
            assembly: Assembly::PerLine,
            front_matter_pages: 3,
            min_section_blocks: 3,
            min_output_blocks: 5,
            min_line_chars: 3,
        }
    }
}

impl BlockOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_assembly(mut self, assembly: Assembly) -> Self {
        self.assembly = assembly;
        self
    }

    /// Merge lines into paragraphs.
    pub fn paragraphs(self) -> Self {
        self.with_assembly(Assembly::Paragraphs)
    }

    pub fn with_front_matter_pages(mut self, pages: u32) -> Self {
        self.front_matter_pages = pages;
        self
    }

    pub fn with_min_output_blocks(mut self, blocks: usize) -> Self {
        self.min_output_blocks = blocks;
        self
    }
}

/// Collects consecutive text lines into one paragraph block.
#[derive(Debug, Default)]
pub struct ParagraphBuffer {
    lines: Vec<String>,
    bbox: Option<BoundingBox>,
}

impl ParagraphBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, text: &str, bbox: BoundingBox) {
        self.lines.push(text.to_string());
        self.bbox = Some(match self.bbox {
            Some(b) => b.union(&bbox),
            None => bbox,
        });
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Take the buffered lines as one text block joined by spaces.
    pub fn flush(&mut self) -> Option<Block> {
        if self.lines.is_empty() {
            return None;
        }
        let text = std::mem::take(&mut self.lines).join(" ");
        let bbox = self.bbox.take().unwrap_or_default();
        Some(Block::text(text, bbox))
    }
}

/// Builds [`BlockSection`]s from items fed in reading order.
///
/// Call [`begin_page`](Self::begin_page) before each page's items.
#[derive(Debug)]
pub struct BlockSectionBuilder {
    rules: HeadingRules,
    options: BlockOptions,
    sections: Vec<BlockSection>,
    current: Option<BlockSection>,
    paragraph: ParagraphBuffer,
    in_metadata: bool,
    page: u32,
}

impl BlockSectionBuilder {
    pub fn new(rules: HeadingRules, options: BlockOptions) -> Self {
        Self {
            rules,
            options,
            sections: Vec::new(),
            current: None,
            paragraph: ParagraphBuffer::new(),
            in_metadata: true,
            page: 1,
        }
    }

    /// Start a page (1-based).
    pub fn begin_page(&mut self, page: u32) {
        self.page = page;
        if page.saturating_sub(1) >= self.options.front_matter_pages {
            self.in_metadata = false;
        }
    }

    /// Heading of the open section, if any.
    pub fn current_heading(&self) -> Option<&str> {
        self.current.as_ref().map(|s| s.heading.as_str())
    }

    /// Feed one text line.
    pub fn push_line(&mut self, text: &str, bbox: BoundingBox) {
        let text = text.trim();
        if self.in_metadata && is_metadata(text) {
            return;
        }

        if self.rules.is_heading(text) {
            self.in_metadata = false;
            let level = self.rules.heading_level(text);
            if level == 1 || self.current.is_none() {
                self.close();
                self.current = Some(BlockSection::new(
                    self.sections.len(),
                    text,
                    self.page,
                    Some(level),
                ));
            } else {
                log::debug!("Dropping sub-heading inside section: {}", text);
            }
            return;
        }

        if text.chars().count() <= self.options.min_line_chars || self.in_metadata {
            return;
        }
        let Some(section) = self.current.as_mut() else {
            return;
        };
        match self.options.assembly {
            Assembly::PerLine => section.push(Block::text(text, bbox)),
            Assembly::Paragraphs => self.paragraph.push(text, bbox),
        }
    }

    /// Feed an image or table block. Dropped when no section is open.
    pub fn push_block(&mut self, block: Block) -> bool {
        if self.current.is_none() {
            return false;
        }
        self.flush_paragraph();
        if let Some(section) = self.current.as_mut() {
            section.push(block);
        }
        true
    }

    fn flush_paragraph(&mut self) {
        if let Some(block) = self.paragraph.flush() {
            if let Some(section) = self.current.as_mut() {
                section.push(block);
            }
        }
    }

    fn close(&mut self) {
        self.flush_paragraph();
        if let Some(mut section) = self.current.take() {
            if section.block_count() > self.options.min_section_blocks {
                section.order = self.sections.len();
                self.sections.push(section);
            } else {
                log::debug!(
                    "Dropping section '{}' with {} blocks",
                    section.heading,
                    section.block_count()
                );
            }
        }
    }

    /// Close the last section and apply the final block-count filter.
    pub fn finish(mut self) -> Vec<BlockSection> {
        self.close();
        let min = self.options.min_output_blocks;
        self.sections
            .into_iter()
            .filter(|s| s.block_count() >= min)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BlockKind, BlockMetadata};

    fn bbox(y: f32) -> BoundingBox {
        BoundingBox::new(72.0, y, 200.0, 12.0)
    }

    fn feed_body(builder: &mut BlockSectionBuilder, lines: usize) {
        for i in 0..lines {
            builder.push_line(&format!("Body line number {}", i), bbox(100.0 + i as f32 * 14.0));
        }
    }

    #[test]
    fn test_per_line_sections() {
        let mut builder = BlockSectionBuilder::new(HeadingRules::strict(), BlockOptions::default());
        builder.begin_page(4);
        builder.push_line("1 Introduction", bbox(50.0));
        feed_body(&mut builder, 5);
        builder.push_line("2 Next Steps", bbox(300.0));
        feed_body(&mut builder, 5);

        let sections = builder.finish();
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].heading, "1 Introduction");
        assert_eq!(sections[0].level, Some(1));
        assert_eq!(sections[0].page, 4);
        assert_eq!(sections[0].blocks.len(), 5);
        assert_eq!(sections[0].blocks[4].order, 4);
        assert_eq!(sections[1].order, 1);
    }

    #[test]
    fn test_front_matter_skipped() {
        let mut builder = BlockSectionBuilder::new(HeadingRules::strict(), BlockOptions::default());
        builder.begin_page(1);
        builder.push_line("Key Learning Outcomes", bbox(50.0));
        feed_body(&mut builder, 5);
        assert!(builder.current_heading().is_none());

        builder.push_line("1 Introduction", bbox(200.0));
        feed_body(&mut builder, 5);
        let sections = builder.finish();
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].blocks.len(), 5);
    }

    #[test]
    fn test_subheading_inside_section_dropped() {
        let mut builder = BlockSectionBuilder::new(HeadingRules::strict(), BlockOptions::default());
        builder.begin_page(5);
        builder.push_line("1 Introduction", bbox(50.0));
        feed_body(&mut builder, 3);
        builder.push_line("1.1 Details Here", bbox(150.0));
        feed_body(&mut builder, 3);

        let sections = builder.finish();
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].blocks.len(), 6);
        assert!(sections[0].blocks.iter().all(|b| b.content != "1.1 Details Here"));
    }

    #[test]
    fn test_paragraphs_flush_around_images() {
        let options = BlockOptions::default().paragraphs();
        let mut builder = BlockSectionBuilder::new(HeadingRules::strict(), options);
        builder.begin_page(4);
        builder.push_line("1 Introduction", bbox(50.0));
        for round in 0..3 {
            feed_body(&mut builder, 2);
            let image = Block::image(
                format!("page_4_img_{}.png", round + 1),
                bbox(400.0),
                BlockMetadata::image("png", 6000),
            );
            assert!(builder.push_block(image));
        }
        // trailing paragraph is flushed at close
        feed_body(&mut builder, 2);

        let sections = builder.finish();
        assert_eq!(sections.len(), 1);
        let kinds: Vec<BlockKind> = sections[0].blocks.iter().map(|b| b.kind).collect();
        assert_eq!(
            kinds,
            vec![
                BlockKind::Text,
                BlockKind::Image,
                BlockKind::Text,
                BlockKind::Image,
                BlockKind::Text,
                BlockKind::Image,
                BlockKind::Text,
            ]
        );
        assert_eq!(sections[0].blocks[0].content, "Body line number 0 Body line number 1");
        assert_eq!(sections[0].blocks[0].bbox, BoundingBox::new(72.0, 100.0, 200.0, 26.0));
    }

    #[test]
    fn test_block_without_section_is_dropped() {
        let mut builder = BlockSectionBuilder::new(HeadingRules::strict(), BlockOptions::default());
        builder.begin_page(4);
        let table = Block::table("a | b", bbox(10.0), 2, 2);
        assert!(!builder.push_block(table));
    }

    #[test]
    fn test_small_sections_filtered() {
        let mut builder = BlockSectionBuilder::new(HeadingRules::strict(), BlockOptions::default());
        builder.begin_page(4);
        builder.push_line("1 Introduction", bbox(50.0));
        feed_body(&mut builder, 4);
        builder.push_line("2 Second Part", bbox(300.0));
        feed_body(&mut builder, 3);

        // 4 blocks survives the close check but not the final filter;
        // 3 blocks fails the close check
        assert!(builder.finish().is_empty());
    }

    #[test]
    fn test_paragraph_buffer() {
        let mut buffer = ParagraphBuffer::new();
        assert!(buffer.flush().is_none());
        buffer.push("one", bbox(10.0));
        buffer.push("two", bbox(24.0));
        assert!(!buffer.is_empty());
        let block = buffer.flush().unwrap();
        assert_eq!(block.content, "one two");
        assert!(buffer.is_empty());
    }
}
