//! Sectioning of parsed-service output: markdown headings and page layout
//! elements.

use serde::{Deserialize, Serialize};

use crate::ai::{LlamaItem, LlamaPage};
use crate::model::{Block, BlockKind, BoundingBox, TextSection};

use super::headings::{layout_heading, markdown_heading};

/// Heading of the single section produced when markdown has no headings.
pub const FALLBACK_HEADING: &str = "Document Content";

/// Split per-page markdown at `#`/`##` headings.
///
/// Sections never continue onto the next page; text before a page's first
/// heading is dropped. Without any heading the whole document becomes one
/// section.
pub fn markdown_sections<'a>(pages: impl IntoIterator<Item = &'a str>) -> Vec<TextSection> {
    let mut sections = Vec::new();
    let mut all_markdown = Vec::new();

    for markdown in pages {
        all_markdown.push(markdown);
        let mut current: Option<TextSection> = None;

        for line in markdown.lines() {
            if let Some(heading) = markdown_heading(line) {
                if let Some(section) = current.take() {
                    push_with_content(&mut sections, section);
                }
                current = Some(TextSection::new(sections.len(), heading, None));
            } else if let Some(section) = current.as_mut() {
                section.content.push_str(line);
                section.content.push('\n');
            }
        }

        if let Some(section) = current {
            push_with_content(&mut sections, section);
        }
    }

    if sections.is_empty() {
        let mut section = TextSection::new(0, FALLBACK_HEADING, None);
        section.content = all_markdown.join("\n");
        sections.push(section);
    }

    sections
}

/// Keep `section` only if it has text under its heading.
fn push_with_content(sections: &mut Vec<TextSection>, section: TextSection) {
    if section.content.trim().is_empty() {
        log::debug!("Dropping empty markdown section '{}'", section.heading);
        return;
    }
    sections.push(section);
}

/// A section of the layout command: a heading and its page's elements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutSection {
    pub order: usize,
    pub heading: String,
    pub page: u32,
    pub blocks: Vec<Block>,
}

/// One section per heading-looking line of each page's text, holding all of
/// that page's elements in reading order.
pub fn layout_sections(pages: &[LlamaPage]) -> Vec<LayoutSection> {
    let mut sections = Vec::new();

    for page in pages {
        let headings: Vec<&str> = page
            .text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && layout_heading(l))
            .collect();
        if headings.is_empty() {
            continue;
        }

        let blocks = page_blocks(page);
        for heading in headings {
            sections.push(LayoutSection {
                order: sections.len(),
                heading: heading.to_string(),
                page: page.page,
                blocks: blocks.clone(),
            });
        }
    }

    sections
}

/// Blocks of a page, sorted top-down then left-right.
fn page_blocks(page: &LlamaPage) -> Vec<Block> {
    let items = page.layout_items();
    if items.is_empty() {
        if page.text.trim().is_empty() {
            return Vec::new();
        }
        return vec![Block::text(page.text.trim(), BoundingBox::default())];
    }

    let mut sorted: Vec<&LlamaItem> = items.iter().collect();
    sorted.sort_by(|a, b| {
        let (a, b) = (a.bounding_box(), b.bounding_box());
        a.y.partial_cmp(&b.y)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal))
    });

    sorted
        .into_iter()
        .filter_map(item_block)
        .enumerate()
        .map(|(i, block)| block.with_order(i))
        .collect()
}

fn item_block(item: &LlamaItem) -> Option<Block> {
    let kind = item.kind.to_lowercase();
    let (kind, content) = match kind.as_str() {
        "table" => (
            BlockKind::Table,
            item.html
                .as_deref()
                .filter(|h| !h.trim().is_empty())
                .unwrap_or_else(|| item.content()),
        ),
        "figure" | "image" | "picture" => (
            BlockKind::Image,
            item.image.as_deref().unwrap_or_else(|| item.content()),
        ),
        _ => (BlockKind::Text, item.content()),
    };

    let content = content.trim();
    if content.is_empty() {
        return None;
    }

    Some(Block {
        kind,
        content: content.to_string(),
        order: 0,
        bbox: item.bounding_box(),
        metadata: None,
    })
}
