//! Sections whose headings come from a language model.

use std::path::Path;

use serde::Serialize;

use crate::ai::{classify_or_default, HeadingIdentifier, ImageClassifier, PageText};
use crate::error::{Error, Result};
use crate::model::{Block, BlockMetadata, BlockSection, ClassificationStats, HeadingEntry};
use crate::parser::{PageLayout, PdfReader, ReaderOptions};
use crate::raster::Rasterizer;
use crate::segment::ParagraphBuffer;

use super::{ensure_dir, page_items, save_file, table_block, PageItem};

/// Sections need at least this many blocks to be reported.
const MIN_SECTION_BLOCKS: usize = 3;

/// Lines of this many chars or fewer are not paragraph text.
const MIN_LINE_CHARS: usize = 3;

#[derive(Debug, Serialize)]
pub struct HeadingsReport {
    pub headings: Vec<HeadingEntry>,
    pub total_headings: usize,
    pub pages_analyzed: usize,
}

#[derive(Debug, Serialize)]
pub struct LlmSectionsReport {
    pub sections: Vec<BlockSection>,
    pub total_sections: usize,
    pub statistics: ClassificationStats,
}

/// Text of the non-empty pages among `layouts`.
fn page_texts(layouts: &[PageLayout]) -> Vec<PageText> {
    layouts
        .iter()
        .map(|l| PageText::new(l.page_number, l.text()))
        .filter(|p| !p.text.trim().is_empty())
        .collect()
}

/// The identifier's headings, or none when the request or its response
/// failed.
fn headings_or_empty(identifier: &dyn HeadingIdentifier, pages: &[PageText]) -> Vec<HeadingEntry> {
    identifier.identify_headings(pages).unwrap_or_else(|e| {
        log::error!("Heading identification failed: {}", e);
        Vec::new()
    })
}

/// Ask `identifier` for the headings of the first `max_pages` pages (all
/// pages when `None`).
pub fn identify_headings(
    pdf: &Path,
    identifier: &dyn HeadingIdentifier,
    max_pages: Option<u32>,
) -> Result<HeadingsReport> {
    let reader = PdfReader::open_with_options(pdf, ReaderOptions::new().with_max_pages(max_pages))?;
    let pages = page_texts(&reader.page_layouts()?);
    if pages.is_empty() {
        return Err(Error::NoTextExtracted);
    }

    log::info!("Identifying headings in {} pages", pages.len());
    let headings = headings_or_empty(identifier, &pages);
    if headings.is_empty() {
        return Err(Error::NoHeadings);
    }

    Ok(HeadingsReport {
        total_headings: headings.len(),
        pages_analyzed: pages.len(),
        headings,
    })
}

/// Inclusive page range of each heading: from its start page up to the page
/// before the next heading starts, and the last heading to the final page.
/// A heading sharing its start page with the next one still gets that page.
fn page_ranges(headings: &[HeadingEntry], last_page: u32) -> Vec<(u32, u32)> {
    let starts: Vec<u32> = headings
        .iter()
        .map(|h| h.start_page.clamp(1, last_page))
        .collect();

    starts
        .iter()
        .enumerate()
        .map(|(k, &start)| {
            let end = match starts.get(k + 1) {
                Some(&next) => start.max(next.saturating_sub(1)),
                None => last_page.max(start),
            };
            (start, end)
        })
        .collect()
}

/// Identify headings with `identifier`, then build one section per heading
/// from the pages it covers: paragraphs of text, important images (judged
/// by `classifier` with the heading as context) and rendered tables.
pub fn process_llm_sections(
    pdf: &Path,
    out_dir: &Path,
    identifier: &dyn HeadingIdentifier,
    classifier: &dyn ImageClassifier,
) -> Result<LlmSectionsReport> {
    ensure_dir(out_dir)?;
    let reader = PdfReader::open_with_options(pdf, ReaderOptions::new().with_tables(true))?;
    let layouts = reader.page_layouts()?;

    let pages = page_texts(&layouts);
    if pages.is_empty() {
        return Err(Error::NoTextExtracted);
    }
    let headings = headings_or_empty(identifier, &pages);
    if headings.is_empty() {
        return Err(Error::HeadingIdentification);
    }
    log::info!("Identified {} headings", headings.len());

    let last_page = layouts.last().map(|l| l.page_number).unwrap_or(1);
    let rasterizer = Rasterizer::new();
    let mut stats = ClassificationStats::new();
    let mut sections = Vec::new();

    for (k, (heading, (start, end))) in headings
        .iter()
        .zip(page_ranges(&headings, last_page))
        .enumerate()
    {
        log::info!("[{}/{}] {} (pages {}-{})", k + 1, headings.len(), heading.heading, start, end);

        let mut section = BlockSection::new(k, &heading.heading, start, Some(heading.level));
        let mut paragraph = ParagraphBuffer::new();
        let title = heading.heading.trim();

        for layout in layouts
            .iter()
            .filter(|l| (start..=end).contains(&l.page_number))
        {
            let page = layout.page_number;
            stats.add_found(reader.listed_image_count(page)?);
            let images = reader.images_for_layout(layout)?;

            for (bbox, item) in page_items(layout, images) {
                match item {
                    PageItem::Line(line) => {
                        let text = line.text();
                        let text = text.trim();
                        if text.chars().count() > MIN_LINE_CHARS && text != title {
                            paragraph.push(text, bbox);
                        }
                    }
                    PageItem::Image(image) => {
                        let classification =
                            classify_or_default(classifier, &image.data, image.format, &heading.heading);
                        if !classification.is_important {
                            stats.add_decorative();
                            continue;
                        }

                        let filename = image.filename();
                        if let Err(e) = save_file(out_dir, &filename, &image.data) {
                            log::warn!("Could not save {}: {}", filename, e);
                            continue;
                        }
                        stats.add_saved_important();

                        push_paragraph(&mut section, &mut paragraph);
                        let metadata = BlockMetadata::image(image.format.extension(), image.size())
                            .with_classification(&classification);
                        section.push(Block::image(filename, bbox, metadata));
                    }
                    PageItem::Table(table, index) => {
                        stats.add_table();
                        push_paragraph(&mut section, &mut paragraph);
                        section.push(table_block(&rasterizer, pdf, out_dir, page, index, table, bbox));
                    }
                }
            }
        }
        push_paragraph(&mut section, &mut paragraph);

        if section.block_count() >= MIN_SECTION_BLOCKS {
            sections.push(section);
        } else {
            log::debug!("Skipping '{}': too few blocks", heading.heading);
        }
    }

    stats.log_summary();
    Ok(LlmSectionsReport {
        total_sections: sections.len(),
        sections,
        statistics: stats,
    })
}

fn push_paragraph(section: &mut BlockSection, paragraph: &mut ParagraphBuffer) {
    if let Some(block) = paragraph.flush() {
        section.push(block);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn heading(page: u32) -> HeadingEntry {
        HeadingEntry::new("Heading", 1, page)
    }

    #[test]
    fn test_page_ranges() {
        let headings = [heading(1), heading(3), heading(3), heading(6)];
        assert_eq!(
            page_ranges(&headings, 8),
            vec![(1, 2), (3, 3), (3, 5), (6, 8)]
        );
    }

    #[test]
    fn test_page_ranges_clamped() {
        let headings = [heading(0), heading(12)];
        assert_eq!(page_ranges(&headings, 4), vec![(1, 3), (4, 4)]);
    }
}
