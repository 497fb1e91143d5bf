//! Command pipelines.
//!
//! Each pipeline takes a PDF (or image) path and its collaborators, writes
//! files into an output directory and returns a serializable report. The
//! CLI prints the report inside the `success` envelope.

mod blocks;
mod classify;
mod filter;
mod images;
mod llama;
mod llm;
mod ocr;
mod sections;

pub use blocks::{process_blocks, process_blocks_with_ai, AiBlocksReport, BlocksReport};
pub use classify::{
    classify_image, describe_image, find_sample_image, ClassifyReport, DescribeReport,
    SAMPLE_CONTEXT, SAMPLE_IMAGE_DIR,
};
pub use filter::{filter_images, FilterReport};
pub use images::{extract_images, ImageRecord, ImagesReport, PageImages};
pub use llama::{process_layout, process_llama, LayoutReport, LlamaReport};
pub use llm::{identify_headings, process_llm_sections, HeadingsReport, LlmSectionsReport};
pub use ocr::{process_ocr, OcrImage, OcrPage, OcrReport, TextSource, COMBINED_TEXT_FILE};
pub use sections::{process_sections, SectionsReport};

use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::model::{table_filename, Block, BoundingBox, ExtractedImage};
use crate::parser::{DetectedTable, PageLayout, TextLine};
use crate::raster::Rasterizer;

/// Reports list at most this many sections; `total_sections` has the full
/// count.
pub const MAX_REPORTED_SECTIONS: usize = 20;

/// Images smaller than this are treated as decoration when no model decides.
pub const MIN_IMAGE_BYTES: usize = 5000;

/// Table crops are rendered at this zoom (144 dpi).
const TABLE_RENDER_SCALE: f32 = 2.0;

/// Create the output directory if needed.
pub(crate) fn ensure_dir(dir: &Path) -> Result<()> {
    if !dir.exists() {
        std::fs::create_dir_all(dir)?;
    }
    Ok(())
}

/// Write `data` as `dir/filename`.
pub(crate) fn save_file(dir: &Path, filename: &str, data: &[u8]) -> Result<PathBuf> {
    let path = dir.join(filename);
    std::fs::write(&path, data)?;
    log::debug!("Saved {} ({} bytes)", path.display(), data.len());
    Ok(path)
}

/// Where an image is drawn, or a stacked guess when it is never painted
/// directly on the page.
pub(crate) fn image_bbox(image: &ExtractedImage) -> BoundingBox {
    image.bbox.unwrap_or_else(|| {
        BoundingBox::new(0.0, image.index.saturating_sub(1) as f32 * 100.0, 0.0, 0.0)
    })
}

/// First `MAX_REPORTED_SECTIONS` sections.
pub(crate) fn truncate_sections<T>(mut sections: Vec<T>) -> Vec<T> {
    sections.truncate(MAX_REPORTED_SECTIONS);
    sections
}

/// Something on a page that becomes a block, positioned top-down.
pub(crate) enum PageItem<'a> {
    Line(&'a TextLine),
    Image(ExtractedImage),
    /// Table and its 1-based index on the page
    Table(&'a DetectedTable, usize),
}

/// A page's lines, images and tables in reading order (top-down, then
/// left to right).
pub(crate) fn page_items<'a>(
    layout: &'a PageLayout,
    images: Vec<ExtractedImage>,
) -> Vec<(BoundingBox, PageItem<'a>)> {
    let mut items: Vec<(BoundingBox, PageItem<'a>)> = Vec::new();
    items.extend(layout.lines.iter().map(|l| (layout.line_bbox(l), PageItem::Line(l))));
    items.extend(images.into_iter().map(|i| (image_bbox(&i), PageItem::Image(i))));
    items.extend(
        layout
            .tables
            .iter()
            .enumerate()
            .map(|(i, t)| (layout.table_bbox(t), PageItem::Table(t, i + 1))),
    );

    // stable: equal positions keep lines before images before tables
    items.sort_by(|(a, _), (b, _)| {
        a.y.partial_cmp(&b.y)
            .unwrap_or(Ordering::Equal)
            .then(a.x.partial_cmp(&b.x).unwrap_or(Ordering::Equal))
    });
    items
}

/// Render a table to `page_{p}_table_{i}.png`; fall back to its cell text.
pub(crate) fn table_block(
    rasterizer: &Rasterizer,
    pdf: &Path,
    out_dir: &Path,
    page: u32,
    index: usize,
    table: &DetectedTable,
    bbox: BoundingBox,
) -> Block {
    let rows = table.row_count();
    let cols = table.column_count();

    let rendered = rasterizer
        .render_region(pdf, page, &bbox, TABLE_RENDER_SCALE)
        .and_then(|png| {
            let filename = table_filename(page, index);
            save_file(out_dir, &filename, &png)?;
            Ok(filename)
        });

    match rendered {
        Ok(filename) => Block::table(filename, bbox, rows, cols),
        Err(e) => {
            log::warn!("Table {} on page {} kept as text: {}", index, page, e);
            Block::table(table.text(), bbox, rows, cols)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ImageFormat;

    fn image(index: usize, bbox: Option<BoundingBox>) -> ExtractedImage {
        ExtractedImage {
            page: 1,
            index,
            name: format!("Im{}", index),
            data: vec![0; 10],
            format: ImageFormat::Png,
            width: 1,
            height: 1,
            bbox,
        }
    }

    #[test]
    fn test_image_bbox_fallback() {
        assert_eq!(image_bbox(&image(1, None)), BoundingBox::new(0.0, 0.0, 0.0, 0.0));
        assert_eq!(image_bbox(&image(3, None)).y, 200.0);
        let placed = BoundingBox::new(10.0, 20.0, 30.0, 40.0);
        assert_eq!(image_bbox(&image(3, Some(placed))), placed);
    }

    #[test]
    fn test_truncate_sections() {
        let sections: Vec<usize> = (0..25).collect();
        assert_eq!(truncate_sections(sections).len(), MAX_REPORTED_SECTIONS);
    }

    #[test]
    fn test_save_file() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested/out");
        ensure_dir(&out).unwrap();
        let path = save_file(&out, "a.bin", b"abc").unwrap();
        assert_eq!(std::fs::read(path).unwrap(), b"abc");
    }
}
