use std::path::Path;

use serde::Serialize;

use crate::ai::{classify_or_default, ImageClassifier};
use crate::error::Result;
use crate::model::{Block, BlockMetadata, BlockSection, BoundingBox, ClassificationStats, ExtractedImage};
use crate::parser::{PdfReader, ReaderOptions};
use crate::raster::Rasterizer;
use crate::segment::{BlockOptions, BlockSectionBuilder, HeadingRules};

use super::{ensure_dir, page_items, save_file, table_block, truncate_sections, PageItem, MIN_IMAGE_BYTES};

#[derive(Debug, Serialize)]
pub struct BlocksReport {
    pub sections: Vec<BlockSection>,
    pub total_sections: usize,
}

#[derive(Debug, Serialize)]
pub struct AiBlocksReport {
    pub sections: Vec<BlockSection>,
    pub total_sections: usize,
    pub statistics: ClassificationStats,
}

/// Decides which images become blocks.
enum ImagePolicy<'a> {
    /// Keep images of at least `MIN_IMAGE_BYTES`
    BySize,
    Classifier(&'a dyn ImageClassifier, ClassificationStats),
}

impl ImagePolicy<'_> {
    /// The block for `image` if it is kept, saving it to `out_dir`.
    fn image_block(
        &mut self,
        image: &ExtractedImage,
        bbox: BoundingBox,
        heading: &str,
        out_dir: &Path,
    ) -> Option<Block> {
        let metadata = BlockMetadata::image(image.format.extension(), image.size());
        let metadata = match self {
            Self::BySize => {
                if image.size() < MIN_IMAGE_BYTES {
                    log::debug!("Skipping small image {} ({} bytes)", image.filename(), image.size());
                    return None;
                }
                metadata
            }
            Self::Classifier(classifier, stats) => {
                log::info!("Classifying image {}", image.filename());
                let classification = classify_or_default(*classifier, &image.data, image.format, heading);
                if !classification.is_important {
                    stats.add_decorative();
                    return None;
                }
                stats.add_saved_important();
                metadata.with_classification(&classification)
            }
        };

        let filename = image.filename();
        if let Err(e) = save_file(out_dir, &filename, &image.data) {
            log::warn!("Could not save {}: {}", filename, e);
            return None;
        }
        Some(Block::image(filename, bbox, metadata))
    }

    /// Count every image the page lists, including undecodable ones.
    fn count_listed(&mut self, count: usize) {
        if let Self::Classifier(_, stats) = self {
            stats.add_found(count);
        }
    }

    fn count_table(&mut self) {
        if let Self::Classifier(_, stats) = self {
            stats.add_table();
        }
    }
}

/// Heading sections made of one block per text line, plus images of at
/// least 5000 bytes and rendered tables.
pub fn process_blocks(pdf: &Path, out_dir: &Path) -> Result<BlocksReport> {
    let mut policy = ImagePolicy::BySize;
    let sections = build_sections(pdf, out_dir, BlockOptions::default(), &mut policy)?;
    Ok(BlocksReport {
        total_sections: sections.len(),
        sections: truncate_sections(sections),
    })
}

/// Heading sections made of paragraphs, with every image judged by
/// `classifier` and only the important ones kept.
pub fn process_blocks_with_ai(
    pdf: &Path,
    out_dir: &Path,
    classifier: &dyn ImageClassifier,
) -> Result<AiBlocksReport> {
    let mut policy = ImagePolicy::Classifier(classifier, ClassificationStats::new());
    let sections = build_sections(pdf, out_dir, BlockOptions::new().paragraphs(), &mut policy)?;

    let statistics = match policy {
        ImagePolicy::Classifier(_, stats) => stats,
        ImagePolicy::BySize => ClassificationStats::new(),
    };
    statistics.log_summary();

    Ok(AiBlocksReport {
        total_sections: sections.len(),
        sections: truncate_sections(sections),
        statistics,
    })
}

fn build_sections(
    pdf: &Path,
    out_dir: &Path,
    options: BlockOptions,
    policy: &mut ImagePolicy<'_>,
) -> Result<Vec<BlockSection>> {
    ensure_dir(out_dir)?;
    let reader = PdfReader::open_with_options(pdf, ReaderOptions::new().with_tables(true))?;
    let rasterizer = Rasterizer::new();
    let mut builder = BlockSectionBuilder::new(HeadingRules::strict(), options);

    for layout in reader.page_layouts()? {
        let page = layout.page_number;
        log::info!("Processing page {}", page);
        builder.begin_page(page);
        // images are classified against the section open when the page starts
        let page_context = builder.current_heading().unwrap_or_default().to_string();

        policy.count_listed(reader.listed_image_count(page)?);
        let images = reader.images_for_layout(&layout)?;
        for (bbox, item) in page_items(&layout, images) {
            match item {
                PageItem::Line(line) => builder.push_line(&line.text(), bbox),
                PageItem::Image(image) => {
                    if let Some(block) = policy.image_block(&image, bbox, &page_context, out_dir) {
                        builder.push_block(block);
                    }
                }
                PageItem::Table(table, index) => {
                    policy.count_table();
                    let block = table_block(&rasterizer, pdf, out_dir, page, index, table, bbox);
                    builder.push_block(block);
                }
            }
        }
    }

    Ok(builder.finish())
}
