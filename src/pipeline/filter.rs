use std::path::Path;

use serde::Serialize;

use crate::ai::{is_important_or_default, ImageClassifier};
use crate::error::Result;
use crate::parser::PdfReader;

use super::{ensure_dir, save_file, MIN_IMAGE_BYTES};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterReport {
    pub total_images_found: usize,
    pub images_classified_important: usize,
    pub images_classified_skip: usize,
    pub images_saved: usize,
    pub ai_filtering_used: bool,
}

/// Save the images worth keeping.
///
/// With a classifier every image gets a yes/no verdict; without one, images
/// of at least 5000 bytes are kept.
pub fn filter_images(
    pdf: &Path,
    out_dir: &Path,
    classifier: Option<&dyn ImageClassifier>,
) -> Result<FilterReport> {
    ensure_dir(out_dir)?;
    let reader = PdfReader::open(pdf)?;
    let mut report = FilterReport {
        ai_filtering_used: classifier.is_some(),
        ..Default::default()
    };

    for layout in reader.page_layouts()? {
        report.total_images_found += reader.listed_image_count(layout.page_number)?;
        let images = reader.images_for_layout(&layout)?;

        for image in images {
            let keep = match classifier {
                Some(classifier) => {
                    log::info!("Classifying image {}", image.filename());
                    let important = is_important_or_default(classifier, &image.data, image.format);
                    if important {
                        report.images_classified_important += 1;
                    } else {
                        report.images_classified_skip += 1;
                    }
                    important
                }
                // verdict counters stay at zero without a classifier
                None => image.size() >= MIN_IMAGE_BYTES,
            };
            if !keep {
                continue;
            }

            let filename = image.filename();
            match save_file(out_dir, &filename, &image.data) {
                Ok(_) => report.images_saved += 1,
                Err(e) => log::warn!("Could not save {}: {}", filename, e),
            }
        }
    }

    log::info!(
        "Saved {} of {} images",
        report.images_saved,
        report.total_images_found
    );
    Ok(report)
}
