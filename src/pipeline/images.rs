use std::path::Path;

use serde::Serialize;

use crate::error::Result;
use crate::parser::PdfReader;

use super::{ensure_dir, save_file};

/// Characters of page text kept in [`PageImages::text_preview`].
const PREVIEW_CHARS: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageRecord {
    pub page: u32,
    pub filename: String,
    /// 1-based position of the image on its page
    pub index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageImages {
    pub page: u32,
    /// Images saved from this page
    pub images: usize,
    pub text_preview: String,
}

#[derive(Debug, Serialize)]
pub struct ImagesReport {
    pub total_images: usize,
    pub images: Vec<ImageRecord>,
    pub pages: Vec<PageImages>,
}

/// Save every embedded image and summarize each page.
pub fn extract_images(pdf: &Path, out_dir: &Path) -> Result<ImagesReport> {
    ensure_dir(out_dir)?;
    let reader = PdfReader::open(pdf)?;

    let mut images = Vec::new();
    let mut pages = Vec::new();

    for layout in reader.page_layouts()? {
        let page = layout.page_number;
        let mut saved = 0;

        for image in reader.images_for_layout(&layout)? {
            let filename = image.filename();
            if let Err(e) = save_file(out_dir, &filename, &image.data) {
                log::warn!("Could not save {}: {}", filename, e);
                continue;
            }
            saved += 1;
            images.push(ImageRecord {
                page,
                filename,
                index: image.index,
            });
        }

        pages.push(PageImages {
            page,
            images: saved,
            text_preview: layout.text().chars().take(PREVIEW_CHARS).collect(),
        });
    }

    log::info!("Extracted {} images from {} pages", images.len(), pages.len());
    Ok(ImagesReport {
        total_images: images.len(),
        images,
        pages,
    })
}
