use std::path::Path;

use serde::Serialize;

use crate::error::Result;
use crate::ocr::TesseractOcr;
use crate::parser::PdfReader;

use super::{ensure_dir, save_file};

/// Combined page text written into the output directory.
pub const COMBINED_TEXT_FILE: &str = "ocr_text.txt";

/// Native text must be longer than this (trimmed) to be preferred over OCR.
const MIN_NATIVE_CHARS: usize = 50;

/// Where a page's best text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TextSource {
    #[serde(rename = "pymupdf")]
    Native,
    #[serde(rename = "ocr")]
    Ocr,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OcrImage {
    pub filename: String,
    pub path: String,
    pub size: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OcrPage {
    pub page_num: u32,
    pub ocr_text: String,
    #[serde(rename = "pymupdf_text")]
    pub native_text: String,
    pub best_text: String,
    pub images: Vec<OcrImage>,
    pub has_native_text: bool,
    pub text_source: TextSource,
}

impl OcrPage {
    fn new(page_num: u32, native_text: String, ocr_text: String, images: Vec<OcrImage>) -> Self {
        let has_native_text = native_text.trim().chars().count() > MIN_NATIVE_CHARS;
        let (best_text, text_source) = if has_native_text {
            (native_text.clone(), TextSource::Native)
        } else {
            (ocr_text.clone(), TextSource::Ocr)
        };
        Self {
            page_num,
            ocr_text,
            native_text,
            best_text,
            images,
            has_native_text,
            text_source,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct OcrReport {
    pub pages: Vec<OcrPage>,
    pub total_pages: usize,
    pub ocr_enabled: bool,
    pub combined_text_path: String,
    pub combined_text_length: usize,
}

/// Every page's best text, each under a `=== PAGE n ===` banner.
fn combined_text(pages: &[OcrPage]) -> String {
    pages
        .iter()
        .map(|p| format!("\n\n=== PAGE {} ===\n\n{}", p.page_num, p.best_text))
        .collect()
}

/// Extract native text and OCR text for every page, save page images and
/// write the best text of all pages to `ocr_text.txt`.
///
/// OCR is skipped (empty `ocr_text`) when pdftoppm or tesseract is missing.
pub fn process_ocr(pdf: &Path, out_dir: &Path, ocr: &TesseractOcr) -> Result<OcrReport> {
    ensure_dir(out_dir)?;
    let reader = PdfReader::open(pdf)?;
    let ocr_enabled = ocr.is_available();
    if !ocr_enabled {
        log::warn!("OCR unavailable, using native text only");
    }

    let layouts = reader.page_layouts()?;
    let total = layouts.len();
    let mut pages = Vec::with_capacity(total);

    for layout in &layouts {
        let page = layout.page_number;
        log::info!("[{}/{}] Processing page {}", page, total, page);

        let ocr_text = if ocr_enabled {
            ocr.recognize_page(pdf, page).unwrap_or_else(|e| {
                log::warn!("OCR failed on page {}: {}", page, e);
                String::new()
            })
        } else {
            String::new()
        };

        let mut images = Vec::new();
        for image in reader.images_for_layout(layout)? {
            let filename = image.filename();
            match save_file(out_dir, &filename, &image.data) {
                Ok(path) => images.push(OcrImage {
                    filename,
                    path: path.display().to_string(),
                    size: image.size(),
                }),
                Err(e) => log::warn!("Could not save {}: {}", filename, e),
            }
        }

        pages.push(OcrPage::new(page, layout.text(), ocr_text, images));
    }

    let text = combined_text(&pages);
    let text_path = save_file(out_dir, COMBINED_TEXT_FILE, text.as_bytes())?;

    Ok(OcrReport {
        total_pages: pages.len(),
        pages,
        ocr_enabled,
        combined_text_path: text_path.display().to_string(),
        combined_text_length: text.chars().count(),
    })
}
