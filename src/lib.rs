//! # pdfblocks
//!
//! Section, block, image and table extraction from PDF documents, with
//! optional vision-model classification of the extracted images.
//!
//! Each command of the `pdfblocks` CLI is a [`pipeline`] function that reads
//! a PDF, writes images and tables into an output directory and returns a
//! serializable report.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::path::Path;
//! use pdfblocks::{pipeline, render};
//!
//! fn main() -> pdfblocks::Result<()> {
//!     let report = pipeline::process_blocks(Path::new("manual.pdf"), Path::new("out"))?;
//!     println!("{}", render::success_json(&report, render::JsonFormat::Pretty)?);
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Heading sections**: regex heading rules, language-model headings or
//!   markdown from LlamaParse
//! - **Blocks**: text, images and tables in reading order, per section
//! - **Image filtering**: size heuristics or an Azure OpenAI vision model
//! - **Tables**: detected from column alignment and rendered with pdftoppm
//! - **OCR**: tesseract fallback for scanned pages
//! - **Parallel processing**: page layouts are analysed with Rayon

pub mod ai;
pub mod error;
pub mod model;
pub mod ocr;
pub mod parser;
pub mod pipeline;
pub mod raster;
pub mod render;
pub mod segment;

// Re-export commonly used types
pub use ai::{HeadingIdentifier, ImageClassifier, PageText};
pub use error::{Error, Result};
pub use model::{
    Block, BlockKind, BlockMetadata, BlockSection, BoundingBox, ClassificationStats,
    ExtractedImage, HeadingEntry, ImageClassification, ImageFormat, TextSection,
};
pub use parser::{is_pdf, PageLayout, PdfReader, ReaderOptions};
pub use render::JsonFormat;
pub use segment::HeadingRules;

use std::path::Path;

/// Open a PDF file with default options.
///
/// # Example
///
/// ```no_run
/// let reader = pdfblocks::open("manual.pdf").unwrap();
/// println!("Pages: {}", reader.page_count());
/// ```
pub fn open<P: AsRef<Path>>(path: P) -> Result<PdfReader> {
    PdfReader::open(path)
}

/// Plain text of every page, in page order.
pub fn extract_text<P: AsRef<Path>>(path: P) -> Result<Vec<String>> {
    let reader = PdfReader::open(path)?;
    Ok(reader.page_layouts()?.iter().map(PageLayout::text).collect())
}

/// Plain text of every page of an in-memory PDF.
pub fn extract_text_from_bytes(data: &[u8]) -> Result<Vec<String>> {
    let reader = PdfReader::from_bytes(data)?;
    Ok(reader.page_layouts()?.iter().map(PageLayout::text).collect())
}

/// Regex-heading sections of a PDF's text, without saving images.
pub fn text_sections(data: &[u8]) -> Result<Vec<TextSection>> {
    let reader = PdfReader::from_bytes(data)?;
    let mut builder = segment::TextSectionBuilder::default();
    for layout in reader.page_layouts()? {
        builder.add_page(layout.page_number, &layout.text(), &[]);
    }
    Ok(builder.finish())
}
