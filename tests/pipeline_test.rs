//! Integration tests for the command pipelines, with canned models.

mod common;

use std::cell::RefCell;

use common::{manual, PageSpec, PdfBuilder};
use pdfblocks::ocr::{OcrOptions, TesseractOcr};
use pdfblocks::pipeline::{self, TextSource, COMBINED_TEXT_FILE};
use pdfblocks::render::{success_json, JsonFormat};
use pdfblocks::{
    BlockKind, Error, HeadingEntry, HeadingIdentifier, ImageClassification, ImageClassifier,
    ImageFormat, PageText, Result,
};

/// Keeps JPEGs, rejects everything else, and records the contexts it saw.
#[derive(Default)]
struct JpegOnly {
    contexts: RefCell<Vec<String>>,
}

impl ImageClassifier for JpegOnly {
    fn is_important(&self, _image: &[u8], format: ImageFormat) -> Result<bool> {
        Ok(format == ImageFormat::Jpeg)
    }

    fn classify(&self, _image: &[u8], format: ImageFormat, context: &str) -> Result<ImageClassification> {
        self.contexts.borrow_mut().push(context.to_string());
        Ok(ImageClassification {
            is_important: format == ImageFormat::Jpeg,
            image_type: "diagram".to_string(),
            description: "Wiring diagram".to_string(),
            relevance_score: 7,
            tags: vec!["wiring".to_string()],
        })
    }
}

struct KeepAll;

impl ImageClassifier for KeepAll {
    fn is_important(&self, _image: &[u8], _format: ImageFormat) -> Result<bool> {
        Ok(true)
    }

    fn classify(&self, _image: &[u8], _format: ImageFormat, _context: &str) -> Result<ImageClassification> {
        Ok(ImageClassification::fallback("kept"))
    }
}

struct RejectAll;

impl ImageClassifier for RejectAll {
    fn is_important(&self, _image: &[u8], _format: ImageFormat) -> Result<bool> {
        Ok(false)
    }

    fn classify(&self, _image: &[u8], _format: ImageFormat, _context: &str) -> Result<ImageClassification> {
        Err(Error::ModelResponse("no".to_string()))
    }
}

/// Returns fixed headings and records how many pages it was shown.
struct FixedHeadings {
    headings: Vec<HeadingEntry>,
    pages_seen: RefCell<Vec<u32>>,
}

impl FixedHeadings {
    fn new(headings: Vec<HeadingEntry>) -> Self {
        Self {
            headings,
            pages_seen: RefCell::new(Vec::new()),
        }
    }

    fn manual() -> Self {
        Self::new(vec![
            HeadingEntry::new("1 Introduction", 1, 1),
            HeadingEntry::new("2 Wiring Basics", 1, 2),
        ])
    }
}

impl HeadingIdentifier for FixedHeadings {
    fn identify_headings(&self, pages: &[PageText]) -> Result<Vec<HeadingEntry>> {
        *self.pages_seen.borrow_mut() = pages.iter().map(|p| p.page).collect();
        Ok(self.headings.clone())
    }
}

/// Fails like a model answering with prose instead of JSON.
struct Unparseable;

impl HeadingIdentifier for Unparseable {
    fn identify_headings(&self, _pages: &[PageText]) -> Result<Vec<HeadingEntry>> {
        Err(Error::ModelResponse("I could not find any headings.".to_string()))
    }
}

#[test]
fn test_sections_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = manual().write(dir.path(), "manual.pdf");
    let out = dir.path().join("out");

    let report = pipeline::process_sections(&pdf, &out).unwrap();
    assert_eq!(report.total_sections, 2);
    assert_eq!(report.sections[0].heading, "1 Introduction");
    assert_eq!(report.sections[0].page, Some(1));
    assert_eq!(
        report.sections[0].images,
        vec!["page_1_img_1.jpeg".to_string(), "page_1_img_2.png".to_string()]
    );
    assert!(report.sections[0].content.contains("explains how the wiring"));
    assert_eq!(report.sections[1].heading, "2 Wiring Basics");
    assert!(report.sections[1].images.is_empty());

    assert!(out.join("page_1_img_1.jpeg").exists());
    assert!(out.join("page_1_img_2.png").exists());
}

#[test]
fn test_images_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = manual().write(dir.path(), "manual.pdf");

    let report = pipeline::extract_images(&pdf, dir.path()).unwrap();
    assert_eq!(report.total_images, 2);
    assert_eq!(report.images[0].page, 1);
    assert_eq!(report.images[0].filename, "page_1_img_1.jpeg");
    assert_eq!(report.images[1].index, 2);

    assert_eq!(report.pages.len(), 2);
    assert_eq!(report.pages[0].images, 2);
    assert_eq!(report.pages[1].images, 0);
    assert!(report.pages[0].text_preview.starts_with("1 Introduction"));
    assert!(report.pages[0].text_preview.chars().count() <= 200);

    let saved = std::fs::read(dir.path().join("page_1_img_1.jpeg")).unwrap();
    assert_eq!(saved, common::fake_jpeg(6000));
}

#[test]
fn test_blocks_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = manual().write(dir.path(), "manual.pdf");
    let out = dir.path().join("blocks");

    let report = pipeline::process_blocks(&pdf, &out).unwrap();
    assert_eq!(report.total_sections, 2);

    let first = &report.sections[0];
    assert_eq!(first.heading, "1 Introduction");
    assert_eq!(first.blocks.len(), 7);
    assert!(first.blocks[..6].iter().all(|b| b.kind == BlockKind::Text));
    assert_eq!(first.blocks[0].content, common::body_line(1));

    let image = &first.blocks[6];
    assert_eq!(image.kind, BlockKind::Image);
    assert_eq!(image.content, "page_1_img_1.jpeg");
    assert_eq!(image.order, 6);
    let metadata = image.metadata.as_ref().unwrap();
    assert_eq!(metadata.format.as_deref(), Some("jpeg"));
    assert_eq!(metadata.size_bytes, Some(6000));
    assert!(!metadata.is_table);

    // the 2x2 image is below the size threshold
    assert!(out.join("page_1_img_1.jpeg").exists());
    assert!(!out.join("page_1_img_2.png").exists());

    assert_eq!(report.sections[1].blocks.len(), 6);
    assert_eq!(report.sections[1].order, 1);
}

#[test]
fn test_blocks_with_table() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = PdfBuilder::new()
        .page(
            PageSpec::new()
                .text(72.0, 720.0, "1 Tools")
                .body(72.0, 700.0, 4)
                .text(72.0, 600.0, "Tool")
                .text(200.0, 600.0, "Rating")
                .text(72.0, 580.0, "Pliers")
                .text(200.0, 580.0, "600V")
                .text(72.0, 560.0, "Tester")
                .text(200.0, 560.0, "250V"),
        )
        .write(dir.path(), "tools.pdf");

    let report = pipeline::process_blocks(&pdf, dir.path()).unwrap();
    assert_eq!(report.total_sections, 1);

    // heading and body share the table's left edge but stay text
    assert_eq!(report.sections[0].heading, "1 Tools");
    let blocks = &report.sections[0].blocks;
    assert_eq!(blocks.len(), 5);
    assert_eq!(blocks[0].content, common::body_line(1));
    let table = &blocks[4];
    assert_eq!(table.kind, BlockKind::Table);
    let metadata = table.metadata.as_ref().unwrap();
    assert!(metadata.is_table);
    assert_eq!(metadata.rows, Some(3));
    assert_eq!(metadata.cols, Some(2));
    // rendered crop when pdftoppm is installed, cell text otherwise
    assert!(table.content == "page_1_table_1.png" || table.content.starts_with("Tool | Rating"));
}

fn interleaved() -> PdfBuilder {
    PdfBuilder::new().page(
        PageSpec::new()
            .text(72.0, 720.0, "1 Introduction")
            .body(72.0, 700.0, 2)
            .jpeg("Im1", 1000, (72.0, 560.0, 100.0, 80.0))
            .body(72.0, 540.0, 2)
            .rgb("Im2", (72.0, 420.0, 50.0, 50.0))
            .body(72.0, 400.0, 2)
            .jpeg("Im3", 2000, (72.0, 260.0, 100.0, 80.0))
            .body(72.0, 240.0, 2),
    )
}

#[test]
fn test_ai_blocks_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = interleaved().write(dir.path(), "interleaved.pdf");
    let classifier = JpegOnly::default();

    let report = pipeline::process_blocks_with_ai(&pdf, dir.path(), &classifier).unwrap();
    assert_eq!(report.total_sections, 1);

    let kinds: Vec<BlockKind> = report.sections[0].blocks.iter().map(|b| b.kind).collect();
    assert_eq!(
        kinds,
        vec![
            BlockKind::Text,
            BlockKind::Image,
            BlockKind::Text,
            BlockKind::Image,
            BlockKind::Text
        ]
    );

    // the rejected image does not split the paragraph around it
    let middle = &report.sections[0].blocks[2].content;
    assert!(middle.contains(&common::body_line(1)));
    assert_eq!(middle.matches("Body text line").count(), 4);

    let image = report.sections[0].blocks[1].metadata.as_ref().unwrap();
    assert_eq!(image.ai_classified, Some(true));
    assert_eq!(image.image_type.as_deref(), Some("diagram"));
    assert_eq!(image.relevance_score, Some(7));

    let stats = &report.statistics;
    assert_eq!(stats.total_images_found, 3);
    assert_eq!(stats.images_classified_important, 2);
    assert_eq!(stats.images_classified_decorative, 1);
    assert_eq!(stats.images_saved, 2);
    assert_eq!(stats.total_tables, 0);

    // the heading opens on the same page as the images
    assert_eq!(*classifier.contexts.borrow(), vec![""; 3]);
    assert!(!dir.path().join("page_1_img_2.png").exists());
}

#[test]
fn test_ai_blocks_context_is_heading_open_at_page_start() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = PdfBuilder::new()
        .page(
            PageSpec::new()
                .text(72.0, 720.0, "1 Introduction")
                .body(72.0, 700.0, 5),
        )
        .page(
            PageSpec::new()
                .jpeg("Im1", 1000, (72.0, 600.0, 100.0, 80.0))
                .text(72.0, 500.0, "2 Wiring Basics")
                .jpeg("Im2", 1000, (72.0, 300.0, 100.0, 80.0)),
        )
        .write(dir.path(), "contexts.pdf");
    let classifier = JpegOnly::default();

    let report = pipeline::process_blocks_with_ai(&pdf, dir.path(), &classifier).unwrap();
    assert_eq!(report.statistics.total_images_found, 2);
    assert_eq!(
        *classifier.contexts.borrow(),
        vec!["1 Introduction".to_string(), "1 Introduction".to_string()]
    );
}

#[test]
fn test_filter_by_size() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = manual().write(dir.path(), "manual.pdf");

    let report = pipeline::filter_images(&pdf, dir.path(), None).unwrap();
    assert!(!report.ai_filtering_used);
    assert_eq!(report.total_images_found, 2);
    assert_eq!(report.images_classified_important, 0);
    assert_eq!(report.images_classified_skip, 0);
    assert_eq!(report.images_saved, 1);
    assert!(dir.path().join("page_1_img_1.jpeg").exists());
    assert!(!dir.path().join("page_1_img_2.png").exists());
}

#[test]
fn test_filter_counts_undecodable_images() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = PdfBuilder::new()
        .page(
            PageSpec::new()
                .text(72.0, 720.0, "1 Introduction")
                .fax("Im1", (72.0, 500.0, 100.0, 100.0))
                .jpeg("Im2", 6000, (72.0, 300.0, 100.0, 100.0)),
        )
        .write(dir.path(), "fax.pdf");

    let report = pipeline::filter_images(&pdf, dir.path(), Some(&KeepAll)).unwrap();
    assert_eq!(report.total_images_found, 2);
    assert_eq!(report.images_classified_important, 1);
    assert_eq!(report.images_saved, 1);
    assert!(dir.path().join("page_1_img_2.jpeg").exists());
}

#[test]
fn test_filter_with_classifier() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = manual().write(dir.path(), "manual.pdf");

    let report = pipeline::filter_images(&pdf, dir.path(), Some(&RejectAll)).unwrap();
    assert!(report.ai_filtering_used);
    assert_eq!(report.images_classified_skip, 2);
    assert_eq!(report.images_saved, 0);

    let report = pipeline::filter_images(&pdf, dir.path(), Some(&KeepAll)).unwrap();
    assert_eq!(report.images_classified_important, 2);
    assert_eq!(report.images_classified_skip, 0);
    assert_eq!(report.images_saved, 2);
}

#[test]
fn test_identify_headings() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = manual().write(dir.path(), "manual.pdf");

    let identifier = FixedHeadings::manual();
    let report = pipeline::identify_headings(&pdf, &identifier, Some(1)).unwrap();
    assert_eq!(report.total_headings, 2);
    assert_eq!(report.pages_analyzed, 1);
    assert_eq!(*identifier.pages_seen.borrow(), vec![1]);

    let identifier = FixedHeadings::new(Vec::new());
    assert!(matches!(
        pipeline::identify_headings(&pdf, &identifier, None),
        Err(Error::NoHeadings)
    ));
}

#[test]
fn test_failed_identification_reports_missing_headings() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = manual().write(dir.path(), "manual.pdf");

    let err = pipeline::identify_headings(&pdf, &Unparseable, None).unwrap_err();
    assert!(matches!(err, Error::NoHeadings));
    assert_eq!(err.to_string(), "No headings identified");

    let err = pipeline::process_llm_sections(&pdf, dir.path(), &Unparseable, &KeepAll).unwrap_err();
    assert!(matches!(err, Error::HeadingIdentification));
    assert_eq!(err.to_string(), "Failed to identify headings");
}

#[test]
fn test_identify_headings_without_text() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = PdfBuilder::new()
        .page(PageSpec::new().rgb("Im1", (0.0, 0.0, 10.0, 10.0)))
        .write(dir.path(), "scan.pdf");

    let result = pipeline::identify_headings(&pdf, &FixedHeadings::manual(), None);
    assert!(matches!(result, Err(Error::NoTextExtracted)));
}

#[test]
fn test_llm_sections_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = manual().write(dir.path(), "manual.pdf");

    let report =
        pipeline::process_llm_sections(&pdf, dir.path(), &FixedHeadings::manual(), &KeepAll).unwrap();

    // the second section has a single paragraph and is dropped
    assert_eq!(report.total_sections, 1);
    let section = &report.sections[0];
    assert_eq!(section.order, 0);
    assert_eq!(section.level, Some(1));
    assert_eq!(section.page, 1);
    assert_eq!(section.blocks.len(), 3);
    assert_eq!(section.blocks[0].kind, BlockKind::Text);
    assert!(!section.blocks[0].content.contains("1 Introduction"));
    assert_eq!(section.blocks[1].content, "page_1_img_1.jpeg");
    assert_eq!(section.blocks[2].content, "page_1_img_2.png");

    assert_eq!(report.statistics.total_images_found, 2);
    assert_eq!(report.statistics.images_saved, 2);
}

#[test]
fn test_llm_sections_without_headings() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = manual().write(dir.path(), "manual.pdf");

    let result =
        pipeline::process_llm_sections(&pdf, dir.path(), &FixedHeadings::new(Vec::new()), &KeepAll);
    let err = result.unwrap_err();
    assert!(matches!(err, Error::HeadingIdentification));
    assert_eq!(err.to_string(), "Failed to identify headings");
}

#[test]
fn test_ocr_pipeline_native_text() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = manual().write(dir.path(), "manual.pdf");
    let out = dir.path().join("ocr");

    let ocr = TesseractOcr::new(OcrOptions::default());
    let report = pipeline::process_ocr(&pdf, &out, &ocr).unwrap();
    assert_eq!(report.total_pages, 2);

    let page = &report.pages[0];
    assert_eq!(page.page_num, 1);
    assert!(page.has_native_text);
    assert_eq!(page.text_source, TextSource::Native);
    assert_eq!(page.best_text, page.native_text);
    assert_eq!(page.images.len(), 2);
    assert_eq!(page.images[0].size, 6000);

    let combined = std::fs::read_to_string(out.join(COMBINED_TEXT_FILE)).unwrap();
    assert!(combined.starts_with("\n\n=== PAGE 1 ===\n\n1 Introduction"));
    assert!(combined.contains("=== PAGE 2 ==="));
    assert_eq!(report.combined_text_length, combined.chars().count());
}

#[test]
fn test_report_envelope() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = manual().write(dir.path(), "manual.pdf");

    let report = pipeline::extract_images(&pdf, dir.path()).unwrap();
    let json = success_json(&report, JsonFormat::Compact).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["success"], true);
    assert_eq!(value["total_images"], 2);
    assert_eq!(value["images"][0]["filename"], "page_1_img_1.jpeg");
}

#[test]
fn test_missing_pdf_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = pipeline::process_blocks(&dir.path().join("missing.pdf"), dir.path());
    assert!(matches!(result, Err(Error::Io(_))));
}
