//! PDF document reader using lopdf.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use lopdf::{Document as LopdfDocument, Object, ObjectId, Stream};
use rayon::prelude::*;

use crate::error::{Error, Result};
use crate::model::ExtractedImage;

use super::content::{ContentInterpreter, PageContent};
use super::images::{decode_image, is_image};
use super::layout::{LineAssembler, PageLayout};
use super::objects::{page_media_box, page_resources, resolve_dict, PageGeometry};
use super::options::{ErrorMode, ReaderOptions};
use super::table_detector::TableDetector;

/// PDF magic bytes: %PDF-
const PDF_MAGIC: &[u8] = b"%PDF-";

/// Check for the `%PDF-` header.
///
/// Some producers put junk before the header, so the first kilobyte is
/// searched.
pub fn is_pdf(data: &[u8]) -> bool {
    let head = &data[..data.len().min(1024)];
    head.windows(PDF_MAGIC.len()).any(|w| w == PDF_MAGIC)
}

/// Read-only access to a PDF's pages, text layout and images.
pub struct PdfReader {
    doc: LopdfDocument,
    pages: BTreeMap<u32, ObjectId>,
    options: ReaderOptions,
}

impl PdfReader {
    /// Open a PDF file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_options(path, ReaderOptions::default())
    }

    /// Open a PDF file with custom options.
    pub fn open_with_options<P: AsRef<Path>>(path: P, options: ReaderOptions) -> Result<Self> {
        let data = std::fs::read(path.as_ref())?;
        Self::from_bytes_with_options(&data, options)
    }

    /// Parse a PDF from bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::from_bytes_with_options(data, ReaderOptions::default())
    }

    /// Parse a PDF from bytes with custom options.
    pub fn from_bytes_with_options(data: &[u8], options: ReaderOptions) -> Result<Self> {
        if !is_pdf(data) {
            return Err(Error::UnknownFormat);
        }

        let doc = LopdfDocument::load_mem(data)?;
        if doc.is_encrypted() {
            log::warn!("Document is encrypted; text may be unreadable");
        }

        let pages = doc.get_pages();
        log::debug!("Loaded PDF {} with {} pages", doc.version, pages.len());

        Ok(Self {
            doc,
            pages,
            options,
        })
    }

    /// Parse a PDF from a reader.
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Self::from_bytes(&data)
    }

    pub fn options(&self) -> &ReaderOptions {
        &self.options
    }

    /// Total pages in the document, ignoring `max_pages`.
    pub fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    /// 1-based page numbers to process, honouring `max_pages`.
    pub fn page_numbers(&self) -> Vec<u32> {
        let limit = self.options.max_pages.unwrap_or(u32::MAX) as usize;
        self.pages.keys().copied().take(limit).collect()
    }

    fn page_id(&self, page: u32) -> Result<ObjectId> {
        self.pages
            .get(&page)
            .copied()
            .ok_or(Error::PageOutOfRange(page, self.page_count()))
    }

    /// Page size and origin from the MediaBox.
    pub fn page_geometry(&self, page: u32) -> Result<PageGeometry> {
        let page_id = self.page_id(page)?;
        Ok(PageGeometry::from_media_box(page_media_box(&self.doc, page_id)))
    }

    fn interpret(&self, page_id: ObjectId) -> Result<PageContent> {
        let content = self
            .doc
            .get_page_content(page_id)
            .map_err(|e| Error::TextExtract(e.to_string()))?;
        ContentInterpreter::new(&self.doc).run(&content, page_resources(&self.doc, page_id))
    }

    /// Analyse one page: spans, lines, blocks, image placements and
    /// (optionally) tables.
    ///
    /// In lenient mode an unreadable page comes back empty.
    pub fn page_layout(&self, page: u32) -> Result<PageLayout> {
        let page_id = self.page_id(page)?;
        let geometry = PageGeometry::from_media_box(page_media_box(&self.doc, page_id));

        let content = match self.interpret(page_id) {
            Ok(content) => content,
            Err(e) if self.options.error_mode == ErrorMode::Lenient => {
                log::warn!("Failed to read page {}: {}", page, e);
                return Ok(PageLayout::empty(page, geometry));
            }
            Err(e) => {
                return Err(Error::TextExtract(format!("Page {}: {}", page, e)));
            }
        };

        let (tables, spans) = if self.options.detect_tables {
            TableDetector::new().detect(content.spans)
        } else {
            (Vec::new(), content.spans)
        };

        let (lines, blocks) = LineAssembler::new().assemble(spans);
        log::debug!(
            "Page {}: {} lines, {} blocks, {} images, {} tables",
            page,
            lines.len(),
            blocks.len(),
            content.placements.len(),
            tables.len()
        );

        Ok(PageLayout {
            page_number: page,
            geometry,
            lines,
            blocks,
            placements: content.placements,
            tables,
        })
    }

    /// Layouts for every page in [`page_numbers`](Self::page_numbers) order.
    pub fn page_layouts(&self) -> Result<Vec<PageLayout>> {
        let pages = self.page_numbers();
        if self.options.parallel {
            pages.par_iter().map(|&p| self.page_layout(p)).collect()
        } else {
            pages.iter().map(|&p| self.page_layout(p)).collect()
        }
    }

    /// Plain text of a page, one line per text line.
    pub fn page_text(&self, page: u32) -> Result<String> {
        Ok(self.page_layout(page)?.text())
    }

    /// Images listed in the page's XObject resources.
    pub fn page_images(&self, page: u32) -> Result<Vec<ExtractedImage>> {
        let layout = self.page_layout(page)?;
        self.images_for_layout(&layout)
    }

    /// Images of an already analysed page, placed with its paint positions.
    ///
    /// Images are returned in resource dictionary order. `index` is the
    /// 1-based position among the page's image XObjects, so an image that
    /// cannot be decoded is skipped with a warning but keeps its number.
    pub fn images_for_layout(&self, layout: &PageLayout) -> Result<Vec<ExtractedImage>> {
        let page = layout.page_number;
        let mut images = Vec::new();

        for (position, (name, stream)) in self.image_xobjects(page)?.into_iter().enumerate() {
            match decode_image(&self.doc, stream) {
                Ok(Some(decoded)) => images.push(ExtractedImage {
                    page,
                    index: position + 1,
                    bbox: layout.placement_bbox(&name),
                    name,
                    data: decoded.data,
                    format: decoded.format,
                    width: decoded.width,
                    height: decoded.height,
                }),
                Ok(None) => {}
                Err(e) => log::warn!("Skipping image {} on page {}: {}", name, page, e),
            }
        }

        Ok(images)
    }

    /// Number of image XObjects listed for a page, decodable or not.
    pub fn listed_image_count(&self, page: u32) -> Result<usize> {
        Ok(self.image_xobjects(page)?.len())
    }

    /// Image streams of the page's XObject resources, by name.
    fn image_xobjects(&self, page: u32) -> Result<Vec<(String, &Stream)>> {
        let page_id = self.page_id(page)?;
        let Some(xobjects) = page_resources(&self.doc, page_id)
            .and_then(|r| r.get(b"XObject").ok())
            .and_then(|x| resolve_dict(&self.doc, x))
        else {
            return Ok(Vec::new());
        };

        let mut streams = Vec::new();
        for (name, obj) in xobjects.iter() {
            let stream = match obj {
                Object::Reference(id) => match self.doc.get_object(*id) {
                    Ok(Object::Stream(s)) => s,
                    _ => continue,
                },
                Object::Stream(s) => s,
                _ => continue,
            };
            if is_image(stream) {
                streams.push((String::from_utf8_lossy(name).into_owned(), stream));
            }
        }
        Ok(streams)
    }
}

impl std::fmt::Debug for PdfReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PdfReader")
            .field("pages", &self.pages.len())
            .field("options", &self.options)
            .finish()
    }
}
