//! Builds small PDFs in memory for the integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, Stream};

pub const PAGE_WIDTH: i64 = 612;
pub const PAGE_HEIGHT: i64 = 792;

/// Body text long enough to survive every length filter.
pub fn body_line(n: usize) -> String {
    format!("Body text line {} explains how the wiring should be checked.", n)
}

enum ImageData {
    /// Fake JPEG stream of the given size (DCTDecode passthrough)
    Jpeg(usize),
    /// Uncompressed RGB samples
    Rgb { width: i64, height: i64 },
    /// A fax-compressed image the reader cannot decode
    Fax,
}

struct PageImage {
    name: String,
    data: ImageData,
}

/// One page: text lines and image placements, drawn in insertion order.
#[derive(Default)]
pub struct PageSpec {
    operations: Vec<Operation>,
    images: Vec<PageImage>,
}

impl PageSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// A 12pt line with its baseline at `y` (user space).
    pub fn text(self, x: f32, y: f32, text: &str) -> Self {
        self.sized_text(x, y, 12.0, text)
    }

    pub fn sized_text(mut self, x: f32, y: f32, size: f32, text: &str) -> Self {
        self.operations.extend([
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec![Object::Name(b"F1".to_vec()), Object::Real(size)]),
            Operation::new("Td", vec![Object::Real(x), Object::Real(y)]),
            Operation::new("Tj", vec![Object::string_literal(text)]),
            Operation::new("ET", vec![]),
        ]);
        self
    }

    /// `count` body lines starting at baseline `y`, 14pt apart.
    pub fn body(mut self, x: f32, y: f32, count: usize) -> Self {
        for n in 0..count {
            self = self.text(x, y - n as f32 * 14.0, &body_line(n + 1));
        }
        self
    }

    /// A JPEG of `size` bytes painted at `(x, y)` with the given size.
    pub fn jpeg(self, name: &str, size: usize, rect: (f32, f32, f32, f32)) -> Self {
        self.image(name, ImageData::Jpeg(size), rect)
    }

    /// A tiny 2x2 RGB image painted at `rect`.
    pub fn rgb(self, name: &str, rect: (f32, f32, f32, f32)) -> Self {
        self.image(
            name,
            ImageData::Rgb {
                width: 2,
                height: 2,
            },
            rect,
        )
    }

    /// An image with a filter the reader does not support.
    pub fn fax(self, name: &str, rect: (f32, f32, f32, f32)) -> Self {
        self.image(name, ImageData::Fax, rect)
    }

    /// `rect` is `(x, y, width, height)` with `y` the bottom edge.
    fn image(mut self, name: &str, data: ImageData, rect: (f32, f32, f32, f32)) -> Self {
        let (x, y, w, h) = rect;
        self.operations.extend([
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    Object::Real(w),
                    Object::Real(0.0),
                    Object::Real(0.0),
                    Object::Real(h),
                    Object::Real(x),
                    Object::Real(y),
                ],
            ),
            Operation::new("Do", vec![Object::Name(name.as_bytes().to_vec())]),
            Operation::new("Q", vec![]),
        ]);
        self.images.push(PageImage {
            name: name.to_string(),
            data,
        });
        self
    }
}

/// Fake JPEG bytes: SOI marker, filler, EOI marker.
pub fn fake_jpeg(size: usize) -> Vec<u8> {
    let mut data = vec![0xFF, 0xD8, 0xFF, 0xE0];
    data.resize(size.saturating_sub(2).max(4), 0x42);
    data.extend([0xFF, 0xD9]);
    data
}

fn image_stream(data: &ImageData) -> Stream {
    match data {
        ImageData::Jpeg(size) => Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => 100,
                "Height" => 50,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
                "Filter" => "DCTDecode",
            },
            fake_jpeg(*size),
        ),
        ImageData::Rgb { width, height } => {
            let samples: Vec<u8> = (0..width * height)
                .flat_map(|i| [(i * 60) as u8, 128, 255 - (i * 60) as u8])
                .collect();
            Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => *width,
                    "Height" => *height,
                    "ColorSpace" => "DeviceRGB",
                    "BitsPerComponent" => 8,
                },
                samples,
            )
        }
        ImageData::Fax => Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => 8,
                "Height" => 8,
                "ColorSpace" => "DeviceGray",
                "BitsPerComponent" => 1,
                "Filter" => "CCITTFaxDecode",
            },
            vec![0u8; 16],
        ),
    }
}

/// A letter-sized document with a Helvetica font.
#[derive(Default)]
pub struct PdfBuilder {
    pages: Vec<PageSpec>,
}

impl PdfBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, page: PageSpec) -> Self {
        self.pages.push(page);
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });

        let mut kids = Vec::new();
        for page in self.pages {
            let mut xobjects = Dictionary::new();
            for image in &page.images {
                let id = doc.add_object(image_stream(&image.data));
                xobjects.set(image.name.as_bytes().to_vec(), id);
            }

            let content = Content {
                operations: page.operations,
            };
            let content_id = doc.add_object(Stream::new(
                dictionary! {},
                content.encode().expect("encode content"),
            ));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "Resources" => dictionary! {
                    "Font" => dictionary! { "F1" => font_id },
                    "XObject" => xobjects,
                },
            });
            kids.push(Object::Reference(page_id));
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buffer = Vec::new();
        doc.save_to(&mut buffer).expect("save pdf");
        buffer
    }

    /// Build and write to `dir/name`.
    pub fn write(self, dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, self.build()).expect("write pdf");
        path
    }
}

/// Two pages with numbered headings. Page 1 paints a large JPEG (`Im1`)
/// below its text and a tiny RGB image (`Im2`) below that.
pub fn manual() -> PdfBuilder {
    PdfBuilder::new()
        .page(
            PageSpec::new()
                .text(72.0, 720.0, "1 Introduction")
                .body(72.0, 700.0, 6)
                .jpeg("Im1", 6000, (72.0, 300.0, 200.0, 100.0))
                .rgb("Im2", (72.0, 150.0, 50.0, 50.0)),
        )
        .page(
            PageSpec::new()
                .text(72.0, 720.0, "2 Wiring Basics")
                .body(72.0, 700.0, 6),
        )
}
