//! Images extracted from PDF pages.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::geometry::BoundingBox;

/// Encoded format of an extracted or user-supplied image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Jpeg,
    Png,
    Jpx,
    Gif,
    Bmp,
    Tiff,
    Webp,
}

impl ImageFormat {
    /// File extension used when saving the image.
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "jpeg",
            ImageFormat::Png => "png",
            ImageFormat::Jpx => "jpx",
            ImageFormat::Gif => "gif",
            ImageFormat::Bmp => "bmp",
            ImageFormat::Tiff => "tiff",
            ImageFormat::Webp => "webp",
        }
    }

    /// Subtype used in `data:image/<subtype>;base64,` URLs.
    pub fn mime_subtype(&self) -> &'static str {
        match self {
            ImageFormat::Jpx => "jp2",
            other => other.extension(),
        }
    }

    /// Map a file extension (case-insensitive, `jpg` allowed) to a format.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Some(ImageFormat::Jpeg),
            "png" => Some(ImageFormat::Png),
            "jpx" | "jp2" => Some(ImageFormat::Jpx),
            "gif" => Some(ImageFormat::Gif),
            "bmp" => Some(ImageFormat::Bmp),
            "tif" | "tiff" => Some(ImageFormat::Tiff),
            "webp" => Some(ImageFormat::Webp),
            _ => None,
        }
    }

    /// Format of a file on disk, judged by its extension and then its bytes.
    pub fn from_path(path: &Path, data: &[u8]) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
            .or_else(|| Self::detect(data))
    }

    /// Detect the format from magic bytes.
    pub fn detect(data: &[u8]) -> Option<Self> {
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(ImageFormat::Jpeg);
        }
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
            return Some(ImageFormat::Png);
        }
        if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
            return Some(ImageFormat::Gif);
        }
        if data.starts_with(&[0x49, 0x49, 0x2A, 0x00]) || data.starts_with(&[0x4D, 0x4D, 0x00, 0x2A])
        {
            return Some(ImageFormat::Tiff);
        }
        if data.starts_with(b"BM") {
            return Some(ImageFormat::Bmp);
        }
        if data.len() >= 12 && data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
            return Some(ImageFormat::Webp);
        }
        // JP2 signature box, or a raw J2K codestream
        if data.starts_with(&[0x00, 0x00, 0x00, 0x0C, 0x6A, 0x50, 0x20, 0x20])
            || data.starts_with(&[0xFF, 0x4F, 0xFF, 0x51])
        {
            return Some(ImageFormat::Jpx);
        }
        None
    }
}

impl std::fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

/// An image XObject pulled out of a page, ready to be written to disk.
#[derive(Debug, Clone)]
pub struct ExtractedImage {
    /// 1-based page number
    pub page: u32,
    /// 1-based position in the page's image list
    pub index: usize,
    /// Resource name of the XObject (e.g. "Im0")
    pub name: String,
    /// Encoded image bytes
    pub data: Vec<u8>,
    pub format: ImageFormat,
    pub width: u32,
    pub height: u32,
    /// Where the image is painted on the page, if it is drawn with `Do`
    pub bbox: Option<BoundingBox>,
}

impl ExtractedImage {
    /// File name under which the image is saved: `page_{p}_img_{i}.{ext}`.
    pub fn filename(&self) -> String {
        format!("page_{}_img_{}.{}", self.page, self.index, self.format.extension())
    }

    /// Encoded size in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }
}

/// File name for a rasterized table: `page_{p}_table_{i}.png`.
pub fn table_filename(page: u32, index: usize) -> String {
    format!("page_{}_table_{}.png", page, index)
}
