//! Text recognition through the `tesseract` command.

use std::path::Path;
use std::process::Command;

use crate::error::{Error, Result};
use crate::raster::Rasterizer;

/// OCR settings.
#[derive(Debug, Clone)]
pub struct OcrOptions {
    /// Render resolution for pages sent to OCR
    pub dpi: u32,
    /// Tesseract language code
    pub lang: String,
}

impl Default for OcrOptions {
    fn default() -> Self {
        Self {
            dpi: 300,
            lang: "eng".to_string(),
        }
    }
}

impl OcrOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dpi(mut self, dpi: u32) -> Self {
        self.dpi = dpi;
        self
    }

    pub fn with_lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = lang.into();
        self
    }
}

/// Runs tesseract on rendered pages.
#[derive(Debug, Clone, Default)]
pub struct TesseractOcr {
    options: OcrOptions,
    rasterizer: Rasterizer,
}

impl TesseractOcr {
    pub fn new(options: OcrOptions) -> Self {
        Self {
            options,
            rasterizer: Rasterizer::new(),
        }
    }

    pub fn options(&self) -> &OcrOptions {
        &self.options
    }

    /// Whether tesseract can be launched.
    pub fn is_tesseract_available() -> bool {
        let available = Command::new("tesseract").arg("--version").output().is_ok();
        if !available {
            log::debug!("tesseract not found - install tesseract-ocr for OCR support");
        }
        available
    }

    /// Whether both the page renderer and tesseract can be launched.
    pub fn is_available(&self) -> bool {
        self.rasterizer.is_available() && Self::is_tesseract_available()
    }

    /// Recognize the text of an image file.
    pub fn recognize(&self, image_path: &Path) -> Result<String> {
        let output = Command::new("tesseract")
            .arg(image_path)
            .arg("stdout")
            .arg("-l")
            .arg(&self.options.lang)
            .output()
            .map_err(|e| Error::Ocr(format!("failed to run tesseract: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Ocr(format!("tesseract failed: {}", stderr.trim())));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Render one page and recognize its text.
    pub fn recognize_page(&self, pdf: &Path, page: u32) -> Result<String> {
        let png = self.rasterizer.render_page(pdf, page, self.options.dpi)?;

        let temp_dir = tempfile::tempdir()?;
        let image_path = temp_dir.path().join(format!("page_{}.png", page));
        std::fs::write(&image_path, png)?;

        self.recognize(&image_path)
    }
}
