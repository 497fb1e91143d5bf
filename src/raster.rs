//! Page rendering through poppler's `pdftoppm`.

use std::path::Path;
use std::process::Command;

use crate::error::{Error, Result};
use crate::model::BoundingBox;

/// PDF user space is 72 units per inch.
const POINTS_PER_INCH: f32 = 72.0;

/// Renders PDF pages (or regions of them) to PNG with `pdftoppm`.
#[derive(Debug, Clone)]
pub struct Rasterizer {
    program: String,
}

impl Default for Rasterizer {
    fn default() -> Self {
        Self {
            program: "pdftoppm".to_string(),
        }
    }
}

impl Rasterizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different `pdftoppm` binary.
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Whether the renderer can be launched.
    pub fn is_available(&self) -> bool {
        let available = Command::new(&self.program).arg("-v").output().is_ok();
        if !available {
            log::debug!("{} not found - install poppler-utils for page rendering", self.program);
        }
        available
    }

    /// Render a whole page at `dpi`.
    pub fn render_page(&self, pdf: &Path, page: u32, dpi: u32) -> Result<Vec<u8>> {
        self.render(pdf, page, dpi, None)
    }

    /// Render the top-down `bbox` (in points) of a page, zoomed by `scale`.
    pub fn render_region(&self, pdf: &Path, page: u32, bbox: &BoundingBox, scale: f32) -> Result<Vec<u8>> {
        if bbox.is_empty() {
            return Err(Error::Raster("empty region".to_string()));
        }
        let dpi = (POINTS_PER_INCH * scale).round() as u32;
        let crop = [
            (bbox.x * scale).round().max(0.0) as u32,
            (bbox.y * scale).round().max(0.0) as u32,
            (bbox.width * scale).round().max(1.0) as u32,
            (bbox.height * scale).round().max(1.0) as u32,
        ];
        self.render(pdf, page, dpi, Some(crop))
    }

    fn render(&self, pdf: &Path, page: u32, dpi: u32, crop: Option<[u32; 4]>) -> Result<Vec<u8>> {
        let temp_dir = tempfile::tempdir()?;
        let prefix = temp_dir.path().join("render");

        let mut cmd = Command::new(&self.program);
        cmd.arg("-png")
            .arg("-r")
            .arg(dpi.to_string())
            .arg("-f")
            .arg(page.to_string())
            .arg("-l")
            .arg(page.to_string())
            .arg("-singlefile");
        if let Some([x, y, w, h]) = crop {
            cmd.arg("-x")
                .arg(x.to_string())
                .arg("-y")
                .arg(y.to_string())
                .arg("-W")
                .arg(w.to_string())
                .arg("-H")
                .arg(h.to_string());
        }
        let output = cmd
            .arg(pdf)
            .arg(&prefix)
            .output()
            .map_err(|e| Error::Raster(format!("failed to run {}: {}", self.program, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Raster(format!("{} failed: {}", self.program, stderr.trim())));
        }

        let png = prefix.with_extension("png");
        std::fs::read(&png)
            .map_err(|e| Error::Raster(format!("{} produced no image: {}", self.program, e)))
    }
}
