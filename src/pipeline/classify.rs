use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::ai::{classify_or_default, is_important_or_default, ImageClassifier};
use crate::error::{Error, Result};
use crate::model::{ImageClassification, ImageFormat};

/// Directory searched by the vision check when none is given.
pub const SAMPLE_IMAGE_DIR: &str = "public/uploads/test-sample";

/// Context sent with the vision check's sample image.
pub const SAMPLE_CONTEXT: &str = "Test image from PDF Learning Platform";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassifyReport {
    pub image_path: String,
    pub is_important: bool,
    /// `include` or `skip`
    pub decision: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DescribeReport {
    pub image_path: String,
    pub context: String,
    pub classification: ImageClassification,
}

fn read_image(path: &Path) -> Result<(Vec<u8>, ImageFormat)> {
    let data = std::fs::read(path)?;
    let format = ImageFormat::from_path(path, &data).ok_or_else(|| {
        Error::ImageExtract(format!("unsupported image format: {}", path.display()))
    })?;
    Ok((data, format))
}

/// Yes/no importance verdict for an image file.
pub fn classify_image(path: &Path, classifier: &dyn ImageClassifier) -> Result<ClassifyReport> {
    let (data, format) = read_image(path)?;
    let is_important = is_important_or_default(classifier, &data, format);
    Ok(ClassifyReport {
        image_path: path.display().to_string(),
        is_important,
        decision: if is_important { "include" } else { "skip" },
    })
}

/// Full classification of an image file, optionally told which section it
/// belongs to.
pub fn describe_image(
    path: &Path,
    context: &str,
    classifier: &dyn ImageClassifier,
) -> Result<DescribeReport> {
    let (data, format) = read_image(path)?;
    Ok(DescribeReport {
        image_path: path.display().to_string(),
        context: context.to_string(),
        classification: classify_or_default(classifier, &data, format, context),
    })
}

/// First `.jpg`, `.jpeg` or `.png` file in `dir`, by name.
pub fn find_sample_image(dir: &Path) -> Result<Option<PathBuf>> {
    let mut candidates: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| matches!(e.to_ascii_lowercase().as_str(), "jpg" | "jpeg" | "png"))
        })
        .collect();
    candidates.sort();
    Ok(candidates.into_iter().next())
}
