//! Remote model access: image classification, heading identification and
//! document parsing services.
//!
//! The pipelines only talk to the [`ImageClassifier`] and
//! [`HeadingIdentifier`] traits, so tests can swap the Azure client for a
//! canned implementation.

mod azure;
mod llama;
mod prompts;
mod response;

pub use azure::{AzureConfig, AzureVisionClient, DEFAULT_API_VERSION};
pub use llama::{ItemBox, LlamaConfig, LlamaItem, LlamaPage, LlamaParseClient};
pub use response::{parse_classification, parse_headings, strip_code_fences};

use crate::error::{Error, Result};
use crate::model::{HeadingEntry, ImageClassification, ImageFormat};

/// Description used when the classification request itself failed.
pub const CLASSIFICATION_ERROR: &str = "Classification error";
/// Description used when the model's answer could not be understood.
pub const CLASSIFICATION_FAILED: &str = "Image classification failed";

/// Decides whether extracted images are worth keeping.
pub trait ImageClassifier {
    /// Yes/no verdict: is this image educational content?
    fn is_important(&self, image: &[u8], format: ImageFormat) -> Result<bool>;

    /// Full verdict with type, description, relevance and tags.
    fn classify(&self, image: &[u8], format: ImageFormat, context: &str) -> Result<ImageClassification>;
}

/// Text of one page, as sent to a [`HeadingIdentifier`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageText {
    /// 1-based page number
    pub page: u32,
    pub text: String,
}

impl PageText {
    pub fn new(page: u32, text: impl Into<String>) -> Self {
        Self {
            page,
            text: text.into(),
        }
    }
}

/// Finds the section headings of a whole document.
pub trait HeadingIdentifier {
    fn identify_headings(&self, pages: &[PageText]) -> Result<Vec<HeadingEntry>>;
}

/// [`ImageClassifier::is_important`], keeping the image when the model
/// cannot be asked.
pub fn is_important_or_default<C: ImageClassifier + ?Sized>(
    classifier: &C,
    image: &[u8],
    format: ImageFormat,
) -> bool {
    classifier.is_important(image, format).unwrap_or_else(|e| {
        log::warn!("Image classification failed, keeping image: {}", e);
        true
    })
}

/// [`ImageClassifier::classify`], falling back to a keep-it verdict.
pub fn classify_or_default<C: ImageClassifier + ?Sized>(
    classifier: &C,
    image: &[u8],
    format: ImageFormat,
    context: &str,
) -> ImageClassification {
    match classifier.classify(image, format, context) {
        Ok(classification) => classification,
        Err(e @ (Error::Json(_) | Error::ModelResponse(_))) => {
            log::warn!("Could not parse classification: {}", e);
            ImageClassification::fallback(CLASSIFICATION_FAILED)
        }
        Err(e) => {
            log::warn!("Classification request failed: {}", e);
            ImageClassification::fallback(CLASSIFICATION_ERROR)
        }
    }
}

/// Turn a non-success response into [`Error::Api`].
pub(crate) fn check_status(
    response: reqwest::blocking::Response,
) -> Result<reqwest::blocking::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().unwrap_or_default();
    Err(Error::Api {
        status: status.as_u16(),
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Failing(fn() -> Error);

    impl ImageClassifier for Failing {
        fn is_important(&self, _: &[u8], _: ImageFormat) -> Result<bool> {
            Err((self.0)())
        }

        fn classify(&self, _: &[u8], _: ImageFormat, _: &str) -> Result<ImageClassification> {
            Err((self.0)())
        }
    }

    #[test]
    fn test_is_important_defaults_to_keep() {
        let classifier = Failing(|| Error::Other("offline".into()));
        assert!(is_important_or_default(&classifier, b"img", ImageFormat::Png));
    }

    #[test]
    fn test_classify_fallbacks() {
        let request_error = Failing(|| Error::Api {
            status: 500,
            message: "boom".into(),
        });
        let c = classify_or_default(&request_error, b"img", ImageFormat::Png, "");
        assert_eq!(c.description, CLASSIFICATION_ERROR);
        assert!(c.is_important);

        let parse_error = Failing(|| Error::ModelResponse("not json".into()));
        let c = classify_or_default(&parse_error, b"img", ImageFormat::Png, "");
        assert_eq!(c.description, CLASSIFICATION_FAILED);
        assert_eq!(c.relevance_score, 5);
    }
}
