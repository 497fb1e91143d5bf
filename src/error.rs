//! Error types for pdfblocks.

use std::io;
use thiserror::Error;

/// Result type alias for pdfblocks operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while extracting or classifying PDF content.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The file format is not recognized as PDF.
    #[error("Unknown file format: not a valid PDF")]
    UnknownFormat,

    /// Error parsing PDF structure.
    #[error("PDF parsing error: {0}")]
    PdfParse(String),

    /// The PDF document is encrypted.
    #[error("Document is encrypted")]
    Encrypted,

    /// Error extracting or encoding an embedded image.
    #[error("Image extraction error: {0}")]
    ImageExtract(String),

    /// Error extracting text content.
    #[error("Text extraction error: {0}")]
    TextExtract(String),

    /// Page number is out of range.
    #[error("Page {0} is out of range (document has {1} pages)")]
    PageOutOfRange(u32, u32),

    /// Page rasterization (pdftoppm) failed or is unavailable.
    #[error("Rasterization error: {0}")]
    Raster(String),

    /// OCR engine (tesseract) failed or is unavailable.
    #[error("OCR error: {0}")]
    Ocr(String),

    /// Transport-level HTTP failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// A remote service answered with a non-success status.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// A model answered with something we could not interpret.
    #[error("Unexpected model response: {0}")]
    ModelResponse(String),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("No text extracted from PDF")]
    NoTextExtracted,

    #[error("No headings identified")]
    NoHeadings,

    #[error("Failed to identify headings")]
    HeadingIdentification,

    /// A remote job did not finish in time.
    #[error("Timed out after {0} seconds")]
    Timeout(u64),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Messages of every underlying cause, outermost first, excluding `self`.
    pub fn source_chain(&self) -> Vec<String> {
        let mut chain = Vec::new();
        let mut source = std::error::Error::source(self);
        while let Some(err) = source {
            chain.push(err.to_string());
            source = err.source();
        }
        chain
    }
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        match err {
            lopdf::Error::IO(e) => Error::Io(e),
            lopdf::Error::Decryption(_) => Error::Encrypted,
            _ => Error::PdfParse(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::NoTextExtracted;
        assert_eq!(err.to_string(), "No text extracted from PDF");

        let err = Error::PageOutOfRange(10, 5);
        assert_eq!(
            err.to_string(),
            "Page 10 is out of range (document has 5 pages)"
        );

        let err = Error::Api {
            status: 401,
            message: "Unauthorized".to_string(),
        };
        assert_eq!(err.to_string(), "API error (401): Unauthorized");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
        assert_eq!(err.source_chain(), vec!["file not found".to_string()]);
    }

    #[test]
    fn test_source_chain_empty_for_leaf_errors() {
        assert!(Error::NoHeadings.source_chain().is_empty());
    }
}
