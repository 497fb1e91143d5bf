//! PDF parsing module.
//!
//! Content streams are interpreted into positioned text spans, which are
//! assembled into lines and blocks in reading order. Image XObjects are
//! decoded alongside, with the position at which each one is painted.

mod content;
mod images;
mod layout;
mod objects;
mod options;
mod reader;
mod table_detector;

pub use content::ImagePlacement;
pub use layout::{Column, FontStatistics, LineAssembler, PageLayout, TextBlock, TextLine, TextSpan};
pub use objects::PageGeometry;
pub use options::{ErrorMode, ReaderOptions};
pub use reader::{is_pdf, PdfReader};
pub use table_detector::{DetectedTable, TableDetector, TableDetectorConfig, TableRowData};
