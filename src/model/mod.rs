//! Data model for extracted PDF content.
//!
//! These types are the JSON document shapes printed by every command:
//! sections made of blocks, saved images, model classifications and
//! processing statistics.

mod block;
mod classification;
mod geometry;
mod heading;
mod image;
mod section;
mod stats;

pub use block::{Block, BlockKind, BlockMetadata};
pub use classification::ImageClassification;
pub use geometry::BoundingBox;
pub use heading::HeadingEntry;
pub use image::{table_filename, ExtractedImage, ImageFormat};
pub use section::{BlockSection, TextSection};
pub use stats::ClassificationStats;
