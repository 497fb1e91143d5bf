//! Section segmentation.
//!
//! Headings are found either by regex heuristics ([`HeadingRules`]) or by
//! markup in service output, and the content between two headings becomes
//! a section.

mod block_sections;
mod headings;
mod markdown;
mod text_sections;

pub use block_sections::{Assembly, BlockOptions, BlockSectionBuilder, ParagraphBuffer};
pub use headings::{is_metadata, layout_heading, markdown_heading, HeadingRules};
pub use markdown::{layout_sections, markdown_sections, LayoutSection, FALLBACK_HEADING};
pub use text_sections::TextSectionBuilder;
