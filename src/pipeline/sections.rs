use std::path::Path;

use serde::Serialize;

use crate::error::Result;
use crate::model::TextSection;
use crate::parser::PdfReader;
use crate::segment::TextSectionBuilder;

use super::{ensure_dir, save_file, truncate_sections};

#[derive(Debug, Serialize)]
pub struct SectionsReport {
    pub sections: Vec<TextSection>,
    pub total_sections: usize,
}

/// Split the document text into heading sections and save every page image
/// to `out_dir`. Sections list the images of the pages they span.
pub fn process_sections(pdf: &Path, out_dir: &Path) -> Result<SectionsReport> {
    ensure_dir(out_dir)?;
    let reader = PdfReader::open(pdf)?;
    let mut builder = TextSectionBuilder::default();

    for layout in reader.page_layouts()? {
        log::info!("Processing page {}", layout.page_number);

        let mut names = Vec::new();
        for image in reader.images_for_layout(&layout)? {
            let filename = image.filename();
            match save_file(out_dir, &filename, &image.data) {
                Ok(_) => names.push(filename),
                Err(e) => log::warn!("Could not save {}: {}", filename, e),
            }
        }

        builder.add_page(layout.page_number, &layout.text(), &names);
    }

    let sections = builder.finish();
    let total_sections = sections.len();
    Ok(SectionsReport {
        sections: truncate_sections(sections),
        total_sections,
    })
}
