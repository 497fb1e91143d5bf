use std::path::Path;

use serde::Serialize;

use crate::ai::{LlamaPage, LlamaParseClient};
use crate::error::Result;
use crate::model::TextSection;
use crate::segment::{layout_sections, markdown_sections, LayoutSection};

use super::truncate_sections;

#[derive(Debug, Serialize)]
pub struct LlamaReport {
    pub sections: Vec<TextSection>,
    pub page_count: usize,
}

impl LlamaReport {
    /// Sections from the markdown of each parsed page.
    pub fn from_pages(pages: &[LlamaPage]) -> Self {
        Self {
            sections: markdown_sections(pages.iter().map(|p| p.md.as_str())),
            page_count: pages.len(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LayoutReport {
    pub sections: Vec<LayoutSection>,
    pub total_sections: usize,
    pub total_pages: usize,
}

impl LayoutReport {
    pub fn from_pages(pages: &[LlamaPage]) -> Self {
        let sections = layout_sections(pages);
        Self {
            total_sections: sections.len(),
            sections: truncate_sections(sections),
            total_pages: pages.len(),
        }
    }
}

/// Parse `pdf` with LlamaParse and split its markdown at headings.
///
/// When the job returns no per-page results the whole-document markdown is
/// used instead.
pub fn process_llama(pdf: &Path, client: &LlamaParseClient) -> Result<LlamaReport> {
    let job_id = client.upload(pdf)?;
    client.wait(&job_id)?;

    let pages = client.pages(&job_id)?;
    if !pages.is_empty() {
        return Ok(LlamaReport::from_pages(&pages));
    }

    log::warn!("LlamaParse returned no pages, using document markdown");
    let markdown = client.markdown(&job_id)?;
    Ok(LlamaReport {
        sections: markdown_sections([markdown.as_str()]),
        page_count: 0,
    })
}

/// Parse `pdf` with LlamaParse and section it by the layout of each page.
pub fn process_layout(pdf: &Path, client: &LlamaParseClient) -> Result<LayoutReport> {
    let pages = client.parse_pages(pdf)?;
    log::info!("LlamaParse returned {} pages", pages.len());
    Ok(LayoutReport::from_pages(&pages))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(page: u32, md: &str, text: &str) -> LlamaPage {
        LlamaPage {
            page,
            md: md.to_string(),
            text: text.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_llama_report() {
        let pages = [
            page(1, "# Safety\nWear gloves.", ""),
            page(2, "## Tools\nA hammer.", ""),
        ];
        let report = LlamaReport::from_pages(&pages);
        assert_eq!(report.page_count, 2);
        assert_eq!(report.sections.len(), 2);
        assert_eq!(report.sections[1].heading, "Tools");
    }

    #[test]
    fn test_layout_report_counts() {
        let pages: Vec<LlamaPage> = (1..=25)
            .map(|n| page(n, "", &format!("SAFETY CHAPTER {}\nbody", n)))
            .collect();
        let report = LayoutReport::from_pages(&pages);
        assert_eq!(report.total_pages, 25);
        assert_eq!(report.total_sections, 25);
        assert_eq!(report.sections.len(), 20);
    }
}
