//! Plain-text sectioning: headings split the running text of the document.

use crate::model::TextSection;

use super::headings::HeadingRules;

/// Sections with this much content or less are dropped.
const MIN_SECTION_CHARS: usize = 100;

/// Builds [`TextSection`]s from page text, one page at a time.
#[derive(Debug)]
pub struct TextSectionBuilder {
    rules: HeadingRules,
    sections: Vec<TextSection>,
    current: Option<TextSection>,
}

impl TextSectionBuilder {
    pub fn new(rules: HeadingRules) -> Self {
        Self {
            rules,
            sections: Vec::new(),
            current: None,
        }
    }

    /// Feed the text of a page along with the file names of its images.
    pub fn add_page(&mut self, page: u32, text: &str, images: &[String]) {
        for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
            if self.rules.is_heading(line) {
                self.close();
                let mut section = TextSection::new(self.sections.len(), line, Some(page));
                section.images = images.to_vec();
                self.current = Some(section);
            } else if let Some(section) = self.current.as_mut() {
                section.content.push_str(line);
                section.content.push('\n');
                section.add_images(images);
            }
        }
    }

    /// Keep the open section if it has any content.
    fn close(&mut self) {
        if let Some(mut section) = self.current.take() {
            if !section.is_blank() {
                section.order = self.sections.len();
                self.sections.push(section);
            }
        }
    }

    /// Close the last section and drop the short ones.
    pub fn finish(mut self) -> Vec<TextSection> {
        self.close();
        self.sections
            .into_iter()
            .filter(|s| s.content.chars().count() > MIN_SECTION_CHARS)
            .collect()
    }
}

impl Default for TextSectionBuilder {
    fn default() -> Self {
        Self::new(HeadingRules::simple())
    }
}
