//! Heading heuristics.
//!
//! Lines are classified as headings by shape alone: all-caps titles,
//! numbered headings ("2.1 Safety") and keyword headings ("UNIT 3").

use regex::Regex;

/// Front-matter phrases that look like headings but never start a section.
const METADATA_KEYWORDS: [&str; 5] = [
    "key learning outcomes",
    "participant handbook",
    "table of contents",
    "unit objectives",
    "at the end of this unit",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Strictness {
    Simple,
    Strict,
}

/// Regex-based heading detector.
#[derive(Debug, Clone)]
pub struct HeadingRules {
    strictness: Strictness,
    allow_questions: bool,
    numbered: Regex,
    keyword: Regex,
    level: Regex,
}

impl HeadingRules {
    fn build(strictness: Strictness, keywords: &str) -> Self {
        Self {
            strictness,
            allow_questions: false,
            numbered: Regex::new(r"^\d+\.?\d*\s+[A-Z]").expect("valid heading pattern"),
            keyword: Regex::new(&format!(r"(?i)^({})\s+\d+", keywords))
                .expect("valid heading pattern"),
            level: Regex::new(r"^(\d+)(\.(\d+))?\s+").expect("valid heading pattern"),
        }
    }

    /// Lenient rules for plain-text sectioning.
    pub fn simple() -> Self {
        Self::build(Strictness::Simple, "UNIT|CHAPTER|MODULE|SECTION")
    }

    /// Stricter rules for block sectioning: longer all-caps titles, front
    /// matter rejected.
    pub fn strict() -> Self {
        Self::build(Strictness::Strict, "UNIT|CHAPTER|MODULE|SECTION|TOPIC")
    }

    /// Also accept long questions as headings (strict rules only).
    pub fn with_questions(mut self, allow: bool) -> Self {
        self.allow_questions = allow;
        self
    }

    pub fn is_heading(&self, text: &str) -> bool {
        let text = text.trim();
        let len = text.chars().count();

        match self.strictness {
            Strictness::Simple => {
                is_all_caps(text, 10, 5) || self.numbered.is_match(text) || self.keyword.is_match(text)
            }
            Strictness::Strict => {
                if len < 5 || is_metadata(text) {
                    return false;
                }
                self.numbered.is_match(text)
                    || is_all_caps(text, 15, 10)
                    || self.keyword.is_match(text)
                    || (self.allow_questions && text.ends_with('?') && len > 20)
            }
        }
    }

    /// 2 for sub-numbered headings ("1.2 Tools"), otherwise 1.
    pub fn heading_level(&self, text: &str) -> u8 {
        match self.level.captures(text.trim()) {
            Some(caps) if caps.get(3).is_some() => 2,
            _ => 1,
        }
    }
}

impl Default for HeadingRules {
    fn default() -> Self {
        Self::simple()
    }
}

/// Whether the line belongs to front matter.
pub fn is_metadata(text: &str) -> bool {
    let lower = text.to_lowercase();
    METADATA_KEYWORDS.iter().any(|k| lower.contains(k))
}

/// Heading test used for layout pages: a long all-caps line, or a line
/// starting with a digit and carrying a '.' early on ("3. Tools").
pub fn layout_heading(text: &str) -> bool {
    let text = text.trim();
    if is_all_caps(text, 10, 5) {
        return true;
    }
    text.chars().next().is_some_and(|c| c.is_ascii_digit()) && text.chars().take(10).any(|c| c == '.')
}

/// Heading text of a `# ` or `## ` markdown line.
pub fn markdown_heading(line: &str) -> Option<&str> {
    if line.starts_with("# ") || line.starts_with("## ") {
        Some(line.trim_start_matches('#').trim())
    } else {
        None
    }
}

/// At least one uppercase letter, no lowercase, more than `min_len` chars
/// and more than `min_alpha` letters.
fn is_all_caps(text: &str, min_len: usize, min_alpha: usize) -> bool {
    let has_upper = text.chars().any(char::is_uppercase);
    let has_lower = text.chars().any(char::is_lowercase);
    let alpha = text.chars().filter(|c| c.is_alphabetic()).count();
    has_upper && !has_lower && text.chars().count() > min_len && alpha > min_alpha
}
