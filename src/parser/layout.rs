//! Layout analysis for PDF pages.
//!
//! Turns positioned text spans into reading-order lines and blocks
//! (paragraph-like groups of lines), the way a PDF viewer's "text
//! blocks" view would present them.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::model::BoundingBox;

use super::content::{is_spaceless_script_char, ImagePlacement};
use super::objects::PageGeometry;
use super::table_detector::DetectedTable;

/// A text span with position and style information.
#[derive(Debug, Clone)]
pub struct TextSpan {
    /// The text content
    pub text: String,
    /// X position (left edge, user space)
    pub x: f32,
    /// Y position (baseline, user space, grows upwards)
    pub y: f32,
    /// Width of the text
    pub width: f32,
    /// Font size in points
    pub font_size: f32,
    /// Font name (e.g., "Helvetica-Bold")
    pub font_name: String,
    pub is_bold: bool,
    pub is_italic: bool,
}

impl TextSpan {
    /// Create a new text span. The width is estimated from the character
    /// count until the interpreter supplies a better one.
    pub fn new(text: String, x: f32, y: f32, font_size: f32, font_name: String) -> Self {
        let lower = font_name.to_lowercase();
        let is_bold = lower.contains("bold") || lower.contains("black") || lower.contains("heavy");
        let is_italic = lower.contains("italic") || lower.contains("oblique");
        let width = text.chars().count() as f32 * font_size * 0.5;

        Self {
            text,
            x,
            y,
            width,
            font_size,
            font_name,
            is_bold,
            is_italic,
        }
    }

    /// Approximate descender line.
    pub fn bottom(&self) -> f32 {
        self.y - self.font_size * 0.2
    }

    /// Approximate ascender line.
    pub fn top(&self) -> f32 {
        self.y + self.font_size * 0.8
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }
}

/// A text line composed of spans sharing a baseline.
#[derive(Debug, Clone)]
pub struct TextLine {
    /// Spans sorted by X position
    pub spans: Vec<TextSpan>,
    /// Baseline
    pub y: f32,
    /// Leftmost X position
    pub x: f32,
    /// Dominant font size, weighted by text length
    pub font_size: f32,
    /// Set when the font size is noticeably above the body size
    pub is_large: bool,
}

impl TextLine {
    /// Create a line from spans. Returns `None` for an empty span list.
    pub fn from_spans(mut spans: Vec<TextSpan>) -> Option<Self> {
        if spans.is_empty() {
            return None;
        }

        spans.sort_by(|a, b| a.x.partial_cmp(&b.x).unwrap_or(Ordering::Equal));

        let total_chars: usize = spans.iter().map(|s| s.text.len()).sum();
        let weighted: f32 = spans
            .iter()
            .map(|s| s.font_size * s.text.len() as f32)
            .sum();
        let font_size = if total_chars > 0 {
            weighted / total_chars as f32
        } else {
            spans[0].font_size
        };

        Some(Self {
            y: spans[0].y,
            x: spans[0].x,
            font_size,
            spans,
            is_large: false,
        })
    }

    /// Combined text of all spans.
    ///
    /// A space is inserted where the gap between spans exceeds a fifth of a
    /// character, except between CJK characters.
    pub fn text(&self) -> String {
        let mut result = String::new();

        for (i, span) in self.spans.iter().enumerate() {
            if i == 0 {
                result.push_str(&span.text);
                continue;
            }
            let prev = &self.spans[i - 1];
            let gap = span.x - prev.right();

            let char_count = span.text.chars().count();
            let avg_char_width = if char_count > 0 && span.width > 0.0 {
                span.width / char_count as f32
            } else {
                span.font_size * 0.5
            };

            let both_cjk = matches!(
                (prev.text.chars().last(), span.text.chars().next()),
                (Some(a), Some(b)) if is_spaceless_script_char(a) && is_spaceless_script_char(b)
            );
            let has_space = prev.text.ends_with(' ')
                || prev.text.ends_with('\u{00A0}')
                || span.text.starts_with(' ')
                || span.text.starts_with('\u{00A0}');

            if gap > avg_char_width * 0.2 && !both_cjk && !has_space {
                result.push(' ');
            }
            result.push_str(&span.text);
        }

        result
    }

    pub fn right(&self) -> f32 {
        self.spans
            .iter()
            .map(|s| s.right())
            .fold(self.x, f32::max)
    }

    pub fn top(&self) -> f32 {
        self.spans.iter().map(|s| s.top()).fold(self.y, f32::max)
    }

    pub fn bottom(&self) -> f32 {
        self.spans.iter().map(|s| s.bottom()).fold(self.y, f32::min)
    }
}

/// A run of lines that read as one paragraph or heading.
#[derive(Debug, Clone)]
pub struct TextBlock {
    pub lines: Vec<TextLine>,
}

impl TextBlock {
    /// Lines joined by newlines.
    pub fn text(&self) -> String {
        self.lines
            .iter()
            .map(|l| l.text())
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn is_empty(&self) -> bool {
        self.lines.iter().all(|l| l.text().trim().is_empty())
    }
}

/// A detected column in the page layout.
#[derive(Debug, Clone)]
pub struct Column {
    pub left: f32,
    pub right: f32,
    /// 0 = leftmost
    pub index: usize,
}

impl Column {
    pub fn contains(&self, x: f32) -> bool {
        x >= self.left && x <= self.right
    }

    /// A span belongs to a column if its left edge or its center is inside.
    pub fn contains_span(&self, span: &TextSpan) -> bool {
        self.contains(span.x) || self.contains(span.x + span.width / 2.0)
    }
}

/// Font size histogram used to spot larger-than-body lines.
#[derive(Debug, Clone, Default)]
pub struct FontStatistics {
    /// Most common font size
    pub body_size: f32,
    /// Size (x10, rounded) -> occurrences
    pub size_histogram: HashMap<i32, usize>,
}

impl FontStatistics {
    pub fn from_spans(spans: &[TextSpan]) -> Self {
        let mut stats = Self::default();
        for span in spans {
            stats.add_size(span.font_size);
        }
        stats.analyze();
        stats
    }

    pub fn add_size(&mut self, size: f32) {
        let key = (size * 10.0) as i32;
        *self.size_histogram.entry(key).or_insert(0) += 1;
    }

    /// Settle the body size; 12pt when nothing was observed.
    pub fn analyze(&mut self) {
        self.body_size = self
            .size_histogram
            .iter()
            .max_by_key(|(key, count)| (**count, **key))
            .map(|(key, _)| *key as f32 / 10.0)
            .unwrap_or(12.0);
    }

    /// Whether a size is at least 1.5pt above the body size.
    pub fn is_large(&self, font_size: f32) -> bool {
        font_size >= self.body_size + 1.5
    }
}

/// Groups spans into lines and lines into blocks.
#[derive(Debug, Default)]
pub struct LineAssembler;

impl LineAssembler {
    pub fn new() -> Self {
        Self
    }

    /// Build reading-order lines and blocks from a page's spans.
    pub fn assemble(&self, spans: Vec<TextSpan>) -> (Vec<TextLine>, Vec<TextBlock>) {
        let stats = FontStatistics::from_spans(&spans);
        let mut lines = self.group_into_lines(spans);
        for line in &mut lines {
            line.is_large = stats.is_large(line.font_size);
        }
        let blocks = self.group_into_blocks(&lines);
        (lines, blocks)
    }

    /// Group spans into lines, column by column.
    fn group_into_lines(&self, spans: Vec<TextSpan>) -> Vec<TextLine> {
        let columns = detect_columns(&spans);
        log::debug!("Detected {} columns", columns.len());

        if columns.len() <= 1 {
            return group_single_column(spans);
        }

        let mut per_column: Vec<Vec<TextSpan>> = vec![Vec::new(); columns.len()];
        for span in spans {
            let idx = columns
                .iter()
                .position(|c| c.contains_span(&span))
                .unwrap_or(0);
            per_column[idx].push(span);
        }

        per_column
            .into_iter()
            .flat_map(group_single_column)
            .collect()
    }

    fn group_into_blocks(&self, lines: &[TextLine]) -> Vec<TextBlock> {
        let avg_spacing = average_line_spacing(lines);
        let mut blocks: Vec<TextBlock> = Vec::new();
        let mut current: Vec<TextLine> = Vec::new();

        for line in lines {
            if let Some(prev) = current.last() {
                if should_break_block(prev, line, avg_spacing) {
                    blocks.push(TextBlock {
                        lines: std::mem::take(&mut current),
                    });
                }
            }
            current.push(line.clone());
        }
        if !current.is_empty() {
            blocks.push(TextBlock { lines: current });
        }

        blocks
    }
}

/// Y-based line grouping within one column, top to bottom.
fn group_single_column(mut spans: Vec<TextSpan>) -> Vec<TextLine> {
    spans.sort_by(|a, b| {
        b.y.partial_cmp(&a.y)
            .unwrap_or(Ordering::Equal)
            .then(a.x.partial_cmp(&b.x).unwrap_or(Ordering::Equal))
    });

    let mut lines = Vec::new();
    let mut current: Vec<TextSpan> = Vec::new();
    let mut current_y: Option<f32> = None;

    for span in spans {
        // 30% of the font size absorbs super/subscripts
        let tolerance = span.font_size * 0.3;
        match current_y {
            Some(y) if (span.y - y).abs() <= tolerance => current.push(span),
            _ => {
                lines.extend(TextLine::from_spans(std::mem::take(&mut current)));
                current_y = Some(span.y);
                current.push(span);
            }
        }
    }
    lines.extend(TextLine::from_spans(current));

    lines
}

fn average_line_spacing(lines: &[TextLine]) -> f32 {
    let spacings: Vec<f32> = lines
        .windows(2)
        .map(|w| (w[0].y - w[1].y).abs())
        .filter(|s| *s > 0.1)
        .collect();

    if spacings.is_empty() {
        12.0
    } else {
        spacings.iter().sum::<f32>() / spacings.len() as f32
    }
}

fn should_break_block(prev: &TextLine, curr: &TextLine, avg_spacing: f32) -> bool {
    if prev.is_large != curr.is_large {
        return true;
    }
    // Moving up means a new column
    if curr.y > prev.y + prev.font_size * 0.3 {
        return true;
    }
    if (prev.y - curr.y).abs() > avg_spacing * 1.5 {
        return true;
    }
    if (prev.font_size - curr.font_size).abs() > 1.0 {
        return true;
    }
    (prev.x - curr.x).abs() > 20.0
}

/// Detect a two-column layout from a vertical gutter.
///
/// The page is sliced into 3pt strips; the best empty run between 15% and
/// 85% of the text width becomes the gutter if it is at least 12pt wide and
/// both sides hold a fair share of the spans.
fn detect_columns(spans: &[TextSpan]) -> Vec<Column> {
    if spans.is_empty() {
        return vec![];
    }

    let min_x = spans.iter().map(|s| s.x).fold(f32::MAX, f32::min);
    let max_x = spans.iter().map(|s| s.right()).fold(f32::MIN, f32::max);
    let single = vec![Column {
        left: min_x - 10.0,
        right: max_x + 10.0,
        index: 0,
    }];

    let text_width = max_x - min_x;
    if text_width < 250.0 {
        return single;
    }

    let slice_width = 3.0;
    let num_slices = (text_width / slice_width) as usize + 1;
    let mut occupancy = vec![0usize; num_slices];
    for span in spans {
        let start = ((span.x - min_x) / slice_width) as usize;
        let end = ((span.right() - min_x) / slice_width) as usize;
        for slot in occupancy
            .iter_mut()
            .take(end.min(num_slices - 1) + 1)
            .skip(start)
        {
            *slot += 1;
        }
    }

    let center = num_slices / 2;
    let mut best: Option<(usize, usize)> = None;
    let mut run_start = 0;
    let mut run_len = 0;
    let search_end = num_slices * 85 / 100;

    for i in (num_slices * 15 / 100)..=search_end {
        let empty = i < search_end && occupancy[i] == 0;
        if empty {
            if run_len == 0 {
                run_start = i;
            }
            run_len += 1;
            continue;
        }
        if run_len > 0 {
            let better = match best {
                None => true,
                Some((b_start, b_len)) => {
                    let dist = (run_start + run_len / 2).abs_diff(center);
                    let b_dist = (b_start + b_len / 2).abs_diff(center);
                    run_len as f32 > b_len as f32 * 1.5
                        || (run_len as f32 >= b_len as f32 * 0.7 && dist < b_dist)
                }
            };
            if better {
                best = Some((run_start, run_len));
            }
        }
        run_len = 0;
    }

    let Some((gap_start, gap_len)) = best else {
        return single;
    };
    if gap_len as f32 * slice_width < 12.0 {
        return single;
    }

    let gutter = min_x + (gap_start as f32 + gap_len as f32 / 2.0) * slice_width;
    if gutter - min_x < 80.0 || max_x - gutter < 80.0 {
        return single;
    }

    let left = spans
        .iter()
        .filter(|s| s.x + s.width / 2.0 < gutter)
        .count();
    let right = spans.len() - left;
    let min_spans = (spans.len() / 10).max(2);
    if left < min_spans || right < min_spans {
        return single;
    }

    log::debug!("Two columns split at x={:.1}", gutter);
    vec![
        Column {
            left: min_x - 10.0,
            right: gutter,
            index: 0,
        },
        Column {
            left: gutter,
            right: max_x + 10.0,
            index: 1,
        },
    ]
}

/// Everything known about one page's layout.
#[derive(Debug, Clone)]
pub struct PageLayout {
    /// 1-based page number
    pub page_number: u32,
    pub geometry: PageGeometry,
    /// Lines in reading order
    pub lines: Vec<TextLine>,
    pub blocks: Vec<TextBlock>,
    /// Where image XObjects are painted, in paint order
    pub placements: Vec<ImagePlacement>,
    /// Tables found when table detection is enabled
    pub tables: Vec<DetectedTable>,
}

impl PageLayout {
    /// A page with no content.
    pub fn empty(page_number: u32, geometry: PageGeometry) -> Self {
        Self {
            page_number,
            geometry,
            lines: Vec::new(),
            blocks: Vec::new(),
            placements: Vec::new(),
            tables: Vec::new(),
        }
    }

    /// Plain page text: one line per text line.
    pub fn text(&self) -> String {
        self.lines
            .iter()
            .map(|l| l.text())
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn line_bbox(&self, line: &TextLine) -> BoundingBox {
        self.geometry
            .to_top_down(line.x, line.bottom(), line.right(), line.top())
    }

    pub fn block_bbox(&self, block: &TextBlock) -> BoundingBox {
        block
            .lines
            .iter()
            .map(|l| self.line_bbox(l))
            .reduce(|a, b| a.union(&b))
            .unwrap_or_default()
    }

    pub fn table_bbox(&self, table: &DetectedTable) -> BoundingBox {
        self.geometry
            .to_top_down(table.left_x, table.bottom(), table.right_x, table.top())
    }

    /// Where the image XObject `name` is first painted.
    pub fn placement_bbox(&self, name: &str) -> Option<BoundingBox> {
        self.placements
            .iter()
            .find(|p| p.name == name)
            .map(|p| self.geometry.to_top_down(p.left, p.bottom, p.right, p.top))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(text: &str, x: f32, y: f32) -> TextSpan {
        TextSpan::new(text.to_string(), x, y, 12.0, "Helvetica".to_string())
    }

    #[test]
    fn test_font_statistics() {
        let mut stats = FontStatistics::default();
        for _ in 0..100 {
            stats.add_size(12.0);
        }
        for _ in 0..5 {
            stats.add_size(18.0);
        }
        stats.analyze();

        assert!((stats.body_size - 12.0).abs() < 0.1);
        assert!(!stats.is_large(12.0));
        assert!(stats.is_large(18.0));
    }

    #[test]
    fn test_font_statistics_empty() {
        let stats = FontStatistics::from_spans(&[]);
        assert_eq!(stats.body_size, 12.0);
    }

    #[test]
    fn test_text_span_style_detection() {
        let bold = TextSpan::new("T".into(), 0.0, 0.0, 12.0, "Helvetica-Bold".into());
        assert!(bold.is_bold);
        assert!(!bold.is_italic);

        let italic = TextSpan::new("T".into(), 0.0, 0.0, 12.0, "Helvetica-Oblique".into());
        assert!(!italic.is_bold);
        assert!(italic.is_italic);
    }

    #[test]
    fn test_column_contains_span() {
        let col = Column {
            left: 100.0,
            right: 200.0,
            index: 0,
        };
        assert!(col.contains(150.0));
        assert!(!col.contains(201.0));

        let inside = TextSpan {
            width: 50.0,
            ..span("Test", 120.0, 0.0)
        };
        assert!(col.contains_span(&inside));

        // center at 110
        let straddling = TextSpan {
            width: 40.0,
            ..span("Test", 90.0, 0.0)
        };
        assert!(col.contains_span(&straddling));

        let outside = TextSpan {
            width: 30.0,
            ..span("Test", 250.0, 0.0)
        };
        assert!(!col.contains_span(&outside));
    }

    #[test]
    fn test_lines_are_top_down_and_joined() {
        let spans = vec![
            span("second", 72.0, 680.0),
            span("Hello", 72.0, 700.0),
            span("world", 110.0, 700.0),
        ];
        let (lines, _) = LineAssembler::new().assemble(spans);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].text(), "Hello world");
        assert_eq!(lines[1].text(), "second");
    }

    #[test]
    fn test_adjacent_spans_not_spaced() {
        // "Hel" ends exactly where "lo" starts
        let first = span("Hel", 72.0, 700.0);
        let second = span("lo", first.right(), 700.0);
        let line = TextLine::from_spans(vec![first, second]).unwrap();
        assert_eq!(line.text(), "Hello");
    }

    #[test]
    fn test_blocks_split_on_large_gap() {
        let spans = vec![
            span("Para one line one", 72.0, 700.0),
            span("Para one line two", 72.0, 686.0),
            span("Para two", 72.0, 600.0),
        ];
        let (_, blocks) = LineAssembler::new().assemble(spans);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].lines.len(), 2);
        assert_eq!(blocks[1].text(), "Para two");
    }

    #[test]
    fn test_blocks_split_on_larger_font() {
        let mut spans = vec![
            span("Body text one", 72.0, 680.0),
            span("Body text two", 72.0, 666.0),
            span("Body text three", 72.0, 652.0),
        ];
        spans.push(TextSpan::new(
            "Big Title".into(),
            72.0,
            700.0,
            20.0,
            "Helvetica-Bold".into(),
        ));
        let (lines, blocks) = LineAssembler::new().assemble(spans);
        assert!(lines[0].is_large);
        assert_eq!(blocks[0].text(), "Big Title");
    }

    #[test]
    fn test_page_layout_bboxes() {
        let geometry = PageGeometry::new(0.0, 0.0, 600.0, 800.0);
        let (lines, blocks) = LineAssembler::new().assemble(vec![span("Hello", 100.0, 700.0)]);
        let layout = PageLayout {
            lines,
            blocks,
            ..PageLayout::empty(1, geometry)
        };
        let bbox = layout.line_bbox(&layout.lines[0]);
        // top = 700 + 9.6 -> 90.4 from the top edge
        assert!((bbox.y - 90.4).abs() < 0.01);
        assert!((bbox.height - 12.0).abs() < 0.01);
        assert_eq!(layout.block_bbox(&layout.blocks[0]), bbox);
        assert_eq!(layout.text(), "Hello");
    }

    #[test]
    fn test_two_columns_read_left_first() {
        let mut spans = Vec::new();
        for i in 0..6 {
            let y = 700.0 - i as f32 * 14.0;
            spans.push(span("Left column text", 50.0, y));
            spans.push(span("Right column text", 350.0, y));
        }
        let (lines, _) = LineAssembler::new().assemble(spans);
        assert_eq!(lines.len(), 12);
        assert!(lines[..6].iter().all(|l| l.text() == "Left column text"));
        assert!(lines[6..].iter().all(|l| l.text() == "Right column text"));
    }
}
