//! Table detection using text position analysis (Stream mode).
//!
//! Tables are found from text alignment alone: rows are spans sharing a
//! baseline, columns are left edges that line up across rows. No ruling
//! lines are needed.

use std::collections::{HashMap, HashSet};

use super::layout::TextSpan;

/// A detected table region with its content.
#[derive(Debug, Clone)]
pub struct DetectedTable {
    /// Baseline of the first row (user space)
    pub top_y: f32,
    /// Baseline of the last row
    pub bottom_y: f32,
    pub left_x: f32,
    pub right_x: f32,
    /// Column left edges
    pub columns: Vec<f32>,
    pub rows: Vec<TableRowData>,
}

impl DetectedTable {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Ascender line of the first row.
    pub fn top(&self) -> f32 {
        let size = self
            .rows
            .first()
            .map(|r| r.max_font_size())
            .unwrap_or(12.0);
        self.top_y + size * 0.8
    }

    /// Descender line of the last row.
    pub fn bottom(&self) -> f32 {
        let size = self
            .rows
            .last()
            .map(|r| r.max_font_size())
            .unwrap_or(12.0);
        self.bottom_y - size * 0.2
    }

    /// Cell text grid, one `Vec` per row with one entry per column.
    pub fn cells(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|row| {
                let mut cells: Vec<Vec<&str>> = vec![Vec::new(); self.columns.len()];
                for span in &row.spans {
                    let idx = column_for_x(span.x, &self.columns, self.right_x);
                    if let Some(cell) = cells.get_mut(idx) {
                        cell.push(span.text.trim());
                    }
                }
                cells.into_iter().map(|c| c.join(" ")).collect()
            })
            .collect()
    }

    /// Rows as ` | `-separated lines.
    pub fn text(&self) -> String {
        self.cells()
            .iter()
            .map(|row| row.join(" | "))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// A row of text spans in a table.
#[derive(Debug, Clone)]
pub struct TableRowData {
    /// Average baseline of the row
    pub y: f32,
    /// Spans sorted by X
    pub spans: Vec<TextSpan>,
}

impl TableRowData {
    fn max_font_size(&self) -> f32 {
        self.spans.iter().map(|s| s.font_size).fold(0.0, f32::max)
    }
}

/// Table detector configuration.
#[derive(Debug, Clone)]
pub struct TableDetectorConfig {
    pub min_rows: usize,
    pub min_columns: usize,
    /// Above this, the "columns" are most likely words of running text
    pub max_columns: usize,
    /// Y tolerance for grouping spans into rows (fraction of font size)
    pub y_tolerance_factor: f32,
    /// Minimum share of a row's spans sitting on a column edge (0.0-1.0)
    pub min_alignment_ratio: f32,
    /// Minimum distance between two column edges (points)
    pub min_column_gap: f32,
}

impl Default for TableDetectorConfig {
    fn default() -> Self {
        Self {
            min_rows: 2,
            min_columns: 2,
            max_columns: 6,
            y_tolerance_factor: 0.4,
            min_alignment_ratio: 0.3,
            min_column_gap: 15.0,
        }
    }
}

/// Left edges are bucketed at this granularity (points).
const EDGE_BUCKET: f32 = 5.0;

/// Detects tables in a list of text spans.
#[derive(Debug, Clone, Default)]
pub struct TableDetector {
    config: TableDetectorConfig,
}

/// A span tagged with its position in the caller's list.
#[derive(Clone)]
struct Indexed<'a> {
    index: usize,
    span: &'a TextSpan,
}

impl TableDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: TableDetectorConfig) -> Self {
        Self { config }
    }

    /// Detect tables in the given spans.
    ///
    /// Returns the tables and the spans that were not part of any table.
    pub fn detect(&self, spans: Vec<TextSpan>) -> (Vec<DetectedTable>, Vec<TextSpan>) {
        let min_spans = self.config.min_rows * self.config.min_columns;
        if spans.len() < min_spans {
            return (vec![], spans);
        }

        let rows = self.group_into_rows(&spans);
        if rows.len() < self.config.min_rows {
            return (vec![], spans);
        }

        let columns = self.detect_columns(&rows);
        log::debug!("TableDetector: {} rows, column edges {:?}", rows.len(), columns);
        if columns.len() < self.config.min_columns {
            return (vec![], spans);
        }

        let mut tables = Vec::new();
        let mut used: HashSet<usize> = HashSet::new();

        for (start, end) in self.find_table_regions(&rows, &columns) {
            let region = &rows[start..=end];
            let table_columns = self.detect_columns(region);

            if table_columns.len() < self.config.min_columns {
                continue;
            }
            if table_columns.len() > self.config.max_columns {
                log::debug!(
                    "TableDetector: skipping region, too many columns ({} > {})",
                    table_columns.len(),
                    self.config.max_columns
                );
                continue;
            }
            if is_list_pattern(region, &table_columns) {
                log::debug!("TableDetector: skipping region, list pattern");
                continue;
            }

            used.extend(region.iter().flatten().map(|s| s.index));

            let members = || region.iter().flatten().map(|s| s.span);
            let left_x = members().map(|s| s.x).fold(f32::MAX, f32::min);
            let right_x = members().map(|s| s.right()).fold(f32::MIN, f32::max);
            let rows: Vec<TableRowData> = region
                .iter()
                .map(|row| TableRowData {
                    y: row.iter().map(|s| s.span.y).sum::<f32>() / row.len() as f32,
                    spans: row.iter().map(|s| s.span.clone()).collect(),
                })
                .collect();

            tables.push(DetectedTable {
                top_y: rows.first().map(|r| r.y).unwrap_or(0.0),
                bottom_y: rows.last().map(|r| r.y).unwrap_or(0.0),
                left_x,
                right_x,
                columns: table_columns,
                rows,
            });
        }

        let remaining = spans
            .into_iter()
            .enumerate()
            .filter(|(i, _)| !used.contains(i))
            .map(|(_, s)| s)
            .collect();

        (tables, remaining)
    }

    /// Group spans into rows by baseline, top to bottom.
    fn group_into_rows<'a>(&self, spans: &'a [TextSpan]) -> Vec<Vec<Indexed<'a>>> {
        let mut sorted: Vec<Indexed<'a>> = spans
            .iter()
            .enumerate()
            .map(|(index, span)| Indexed { index, span })
            .collect();
        sorted.sort_by(|a, b| {
            b.span
                .y
                .partial_cmp(&a.span.y)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(
                    a.span
                        .x
                        .partial_cmp(&b.span.x)
                        .unwrap_or(std::cmp::Ordering::Equal),
                )
        });

        let mut rows: Vec<Vec<Indexed<'a>>> = Vec::new();
        let mut row_y: Option<f32> = None;

        for item in sorted {
            let tolerance = item.span.font_size * self.config.y_tolerance_factor;
            match (row_y, rows.last_mut()) {
                (Some(y), Some(row)) if (item.span.y - y).abs() <= tolerance => row.push(item),
                _ => {
                    row_y = Some(item.span.y);
                    rows.push(vec![item]);
                }
            }
        }

        rows
    }

    /// Column edges: left-edge buckets shared by enough rows.
    ///
    /// Rows with several spans are the best evidence; when too few exist,
    /// every span's left edge counts.
    fn detect_columns(&self, rows: &[Vec<Indexed<'_>>]) -> Vec<f32> {
        let multi: Vec<&Vec<Indexed<'_>>> = rows.iter().filter(|r| r.len() >= 2).collect();

        let mut edge_counts: HashMap<i32, usize> = HashMap::new();
        let sample_size = if multi.len() >= self.config.min_rows {
            for row in &multi {
                let buckets: HashSet<i32> = row.iter().map(|s| bucket(s.span.x)).collect();
                for b in buckets {
                    *edge_counts.entry(b).or_insert(0) += 1;
                }
            }
            multi.len()
        } else {
            for s in rows.iter().flatten() {
                *edge_counts.entry(bucket(s.span.x)).or_insert(0) += 1;
            }
            rows.len()
        };

        let min_occurrences =
            ((sample_size as f32 * self.config.min_alignment_ratio) as usize).max(2);

        let mut edges: Vec<f32> = edge_counts
            .into_iter()
            .filter(|(_, count)| *count >= min_occurrences)
            .map(|(b, _)| b as f32 * EDGE_BUCKET)
            .collect();
        edges.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let mut merged: Vec<f32> = Vec::new();
        for edge in edges {
            match merged.last() {
                Some(last) if edge - last < self.config.min_column_gap => {}
                _ => merged.push(edge),
            }
        }
        merged
    }

    /// Contiguous runs of well-aligned rows.
    ///
    /// A row belongs to a table only when its spans hit at least
    /// `min_columns` distinct column edges; a single-span line ends the run.
    fn find_table_regions(&self, rows: &[Vec<Indexed<'_>>], columns: &[f32]) -> Vec<(usize, usize)> {
        let mut regions = Vec::new();
        let mut start: Option<usize> = None;

        for (i, row) in rows.iter().enumerate() {
            if aligned_columns(row, columns) >= self.config.min_columns
                && alignment_score(row, columns) >= self.config.min_alignment_ratio
            {
                start.get_or_insert(i);
                continue;
            }
            if let Some(s) = start.take() {
                if i - s >= self.config.min_rows {
                    regions.push((s, i - 1));
                }
            }
        }
        if let Some(s) = start {
            if rows.len() - s >= self.config.min_rows {
                regions.push((s, rows.len() - 1));
            }
        }

        regions
    }
}

fn bucket(x: f32) -> i32 {
    (x / EDGE_BUCKET).round() as i32
}

/// Share of a row's spans starting within 5pt of a column edge.
fn alignment_score(row: &[Indexed<'_>], columns: &[f32]) -> f32 {
    if row.is_empty() || columns.is_empty() {
        return 0.0;
    }
    let aligned = row
        .iter()
        .filter(|s| columns.iter().any(|c| (s.span.x - c).abs() <= 5.0))
        .count();
    aligned as f32 / row.len() as f32
}

/// Number of distinct column edges that some span of the row starts at.
fn aligned_columns(row: &[Indexed<'_>], columns: &[f32]) -> usize {
    columns
        .iter()
        .filter(|c| row.iter().any(|s| (s.span.x - **c).abs() <= 5.0))
        .count()
}

/// Column index for a left edge: the column whose range contains it
/// (with 10pt slack), else the nearest edge.
fn column_for_x(x: f32, columns: &[f32], right_x: f32) -> usize {
    for (i, &start) in columns.iter().enumerate() {
        let end = columns.get(i + 1).copied().unwrap_or(right_x + 100.0);
        if x >= start - 10.0 && x < end - 10.0 {
            return i;
        }
    }
    columns
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| {
            (x - **a)
                .abs()
                .partial_cmp(&(x - **b).abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .map(|(i, _)| i)
        .unwrap_or(0)
}

/// Numbered and bulleted lists look like two-column tables when the marker
/// and the item text are separate spans.
fn is_list_pattern(rows: &[Vec<Indexed<'_>>], columns: &[f32]) -> bool {
    if columns.len() < 2 || rows.is_empty() {
        return false;
    }

    let mut bullets = 0;
    let mut numbers = 0;
    for row in rows {
        let first = row
            .iter()
            .min_by(|a, b| {
                a.span
                    .x
                    .partial_cmp(&b.span.x)
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
        if let Some(s) = first {
            let text = s.span.text.trim();
            if is_bullet_marker(text) {
                bullets += 1;
            } else if is_number_marker(text) {
                numbers += 1;
            }
        }
    }

    let bullet_ratio = bullets as f32 / rows.len() as f32;
    let marker_ratio = (bullets + numbers) as f32 / rows.len() as f32;

    // Numbered first columns are common in real tables, so numbers alone
    // only disqualify two-column regions.
    bullet_ratio >= 0.5 || (columns.len() == 2 && marker_ratio >= 0.5)
}

fn is_bullet_marker(text: &str) -> bool {
    matches!(
        text.trim(),
        "-" | "–" | "—" | "•" | "·" | "*" | "○" | "▪" | "◦" | "▸" | "▹" | "►" | "■" | "●" | "□"
            | "◆" | "◇" | "▶" | "▷" | "➤" | "➜"
    )
}

/// "1.", "12)", "3", "a.", "B)".
fn is_number_marker(text: &str) -> bool {
    let cleaned: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    if cleaned.is_empty() {
        return false;
    }
    if cleaned.parse::<u32>().is_ok() {
        return true;
    }

    let (body, suffix) = cleaned.split_at(cleaned.len() - 1);
    if suffix != "." && suffix != ")" || body.is_empty() {
        return false;
    }
    body.chars().all(|c| c.is_ascii_digit())
        || (body.chars().count() == 1 && body.chars().all(char::is_alphabetic))
}
