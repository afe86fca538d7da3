//! Table detection from text alignment.
//!
//! Tables without ruling lines are found by grouping spans into rows and
//! looking for left edges that line up over several consecutive rows.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use crate::model::{Table, TableCell, TableRow};

use super::content::TextSpan;

/// Spans whose left edges fall in the same bucket share a column edge.
const EDGE_BUCKET: f32 = 5.0;
/// Distance within which a span counts as aligned to a column edge.
const ALIGN_TOLERANCE: f32 = 5.0;

/// A table region found on a page.
#[derive(Debug, Clone)]
pub struct DetectedTable {
    /// Baseline of the first row
    pub top_y: f32,
    /// Baseline of the last row
    pub bottom_y: f32,
    /// Left X boundary
    pub left_x: f32,
    /// Right X boundary
    pub right_x: f32,
    /// Column left edges, ascending
    pub columns: Vec<f32>,
    /// Rows of spans, top to bottom, each sorted by X
    pub rows: Vec<Vec<TextSpan>>,
}

/// Table detector configuration.
#[derive(Debug, Clone)]
pub struct TableDetectorConfig {
    /// Minimum number of rows to consider as table
    pub min_rows: usize,
    /// Minimum number of columns to consider as table
    pub min_columns: usize,
    /// Maximum number of columns (above this, likely word-level splitting)
    pub max_columns: usize,
    /// Y tolerance for grouping spans into rows (fraction of font size)
    pub y_tolerance_factor: f32,
    /// Minimum share of rows an edge must appear in
    pub min_alignment_ratio: f32,
    /// Minimum gap between column edges (points)
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

/// A row under construction: span indices plus average baseline.
#[derive(Debug, Clone)]
struct Row {
    y: f32,
    spans: Vec<usize>,
}

/// Detects tables in the spans of one page.
#[derive(Debug, Clone, Default)]
pub struct TableDetector {
    config: TableDetectorConfig,
}

impl TableDetector {
    /// Create a detector with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a detector with custom configuration.
    pub fn with_config(config: TableDetectorConfig) -> Self {
        Self { config }
    }

    /// Split spans into detected tables and the spans outside any table.
    pub fn detect(&self, spans: Vec<TextSpan>) -> (Vec<DetectedTable>, Vec<TextSpan>) {
        if spans.len() < self.config.min_rows * self.config.min_columns {
            return (Vec::new(), spans);
        }

        let rows = self.group_into_rows(&spans);
        if rows.len() < self.config.min_rows {
            return (Vec::new(), spans);
        }

        let columns = self.detect_columns(&spans, &rows);
        if columns.len() < self.config.min_columns {
            return (Vec::new(), spans);
        }

        let mut used: HashSet<usize> = HashSet::new();
        let mut regions = Vec::new();

        for (start, end) in self.find_table_regions(&spans, &rows, &columns) {
            let region = &rows[start..=end];
            let region_columns = self.detect_columns(&spans, region);

            if region_columns.len() < self.config.min_columns {
                continue;
            }
            if region_columns.len() > self.config.max_columns {
                log::debug!(
                    "Skipping table region with {} columns (max {})",
                    region_columns.len(),
                    self.config.max_columns
                );
                continue;
            }
            if self.is_list_pattern(&spans, region, &region_columns) {
                log::debug!("Skipping table region that looks like a list");
                continue;
            }

            used.extend(region.iter().flat_map(|r| r.spans.iter().copied()));
            regions.push((region.to_vec(), region_columns));
        }

        if regions.is_empty() {
            return (Vec::new(), spans);
        }

        let mut slots: Vec<Option<TextSpan>> = spans.into_iter().map(Some).collect();
        let tables = regions
            .into_iter()
            .map(|(rows, columns)| {
                let top_y = rows.first().map(|r| r.y).unwrap_or(0.0);
                let bottom_y = rows.last().map(|r| r.y).unwrap_or(0.0);
                let rows: Vec<Vec<TextSpan>> = rows
                    .iter()
                    .map(|row| row.spans.iter().filter_map(|&i| slots[i].take()).collect())
                    .collect();
                build_detected(rows, columns, top_y, bottom_y)
            })
            .collect();

        let remaining = slots
            .into_iter()
            .enumerate()
            .filter(|(i, _)| !used.contains(i))
            .filter_map(|(_, span)| span)
            .collect();

        (tables, remaining)
    }

    /// Group span indices into rows by baseline, top to bottom.
    fn group_into_rows(&self, spans: &[TextSpan]) -> Vec<Row> {
        let mut order: Vec<usize> = (0..spans.len()).collect();
        order.sort_by(|&a, &b| {
            spans[b]
                .y
                .partial_cmp(&spans[a].y)
                .unwrap_or(Ordering::Equal)
                .then(spans[a].x.partial_cmp(&spans[b].x).unwrap_or(Ordering::Equal))
        });

        let mut rows: Vec<Row> = Vec::new();
        let mut current: Vec<usize> = Vec::new();
        let mut current_y: Option<f32> = None;

        for i in order {
            let span = &spans[i];
            let tolerance = span.font_size * self.config.y_tolerance_factor;
            match current_y {
                Some(y) if (span.y - y).abs() <= tolerance => current.push(i),
                _ => {
                    if !current.is_empty() {
                        rows.push(make_row(spans, std::mem::take(&mut current)));
                    }
                    current_y = Some(span.y);
                    current.push(i);
                }
            }
        }
        if !current.is_empty() {
            rows.push(make_row(spans, current));
        }
        rows
    }

    /// Left edges shared by enough multi-span rows, merged when closer than
    /// the minimum column gap.
    fn detect_columns(&self, spans: &[TextSpan], rows: &[Row]) -> Vec<f32> {
        let multi: Vec<&Row> = rows.iter().filter(|r| r.spans.len() >= 2).collect();
        if multi.len() < self.config.min_rows {
            return Vec::new();
        }

        let mut edge_counts: HashMap<i32, usize> = HashMap::new();
        for row in &multi {
            let buckets: HashSet<i32> = row
                .spans
                .iter()
                .map(|&i| (spans[i].x / EDGE_BUCKET).round() as i32)
                .collect();
            for bucket in buckets {
                *edge_counts.entry(bucket).or_insert(0) += 1;
            }
        }

        let min_occurrences =
            ((multi.len() as f32 * self.config.min_alignment_ratio) as usize).max(2);

        let mut edges: Vec<f32> = edge_counts
            .into_iter()
            .filter(|(_, count)| *count >= min_occurrences)
            .map(|(bucket, _)| bucket as f32 * EDGE_BUCKET)
            .collect();
        edges.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));

        let mut merged: Vec<f32> = Vec::new();
        for edge in edges {
            match merged.last() {
                Some(&last) if edge - last < self.config.min_column_gap => {}
                _ => merged.push(edge),
            }
        }
        merged
    }

    /// Runs of consecutive rows whose spans sit on at least two column edges.
    fn find_table_regions(
        &self,
        spans: &[TextSpan],
        rows: &[Row],
        columns: &[f32],
    ) -> Vec<(usize, usize)> {
        let mut regions = Vec::new();
        let mut start: Option<usize> = None;

        for (i, row) in rows.iter().enumerate() {
            if self.is_table_row(spans, row, columns) {
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

    fn is_table_row(&self, spans: &[TextSpan], row: &Row, columns: &[f32]) -> bool {
        let mut hit_columns = HashSet::new();
        let mut aligned = 0;
        for &i in &row.spans {
            if let Some(col) = columns
                .iter()
                .position(|c| (spans[i].x - c).abs() <= ALIGN_TOLERANCE)
            {
                hit_columns.insert(col);
                aligned += 1;
            }
        }
        hit_columns.len() >= 2
            && aligned as f32 / row.spans.len() as f32 >= self.config.min_alignment_ratio
    }

    /// Numbered or bulleted lists split into marker and text spans look like
    /// two-column tables.
    fn is_list_pattern(&self, spans: &[TextSpan], rows: &[Row], columns: &[f32]) -> bool {
        if rows.is_empty() {
            return false;
        }

        let (mut bullets, mut numbers) = (0usize, 0usize);
        for row in rows {
            let first = row.spans.iter().map(|&i| &spans[i]).min_by(|a, b| {
                a.x.partial_cmp(&b.x).unwrap_or(Ordering::Equal)
            });
            if let Some(span) = first {
                if is_bullet_marker(&span.text) {
                    bullets += 1;
                } else if is_number_marker(&span.text) {
                    numbers += 1;
                }
            }
        }

        let total = rows.len() as f32;
        bullets as f32 / total >= 0.5
            || (columns.len() == 2 && (bullets + numbers) as f32 / total >= 0.5)
    }

    /// Convert a detected region into a model table. The first row becomes
    /// the header when the table has more than one row.
    pub fn to_table_model(&self, detected: &DetectedTable) -> Table {
        let columns = &detected.columns;
        let mut table = Table::new();
        table.header_rows = u8::from(detected.rows.len() > 1);

        for (row_idx, row) in detected.rows.iter().enumerate() {
            let mut contents: Vec<Vec<&str>> = vec![Vec::new(); columns.len()];
            for span in row {
                let col = find_column(span.x, columns);
                contents[col].push(span.text.trim());
            }

            let cells: Vec<TableCell> = contents
                .into_iter()
                .map(|parts| TableCell::text(parts.join(" ")))
                .collect();

            table.add_row(if row_idx == 0 && table.header_rows > 0 {
                TableRow::header(cells)
            } else {
                TableRow::new(cells)
            });
        }

        table.column_widths = columns
            .iter()
            .enumerate()
            .map(|(i, &left)| {
                let right = columns.get(i + 1).copied().unwrap_or(detected.right_x);
                (right - left).max(EDGE_BUCKET)
            })
            .collect();

        table
    }
}

fn make_row(spans: &[TextSpan], indices: Vec<usize>) -> Row {
    let y = indices.iter().map(|&i| spans[i].y).sum::<f32>() / indices.len() as f32;
    Row { y, spans: indices }
}

fn build_detected(
    rows: Vec<Vec<TextSpan>>,
    columns: Vec<f32>,
    top_y: f32,
    bottom_y: f32,
) -> DetectedTable {
    let all = || rows.iter().flatten();
    let left_x = all().map(|s| s.x).fold(f32::INFINITY, f32::min);
    let right_x = all().map(TextSpan::right).fold(f32::NEG_INFINITY, f32::max);

    DetectedTable {
        top_y,
        bottom_y,
        left_x,
        right_x,
        columns,
        rows,
    }
}

/// Index of the column whose range holds `x`, allowing spans to start a
/// little before their column edge.
fn find_column(x: f32, columns: &[f32]) -> usize {
    let slack = 10.0;
    columns
        .iter()
        .rposition(|&left| x >= left - slack)
        .unwrap_or(0)
}

fn is_bullet_marker(text: &str) -> bool {
    matches!(
        text.trim(),
        "-" | "–" | "—" | "•" | "·" | "*" | "○" | "▪" | "◦" | "▸" | "►" | "■" | "●" | "□" | "◆" | "▶" | "➤"
    )
}

/// "1.", "12)", "3", "a.", "B)"
fn is_number_marker(text: &str) -> bool {
    let cleaned: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    if cleaned.is_empty() {
        return false;
    }

    let digits = cleaned.chars().take_while(char::is_ascii_digit).count();
    let rest = &cleaned[digits..];
    if digits > 0 && matches!(rest, "" | "." | ")") {
        return true;
    }

    let mut chars = cleaned.chars();
    matches!(
        (chars.next(), chars.next(), chars.next()),
        (Some(c), Some('.' | ')'), None) if c.is_alphabetic()
    )
}
