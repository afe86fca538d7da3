//! Layout analysis: spans into lines, lines into blocks, blocks into
//! paragraphs.
//!
//! The analyzer works on the spans of one page and needs no access to the
//! PDF itself, so pages can be laid out in parallel once the document-wide
//! [`FontStatistics`] are known.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::model::{Paragraph, TextRun, TextStyle};
use crate::text::{is_spaceless_script_char, line_join, LineJoin};

use super::content::TextSpan;

/// Body size assumed when a document has no text at all.
const DEFAULT_BODY_SIZE: f32 = 12.0;
/// A heading must be at least this much larger than body text.
const HEADING_SIZE_MARGIN: f32 = 1.5;

/// Widest text area considered for column detection (the PDF page size limit).
const MAX_COLUMN_SPAN: f32 = 14_400.0;

/// Spans sharing a baseline.
#[derive(Debug, Clone)]
pub struct TextLine {
    /// Spans sorted by X position
    pub spans: Vec<TextSpan>,
    /// Baseline of the first span
    pub y: f32,
    /// Leftmost X position
    pub x: f32,
    /// Dominant font size, weighted by text length
    pub font_size: f32,
    /// Heading level assigned from the font size hierarchy
    pub heading_level: Option<u8>,
}

impl TextLine {
    /// Build a line from spans, sorting them left to right.
    pub fn from_spans(mut spans: Vec<TextSpan>) -> Self {
        spans.sort_by(|a, b| a.x.partial_cmp(&b.x).unwrap_or(Ordering::Equal));

        let total_chars: usize = spans.iter().map(|s| s.text.chars().count()).sum();
        let weighted: f32 = spans
            .iter()
            .map(|s| s.font_size * s.text.chars().count() as f32)
            .sum();
        let font_size = if total_chars > 0 {
            weighted / total_chars as f32
        } else {
            spans.first().map(|s| s.font_size).unwrap_or(0.0)
        };

        Self {
            y: spans.first().map(|s| s.y).unwrap_or(0.0),
            x: spans.first().map(|s| s.x).unwrap_or(0.0),
            spans,
            font_size,
            heading_level: None,
        }
    }

    /// Text of the line with spaces inserted at visual gaps.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for (i, span) in self.spans.iter().enumerate() {
            if i > 0 && space_between(&self.spans[i - 1], span) {
                out.push(' ');
            }
            out.push_str(&span.text);
        }
        out
    }

    /// Whether more than half of the characters are bold.
    pub fn is_bold(&self) -> bool {
        let (bold, total) = self.spans.iter().fold((0, 0), |(bold, total), s| {
            let n = s.text.chars().count();
            (bold + if s.is_bold { n } else { 0 }, total + n)
        });
        total > 0 && bold * 2 > total
    }
}

/// Whether a space separates two adjacent spans of a line.
///
/// A gap wider than a fifth of the average glyph width counts as a word
/// break, except between characters of scripts written without spaces.
fn space_between(prev: &TextSpan, span: &TextSpan) -> bool {
    if prev.text.ends_with([' ', '\u{00A0}']) || span.text.starts_with([' ', '\u{00A0}']) {
        return false;
    }

    let chars = span.text.chars().count();
    let avg_char_width = if chars > 0 && span.width > 0.0 {
        span.width / chars as f32
    } else {
        span.font_size * 0.5
    };
    if span.x - prev.right() <= avg_char_width * 0.2 {
        return false;
    }

    let prev_cjk = prev.text.chars().last().is_some_and(is_spaceless_script_char);
    let curr_cjk = span.text.chars().next().is_some_and(is_spaceless_script_char);
    !(prev_cjk && curr_cjk)
}

/// Consecutive lines forming one paragraph or heading.
#[derive(Debug, Clone)]
pub struct TextBlock {
    /// Lines from top to bottom
    pub lines: Vec<TextLine>,
    /// Heading level (1-6), None for body text
    pub heading_level: Option<u8>,
}

impl TextBlock {
    fn new(lines: Vec<TextLine>) -> Self {
        let heading_level = lines.iter().filter_map(|l| l.heading_level).min();
        Self {
            lines,
            heading_level,
        }
    }

    /// Baseline of the first line.
    pub fn top(&self) -> f32 {
        self.lines.first().map(|l| l.y).unwrap_or(0.0)
    }

    /// Leftmost X of the block.
    pub fn left(&self) -> f32 {
        self.lines
            .iter()
            .map(|l| l.x)
            .min_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal))
            .unwrap_or(0.0)
    }

    /// Text of the block, lines joined as in a reflowed paragraph.
    pub fn text(&self) -> String {
        self.to_paragraph(0.0).plain_text()
    }

    /// Convert to a model paragraph with styled runs.
    ///
    /// `margin` is the page's left text margin; the paragraph indent is
    /// measured from it.
    pub fn to_paragraph(&self, margin: f32) -> Paragraph {
        let mut para = Paragraph::new();

        for line in &self.lines {
            for (i, span) in line.spans.iter().enumerate() {
                let text = if i == 0 {
                    if let Some(last) = para.runs.last_mut() {
                        attach_line(&mut last.text, &span.text);
                    }
                    span.text.trim_start()
                } else {
                    if space_between(&line.spans[i - 1], span) {
                        if let Some(last) = para.runs.last_mut() {
                            last.text.push(' ');
                        }
                    }
                    span.text.as_str()
                };
                para.push_run(TextRun::styled(text, span_style(span)));
            }
        }

        if let Some(last) = para.runs.last_mut() {
            let len = last.text.trim_end().len();
            last.text.truncate(len);
        }
        para.runs.retain(|r| !r.text.is_empty());

        para.style.heading_level = self.heading_level;
        para.style.indent = (self.left() - margin).max(0.0);
        para
    }
}

/// Prepare the end of a paragraph for the text of its next line.
fn attach_line(prev: &mut String, next: &str) {
    let join = line_join(prev, next);
    let len = prev.trim_end().len();
    prev.truncate(len);
    match join {
        LineJoin::Dehyphenate => {
            prev.pop();
        }
        LineJoin::Space => prev.push(' '),
        LineJoin::Direct => {}
    }
}

fn span_style(span: &TextSpan) -> TextStyle {
    let family = span.font_family();
    TextStyle {
        bold: span.is_bold,
        italic: span.is_italic,
        font_name: (!family.is_empty() && family != "Unknown").then(|| family.to_string()),
        font_size: (span.font_size > 0.0).then(|| (span.font_size * 2.0).round() / 2.0),
    }
}

/// A text column of the page layout.
#[derive(Debug, Clone)]
pub struct Column {
    /// Left boundary X coordinate
    pub left: f32,
    /// Right boundary X coordinate
    pub right: f32,
    /// Column index (0 = leftmost)
    pub index: usize,
}

impl Column {
    /// Check if an X coordinate falls within this column.
    pub fn contains(&self, x: f32) -> bool {
        x >= self.left && x <= self.right
    }

    /// A span belongs to the column holding its left edge or its center.
    pub fn contains_span(&self, span: &TextSpan) -> bool {
        self.contains(span.x) || self.contains(span.x + span.width / 2.0)
    }
}

/// Document-wide font size distribution, used to find headings.
#[derive(Debug, Clone, Default)]
pub struct FontStatistics {
    /// Most common font size by character count
    pub body_size: f32,
    /// Sizes noticeably larger than body text, largest first
    pub heading_sizes: Vec<f32>,
    /// Character counts per font size (tenths of a point)
    pub size_histogram: HashMap<i32, usize>,
}

impl FontStatistics {
    /// Record `weight` characters set at `size`.
    pub fn add_size(&mut self, size: f32, weight: usize) {
        let key = (size * 10.0).round() as i32;
        *self.size_histogram.entry(key).or_insert(0) += weight;
    }

    /// Record a span.
    pub fn add_span(&mut self, span: &TextSpan) {
        self.add_size(span.font_size, span.text.chars().count());
    }

    /// Compute the body size and the heading size ladder.
    pub fn analyze(&mut self) {
        let body_key = self
            .size_histogram
            .iter()
            .max_by(|a, b| a.1.cmp(b.1).then(b.0.cmp(a.0)))
            .map(|(key, _)| *key);

        self.body_size = match body_key {
            Some(key) => key as f32 / 10.0,
            None => DEFAULT_BODY_SIZE,
        };

        let mut larger: Vec<f32> = self
            .size_histogram
            .keys()
            .map(|k| *k as f32 / 10.0)
            .filter(|size| *size > self.body_size + 0.5)
            .collect();
        larger.sort_by(|a, b| b.partial_cmp(a).unwrap_or(Ordering::Equal));
        self.heading_sizes = larger;
    }

    /// Heading level for a font size, None for body text.
    pub fn heading_level(&self, font_size: f32) -> Option<u8> {
        if font_size < self.body_size + HEADING_SIZE_MARGIN {
            return None;
        }
        let level = self
            .heading_sizes
            .iter()
            .position(|&size| font_size >= size - 0.5)
            .map(|i| (i + 1).min(6) as u8)
            .unwrap_or(5);
        Some(level)
    }
}

/// Lays out the spans of one page into text blocks.
pub struct LayoutAnalyzer<'s> {
    font_stats: &'s FontStatistics,
}

impl<'s> LayoutAnalyzer<'s> {
    /// Create an analyzer using document-wide font statistics.
    pub fn new(font_stats: &'s FontStatistics) -> Self {
        Self { font_stats }
    }

    /// Group spans into blocks in reading order.
    ///
    /// In a two-column layout the left column is read completely before the
    /// right one.
    pub fn analyze(&self, spans: Vec<TextSpan>) -> Vec<TextBlock> {
        let columns = self.detect_columns(&spans);
        log::debug!("Detected {} column(s)", columns.len());

        if columns.len() <= 1 {
            return self.blocks_from_spans(spans);
        }

        let mut column_spans: Vec<Vec<TextSpan>> = vec![Vec::new(); columns.len()];
        for span in spans {
            let idx = columns
                .iter()
                .position(|c| c.contains_span(&span))
                .unwrap_or(0);
            column_spans[idx].push(span);
        }

        column_spans
            .into_iter()
            .flat_map(|spans| self.blocks_from_spans(spans))
            .collect()
    }

    fn blocks_from_spans(&self, spans: Vec<TextSpan>) -> Vec<TextBlock> {
        let mut lines = group_lines(spans);
        for line in &mut lines {
            line.heading_level = self.font_stats.heading_level(line.font_size);
        }
        group_blocks(lines)
    }

    /// Find a vertical gutter splitting the page into two columns.
    pub fn detect_columns(&self, spans: &[TextSpan]) -> Vec<Column> {
        if spans.is_empty() {
            return Vec::new();
        }
        let min_x = spans.iter().map(|s| s.x).fold(f32::INFINITY, f32::min);
        let max_x = spans.iter().map(|s| s.right()).fold(f32::NEG_INFINITY, f32::max);

        let single = vec![Column {
            left: min_x - 10.0,
            right: max_x + 10.0,
            index: 0,
        }];

        let width = max_x - min_x;
        if width < 250.0 {
            return single;
        }

        const SLICE: f32 = 3.0;
        if !width.is_finite() || width > MAX_COLUMN_SPAN {
            log::debug!("Text spans {:.0}pt, single column", width);
            return single;
        }
        let slices = (width / SLICE) as usize + 1;
        let mut occupancy = vec![0usize; slices];
        for span in spans {
            let start = ((span.x - min_x) / SLICE) as usize;
            let end = (((span.right() - min_x) / SLICE) as usize).min(slices - 1);
            for slot in occupancy.iter_mut().take(end + 1).skip(start) {
                *slot += 1;
            }
        }

        // Empty runs of slices inside the middle 70% of the text area
        let (search_start, search_end) = (slices * 15 / 100, slices * 85 / 100);
        let mut gaps: Vec<(usize, usize)> = Vec::new();
        let mut run_start = None;
        for (i, &count) in occupancy.iter().enumerate().take(search_end).skip(search_start) {
            match (count, run_start) {
                (0, None) => run_start = Some(i),
                (0, Some(_)) => {}
                (_, Some(start)) => {
                    gaps.push((start, i - start));
                    run_start = None;
                }
                (_, None) => {}
            }
        }
        if let Some(start) = run_start {
            gaps.push((start, search_end - start));
        }

        // Prefer wide gutters, then ones close to the center
        let center = slices as f32 / 2.0;
        let mut best: Option<(usize, usize)> = None;
        for (start, len) in gaps {
            let gap_width = len as f32 * SLICE;
            if gap_width < 10.0 {
                continue;
            }
            let dist = ((start + len / 2) as f32 - center).abs();
            best = match best {
                None => Some((start, len)),
                Some((b_start, b_len)) => {
                    let best_width = b_len as f32 * SLICE;
                    let best_dist = ((b_start + b_len / 2) as f32 - center).abs();
                    if gap_width > best_width * 1.5
                        || (gap_width >= best_width * 0.7 && dist < best_dist)
                    {
                        Some((start, len))
                    } else {
                        best
                    }
                }
            };
        }

        let Some((start, len)) = best else {
            return single;
        };
        if (len as f32) * SLICE < 12.0 {
            return single;
        }

        let gutter = min_x + (start as f32 + len as f32 / 2.0) * SLICE;
        if gutter - min_x < 80.0 || max_x - gutter < 80.0 {
            log::debug!("Column too narrow at gutter {:.1}, single column", gutter);
            return single;
        }

        let left = spans.iter().filter(|s| s.x + s.width / 2.0 < gutter).count();
        let right = spans.len() - left;
        let min_spans = (spans.len() / 10).max(2);
        if left < min_spans || right < min_spans {
            log::debug!("Spans too imbalanced ({} / {}), single column", left, right);
            return single;
        }

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
}

/// Group spans into lines, top to bottom.
pub fn group_lines(mut spans: Vec<TextSpan>) -> Vec<TextLine> {
    spans.sort_by(|a, b| {
        b.y.partial_cmp(&a.y)
            .unwrap_or(Ordering::Equal)
            .then(a.x.partial_cmp(&b.x).unwrap_or(Ordering::Equal))
    });

    let mut lines = Vec::new();
    let mut current: Vec<TextSpan> = Vec::new();
    let mut current_y: Option<f32> = None;

    for span in spans {
        let tolerance = span.font_size * 0.3;
        match current_y {
            Some(y) if (span.y - y).abs() <= tolerance => current.push(span),
            _ => {
                if !current.is_empty() {
                    lines.push(TextLine::from_spans(std::mem::take(&mut current)));
                }
                current_y = Some(span.y);
                current.push(span);
            }
        }
    }
    if !current.is_empty() {
        lines.push(TextLine::from_spans(current));
    }
    lines
}

/// Group lines into blocks, breaking on spacing, size, indentation and
/// heading changes.
pub fn group_blocks(lines: Vec<TextLine>) -> Vec<TextBlock> {
    let avg_spacing = average_line_spacing(&lines);
    let mut blocks = Vec::new();
    let mut current: Vec<TextLine> = Vec::new();

    for line in lines {
        if let Some(prev) = current.last() {
            if should_break_block(prev, &line, avg_spacing) {
                blocks.push(TextBlock::new(std::mem::take(&mut current)));
            }
        }
        current.push(line);
    }
    if !current.is_empty() {
        blocks.push(TextBlock::new(current));
    }
    blocks
}

fn average_line_spacing(lines: &[TextLine]) -> f32 {
    let spacings: Vec<f32> = lines
        .windows(2)
        .map(|w| (w[0].y - w[1].y).abs())
        .filter(|s| *s > 0.1)
        .collect();
    if spacings.is_empty() {
        return DEFAULT_BODY_SIZE;
    }
    spacings.iter().sum::<f32>() / spacings.len() as f32
}

fn should_break_block(prev: &TextLine, curr: &TextLine, avg_spacing: f32) -> bool {
    if prev.heading_level != curr.heading_level {
        return true;
    }
    let spacing = (prev.y - curr.y).abs();
    spacing > avg_spacing * 1.5
        || spacing > curr.font_size.max(prev.font_size) * 2.5
        || (prev.font_size - curr.font_size).abs() > 1.0
        || (prev.x - curr.x).abs() > 20.0
}
