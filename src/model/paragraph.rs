//! Paragraph and text-level types.

use serde::{Deserialize, Serialize};

/// A paragraph of styled text runs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Paragraph {
    /// Text runs in reading order
    pub runs: Vec<TextRun>,

    /// Paragraph style
    pub style: ParagraphStyle,
}

impl Paragraph {
    /// Create a new empty paragraph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a paragraph with a single unstyled run.
    pub fn with_text(text: impl Into<String>) -> Self {
        let mut p = Self::new();
        p.push_run(TextRun::new(text));
        p
    }

    /// Create a heading paragraph.
    pub fn heading(text: impl Into<String>, level: u8) -> Self {
        let mut p = Self::with_text(text);
        p.style.heading_level = Some(level.clamp(1, 6));
        p
    }

    /// Append a run, merging it into the previous run when both share the
    /// same style.
    pub fn push_run(&mut self, run: TextRun) {
        if run.text.is_empty() {
            return;
        }
        match self.runs.last_mut() {
            Some(last) if last.style == run.style => last.text.push_str(&run.text),
            _ => self.runs.push(run),
        }
    }

    /// Concatenated text of all runs.
    pub fn plain_text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }

    /// Check if the paragraph has no visible text.
    pub fn is_empty(&self) -> bool {
        self.runs.iter().all(|r| r.text.trim().is_empty())
    }

    /// Get the heading level (1-6) or None.
    pub fn heading_level(&self) -> Option<u8> {
        self.style.heading_level
    }
}

/// Paragraph-level style.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParagraphStyle {
    /// Heading level (1-6), None for body text
    pub heading_level: Option<u8>,

    /// Left indentation relative to the page's text margin, in points
    pub indent: f32,
}

/// A run of text with consistent styling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextRun {
    /// The text content
    pub text: String,

    /// Text styling
    pub style: TextStyle,
}

impl TextRun {
    /// Create a new text run with default style.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: TextStyle::default(),
        }
    }

    /// Create a run with the given style.
    pub fn styled(text: impl Into<String>, style: TextStyle) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }
}

/// Character formatting carried over from the PDF font.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextStyle {
    /// Bold text
    pub bold: bool,

    /// Italic text
    pub italic: bool,

    /// Font family name with subset prefix and style suffix removed
    pub font_name: Option<String>,

    /// Font size in points, rounded to half points
    pub font_size: Option<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paragraph_text() {
        let p = Paragraph::with_text("Hello world");
        assert_eq!(p.plain_text(), "Hello world");
        assert!(!p.is_empty());
        assert_eq!(p.heading_level(), None);
    }

    #[test]
    fn test_heading_level_clamped() {
        assert_eq!(Paragraph::heading("Title", 9).heading_level(), Some(6));
        assert_eq!(Paragraph::heading("Title", 0).heading_level(), Some(1));
    }

    #[test]
    fn test_push_run_merges_same_style() {
        let mut p = Paragraph::new();
        p.push_run(TextRun::new("Hello "));
        p.push_run(TextRun::new("world"));
        assert_eq!(p.runs.len(), 1);

        let bold = TextStyle {
            bold: true,
            ..Default::default()
        };
        p.push_run(TextRun::styled("!", bold));
        assert_eq!(p.runs.len(), 2);
        assert_eq!(p.plain_text(), "Hello world!");
    }

    #[test]
    fn test_push_run_skips_empty() {
        let mut p = Paragraph::new();
        p.push_run(TextRun::new(""));
        assert!(p.runs.is_empty());
        assert!(p.is_empty());
    }
}
