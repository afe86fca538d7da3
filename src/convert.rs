//! PDF to DOCX conversion.
//!
//! # Example
//!
//! ```no_run
//! use doctrans::convert::{pdf_to_docx, ConvertOptions};
//!
//! fn main() -> doctrans::Result<()> {
//!     let summary = pdf_to_docx("paper.pdf", "paper.docx", &ConvertOptions::default())?;
//!     println!("{} pages, {} paragraphs", summary.pages, summary.paragraphs);
//!     Ok(())
//! }
//! ```

use std::path::Path;

use crate::docx::{DocxWriter, WriterOptions};
use crate::error::Result;
use crate::parser::{PageSelection, ParseOptions, PdfParser};

/// Options for PDF to DOCX conversion.
#[derive(Debug, Clone, Default)]
pub struct ConvertOptions {
    /// PDF parsing options
    pub parse: ParseOptions,

    /// DOCX rendering options
    pub writer: WriterOptions,
}

impl ConvertOptions {
    /// Create new conversion options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set parsing options.
    pub fn with_parse_options(mut self, options: ParseOptions) -> Self {
        self.parse = options;
        self
    }

    /// Set rendering options.
    pub fn with_writer_options(mut self, options: WriterOptions) -> Self {
        self.writer = options;
        self
    }

    /// Convert only the selected pages.
    pub fn with_pages(mut self, pages: PageSelection) -> Self {
        self.parse.pages = pages;
        self
    }

    /// Skip pages whose content cannot be read instead of failing.
    pub fn lenient(mut self) -> Self {
        self.parse = self.parse.lenient();
        self
    }

    /// Lay out pages on the calling thread only.
    pub fn sequential(mut self) -> Self {
        self.parse = self.parse.sequential();
        self
    }
}

/// What a conversion produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConvertSummary {
    /// Pages converted
    pub pages: usize,
    /// Paragraphs written
    pub paragraphs: usize,
    /// Tables written
    pub tables: usize,
}

/// Convert the PDF at `input` into a DOCX file at `output`, overwriting it.
pub fn pdf_to_docx<P, Q>(input: P, output: Q, options: &ConvertOptions) -> Result<ConvertSummary>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let (input, output) = (input.as_ref(), output.as_ref());

    let parser = PdfParser::open_with_options(input, options.parse.clone())?;
    let document = parser.parse()?;

    let summary = ConvertSummary {
        pages: document.page_count(),
        paragraphs: document.paragraph_count(),
        tables: document.table_count(),
    };

    DocxWriter::with_options(options.writer.clone()).write(&document, output)?;

    log::info!(
        "Converted {} -> {}: {} pages, {} paragraphs, {} tables",
        input.display(),
        output.display(),
        summary.pages,
        summary.paragraphs,
        summary.tables
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ErrorMode;

    #[test]
    fn test_convert_options_builder() {
        let options = ConvertOptions::new()
            .with_pages(PageSelection::Range(2..=3))
            .lenient()
            .sequential();

        assert_eq!(options.parse.pages, PageSelection::Range(2..=3));
        assert_eq!(options.parse.error_mode, ErrorMode::Lenient);
        assert!(!options.parse.parallel);
        assert!(options.writer.page_breaks);
    }

    #[test]
    fn test_missing_input_fails() {
        let dir = tempfile::tempdir().unwrap();
        let result = pdf_to_docx(
            dir.path().join("missing.pdf"),
            dir.path().join("out.docx"),
            &ConvertOptions::default(),
        );
        assert!(result.is_err());
        assert!(!dir.path().join("out.docx").exists());
    }
}
