//! Document-level types.

use super::Page;
use serde::{Deserialize, Serialize};

/// Layout of a PDF document: what the converter renders into DOCX.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Document {
    /// Document metadata (title, author, etc.)
    pub metadata: Metadata,

    /// Parsed pages, in page order
    pub pages: Vec<Page>,
}

impl Document {
    /// Create a new empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of parsed pages (may be fewer than the source when a page
    /// selection is used).
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Add a page to the document.
    pub fn add_page(&mut self, page: Page) {
        self.pages.push(page);
    }

    /// Check if the document has any pages.
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Total number of paragraphs over all pages.
    pub fn paragraph_count(&self) -> usize {
        self.pages.iter().map(|p| p.paragraphs().count()).sum()
    }

    /// Total number of tables over all pages.
    pub fn table_count(&self) -> usize {
        self.pages.iter().map(|p| p.tables().count()).sum()
    }

    /// Get plain text content of the entire document.
    pub fn plain_text(&self) -> String {
        self.pages
            .iter()
            .map(Page::plain_text)
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// Document metadata.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Metadata {
    /// Document title from the Info dictionary
    pub title: Option<String>,

    /// Document author from the Info dictionary
    pub author: Option<String>,

    /// PDF version (e.g., "1.7")
    pub pdf_version: String,

    /// Number of pages in the source file
    pub page_count: u32,

    /// Whether the document is encrypted
    pub encrypted: bool,
}

impl Metadata {
    /// Create new metadata with PDF version.
    pub fn with_version(version: impl Into<String>) -> Self {
        Self {
            pdf_version: version.into(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Paragraph, Table};

    #[test]
    fn test_document_counts() {
        let mut doc = Document::new();
        assert!(doc.is_empty());

        let mut page = Page::letter(1);
        page.add_paragraph(Paragraph::with_text("one"));
        page.add_paragraph(Paragraph::with_text("two"));
        page.add_table(Table::new());
        doc.add_page(page);
        doc.add_page(Page::letter(2));

        assert_eq!(doc.page_count(), 2);
        assert_eq!(doc.paragraph_count(), 2);
        assert_eq!(doc.table_count(), 1);
    }

    #[test]
    fn test_metadata_with_version() {
        let meta = Metadata::with_version("1.4");
        assert_eq!(meta.pdf_version, "1.4");
        assert!(meta.title.is_none());
    }
}
