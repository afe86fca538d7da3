//! PDF document parser using lopdf.

use std::path::Path;

use lopdf::{Dictionary, Document as LopdfDocument, Object, ObjectId};
use rayon::prelude::*;

use crate::detect::{pdf_version_from_bytes, pdf_version_from_path};
use crate::error::{Error, Result};
use crate::model::{Document, Metadata, Page};

use super::content::{ContentExtractor, TextSpan};
use super::layout::{FontStatistics, LayoutAnalyzer};
use super::options::{ErrorMode, PageSelection, ParseOptions};
use super::table_detector::TableDetector;

/// US Letter, used when a page has no usable MediaBox.
const DEFAULT_PAGE_BOX: PageBox = PageBox {
    x0: 0.0,
    y0: 0.0,
    x1: 612.0,
    y1: 792.0,
};

/// Slack around the MediaBox before a span counts as off-page.
const PAGE_BOX_SLACK: f32 = 36.0;

/// Normalized page MediaBox.
#[derive(Debug, Clone, Copy, PartialEq)]
struct PageBox {
    x0: f32,
    y0: f32,
    x1: f32,
    y1: f32,
}

impl PageBox {
    fn from_corners(ax: f32, ay: f32, bx: f32, by: f32) -> Self {
        Self {
            x0: ax.min(bx),
            y0: ay.min(by),
            x1: ax.max(bx),
            y1: ay.max(by),
        }
    }

    fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    fn height(&self) -> f32 {
        self.y1 - self.y0
    }

    /// Whether a span starts on the visible page.
    fn contains(&self, span: &TextSpan) -> bool {
        span.x.is_finite()
            && span.y.is_finite()
            && span.x >= self.x0 - PAGE_BOX_SLACK
            && span.x <= self.x1 + PAGE_BOX_SLACK
            && span.y >= self.y0 - PAGE_BOX_SLACK
            && span.y <= self.y1 + PAGE_BOX_SLACK
    }
}

/// Spans of one page, waiting for layout analysis.
struct PageSpans {
    number: u32,
    width: f32,
    height: f32,
    spans: Vec<TextSpan>,
}

/// PDF document parser.
pub struct PdfParser {
    doc: LopdfDocument,
    options: ParseOptions,
}

impl PdfParser {
    /// Open a PDF file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_options(path, ParseOptions::default())
    }

    /// Open a PDF file with custom options.
    pub fn open_with_options<P: AsRef<Path>>(path: P, options: ParseOptions) -> Result<Self> {
        let path = path.as_ref();
        let version = pdf_version_from_path(path)?;
        log::debug!("Opening {} (PDF {})", path.display(), version);

        let doc = LopdfDocument::load(path)?;
        Ok(Self::with_document(doc, options))
    }

    /// Parse a PDF held in memory.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::from_bytes_with_options(data, ParseOptions::default())
    }

    /// Parse a PDF held in memory with custom options.
    pub fn from_bytes_with_options(data: &[u8], options: ParseOptions) -> Result<Self> {
        pdf_version_from_bytes(data)?;
        let doc = LopdfDocument::load_mem(data)?;
        Ok(Self::with_document(doc, options))
    }

    fn with_document(doc: LopdfDocument, options: ParseOptions) -> Self {
        if doc.is_encrypted() {
            log::warn!("Document is encrypted; extracted text may be unreadable");
        }
        Self { doc, options }
    }

    /// Get the number of pages.
    pub fn page_count(&self) -> u32 {
        self.doc.get_pages().len() as u32
    }

    /// Check if the document is encrypted.
    pub fn is_encrypted(&self) -> bool {
        self.doc.is_encrypted()
    }

    /// Get PDF version.
    pub fn version(&self) -> String {
        self.doc.version.to_string()
    }

    /// Parse the selected pages into a layout document.
    ///
    /// Text extraction runs page by page; layout analysis of the extracted
    /// pages runs in parallel unless the options ask for sequential work.
    pub fn parse(&self) -> Result<Document> {
        let pages = self.doc.get_pages();
        let total = pages.len() as u32;
        self.check_selection(total)?;

        let mut document = Document::new();
        document.metadata = self.extract_metadata();
        document.metadata.page_count = total;

        let extractor = ContentExtractor::new(&self.doc);
        let mut extracted = Vec::new();

        for (&number, &page_id) in &pages {
            if !self.options.pages.includes(number) {
                continue;
            }

            let mut spans = match extractor.page_spans(page_id) {
                Ok(spans) => spans,
                Err(e) if self.options.error_mode == ErrorMode::Lenient => {
                    log::warn!("Skipping text of page {}: {}", number, e);
                    Vec::new()
                }
                Err(e) => return Err(Error::TextExtract(format!("page {}: {}", number, e))),
            };
            let page_box = self.page_box(page_id);
            let found = spans.len();
            spans.retain(|span| page_box.contains(span));
            if spans.len() < found {
                log::debug!("Page {}: dropped {} off-page spans", number, found - spans.len());
            }
            log::debug!("Page {}: {} spans", number, spans.len());

            extracted.push(PageSpans {
                number,
                width: page_box.width(),
                height: page_box.height(),
                spans,
            });
        }

        let mut stats = FontStatistics::default();
        for span in extracted.iter().flat_map(|p| p.spans.iter()) {
            stats.add_span(span);
        }
        stats.analyze();
        log::debug!(
            "Body font size {:.1}pt, heading sizes {:?}",
            stats.body_size,
            stats.heading_sizes
        );

        let detect_tables = self.options.detect_tables;
        document.pages = if self.options.parallel {
            extracted
                .into_par_iter()
                .map(|page| layout_page(page, &stats, detect_tables))
                .collect()
        } else {
            extracted
                .into_iter()
                .map(|page| layout_page(page, &stats, detect_tables))
                .collect()
        };

        Ok(document)
    }

    /// Explicitly requested pages must exist.
    fn check_selection(&self, total: u32) -> Result<()> {
        let first_missing = match &self.options.pages {
            PageSelection::All => None,
            PageSelection::Range(range) => Some(*range.start()).filter(|&p| p > total),
            PageSelection::Pages(pages) => pages.iter().copied().find(|&p| p > total),
        };
        match first_missing {
            Some(page) => Err(Error::PageOutOfRange(page, total)),
            None => Ok(()),
        }
    }

    fn extract_metadata(&self) -> Metadata {
        let mut metadata = Metadata::with_version(self.doc.version.to_string());
        metadata.encrypted = self.doc.is_encrypted();

        let info = self
            .doc
            .trailer
            .get(b"Info")
            .and_then(Object::as_reference)
            .and_then(|id| self.doc.get_dictionary(id));

        if let Ok(info) = info {
            metadata.title = info_string(info, b"Title");
            metadata.author = info_string(info, b"Author");
        }
        metadata
    }

    fn page_box(&self, page_id: ObjectId) -> PageBox {
        let media_box = self
            .doc
            .get_dictionary(page_id)
            .and_then(|page| page.get(b"MediaBox"))
            .and_then(|obj| match obj {
                Object::Reference(id) => self.doc.get_object(*id),
                other => Ok(other),
            })
            .and_then(Object::as_array);

        match media_box {
            Ok(values) if values.len() >= 4 => {
                let coords: Vec<f32> = values.iter().filter_map(|v| v.as_float().ok()).collect();
                match coords.as_slice() {
                    [x0, y0, x1, y1, ..] => PageBox::from_corners(*x0, *y0, *x1, *y1),
                    _ => DEFAULT_PAGE_BOX,
                }
            }
            _ => DEFAULT_PAGE_BOX,
        }
    }
}

/// Lay out one page: pull tables out first, group the remaining spans into
/// paragraphs, then interleave both by vertical position.
fn layout_page(page: PageSpans, stats: &FontStatistics, detect_tables: bool) -> Page {
    let PageSpans {
        number,
        width,
        height,
        spans,
    } = page;
    let mut out = Page::new(number, width, height);

    let detector = TableDetector::new();
    let (mut tables, spans) = if detect_tables {
        detector.detect(spans)
    } else {
        (Vec::new(), spans)
    };
    tables.sort_by(|a, b| b.top_y.total_cmp(&a.top_y));

    let margin = spans.iter().map(|s| s.x).fold(f32::INFINITY, f32::min);
    let margin = if margin.is_finite() { margin } else { 0.0 };

    let blocks = LayoutAnalyzer::new(stats).analyze(spans);
    let mut pending = tables.into_iter().peekable();

    for block in blocks {
        while let Some(table) = pending.next_if(|t| t.top_y >= block.top()) {
            out.add_table(detector.to_table_model(&table));
        }
        let paragraph = block.to_paragraph(margin);
        if !paragraph.is_empty() {
            out.add_paragraph(paragraph);
        }
    }
    for table in pending {
        out.add_table(detector.to_table_model(&table));
    }

    log::debug!(
        "Page {}: {} paragraphs, {} tables",
        number,
        out.paragraphs().count(),
        out.tables().count()
    );
    out
}

/// A text string from the Info dictionary (PDFDocEncoding or UTF-16BE).
fn info_string(dict: &Dictionary, key: &[u8]) -> Option<String> {
    let bytes = match dict.get(key).ok()? {
        Object::String(bytes, _) => bytes,
        _ => return None,
    };

    let text = match bytes.strip_prefix(&[0xFE, 0xFF]) {
        Some(utf16) => {
            let units: Vec<u16> = utf16
                .chunks_exact(2)
                .map(|c| u16::from_be_bytes([c[0], c[1]]))
                .collect();
            String::from_utf16_lossy(&units)
        }
        None => String::from_utf8(bytes.clone())
            .unwrap_or_else(|_| bytes.iter().map(|&b| b as char).collect()),
    };

    let text = text.trim().to_string();
    (!text.is_empty()).then_some(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::StringFormat;

    #[test]
    fn test_info_string_utf16() {
        let mut dict = Dictionary::new();
        dict.set(
            "Title",
            Object::String(vec![0xFE, 0xFF, 0x00, 0x48, 0x00, 0x69], StringFormat::Hexadecimal),
        );
        dict.set("Author", Object::string_literal("  Jane Roe "));
        dict.set("Subject", Object::string_literal(""));

        assert_eq!(info_string(&dict, b"Title").as_deref(), Some("Hi"));
        assert_eq!(info_string(&dict, b"Author").as_deref(), Some("Jane Roe"));
        assert_eq!(info_string(&dict, b"Subject"), None);
        assert_eq!(info_string(&dict, b"Keywords"), None);
    }

    #[test]
    fn test_page_box_drops_off_page_spans() {
        let page_box = PageBox::from_corners(612.0, 792.0, 0.0, 0.0);
        assert_eq!(page_box, DEFAULT_PAGE_BOX);

        let span = |x: f32, y: f32| TextSpan::new("t".to_string(), x, y, 12.0, "Helvetica".into());
        assert!(page_box.contains(&span(72.0, 700.0)));
        assert!(page_box.contains(&span(-10.0, 700.0)));
        assert!(!page_box.contains(&span(4.0e10, 700.0)));
        assert!(!page_box.contains(&span(72.0, -5000.0)));
        assert!(!page_box.contains(&span(f32::NAN, 700.0)));
    }

    #[test]
    fn test_layout_page_orders_tables_by_position() {
        let mut stats = FontStatistics::default();
        stats.add_size(12.0, 100);
        stats.analyze();

        let span = |text: &str, x: f32, y: f32| {
            TextSpan::new(text.to_string(), x, y, 12.0, "Helvetica".to_string())
        };
        let page = PageSpans {
            number: 1,
            width: 612.0,
            height: 792.0,
            spans: vec![
                span("Intro paragraph.", 72.0, 720.0),
                span("Name", 72.0, 650.0),
                span("Age", 200.0, 650.0),
                span("Alice", 72.0, 635.0),
                span("30", 200.0, 635.0),
                span("Closing paragraph.", 72.0, 560.0),
            ],
        };

        let out = layout_page(page, &stats, true);
        let kinds: Vec<&str> = out
            .elements
            .iter()
            .map(|b| match b {
                crate::model::Block::Paragraph(_) => "p",
                crate::model::Block::Table(_) => "t",
            })
            .collect();
        assert_eq!(kinds, vec!["p", "t", "p"]);
    }
}
