//! PDF parsing: content stream interpretation, layout analysis and table
//! detection, producing a [`crate::model::Document`].

mod content;
mod layout;
mod options;
mod pdf_parser;
mod table_detector;

pub use content::{ContentExtractor, TextSpan};
pub use layout::{Column, FontStatistics, LayoutAnalyzer, TextBlock, TextLine};
pub use options::{ErrorMode, PageSelection, ParseOptions};
pub use pdf_parser::PdfParser;
pub use table_detector::{DetectedTable, TableDetector, TableDetectorConfig};
