//! Layout model of a parsed PDF.
//!
//! This is the intermediate representation between PDF parsing and DOCX
//! writing: pages of paragraphs and tables, with the run-level formatting
//! the parser could recover from fonts.

mod document;
mod page;
mod paragraph;
mod table;

pub use document::{Document, Metadata};
pub use page::{Block, Page};
pub use paragraph::{Paragraph, ParagraphStyle, TextRun, TextStyle};
pub use table::{Table, TableCell, TableRow};
