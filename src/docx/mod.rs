//! DOCX input and output.
//!
//! [`DocxWriter`] renders the layout model produced by the PDF parser;
//! [`DocxDocument`] loads an existing file so its text can be rewritten in
//! place.

mod document;
mod writer;

pub use document::{
    cell_text, paragraph_text, plain_run, set_cell_text, set_paragraph_text, DocxDocument,
};
pub use writer::{DocxWriter, WriterOptions};
