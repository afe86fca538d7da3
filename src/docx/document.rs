//! Reading, editing and saving existing DOCX files.

use std::fs::{self, File};
use std::path::Path;

use docx_rs::{
    read_docx, BreakType, Docx, DocumentChild, Paragraph, ParagraphChild, Run, RunChild, Table,
    TableCell, TableCellContent, TableChild, TableRowChild,
};

use crate::error::{Error, Result};

/// A loaded DOCX document, edited in place.
pub struct DocxDocument {
    docx: Docx,
}

impl DocxDocument {
    /// Load a DOCX file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read(path)?;
        Self::from_bytes(&data).map_err(|e| match e {
            Error::Docx(msg) => Error::Docx(format!("{}: {}", path.display(), msg)),
            other => other,
        })
    }

    /// Load a DOCX document held in memory.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Ok(Self {
            docx: read_docx(data)?,
        })
    }

    /// Wrap a document built in memory.
    pub fn from_docx(docx: Docx) -> Self {
        Self { docx }
    }

    /// Write the document to `path`, replacing any existing file.
    pub fn save<P: AsRef<Path>>(self, path: P) -> Result<()> {
        let file = File::create(path.as_ref())?;
        self.docx
            .build()
            .pack(file)
            .map_err(|e| Error::Docx(e.to_string()))
    }

    /// Body paragraphs in document order (paragraphs inside tables excluded).
    pub fn paragraphs(&self) -> Vec<&Paragraph> {
        self.docx
            .document
            .children
            .iter()
            .filter_map(|child| match child {
                DocumentChild::Paragraph(p) => {
                    let p: &Paragraph = p;
                    Some(p)
                }
                _ => None,
            })
            .collect()
    }

    /// Mutable body paragraphs in document order.
    pub fn paragraphs_mut(&mut self) -> Vec<&mut Paragraph> {
        self.docx
            .document
            .children
            .iter_mut()
            .filter_map(|child| match child {
                DocumentChild::Paragraph(p) => {
                    let p: &mut Paragraph = p;
                    Some(p)
                }
                _ => None,
            })
            .collect()
    }

    /// Top-level tables in document order.
    pub fn tables(&self) -> Vec<&Table> {
        self.docx
            .document
            .children
            .iter()
            .filter_map(|child| match child {
                DocumentChild::Table(t) => {
                    let t: &Table = t;
                    Some(t)
                }
                _ => None,
            })
            .collect()
    }

    /// Cells of all top-level tables: table by table, row by row.
    pub fn cells(&self) -> Vec<&TableCell> {
        let mut cells = Vec::new();
        for table in self.tables() {
            for row in &table.rows {
                let TableChild::TableRow(row) = row;
                for cell in &row.cells {
                    let TableRowChild::TableCell(cell) = cell;
                    cells.push(cell);
                }
            }
        }
        cells
    }

    /// Mutable cells of all top-level tables, in the order of [`cells`].
    ///
    /// [`cells`]: DocxDocument::cells
    pub fn cells_mut(&mut self) -> Vec<&mut TableCell> {
        let mut cells = Vec::new();
        for child in self.docx.document.children.iter_mut() {
            let DocumentChild::Table(table) = child else {
                continue;
            };
            let table: &mut Table = table;
            for row in table.rows.iter_mut() {
                let TableChild::TableRow(row) = row;
                for cell in row.cells.iter_mut() {
                    let TableRowChild::TableCell(cell) = cell;
                    cells.push(cell);
                }
            }
        }
        cells
    }

    /// Text of every body paragraph.
    pub fn paragraph_texts(&self) -> Vec<String> {
        self.paragraphs().into_iter().map(paragraph_text).collect()
    }

    /// Text of every table cell, in [`cells`](DocxDocument::cells) order.
    pub fn cell_texts(&self) -> Vec<String> {
        self.cells().into_iter().map(cell_text).collect()
    }
}

/// Text of a paragraph, including hyperlinked runs. Tabs read as `\t` and
/// breaks as `\n`.
pub fn paragraph_text(paragraph: &Paragraph) -> String {
    let mut out = String::new();
    collect_children_text(&paragraph.children, &mut out);
    out
}

fn collect_children_text(children: &[ParagraphChild], out: &mut String) {
    for child in children {
        match child {
            ParagraphChild::Run(run) => collect_run_text(run, out),
            ParagraphChild::Hyperlink(link) => collect_children_text(&link.children, out),
            _ => {}
        }
    }
}

fn collect_run_text(run: &Run, out: &mut String) {
    for child in &run.children {
        match child {
            RunChild::Text(t) => out.push_str(&t.text),
            RunChild::Tab(_) => out.push('\t'),
            RunChild::Break(_) => out.push('\n'),
            _ => {}
        }
    }
}

/// Replace the content of a paragraph with one plain run holding `text`.
///
/// Paragraph properties (style, alignment, spacing) are kept; runs and
/// their formatting are dropped.
pub fn set_paragraph_text(paragraph: &mut Paragraph, text: &str) {
    paragraph.children = Paragraph::new().add_run(plain_run(text)).children;
}

/// Text of a cell: its paragraphs joined with `\n`.
pub fn cell_text(cell: &TableCell) -> String {
    cell.children
        .iter()
        .filter_map(|content| match content {
            TableCellContent::Paragraph(p) => Some(paragraph_text(p)),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Replace the content of a cell with a single paragraph holding one plain
/// run. Cell properties (width, borders, shading) are kept.
pub fn set_cell_text(cell: &mut TableCell, text: &str) {
    let paragraph = Paragraph::new().add_run(plain_run(text));
    cell.children = TableCell::new().add_paragraph(paragraph).children;
}

/// A run without formatting, with `\n` as line breaks and `\t` as tabs.
pub fn plain_run(text: &str) -> Run {
    let mut run = Run::new();
    let mut segment = String::new();

    for c in text.chars() {
        match c {
            '\n' | '\t' => {
                if !segment.is_empty() {
                    run = run.add_text(std::mem::take(&mut segment));
                }
                run = if c == '\n' {
                    run.add_break(BreakType::TextWrapping)
                } else {
                    run.add_tab()
                };
            }
            _ => segment.push(c),
        }
    }
    if !segment.is_empty() {
        run = run.add_text(segment);
    }
    run
}
