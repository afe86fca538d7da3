//! Rendering of a layout [`Document`] into DOCX.

use std::fs::File;
use std::path::Path;

use docx_rs::{
    Docx, Paragraph as DocxParagraph, Run, RunFonts, Style, StyleType, Table as DocxTable,
    TableCell as DocxTableCell, TableRow as DocxTableRow, WidthType,
};

use crate::error::{Error, Result};
use crate::model::{Block, Document, Paragraph, Table, TextRun};

/// Points to twentieths of a point.
const TWIPS_PER_POINT: f32 = 20.0;
/// Heading font sizes in half-points, level 1 first.
const HEADING_SIZES: [usize; 6] = [32, 28, 26, 24, 22, 22];

/// Options for DOCX rendering.
#[derive(Debug, Clone)]
pub struct WriterOptions {
    /// Start each PDF page on a new DOCX page
    pub page_breaks: bool,
    /// Carry font names from the PDF into run properties
    pub keep_fonts: bool,
    /// Indent paragraphs by their offset from the page margin
    pub keep_indent: bool,
}

impl WriterOptions {
    /// Create writer options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable page breaks between PDF pages.
    pub fn with_page_breaks(mut self, enabled: bool) -> Self {
        self.page_breaks = enabled;
        self
    }

    /// Enable or disable font names on runs.
    pub fn with_fonts(mut self, enabled: bool) -> Self {
        self.keep_fonts = enabled;
        self
    }

    /// Enable or disable paragraph indentation.
    pub fn with_indent(mut self, enabled: bool) -> Self {
        self.keep_indent = enabled;
        self
    }
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            page_breaks: true,
            keep_fonts: true,
            keep_indent: true,
        }
    }
}

/// Renders layout documents as DOCX.
#[derive(Debug, Clone, Default)]
pub struct DocxWriter {
    options: WriterOptions,
}

impl DocxWriter {
    /// Create a writer with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a writer with custom options.
    pub fn with_options(options: WriterOptions) -> Self {
        Self { options }
    }

    /// Render and write `doc` to `path`.
    pub fn write<P: AsRef<Path>>(&self, doc: &Document, path: P) -> Result<()> {
        let file = File::create(path.as_ref())?;
        self.build(doc)
            .build()
            .pack(file)
            .map_err(|e| Error::Docx(e.to_string()))
    }

    /// Render `doc` into an in-memory DOCX.
    pub fn build(&self, doc: &Document) -> Docx {
        let mut docx = heading_styles(Docx::new());

        if let Some(first) = doc.pages.first() {
            docx = docx.page_size(twips(first.width) as u32, twips(first.height) as u32);
        }

        let mut wrote_any = false;
        for page in &doc.pages {
            let mut page_break = self.options.page_breaks && wrote_any;

            for block in &page.elements {
                match block {
                    Block::Paragraph(p) => {
                        docx = docx.add_paragraph(self.paragraph(p).page_break_before(page_break));
                    }
                    Block::Table(t) => {
                        if page_break {
                            docx = docx.add_paragraph(DocxParagraph::new().page_break_before(true));
                        }
                        docx = docx.add_table(self.table(t));
                    }
                }
                page_break = false;
                wrote_any = true;
            }
        }

        docx
    }

    fn paragraph(&self, paragraph: &Paragraph) -> DocxParagraph {
        let mut out = DocxParagraph::new();
        if let Some(level) = paragraph.style.heading_level {
            out = out.style(&format!("Heading{}", level.clamp(1, 6)));
        }
        if self.options.keep_indent && paragraph.style.indent >= 1.0 {
            out = out.indent(Some(twips(paragraph.style.indent)), None, None, None);
        }
        for run in &paragraph.runs {
            out = out.add_run(self.run(run));
        }
        out
    }

    fn run(&self, run: &TextRun) -> Run {
        let mut out = Run::new().add_text(run.text.as_str());
        if run.style.bold {
            out = out.bold();
        }
        if run.style.italic {
            out = out.italic();
        }
        if let Some(size) = run.style.font_size {
            out = out.size((size * 2.0).round() as usize);
        }
        if self.options.keep_fonts {
            if let Some(name) = &run.style.font_name {
                out = out.fonts(RunFonts::new().ascii(name).hi_ansi(name).cs(name));
            }
        }
        out
    }

    fn table(&self, table: &Table) -> DocxTable {
        let columns = table.column_count();
        let widths: Vec<usize> = (0..columns)
            .map(|i| {
                let points = table.column_widths.get(i).copied().unwrap_or(72.0);
                twips(points).max(1) as usize
            })
            .collect();

        let rows = table
            .rows
            .iter()
            .map(|row| {
                let mut cells: Vec<DocxTableCell> = row
                    .cells
                    .iter()
                    .enumerate()
                    .map(|(i, cell)| {
                        let mut out = DocxTableCell::new();
                        for p in &cell.content {
                            out = out.add_paragraph(if row.is_header {
                                bold_header(p)
                            } else {
                                self.paragraph(p)
                            });
                        }
                        if cell.content.is_empty() {
                            out = out.add_paragraph(DocxParagraph::new());
                        }
                        out.width(widths[i], WidthType::Dxa)
                    })
                    .collect();
                // Short rows are padded so every row spans the grid
                for width in widths.iter().skip(cells.len()) {
                    cells.push(
                        DocxTableCell::new()
                            .add_paragraph(DocxParagraph::new())
                            .width(*width, WidthType::Dxa),
                    );
                }
                DocxTableRow::new(cells)
            })
            .collect();

        DocxTable::new(rows).set_grid(widths)
    }
}

fn bold_header(paragraph: &Paragraph) -> DocxParagraph {
    paragraph.runs.iter().fold(DocxParagraph::new(), |p, run| {
        p.add_run(Run::new().add_text(run.text.as_str()).bold())
    })
}

fn heading_styles(mut docx: Docx) -> Docx {
    for (i, size) in HEADING_SIZES.iter().enumerate() {
        let level = i + 1;
        docx = docx.add_style(
            Style::new(&format!("Heading{}", level), StyleType::Paragraph)
                .name(&format!("Heading {}", level))
                .size(*size)
                .bold(),
        );
    }
    docx
}

fn twips(points: f32) -> i32 {
    (points * TWIPS_PER_POINT).round() as i32
}
