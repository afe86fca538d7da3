//! Integration tests for DOCX translation.

mod common;

use std::cell::RefCell;
use std::fs::File;
use std::path::Path;

use common::{write_pdf, Line};
use docx_rs::{Docx, Paragraph, ParagraphChild, Run, Table, TableCell, TableCellContent, TableRow};
use doctrans::{
    pdf_to_docx, translate_docx, ConvertOptions, DocxDocument, Hypothesis, Result, Translate,
    TranslationModel, Translator, WalkOptions,
};

fn write_docx(path: &Path, docx: Docx) {
    docx.build().pack(File::create(path).unwrap()).unwrap();
}

fn text_paragraph(text: &str) -> Paragraph {
    Paragraph::new().add_run(Run::new().add_text(text))
}

fn text_cell(text: &str) -> TableCell {
    TableCell::new().add_paragraph(text_paragraph(text))
}

/// Replaces words from a small dictionary, leaving everything else as is.
struct Glossary;

impl TranslationModel for Glossary {
    fn hypotheses(&self, text: &str, _n: usize) -> Result<Vec<Hypothesis>> {
        let translated = text
            .split(' ')
            .map(|word| match word {
                "Hello" => "Olá",
                "world" => "mundo",
                "Price" => "Preço",
                "Total" => "Total",
                other => other,
            })
            .collect::<Vec<_>>()
            .join(" ");
        Ok(vec![Hypothesis::new(translated)])
    }
}

#[test]
fn test_translate_paragraphs_and_cells() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.docx");
    let output = dir.path().join("out.docx");
    write_docx(
        &input,
        Docx::new()
            .add_paragraph(text_paragraph("Hello world"))
            .add_table(Table::new(vec![
                TableRow::new(vec![text_cell("Price"), text_cell("Total")]),
                TableRow::new(vec![text_cell("12"), text_cell("42")]),
            ])),
    );

    let translator = Translator::new("en", "pt", Glossary);
    let stats = translate_docx(&input, &output, &translator, &WalkOptions::default(), &mut ())
        .unwrap();

    assert_eq!(stats.paragraphs_visited, 1);
    assert_eq!(stats.paragraphs_changed, 1);
    assert_eq!(stats.cells_visited, 4);
    assert_eq!(stats.cells_changed, 1);

    let doc = DocxDocument::open(&output).unwrap();
    assert_eq!(doc.paragraph_texts(), vec!["Olá mundo"]);
    assert_eq!(doc.cell_texts(), vec!["Preço", "Total", "12", "42"]);
}

#[test]
fn test_untouched_cell_keeps_formatting() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.docx");
    let output = dir.path().join("out.docx");
    write_docx(
        &input,
        Docx::new().add_table(Table::new(vec![TableRow::new(vec![
            TableCell::new().add_paragraph(Paragraph::new().add_run(Run::new().add_text("42").bold())),
            TableCell::new()
                .add_paragraph(Paragraph::new().add_run(Run::new().add_text("Price").bold())),
        ])])),
    );

    let translator = Translator::new("en", "pt", Glossary);
    translate_docx(&input, &output, &translator, &WalkOptions::default(), &mut ()).unwrap();

    let doc = DocxDocument::open(&output).unwrap();
    let cells = doc.cells();
    let first_run_bold = |cell: &TableCell| match &cell.children[0] {
        TableCellContent::Paragraph(p) => match &p.children[0] {
            ParagraphChild::Run(run) => run.run_property.bold.is_some(),
            _ => false,
        },
        _ => false,
    };

    // "42" translates to itself and is left alone
    assert!(first_run_bold(cells[0]));
    // "Price" was replaced by a plain run
    assert!(!first_run_bold(cells[1]));
    assert_eq!(doc.cell_texts(), vec!["42", "Preço"]);
}

#[test]
fn test_multi_paragraph_cell_is_one_block() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.docx");
    let output = dir.path().join("out.docx");
    write_docx(
        &input,
        Docx::new().add_table(Table::new(vec![TableRow::new(vec![TableCell::new()
            .add_paragraph(text_paragraph("first"))
            .add_paragraph(text_paragraph("second"))])])),
    );

    let seen = RefCell::new(Vec::new());
    let record = |text: &str| -> Result<String> {
        seen.borrow_mut().push(text.to_string());
        Ok(text.replace("first", "primeiro"))
    };
    translate_docx(&input, &output, &record, &WalkOptions::default(), &mut ()).unwrap();

    assert_eq!(seen.borrow().as_slice(), ["first\nsecond"]);
    let doc = DocxDocument::open(&output).unwrap();
    assert_eq!(doc.cell_texts(), vec!["primeiro\nsecond"]);
}

#[test]
fn test_blank_paragraphs_are_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.docx");
    let output = dir.path().join("out.docx");
    write_docx(
        &input,
        Docx::new()
            .add_paragraph(text_paragraph("one"))
            .add_paragraph(Paragraph::new())
            .add_paragraph(text_paragraph("two")),
    );

    let calls = RefCell::new(0);
    let count = |text: &str| -> Result<String> {
        *calls.borrow_mut() += 1;
        Ok(text.to_uppercase())
    };

    let stats = translate_docx(&input, &output, &count, &WalkOptions::default(), &mut ()).unwrap();
    assert_eq!(*calls.borrow(), 2);
    assert_eq!(stats.paragraphs_visited, 2);

    let doc = DocxDocument::open(&output).unwrap();
    assert_eq!(doc.paragraph_texts(), vec!["ONE", "", "TWO"]);

    *calls.borrow_mut() = 0;
    translate_docx(&input, &output, &count, &WalkOptions::new().keep_blank(), &mut ()).unwrap();
    assert_eq!(*calls.borrow(), 3);
}

#[test]
fn test_in_place_translation() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("doc.docx");
    write_docx(&path, Docx::new().add_paragraph(text_paragraph("Hello world")));

    let translator = Translator::new("en", "pt", Glossary);
    translate_docx(&path, &path, &translator, &WalkOptions::default(), &mut ()).unwrap();

    assert_eq!(
        DocxDocument::open(&path).unwrap().paragraph_texts(),
        vec!["Olá mundo"]
    );
}

#[test]
fn test_pdf_to_translated_docx() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = dir.path().join("hello.pdf");
    let intermediate = dir.path().join("hello.docx");
    let output = dir.path().join("hello.pt.docx");
    write_pdf(&pdf, &[vec![Line::new("Hello world", 72.0, 700.0)]]);

    pdf_to_docx(&pdf, &intermediate, &ConvertOptions::default()).unwrap();
    assert_eq!(
        DocxDocument::open(&intermediate).unwrap().paragraph_texts(),
        vec!["Hello world"]
    );

    let translator = Translator::new("en", "pt", Glossary);
    translate_docx(&intermediate, &output, &translator, &WalkOptions::default(), &mut ())
        .unwrap();

    let texts = DocxDocument::open(&output).unwrap().paragraph_texts();
    assert_eq!(texts.len(), 1);
    assert_ne!(texts[0], "Hello world");
    assert!(!texts[0].is_empty());
}

#[test]
fn test_translator_error_stops_the_walk() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.docx");
    let output = dir.path().join("out.docx");
    write_docx(&input, Docx::new().add_paragraph(text_paragraph("text")));

    let fail = |_: &str| -> Result<String> { Err(doctrans::Error::Translation("offline".into())) };
    assert!(translate_docx(&input, &output, &fail, &WalkOptions::default(), &mut ()).is_err());
    assert!(!output.exists());
}

#[test]
fn test_units_are_translated_separately() {
    let translator = Translator::new("en", "pt", Glossary);
    assert_eq!(
        translator.translate("Hello\n\n\n\nworld").unwrap(),
        "Olá\n\n\n\nmundo"
    );
}
