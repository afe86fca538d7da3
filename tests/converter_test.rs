//! Integration tests for PDF to DOCX conversion.

mod common;

use common::{write_pdf, Line};
use docx_rs::{ParagraphChild, RunChild};
use doctrans::{
    pdf_to_docx, parse_bytes, ConvertOptions, DocxDocument, Error, PageSelection, WriterOptions,
};

#[test]
fn test_single_paragraph_pdf() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = dir.path().join("hello.pdf");
    let docx = dir.path().join("hello.docx");
    write_pdf(&pdf, &[vec![Line::new("Hello world", 72.0, 700.0)]]);

    let summary = pdf_to_docx(&pdf, &docx, &ConvertOptions::default()).unwrap();
    assert_eq!(summary.pages, 1);
    assert_eq!(summary.paragraphs, 1);
    assert_eq!(summary.tables, 0);

    let doc = DocxDocument::open(&docx).unwrap();
    assert_eq!(doc.paragraph_texts(), vec!["Hello world"]);
    assert!(doc.tables().is_empty());
}

#[test]
fn test_lines_of_a_paragraph_are_joined() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = dir.path().join("para.pdf");
    let docx = dir.path().join("para.docx");
    write_pdf(
        &pdf,
        &[vec![
            Line::new("The quick brown fox", 72.0, 700.0),
            Line::new("jumps over the dog.", 72.0, 686.0),
            Line::new("A second paragraph starts here.", 72.0, 620.0),
        ]],
    );

    pdf_to_docx(&pdf, &docx, &ConvertOptions::default()).unwrap();
    let doc = DocxDocument::open(&docx).unwrap();
    assert_eq!(
        doc.paragraph_texts(),
        vec![
            "The quick brown fox jumps over the dog.",
            "A second paragraph starts here."
        ]
    );
}

#[test]
fn test_pages_keep_their_order() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = dir.path().join("pages.pdf");
    let docx = dir.path().join("pages.docx");
    write_pdf(
        &pdf,
        &[
            vec![Line::new("First page", 72.0, 700.0)],
            vec![Line::new("Second page", 72.0, 700.0)],
        ],
    );

    let summary = pdf_to_docx(&pdf, &docx, &ConvertOptions::default()).unwrap();
    assert_eq!(summary.pages, 2);

    let doc = DocxDocument::open(&docx).unwrap();
    assert_eq!(doc.paragraph_texts(), vec!["First page", "Second page"]);
}

#[test]
fn test_page_selection() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = dir.path().join("pages.pdf");
    let docx = dir.path().join("pages.docx");
    write_pdf(
        &pdf,
        &[
            vec![Line::new("First page", 72.0, 700.0)],
            vec![Line::new("Second page", 72.0, 700.0)],
            vec![Line::new("Third page", 72.0, 700.0)],
        ],
    );

    let options = ConvertOptions::new().with_pages(PageSelection::Pages(vec![2]));
    let summary = pdf_to_docx(&pdf, &docx, &options).unwrap();
    assert_eq!(summary.pages, 1);
    assert_eq!(
        DocxDocument::open(&docx).unwrap().paragraph_texts(),
        vec!["Second page"]
    );

    let options = ConvertOptions::new().with_pages(PageSelection::Pages(vec![7]));
    let err = pdf_to_docx(&pdf, &docx, &options).unwrap_err();
    assert!(matches!(err, Error::PageOutOfRange(7, 3)));
}

#[test]
fn test_heading_is_styled() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = dir.path().join("heading.pdf");
    let docx = dir.path().join("heading.docx");
    write_pdf(
        &pdf,
        &[vec![
            Line::new("Overview", 72.0, 720.0).size(20.0).bold(),
            Line::new("Body text set in the regular size of the document.", 72.0, 680.0),
            Line::new("More body text so that the body size dominates.", 72.0, 620.0),
        ]],
    );

    pdf_to_docx(&pdf, &docx, &ConvertOptions::default()).unwrap();
    let doc = DocxDocument::open(&docx).unwrap();
    let paragraphs = doc.paragraphs();
    assert_eq!(doc.paragraph_texts()[0], "Overview");
    assert!(paragraphs[0].property.style.is_some());
    assert!(paragraphs[1].property.style.is_none());
}

#[test]
fn test_bold_run_survives_conversion() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = dir.path().join("bold.pdf");
    let docx = dir.path().join("bold.docx");
    write_pdf(
        &pdf,
        &[vec![
            Line::new("Warning", 72.0, 700.0).bold(),
            Line::new("Plain text follows here in a paragraph.", 72.0, 640.0),
            Line::new("And some more plain text for the body.", 72.0, 600.0),
        ]],
    );

    pdf_to_docx(&pdf, &docx, &ConvertOptions::default()).unwrap();
    let doc = DocxDocument::open(&docx).unwrap();
    let first = doc.paragraphs()[0];
    let bold_text: String = first
        .children
        .iter()
        .filter_map(|child| match child {
            ParagraphChild::Run(run) if run.run_property.bold.is_some() => Some(
                run.children
                    .iter()
                    .filter_map(|c| match c {
                        RunChild::Text(t) => Some(t.text.clone()),
                        _ => None,
                    })
                    .collect::<String>(),
            ),
            _ => None,
        })
        .collect();
    assert_eq!(bold_text, "Warning");
}

#[test]
fn test_table_is_detected() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = dir.path().join("table.pdf");
    let docx = dir.path().join("table.docx");
    write_pdf(
        &pdf,
        &[vec![
            Line::new("Intro paragraph.", 72.0, 720.0),
            Line::new("Name", 72.0, 650.0),
            Line::new("Age", 200.0, 650.0),
            Line::new("Alice", 72.0, 635.0),
            Line::new("30", 200.0, 635.0),
            Line::new("Closing paragraph.", 72.0, 560.0),
        ]],
    );

    let summary = pdf_to_docx(&pdf, &docx, &ConvertOptions::default()).unwrap();
    assert_eq!(summary.tables, 1);

    let doc = DocxDocument::open(&docx).unwrap();
    assert_eq!(doc.cell_texts(), vec!["Name", "Age", "Alice", "30"]);
    assert_eq!(
        doc.paragraph_texts(),
        vec!["Intro paragraph.", "Closing paragraph."]
    );
}

#[test]
fn test_without_page_breaks() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = dir.path().join("pages.pdf");
    let docx = dir.path().join("pages.docx");
    write_pdf(
        &pdf,
        &[
            vec![Line::new("First page", 72.0, 700.0)],
            vec![Line::new("Second page", 72.0, 700.0)],
        ],
    );

    let options = ConvertOptions::new()
        .with_writer_options(WriterOptions::new().with_page_breaks(false))
        .sequential();
    pdf_to_docx(&pdf, &docx, &options).unwrap();

    let doc = DocxDocument::open(&docx).unwrap();
    assert_eq!(doc.paragraph_texts(), vec!["First page", "Second page"]);
}

#[test]
fn test_not_a_pdf() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("notes.pdf");
    std::fs::write(&input, "just some text").unwrap();

    let err = pdf_to_docx(&input, dir.path().join("out.docx"), &ConvertOptions::default())
        .unwrap_err();
    assert!(matches!(err, Error::UnknownFormat));
    assert!(!dir.path().join("out.docx").exists());
}

#[test]
fn test_parse_bytes_metadata() {
    let data = common::pdf_bytes(&[vec![Line::new("Hello world", 72.0, 700.0)]]);
    let doc = parse_bytes(&data).unwrap();
    assert_eq!(doc.metadata.pdf_version, "1.5");
    assert_eq!(doc.metadata.page_count, 1);
    assert_eq!(doc.plain_text().trim(), "Hello world");
}

#[test]
fn test_off_page_text_is_ignored() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = dir.path().join("hidden.pdf");
    let docx = dir.path().join("hidden.docx");
    write_pdf(
        &pdf,
        &[vec![
            Line::new("Hello world", 72.0, 700.0),
            Line::new("hidden", 4.0e10, 700.0),
        ]],
    );

    let doc = parse_bytes(&std::fs::read(&pdf).unwrap()).unwrap();
    assert_eq!(doc.plain_text().trim(), "Hello world");

    pdf_to_docx(&pdf, &docx, &ConvertOptions::default()).unwrap();
    assert_eq!(
        DocxDocument::open(&docx).unwrap().paragraph_texts(),
        vec!["Hello world"]
    );
}
