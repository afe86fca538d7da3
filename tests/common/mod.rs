//! Fixtures shared by the integration tests.
#![allow(dead_code)]

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use lopdf::{dictionary, Document, Object, Stream};
use zip::write::FileOptions;
use zip::ZipWriter;

/// A line of text placed on a page.
pub struct Line<'a> {
    pub text: &'a str,
    pub x: f32,
    pub y: f32,
    pub size: f32,
    pub bold: bool,
}

impl<'a> Line<'a> {
    pub fn new(text: &'a str, x: f32, y: f32) -> Self {
        Self {
            text,
            x,
            y,
            size: 12.0,
            bold: false,
        }
    }

    pub fn size(mut self, size: f32) -> Self {
        self.size = size;
        self
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }
}

/// Build a PDF with one page per entry of `pages`, using the standard
/// Helvetica fonts.
pub fn pdf_bytes(pages: &[Vec<Line>]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let regular = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let bold = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica-Bold",
    });
    let resources = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => regular,
            "F2" => bold,
        },
    });

    let mut kids = Vec::new();
    for lines in pages {
        let mut content = String::new();
        for line in lines {
            let font = if line.bold { "F2" } else { "F1" };
            content.push_str(&format!(
                "BT /{} {} Tf {} {} Td ({}) Tj ET\n",
                font, line.size, line.x, line.y, line.text
            ));
        }
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Contents" => content_id,
            "Resources" => resources,
        });
        kids.push(Object::from(page_id));
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buf = Vec::new();
    doc.save_to(&mut buf).unwrap();
    buf
}

/// Write a PDF built by [`pdf_bytes`] to `path`.
pub fn write_pdf(path: &Path, pages: &[Vec<Line>]) {
    fs::write(path, pdf_bytes(pages)).unwrap();
}

/// Write a `.argosmodel` archive holding a package directory `root`.
pub fn write_package(path: &Path, root: &str, from_code: &str, to_code: &str) {
    let metadata = format!(
        r#"{{"package_version": "1.0", "argos_version": "1.5", "from_code": "{}", "to_code": "{}"}}"#,
        from_code, to_code
    );

    let mut zip = ZipWriter::new(File::create(path).unwrap());
    let options = FileOptions::default();
    zip.add_directory(format!("{}/", root), options).unwrap();
    zip.start_file(format!("{}/metadata.json", root), options).unwrap();
    zip.write_all(metadata.as_bytes()).unwrap();
    zip.add_directory(format!("{}/model/", root), options).unwrap();
    zip.start_file(format!("{}/model/model.bin", root), options).unwrap();
    zip.write_all(b"not really weights").unwrap();
    zip.start_file(format!("{}/sentencepiece.model", root), options).unwrap();
    zip.write_all(b"not really a tokenizer").unwrap();
    zip.finish().unwrap();
}

/// Write a package index listing `entries` of `(from, to, link)`.
pub fn write_index(path: &Path, entries: &[(&str, &str, &str)]) {
    let packages: Vec<serde_json::Value> = entries
        .iter()
        .map(|(from, to, link)| {
            serde_json::json!({
                "package_version": "1.0",
                "from_code": from,
                "to_code": to,
                "links": [link],
                "type": "translate",
            })
        })
        .collect();
    fs::write(path, serde_json::to_string_pretty(&packages).unwrap()).unwrap();
}
