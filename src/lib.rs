//! # doctrans
//!
//! Offline PDF translation through DOCX.
//!
//! A PDF is converted to an editable DOCX, every paragraph and table cell of
//! that DOCX is machine-translated with a locally installed model, and the
//! translated document is written as a new DOCX.
//!
//! ## Quick Start
//!
//! ```no_run
//! use doctrans::{Doctrans, PackageRegistry};
//!
//! fn main() -> doctrans::Result<()> {
//!     let pipeline = Doctrans::new("en", "pt", PackageRegistry::default_location()?);
//!
//!     // Fetch and install the en -> pt model
//!     pipeline.provision(&mut ())?;
//!
//!     // PDF -> DOCX
//!     pipeline.convert("paper.pdf", "paper.docx")?;
//!
//!     // DOCX -> translated DOCX
//!     let translator = pipeline.load_translator()?;
//!     pipeline.translate("paper.docx", "paper.pt.docx", &translator, &mut ())?;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Layout-aware conversion**: headings, paragraphs, multi-column pages and
//!   tables recovered from text positions
//! - **Formatting**: bold, italic, font and size carried into DOCX runs
//! - **Offline translation**: CTranslate2 models from `.argosmodel` packages
//!   (`ctranslate2` feature)
//! - **Parallel processing**: per-page layout analysis runs on Rayon

pub mod convert;
pub mod detect;
pub mod docx;
pub mod error;
pub mod model;
pub mod package;
pub mod parser;
pub mod text;
pub mod translate;

// Re-export commonly used types
pub use convert::{pdf_to_docx, ConvertOptions, ConvertSummary};
pub use detect::{is_pdf_bytes, pdf_version_from_bytes, pdf_version_from_path};
pub use docx::{DocxDocument, DocxWriter, WriterOptions};
pub use error::{Error, Result};
pub use model::{
    Block, Document, Metadata, Page, Paragraph, ParagraphStyle, Table, TableCell, TableRow,
    TextRun, TextStyle,
};
pub use package::{
    ensure_model_installed, AvailablePackage, InstalledPackage, PackageIndex, PackageRegistry,
    ProvisionObserver,
};
pub use parser::{ErrorMode, PageSelection, ParseOptions, PdfParser};
pub use translate::{
    load_translator, translate_docx, Hypothesis, Translate, TranslationModel, Translator,
    WalkObserver, WalkOptions, WalkStage, WalkStats, BACKEND_AVAILABLE,
};

use std::path::Path;

/// Parse a PDF file into a layout document.
///
/// # Example
///
/// ```no_run
/// use doctrans::parse_file;
///
/// let doc = parse_file("document.pdf").unwrap();
/// println!("Pages: {}", doc.page_count());
/// ```
pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Document> {
    PdfParser::open(path)?.parse()
}

/// Parse a PDF file with custom options.
pub fn parse_file_with_options<P: AsRef<Path>>(path: P, options: ParseOptions) -> Result<Document> {
    PdfParser::open_with_options(path, options)?.parse()
}

/// Parse a PDF held in memory.
pub fn parse_bytes(data: &[u8]) -> Result<Document> {
    PdfParser::from_bytes(data)?.parse()
}

/// Extract plain text from a PDF file, one paragraph per line.
pub fn extract_text<P: AsRef<Path>>(path: P) -> Result<String> {
    Ok(parse_file(path)?.plain_text())
}

/// The whole pipeline for one language pair.
///
/// Each stage can run on its own; the CLI runs them in order.
#[derive(Debug, Clone)]
pub struct Doctrans {
    from_code: String,
    to_code: String,
    registry: PackageRegistry,
    convert_options: ConvertOptions,
    walk_options: WalkOptions,
}

impl Doctrans {
    /// Create a pipeline translating `from_code` into `to_code` with models
    /// from `registry`.
    pub fn new(
        from_code: impl Into<String>,
        to_code: impl Into<String>,
        registry: PackageRegistry,
    ) -> Self {
        Self {
            from_code: from_code.into(),
            to_code: to_code.into(),
            registry,
            convert_options: ConvertOptions::default(),
            walk_options: WalkOptions::default(),
        }
    }

    /// Set conversion options.
    pub fn with_convert_options(mut self, options: ConvertOptions) -> Self {
        self.convert_options = options;
        self
    }

    /// Set walk options.
    pub fn with_walk_options(mut self, options: WalkOptions) -> Self {
        self.walk_options = options;
        self
    }

    /// Convert only the selected pages.
    pub fn with_pages(mut self, pages: PageSelection) -> Self {
        self.convert_options = self.convert_options.with_pages(pages);
        self
    }

    /// Source language code.
    pub fn from_code(&self) -> &str {
        &self.from_code
    }

    /// Target language code.
    pub fn to_code(&self) -> &str {
        &self.to_code
    }

    /// The package registry in use.
    pub fn registry(&self) -> &PackageRegistry {
        &self.registry
    }

    /// Download and install the model package for the pair.
    pub fn provision(&self, observer: &mut dyn ProvisionObserver) -> Result<InstalledPackage> {
        ensure_model_installed(&self.from_code, &self.to_code, &self.registry, observer)
    }

    /// Convert `input` PDF into `output` DOCX.
    pub fn convert<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        input: P,
        output: Q,
    ) -> Result<ConvertSummary> {
        pdf_to_docx(input, output, &self.convert_options)
    }

    /// Load the installed model for the pair.
    pub fn load_translator(&self) -> Result<Translator> {
        load_translator(&self.from_code, &self.to_code, &self.registry)
    }

    /// Translate `input` DOCX into `output` DOCX.
    pub fn translate<P, Q, T>(
        &self,
        input: P,
        output: Q,
        translator: &T,
        observer: &mut dyn WalkObserver,
    ) -> Result<WalkStats>
    where
        P: AsRef<Path>,
        Q: AsRef<Path>,
        T: Translate + ?Sized,
    {
        translate_docx(input, output, translator, &self.walk_options, observer)
    }
}
