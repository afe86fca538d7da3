//! Error types for doctrans.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for doctrans operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while converting, provisioning or translating.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The input PDF does not exist or is not a regular file.
    #[error("PDF not found: {}", .0.display())]
    InputNotFound(PathBuf),

    /// The file format is not recognized as PDF.
    #[error("Unknown file format: not a valid PDF")]
    UnknownFormat,

    /// The PDF version is not supported.
    #[error("Unsupported PDF version: {0}")]
    UnsupportedVersion(String),

    /// Error parsing PDF structure.
    #[error("PDF parsing error: {0}")]
    PdfParse(String),

    /// The PDF document is encrypted and requires a password.
    #[error("Document is encrypted")]
    Encrypted,

    /// Error extracting text content.
    #[error("Text extraction error: {0}")]
    TextExtract(String),

    /// Page number is out of range.
    #[error("Page {0} is out of range (document has {1} pages)")]
    PageOutOfRange(u32, u32),

    /// Invalid page range specification.
    #[error("Invalid page range: {0}")]
    InvalidPageRange(String),

    /// Error reading or writing a DOCX package.
    #[error("DOCX error: {0}")]
    Docx(String),

    /// Network failure while fetching the index or a package.
    #[error("Network error: {0}")]
    Network(String),

    /// The package index could not be read.
    #[error("Package index error: {0}")]
    PackageIndex(String),

    /// No package in the index translates between the two languages.
    #[error("No translation package available for {from} -> {to}")]
    NoPackageAvailable {
        /// Source language code
        from: String,
        /// Target language code
        to: String,
    },

    /// A package archive could not be installed.
    #[error("Package install error: {0}")]
    PackageInstall(String),

    /// No installed package translates between the two languages.
    #[error("No installed model for {from} -> {to}")]
    ModelNotInstalled {
        /// Source language code
        from: String,
        /// Target language code
        to: String,
    },

    /// The translation model could not be loaded.
    #[error("Failed to load translation model: {0}")]
    ModelLoad(String),

    /// The model failed while translating.
    #[error("Translation error: {0}")]
    Translation(String),

    /// This build has no inference backend.
    #[error("No translation backend compiled in (rebuild with the `ctranslate2` feature)")]
    BackendUnavailable,

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        match err {
            lopdf::Error::IO(e) => Error::Io(e),
            lopdf::Error::Decryption(_) => Error::Encrypted,
            _ => Error::PdfParse(err.to_string()),
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Network(err.to_string())
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        match err {
            zip::result::ZipError::Io(e) => Error::Io(e),
            _ => Error::PackageInstall(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::PackageIndex(err.to_string())
    }
}

impl From<docx_rs::ReaderError> for Error {
    fn from(err: docx_rs::ReaderError) -> Self {
        Error::Docx(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::Encrypted;
        assert_eq!(err.to_string(), "Document is encrypted");

        let err = Error::PageOutOfRange(10, 5);
        assert_eq!(
            err.to_string(),
            "Page 10 is out of range (document has 5 pages)"
        );
    }

    #[test]
    fn test_input_not_found_names_path() {
        let err = Error::InputNotFound(PathBuf::from("missing/report.pdf"));
        assert_eq!(err.to_string(), "PDF not found: missing/report.pdf");
    }

    #[test]
    fn test_no_package_display() {
        let err = Error::NoPackageAvailable {
            from: "en".into(),
            to: "xx".into(),
        };
        assert_eq!(
            err.to_string(),
            "No translation package available for en -> xx"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<Vec<u8>>("{").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::PackageIndex(_)));
    }
}
