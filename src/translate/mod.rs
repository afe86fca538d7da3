//! Offline translation of text blocks and DOCX documents.
//!
//! A [`Translator`] wraps a model loaded from an installed package and
//! translates text block by block: the text is split on blank lines, each
//! non-blank unit gets the model's best hypothesis, and the units are joined
//! back in order. The [`walker`] applies any [`Translate`] implementation to
//! every paragraph and table cell of a DOCX file.

#[cfg(feature = "ctranslate2")]
mod ctranslate2;
mod sentence;
mod translator;
pub mod walker;

#[cfg(feature = "ctranslate2")]
pub use ctranslate2::Ct2Model;
pub use sentence::SentenceSplitter;
pub use translator::{
    load_translator, Hypothesis, Translate, TranslationModel, Translator, BACKEND_AVAILABLE,
    UNIT_SEPARATOR,
};
pub use walker::{
    translate_document, translate_docx, WalkObserver, WalkOptions, WalkStage, WalkStats,
};
