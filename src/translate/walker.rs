//! Translation of every text node of a DOCX document.
//!
//! Body paragraphs are visited first, in document order, then each cell of
//! each top-level table, row by row. A node is rewritten only when its
//! translation differs from the original text.

use std::path::Path;

use crate::docx::{cell_text, paragraph_text, set_cell_text, set_paragraph_text, DocxDocument};
use crate::error::Result;

use super::translator::Translate;

/// Options for walking a document.
#[derive(Debug, Clone)]
pub struct WalkOptions {
    /// Leave paragraphs and cells with only whitespace alone
    pub skip_blank: bool,
    /// Report progress to the observer
    pub show_progress: bool,
}

impl WalkOptions {
    /// Create walk options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Also send blank paragraphs and cells to the translator.
    pub fn keep_blank(mut self) -> Self {
        self.skip_blank = false;
        self
    }

    /// Enable or disable progress reporting.
    pub fn with_progress(mut self, enabled: bool) -> Self {
        self.show_progress = enabled;
        self
    }
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self {
            skip_blank: true,
            show_progress: true,
        }
    }
}

/// The pass a walk is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkStage {
    /// Body paragraphs
    Paragraphs,
    /// Table cells
    Cells,
}

impl WalkStage {
    /// Human readable label.
    pub fn label(&self) -> &'static str {
        match self {
            WalkStage::Paragraphs => "paragraphs",
            WalkStage::Cells => "table cells",
        }
    }
}

/// Receives progress while a document is translated.
pub trait WalkObserver {
    /// A pass over `total` nodes begins.
    fn on_start(&mut self, _stage: WalkStage, _total: usize) {}

    /// Node `index` (zero based) of the current pass is done.
    fn on_item(&mut self, _stage: WalkStage, _index: usize) {}

    /// The pass is complete.
    fn on_finish(&mut self, _stage: WalkStage) {}
}

impl WalkObserver for () {}

/// Counts of a finished walk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WalkStats {
    pub paragraphs_visited: usize,
    pub paragraphs_changed: usize,
    pub cells_visited: usize,
    pub cells_changed: usize,
}

/// Translate `doc` in place.
pub fn translate_document<T>(
    doc: &mut DocxDocument,
    translator: &T,
    options: &WalkOptions,
    observer: &mut dyn WalkObserver,
) -> Result<WalkStats>
where
    T: Translate + ?Sized,
{
    let mut stats = WalkStats::default();
    let mut progress = Progress {
        observer,
        enabled: options.show_progress,
    };

    let paragraphs: Vec<_> = doc
        .paragraphs_mut()
        .into_iter()
        .filter(|p| !options.skip_blank || !paragraph_text(p).trim().is_empty())
        .collect();

    progress.start(WalkStage::Paragraphs, paragraphs.len());
    for (i, paragraph) in paragraphs.into_iter().enumerate() {
        let original = paragraph_text(paragraph);
        let translated = translator.translate(&original)?;
        if translated != original {
            set_paragraph_text(paragraph, &translated);
            stats.paragraphs_changed += 1;
        }
        stats.paragraphs_visited += 1;
        progress.item(WalkStage::Paragraphs, i);
    }
    progress.finish(WalkStage::Paragraphs);

    let cells: Vec<_> = doc
        .cells_mut()
        .into_iter()
        .filter(|c| !options.skip_blank || !cell_text(c).trim().is_empty())
        .collect();

    progress.start(WalkStage::Cells, cells.len());
    for (i, cell) in cells.into_iter().enumerate() {
        let original = cell_text(cell);
        let translated = translator.translate(&original)?;
        if translated != original {
            set_cell_text(cell, &translated);
            stats.cells_changed += 1;
        }
        stats.cells_visited += 1;
        progress.item(WalkStage::Cells, i);
    }
    progress.finish(WalkStage::Cells);

    Ok(stats)
}

/// Load `input`, translate it and save the result to `output`.
///
/// The output file is overwritten. `input` and `output` may be the same path.
pub fn translate_docx<P, Q, T>(
    input: P,
    output: Q,
    translator: &T,
    options: &WalkOptions,
    observer: &mut dyn WalkObserver,
) -> Result<WalkStats>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
    T: Translate + ?Sized,
{
    let mut doc = DocxDocument::open(input.as_ref())?;
    let stats = translate_document(&mut doc, translator, options, observer)?;
    doc.save(output.as_ref())?;

    log::info!(
        "Translated {}/{} paragraphs and {}/{} cells into {}",
        stats.paragraphs_changed,
        stats.paragraphs_visited,
        stats.cells_changed,
        stats.cells_visited,
        output.as_ref().display()
    );
    Ok(stats)
}

/// Forwards to the observer only when progress is enabled.
struct Progress<'a> {
    observer: &'a mut dyn WalkObserver,
    enabled: bool,
}

impl Progress<'_> {
    fn start(&mut self, stage: WalkStage, total: usize) {
        if self.enabled {
            self.observer.on_start(stage, total);
        }
    }

    fn item(&mut self, stage: WalkStage, index: usize) {
        if self.enabled {
            self.observer.on_item(stage, index);
        }
    }

    fn finish(&mut self, stage: WalkStage) {
        if self.enabled {
            self.observer.on_finish(stage);
        }
    }
}
