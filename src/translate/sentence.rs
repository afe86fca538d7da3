//! Sentence splitting for translation units.
//!
//! Neural models translate short inputs best, so a unit is cut into
//! sentences before it reaches the model.

use regex::Regex;

use crate::error::{Error, Result};

/// Words that end with a period without ending a sentence.
const ABBREVIATIONS: &[&str] = &[
    "mr", "mrs", "ms", "dr", "prof", "sr", "jr", "st", "vs", "etc", "e.g", "i.e", "fig", "no",
    "vol", "pp", "cf", "al", "approx", "dept", "inc", "ltd", "co",
];

/// Splits text at sentence boundaries.
#[derive(Debug, Clone)]
pub struct SentenceSplitter {
    boundary: Regex,
}

impl SentenceSplitter {
    /// Create a splitter.
    pub fn new() -> Result<Self> {
        // Terminal punctuation, optional closing quotes/brackets, then space.
        let boundary = Regex::new(r#"[.!?\u{3002}\u{FF01}\u{FF1F}]+["'\u{201D}\u{2019})\]]*\s+"#)
            .map_err(|e| Error::Other(format!("sentence pattern: {}", e)))?;
        Ok(Self { boundary })
    }

    /// Split `text` into trimmed, non-empty sentences.
    ///
    /// Text without a boundary comes back as a single sentence.
    pub fn split(&self, text: &str) -> Vec<String> {
        let mut sentences = Vec::new();
        let mut start = 0;

        for m in self.boundary.find_iter(text) {
            let candidate = &text[start..m.end()];
            if ends_with_abbreviation(candidate.trim_end()) || starts_lowercase(&text[m.end()..]) {
                continue;
            }
            push_trimmed(&mut sentences, candidate);
            start = m.end();
        }
        push_trimmed(&mut sentences, &text[start..]);

        sentences
    }
}

fn push_trimmed(out: &mut Vec<String>, sentence: &str) {
    let sentence = sentence.trim();
    if !sentence.is_empty() {
        out.push(sentence.to_string());
    }
}

fn ends_with_abbreviation(sentence: &str) -> bool {
    let Some(stem) = sentence.strip_suffix('.') else {
        return false;
    };
    let word = stem
        .rsplit(|c: char| c.is_whitespace() || c == '(')
        .next()
        .unwrap_or(stem)
        .to_lowercase();

    // Single initials such as "J." in "J. Smith"
    if word.chars().count() == 1 && word.chars().all(char::is_alphabetic) {
        return true;
    }
    ABBREVIATIONS.contains(&word.as_str())
}

fn starts_lowercase(rest: &str) -> bool {
    rest.chars().next().is_some_and(char::is_lowercase)
}
