//! Normalization of text extracted from PDF content streams.
//!
//! Presentation-form ligatures and decomposed accents split words in ways
//! a translation model does not recognize, so every span goes through
//! [`normalize`] before layout analysis.

use unicode_normalization::UnicodeNormalization;

const LIGATURES: &[(char, &str)] = &[
    ('\u{FB00}', "ff"),
    ('\u{FB01}', "fi"),
    ('\u{FB02}', "fl"),
    ('\u{FB03}', "ffi"),
    ('\u{FB04}', "ffl"),
    ('\u{FB05}', "st"),
    ('\u{FB06}', "st"),
];

/// NFC-normalize text, expand ligatures and drop characters that never
/// carry content (replacement character, private use area, C0 controls
/// other than tab).
pub fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.nfc() {
        if let Some((_, expanded)) = LIGATURES.iter().find(|(lig, _)| *lig == c) {
            out.push_str(expanded);
        } else if keep_char(c) {
            out.push(c);
        }
    }
    out
}

fn keep_char(c: char) -> bool {
    let code = c as u32;
    if c == '\u{FFFD}' {
        return false;
    }
    if (0xE000..=0xF8FF).contains(&code) {
        return false;
    }
    !(c.is_control() && c != '\t')
}

/// How the end of one line connects to the start of the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineJoin {
    /// Separate with a single space
    Space,
    /// Drop the trailing hyphen and join directly
    Dehyphenate,
    /// Join directly (scripts written without spaces)
    Direct,
}

/// Decide how two lines of the same paragraph are joined.
///
/// A trailing hyphen between two letters followed by a lowercase letter is
/// a line-break hyphenation. Characters of spaceless scripts are joined
/// directly; everything else gets a space.
pub fn line_join(prev: &str, next: &str) -> LineJoin {
    let mut tail = prev.trim_end().chars().rev();
    let last = tail.next();
    let before_last = tail.next();
    let first = next.trim_start().chars().next();

    if last == Some('-')
        && before_last.is_some_and(char::is_alphabetic)
        && first.is_some_and(char::is_lowercase)
    {
        LineJoin::Dehyphenate
    } else if last.is_some_and(is_spaceless_script_char)
        && first.is_some_and(is_spaceless_script_char)
    {
        LineJoin::Direct
    } else {
        LineJoin::Space
    }
}

/// Append `next` to `prev` as the following line of a paragraph.
pub fn join_lines(prev: &mut String, next: &str) {
    let next = next.trim_start();
    if next.is_empty() {
        return;
    }
    if prev.trim_end().is_empty() {
        prev.clear();
        prev.push_str(next);
        return;
    }

    let join = line_join(prev, next);
    let trimmed_len = prev.trim_end().len();
    prev.truncate(trimmed_len);
    match join {
        LineJoin::Dehyphenate => {
            prev.pop();
        }
        LineJoin::Space => prev.push(' '),
        LineJoin::Direct => {}
    }
    prev.push_str(next);
}

/// Whether a character belongs to a script that does not separate words
/// with spaces (Han, Hiragana, Katakana, CJK punctuation). Hangul is
/// written with spaces and is not included.
pub fn is_spaceless_script_char(c: char) -> bool {
    let code = c as u32;
    (0x4E00..=0x9FFF).contains(&code)
        || (0x3400..=0x4DBF).contains(&code)
        || (0x20000..=0x2EBEF).contains(&code)
        || (0x3040..=0x309F).contains(&code)
        || (0x30A0..=0x30FF).contains(&code)
        || (0x3000..=0x303F).contains(&code)
}
