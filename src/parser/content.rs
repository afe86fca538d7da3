//! Text span extraction from page content streams.
//!
//! Interprets the text operators of a content stream (BT/ET, Tf, Td, TD,
//! Tm, T*, TL, Tj, TJ, ', ") together with the graphics state operators
//! q/Q/cm, and yields positioned spans in page space.

use std::collections::{BTreeMap, HashMap};

use lopdf::content::Content;
use lopdf::{Dictionary, Document as LopdfDocument, Object, ObjectId};

use crate::error::{Error, Result};
use crate::text::{is_spaceless_script_char, normalize};

/// TJ adjustment (thousandths of an em) treated as a word space.
const TJ_SPACE_THRESHOLD: f32 = 200.0;
/// Average glyph width used when a font has no usable Widths array.
const FALLBACK_GLYPH_WIDTH: f32 = 500.0;

/// A run of text shown by one text operator, in page coordinates.
#[derive(Debug, Clone)]
pub struct TextSpan {
    /// The text content
    pub text: String,
    /// X position (left edge)
    pub x: f32,
    /// Y position (baseline, PDF coordinates grow upwards)
    pub y: f32,
    /// Advance width of the text
    pub width: f32,
    /// Effective font size in points
    pub font_size: f32,
    /// Base font name (e.g., "ABCDEF+Helvetica-Bold")
    pub font_name: String,
    /// Whether the font appears to be bold
    pub is_bold: bool,
    /// Whether the font appears to be italic
    pub is_italic: bool,
}

impl TextSpan {
    /// Create a span, deriving weight and slant from the font name.
    ///
    /// The width is estimated from the character count; callers that know
    /// the real advance overwrite it.
    pub fn new(text: String, x: f32, y: f32, font_size: f32, font_name: String) -> Self {
        let lower = font_name.to_lowercase();
        let is_bold = ["bold", "black", "heavy", "semibold"]
            .iter()
            .any(|k| lower.contains(k));
        let is_italic = lower.contains("italic") || lower.contains("oblique");
        let width = text.chars().count() as f32 * font_size * 0.5;

        Self {
            text,
            x,
            y,
            width,
            font_size,
            font_name,
            is_bold,
            is_italic,
        }
    }

    /// Right edge of the span.
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Font family without subset tag and style suffix ("Helvetica").
    pub fn font_family(&self) -> &str {
        let name = match self.font_name.split_once('+') {
            Some((tag, rest)) if tag.len() == 6 => rest,
            _ => &self.font_name,
        };
        name.split(['-', ',']).next().unwrap_or(name)
    }
}

/// Affine transformation matrix `[a b c d e f]`.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Matrix([f32; 6]);

impl Matrix {
    const IDENTITY: Matrix = Matrix([1.0, 0.0, 0.0, 1.0, 0.0, 0.0]);

    fn translation(tx: f32, ty: f32) -> Self {
        Matrix([1.0, 0.0, 0.0, 1.0, tx, ty])
    }

    /// `self × other`: apply `self`, then `other`.
    fn then(&self, other: &Matrix) -> Matrix {
        let [a, b, c, d, e, f] = self.0;
        let [a2, b2, c2, d2, e2, f2] = other.0;
        Matrix([
            a * a2 + b * c2,
            a * b2 + b * d2,
            c * a2 + d * c2,
            c * b2 + d * d2,
            e * a2 + f * c2 + e2,
            e * b2 + f * d2 + f2,
        ])
    }

    fn origin(&self) -> (f32, f32) {
        (self.0[4], self.0[5])
    }

    fn horizontal_scale(&self) -> f32 {
        (self.0[0] * self.0[0] + self.0[1] * self.0[1]).sqrt()
    }

    fn vertical_scale(&self) -> f32 {
        (self.0[2] * self.0[2] + self.0[3] * self.0[3]).sqrt()
    }
}

/// Glyph advance widths of a simple font.
#[derive(Debug, Clone, Default)]
struct FontMetrics {
    first_char: u32,
    widths: Vec<f32>,
    /// Two-byte codes (Type0 fonts)
    composite: bool,
}

impl FontMetrics {
    fn from_font(doc: &LopdfDocument, font: &Dictionary) -> Self {
        let composite = matches!(font.get(b"Subtype").and_then(Object::as_name), Ok(b"Type0"));
        let first_char = font
            .get(b"FirstChar")
            .ok()
            .and_then(|o| o.as_i64().ok())
            .unwrap_or(0)
            .max(0) as u32;
        let widths = font
            .get(b"Widths")
            .ok()
            .and_then(|o| resolve(doc, o).as_array().ok())
            .map(|arr| arr.iter().filter_map(|w| number(resolve(doc, w))).collect())
            .unwrap_or_default();

        Self {
            first_char,
            widths,
            composite,
        }
    }

    /// Advance of a string in text space units (thousandths of an em).
    fn string_width(&self, bytes: &[u8], decoded_chars: usize) -> f32 {
        if self.composite || self.widths.is_empty() {
            return decoded_chars as f32 * FALLBACK_GLYPH_WIDTH;
        }
        bytes
            .iter()
            .map(|&code| {
                (code as u32)
                    .checked_sub(self.first_char)
                    .and_then(|i| self.widths.get(i as usize).copied())
                    .filter(|w| *w > 0.0)
                    .unwrap_or(FALLBACK_GLYPH_WIDTH)
            })
            .sum()
    }
}

/// A font resource as used while interpreting a content stream.
struct FontEntry<'a> {
    dict: &'a Dictionary,
    base_name: String,
    metrics: FontMetrics,
}

impl FontEntry<'_> {
    fn decode(&self, doc: &LopdfDocument, bytes: &[u8]) -> String {
        match self.dict.get_font_encoding(doc) {
            Ok(enc) => LopdfDocument::decode_text(&enc, bytes).unwrap_or_default(),
            Err(_) => decode_text_simple(bytes),
        }
    }
}

/// Text state carried between operators.
struct TextState {
    ctm: Matrix,
    ctm_stack: Vec<Matrix>,
    text_matrix: Matrix,
    line_matrix: Matrix,
    font_key: Vec<u8>,
    font_size: f32,
    leading: f32,
    in_text: bool,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            ctm: Matrix::IDENTITY,
            ctm_stack: Vec::new(),
            text_matrix: Matrix::IDENTITY,
            line_matrix: Matrix::IDENTITY,
            font_key: Vec::new(),
            font_size: 12.0,
            leading: 0.0,
            in_text: false,
        }
    }
}

impl TextState {
    fn move_line(&mut self, tx: f32, ty: f32) {
        self.line_matrix = Matrix::translation(tx, ty).then(&self.line_matrix);
        self.text_matrix = self.line_matrix;
    }

    fn next_line(&mut self) {
        let leading = if self.leading > 0.0 {
            self.leading
        } else {
            self.font_size * 1.2
        };
        self.move_line(0.0, -leading);
    }

    fn advance(&mut self, text_space_width: f32) {
        self.text_matrix = Matrix::translation(text_space_width, 0.0).then(&self.text_matrix);
    }

    fn rendering_matrix(&self) -> Matrix {
        self.text_matrix.then(&self.ctm)
    }
}

/// Extracts positioned text spans from the pages of a loaded document.
pub struct ContentExtractor<'a> {
    doc: &'a LopdfDocument,
}

impl<'a> ContentExtractor<'a> {
    /// Create an extractor for a document.
    pub fn new(doc: &'a LopdfDocument) -> Self {
        Self { doc }
    }

    /// Extract all spans of a page, in content stream order.
    pub fn page_spans(&self, page_id: ObjectId) -> Result<Vec<TextSpan>> {
        let page_fonts = self
            .doc
            .get_page_fonts(page_id)
            .map_err(|e| Error::PdfParse(e.to_string()))?;
        let fonts = self.load_fonts(&page_fonts);

        let content = self.page_content(page_id)?;
        if content.is_empty() {
            return Ok(Vec::new());
        }
        let content = Content::decode(&content).map_err(|e| Error::PdfParse(e.to_string()))?;

        let mut state = TextState::default();
        let mut spans = Vec::new();

        for op in &content.operations {
            let operands = &op.operands;
            match op.operator.as_str() {
                "q" => state.ctm_stack.push(state.ctm),
                "Q" => {
                    if let Some(ctm) = state.ctm_stack.pop() {
                        state.ctm = ctm;
                    }
                }
                "cm" => {
                    if let Some(m) = matrix_operand(operands) {
                        state.ctm = m.then(&state.ctm);
                    }
                }
                "BT" => {
                    state.in_text = true;
                    state.text_matrix = Matrix::IDENTITY;
                    state.line_matrix = Matrix::IDENTITY;
                }
                "ET" => state.in_text = false,
                "Tf" => {
                    if let (Some(Object::Name(key)), Some(size)) =
                        (operands.first(), operands.get(1).and_then(number))
                    {
                        state.font_key = key.clone();
                        state.font_size = size;
                    }
                }
                "TL" => {
                    if let Some(leading) = operands.first().and_then(number) {
                        state.leading = leading;
                    }
                }
                "Td" | "TD" => {
                    let tx = operands.first().and_then(number).unwrap_or(0.0);
                    let ty = operands.get(1).and_then(number).unwrap_or(0.0);
                    if op.operator == "TD" {
                        state.leading = -ty;
                    }
                    state.move_line(tx, ty);
                }
                "Tm" => {
                    if let Some(m) = matrix_operand(operands) {
                        state.line_matrix = m;
                        state.text_matrix = m;
                    }
                }
                "T*" => state.next_line(),
                "Tj" => {
                    if let Some(s @ Object::String(..)) = operands.first() {
                        self.show(&mut state, &fonts, std::slice::from_ref(s), &mut spans);
                    }
                }
                "TJ" => {
                    if let Some(Object::Array(items)) = operands.first() {
                        self.show(&mut state, &fonts, items, &mut spans);
                    }
                }
                "'" | "\"" => {
                    state.next_line();
                    let idx = if op.operator == "\"" { 2 } else { 0 };
                    if let Some(s @ Object::String(..)) = operands.get(idx) {
                        self.show(&mut state, &fonts, std::slice::from_ref(s), &mut spans);
                    }
                }
                _ => {}
            }
        }

        Ok(spans)
    }

    /// Show a TJ-style array of strings and adjustments as one span.
    fn show(
        &self,
        state: &mut TextState,
        fonts: &HashMap<Vec<u8>, FontEntry<'a>>,
        items: &[Object],
        spans: &mut Vec<TextSpan>,
    ) {
        if !state.in_text {
            return;
        }

        let font = fonts.get(&state.font_key);
        let start = state.rendering_matrix();
        let mut text = String::new();
        let mut advance = 0.0f32;

        for item in items {
            match item {
                Object::String(bytes, _) => {
                    let decoded = match font {
                        Some(f) => f.decode(self.doc, bytes),
                        None => decode_text_simple(bytes),
                    };
                    let chars = decoded.chars().count();
                    let units = match font {
                        Some(f) => f.metrics.string_width(bytes, chars),
                        None => chars as f32 * FALLBACK_GLYPH_WIDTH,
                    };
                    advance += units / 1000.0 * state.font_size;
                    text.push_str(&decoded);
                }
                other => {
                    if let Some(adjust) = number(other) {
                        advance -= adjust / 1000.0 * state.font_size;
                        if -adjust > TJ_SPACE_THRESHOLD && needs_space(&text) {
                            text.push(' ');
                        }
                    }
                }
            }
        }

        state.advance(advance);

        let text = normalize(&text);
        if text.trim().is_empty() {
            return;
        }

        let (x, y) = start.origin();
        let font_size = state.font_size * start.vertical_scale();
        let font_name = font
            .map(|f| f.base_name.clone())
            .unwrap_or_else(|| String::from_utf8_lossy(&state.font_key).to_string());

        let mut span = TextSpan::new(text, x, y, font_size, font_name);
        span.width = advance * start.horizontal_scale();
        spans.push(span);
    }

    fn load_fonts(
        &self,
        page_fonts: &BTreeMap<Vec<u8>, &'a Dictionary>,
    ) -> HashMap<Vec<u8>, FontEntry<'a>> {
        page_fonts
            .iter()
            .map(|(key, &font)| {
                let base_name = font
                    .get(b"BaseFont")
                    .ok()
                    .and_then(|o| o.as_name().ok())
                    .map(|n| String::from_utf8_lossy(n).to_string())
                    .unwrap_or_else(|| "Unknown".to_string());
                let entry = FontEntry {
                    dict: font,
                    base_name,
                    metrics: FontMetrics::from_font(self.doc, font),
                };
                (key.clone(), entry)
            })
            .collect()
    }

    /// Concatenated, decompressed content streams of a page.
    fn page_content(&self, page_id: ObjectId) -> Result<Vec<u8>> {
        let page = self
            .doc
            .get_dictionary(page_id)
            .map_err(|e| Error::PdfParse(e.to_string()))?;

        let contents = match page.get(b"Contents") {
            Ok(obj) => obj,
            Err(_) => return Ok(Vec::new()),
        };

        let refs: Vec<&Object> = match contents {
            Object::Array(arr) => arr.iter().collect(),
            other => vec![other],
        };

        let mut content = Vec::new();
        for obj in refs {
            let stream = match obj {
                Object::Reference(id) => self.doc.get_object(*id).and_then(Object::as_stream),
                other => other.as_stream(),
            }
            .map_err(|e| Error::PdfParse(format!("invalid content stream: {}", e)))?;

            let data = stream
                .decompressed_content()
                .unwrap_or_else(|_| stream.content.clone());
            content.extend_from_slice(&data);
            content.push(b'\n');
        }
        Ok(content)
    }
}

fn needs_space(text: &str) -> bool {
    match text.chars().last() {
        Some(c) => !c.is_whitespace() && c != '\u{00A0}' && !is_spaceless_script_char(c),
        None => false,
    }
}

fn resolve<'d>(doc: &'d LopdfDocument, obj: &'d Object) -> &'d Object {
    match obj {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
        _ => obj,
    }
}

fn number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

fn matrix_operand(operands: &[Object]) -> Option<Matrix> {
    if operands.len() < 6 {
        return None;
    }
    let mut m = [0.0f32; 6];
    for (slot, obj) in m.iter_mut().zip(operands) {
        *slot = number(obj)?;
    }
    Some(Matrix(m))
}

/// Decoding used when a font has no usable encoding.
fn decode_text_simple(bytes: &[u8]) -> String {
    if let Some(utf16) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = utf16
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}
