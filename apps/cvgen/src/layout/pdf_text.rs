//! Positioned text extraction from PDF content streams.
//!
//! Walks each page's decoded content stream with lopdf and tracks the text matrix
//! through `BT/ET/Tf/Td/TD/Tm/TL/T*/'/"/Tj/TJ`. Simple-font strings are decoded as
//! WinAnsi, which is what the template renderer writes. Graphics-state transforms
//! (`cm`) are not applied; the renderer never emits them.

use std::collections::BTreeMap;

use lopdf::content::Content;
use lopdf::{Document, Object, ObjectId};
use thiserror::Error;

/// A4 height, used when a page has no resolvable MediaBox.
const DEFAULT_PAGE_HEIGHT: f32 = 842.0;
const DEFAULT_PAGE_WIDTH: f32 = 595.0;
/// TJ adjustments larger than this (thousandths of an em) are read as a word break.
const TJ_SPACE_THRESHOLD: f32 = 200.0;
/// Spans whose baselines differ by less than this are on the same printed line.
const SAME_LINE_TOLERANCE: f32 = 1.0;
const MAX_PARENT_DEPTH: usize = 16;

#[derive(Debug, Error)]
pub enum PdfTextError {
    #[error("PDF parse error: {0}")]
    Parse(String),
}

/// A run of text drawn at one position.
#[derive(Debug, Clone, PartialEq)]
pub struct TextSpan {
    pub text: String,
    pub x: f32,
    /// Baseline y in PDF user space (origin bottom-left).
    pub y: f32,
    pub font_size: f32,
}

impl TextSpan {
    /// Top of the glyph box, approximated as 80% of the font size above the baseline.
    pub fn top(&self) -> f32 {
        self.y + self.font_size * 0.8
    }

    /// Bottom of the glyph box, approximated as 20% of the font size below the baseline.
    pub fn bottom(&self) -> f32 {
        self.y - self.font_size * 0.2
    }
}

/// All text spans of one page plus the page geometry.
#[derive(Debug, Clone)]
pub struct PageText {
    pub width: f32,
    pub height: f32,
    pub spans: Vec<TextSpan>,
}

impl PageText {
    /// Reading-order text: spans grouped into lines top to bottom, left to right.
    pub fn text(&self) -> String {
        self.lines().join("\n")
    }

    pub fn lines(&self) -> Vec<String> {
        let mut spans: Vec<&TextSpan> = self.spans.iter().collect();
        spans.sort_by(|a, b| {
            b.y.partial_cmp(&a.y)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal))
        });

        let mut lines: Vec<(f32, String)> = Vec::new();
        for span in spans {
            match lines.last_mut() {
                Some((y, line)) if (*y - span.y).abs() < SAME_LINE_TOLERANCE => {
                    line.push(' ');
                    line.push_str(span.text.trim());
                }
                _ => lines.push((span.y, span.text.trim().to_string())),
            }
        }
        lines.into_iter().map(|(_, l)| l).collect()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Document walking
// ────────────────────────────────────────────────────────────────────────────

/// Parses `bytes` and returns the positioned text of every page, in page order.
pub fn extract_pages(bytes: &[u8]) -> Result<Vec<PageText>, PdfTextError> {
    let doc = Document::load_mem(bytes).map_err(|e| PdfTextError::Parse(e.to_string()))?;
    let pages: BTreeMap<u32, ObjectId> = doc.get_pages();

    let mut result = Vec::with_capacity(pages.len());
    for (_, page_id) in pages {
        let (width, height) = page_size(&doc, page_id);
        let content = doc
            .get_page_content(page_id)
            .map_err(|e| PdfTextError::Parse(e.to_string()))?;
        let spans = parse_content_stream(&content)?;
        result.push(PageText {
            width,
            height,
            spans,
        });
    }
    Ok(result)
}

/// Resolves the MediaBox of a page, following the `Parent` chain for inherited values.
fn page_size(doc: &Document, page_id: ObjectId) -> (f32, f32) {
    let mut current = Some(page_id);
    for _ in 0..MAX_PARENT_DEPTH {
        let Some(id) = current else { break };
        let Ok(dict) = doc.get_dictionary(id) else {
            break;
        };
        if let Ok(obj) = dict.get(b"MediaBox") {
            let obj = match obj {
                Object::Reference(r) => doc.get_object(*r).unwrap_or(obj),
                other => other,
            };
            if let Object::Array(values) = obj {
                let nums: Vec<f32> = values.iter().filter_map(get_number).collect();
                if nums.len() == 4 {
                    return ((nums[2] - nums[0]).abs(), (nums[3] - nums[1]).abs());
                }
            }
        }
        current = dict.get(b"Parent").and_then(Object::as_reference).ok();
    }
    (DEFAULT_PAGE_WIDTH, DEFAULT_PAGE_HEIGHT)
}

#[derive(Debug, Clone, Copy)]
struct TextMatrix {
    a: f32,
    b: f32,
    c: f32,
    d: f32,
    e: f32,
    f: f32,
    // Line matrix origin: Td/T* are relative to the start of the current line,
    // not to wherever the last show operator left the pen.
    line_e: f32,
    line_f: f32,
}

impl Default for TextMatrix {
    fn default() -> Self {
        Self {
            a: 1.0,
            b: 0.0,
            c: 0.0,
            d: 1.0,
            e: 0.0,
            f: 0.0,
            line_e: 0.0,
            line_f: 0.0,
        }
    }
}

impl TextMatrix {
    fn set(&mut self, a: f32, b: f32, c: f32, d: f32, e: f32, f: f32) {
        *self = Self {
            a,
            b,
            c,
            d,
            e,
            f,
            line_e: e,
            line_f: f,
        };
    }

    fn translate(&mut self, tx: f32, ty: f32) {
        self.line_e += tx * self.a + ty * self.c;
        self.line_f += tx * self.b + ty * self.d;
        self.e = self.line_e;
        self.f = self.line_f;
    }

    fn next_line(&mut self, leading: f32) {
        self.translate(0.0, -leading);
    }

    fn vertical_scale(&self) -> f32 {
        (self.b * self.b + self.d * self.d).sqrt()
    }
}

fn parse_content_stream(content: &[u8]) -> Result<Vec<TextSpan>, PdfTextError> {
    let content = Content::decode(content).map_err(|e| PdfTextError::Parse(e.to_string()))?;

    let mut spans = Vec::new();
    let mut font_size: f32 = 12.0;
    let mut leading: f32 = 0.0;
    let mut matrix = TextMatrix::default();
    let mut in_text_block = false;

    for op in content.operations {
        let operands = &op.operands;
        match op.operator.as_str() {
            "BT" => {
                in_text_block = true;
                matrix = TextMatrix::default();
            }
            "ET" => in_text_block = false,
            "Tf" => {
                if let Some(size) = operands.get(1).and_then(get_number) {
                    font_size = size;
                }
            }
            "TL" => {
                if let Some(tl) = operands.first().and_then(get_number) {
                    leading = tl;
                }
            }
            "Td" | "TD" => {
                if operands.len() >= 2 {
                    let tx = get_number(&operands[0]).unwrap_or(0.0);
                    let ty = get_number(&operands[1]).unwrap_or(0.0);
                    if op.operator == "TD" {
                        leading = -ty;
                    }
                    matrix.translate(tx, ty);
                }
            }
            "Tm" => {
                if operands.len() >= 6 {
                    let n: Vec<f32> = operands.iter().map(|o| get_number(o).unwrap_or(0.0)).collect();
                    matrix.set(n[0], n[1], n[2], n[3], n[4], n[5]);
                }
            }
            "T*" => matrix.next_line(leading),
            "Tj" | "TJ" | "'" | "\"" => {
                if matches!(op.operator.as_str(), "'" | "\"") {
                    matrix.next_line(leading);
                }
                if !in_text_block {
                    continue;
                }
                let text = match op.operator.as_str() {
                    "TJ" => match operands.first() {
                        Some(Object::Array(items)) => decode_tj_array(items),
                        _ => String::new(),
                    },
                    "\"" => string_operand(operands.get(2)),
                    _ => string_operand(operands.first()),
                };
                if !text.trim().is_empty() {
                    spans.push(TextSpan {
                        text,
                        x: matrix.e,
                        y: matrix.f,
                        font_size: font_size * matrix.vertical_scale(),
                    });
                }
            }
            _ => {}
        }
    }

    Ok(spans)
}

fn string_operand(obj: Option<&Object>) -> String {
    match obj {
        Some(Object::String(bytes, _)) => decode_win_ansi(bytes),
        _ => String::new(),
    }
}

fn decode_tj_array(items: &[Object]) -> String {
    let mut combined = String::new();
    for item in items {
        match item {
            Object::String(bytes, _) => combined.push_str(&decode_win_ansi(bytes)),
            other => {
                let Some(adjustment) = get_number(other) else {
                    continue;
                };
                // Negative adjustments advance the pen to the right.
                if -adjustment > TJ_SPACE_THRESHOLD
                    && !combined.is_empty()
                    && !combined.ends_with(' ')
                {
                    combined.push(' ');
                }
            }
        }
    }
    combined
}

fn get_number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r as f32),
        _ => None,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// WinAnsi encoding
// ────────────────────────────────────────────────────────────────────────────

/// The 0x80..=0x9F block of WinAnsiEncoding, where it departs from Latin-1.
const WIN_ANSI_HIGH: [(u8, char); 23] = [
    (0x80, '€'),
    (0x82, '‚'),
    (0x83, 'ƒ'),
    (0x84, '„'),
    (0x85, '…'),
    (0x86, '†'),
    (0x87, '‡'),
    (0x88, 'ˆ'),
    (0x89, '‰'),
    (0x8A, 'Š'),
    (0x8B, '‹'),
    (0x8C, 'Œ'),
    (0x8E, 'Ž'),
    (0x91, '‘'),
    (0x92, '’'),
    (0x93, '“'),
    (0x94, '”'),
    (0x95, '•'),
    (0x96, '–'),
    (0x97, '—'),
    (0x99, '™'),
    (0x9C, 'œ'),
    (0x9F, 'Ÿ'),
];

/// Decodes a simple-font string as WinAnsi. Unassigned control bytes are dropped.
pub fn decode_win_ansi(bytes: &[u8]) -> String {
    bytes
        .iter()
        .filter_map(|&b| match b {
            0x20..=0x7E | 0xA0..=0xFF => Some(b as char),
            0x80..=0x9F => WIN_ANSI_HIGH
                .iter()
                .find(|(code, _)| *code == b)
                .map(|(_, c)| *c),
            b'\t' => Some(' '),
            _ => None,
        })
        .collect()
}

/// Encodes text for a WinAnsi simple font. Characters outside the encoding become `?`.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c as u32 {
            0x20..=0x7E | 0xA0..=0xFF => c as u8,
            _ => WIN_ANSI_HIGH
                .iter()
                .find(|(_, ch)| *ch == c)
                .map(|(code, _)| *code)
                .unwrap_or(b'?'),
        })
        .collect()
}
