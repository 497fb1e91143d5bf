//! Content stream interpretation.
//!
//! Walks the operators of a page (and of the form XObjects it paints),
//! tracking the current transformation matrix and the text state, and
//! records positioned text spans plus where each image XObject is drawn.

use std::collections::BTreeMap;

use lopdf::content::Content;
use lopdf::{Dictionary, Document as LopdfDocument, Object};
use unicode_normalization::UnicodeNormalization;

use crate::error::{Error, Result};

use super::layout::TextSpan;
use super::objects::{get_number, name_of, resolve_dict};

/// Estimated glyph advance as a fraction of the font size.
const GLYPH_WIDTH_RATIO: f32 = 0.5;

/// Nesting limit for form XObjects painting other forms.
const MAX_FORM_DEPTH: usize = 8;

/// An affine transform `[a b c d e f]` in PDF row-vector convention.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Matrix {
    a: f32,
    b: f32,
    c: f32,
    d: f32,
    e: f32,
    f: f32,
}

impl Matrix {
    pub(crate) const IDENTITY: Matrix = Matrix {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    fn new(a: f32, b: f32, c: f32, d: f32, e: f32, f: f32) -> Self {
        Self { a, b, c, d, e, f }
    }

    fn translation(tx: f32, ty: f32) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, tx, ty)
    }

    /// Six numeric operands, as given to `cm`, `Tm` or a form's /Matrix.
    fn from_operands(operands: &[Object]) -> Option<Self> {
        if operands.len() < 6 {
            return None;
        }
        let n: Vec<f32> = operands[..6].iter().filter_map(get_number).collect();
        if n.len() != 6 {
            return None;
        }
        Some(Self::new(n[0], n[1], n[2], n[3], n[4], n[5]))
    }

    /// `self × other`: apply `self` first, then `other`.
    fn then(&self, other: &Matrix) -> Matrix {
        Matrix {
            a: self.a * other.a + self.b * other.c,
            b: self.a * other.b + self.b * other.d,
            c: self.c * other.a + self.d * other.c,
            d: self.c * other.b + self.d * other.d,
            e: self.e * other.a + self.f * other.c + other.e,
            f: self.e * other.b + self.f * other.d + other.f,
        }
    }

    fn apply(&self, x: f32, y: f32) -> (f32, f32) {
        (
            x * self.a + y * self.c + self.e,
            x * self.b + y * self.d + self.f,
        )
    }

    fn horizontal_scale(&self) -> f32 {
        (self.a * self.a + self.b * self.b).sqrt()
    }

    fn vertical_scale(&self) -> f32 {
        (self.c * self.c + self.d * self.d).sqrt()
    }
}

/// Where an image XObject is painted, in PDF user space.
#[derive(Debug, Clone, PartialEq)]
pub struct ImagePlacement {
    /// XObject resource name
    pub name: String,
    pub left: f32,
    pub bottom: f32,
    pub right: f32,
    pub top: f32,
}

/// Output of interpreting a page.
#[derive(Debug, Default)]
pub(crate) struct PageContent {
    pub spans: Vec<TextSpan>,
    pub placements: Vec<ImagePlacement>,
}

#[derive(Debug, Clone)]
struct TextState {
    font_key: Vec<u8>,
    font_name: String,
    font_size: f32,
    leading: f32,
    matrix: Matrix,
    line_matrix: Matrix,
    in_text: bool,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            font_key: Vec::new(),
            font_name: String::new(),
            font_size: 12.0,
            leading: 0.0,
            matrix: Matrix::IDENTITY,
            line_matrix: Matrix::IDENTITY,
            in_text: false,
        }
    }
}

impl TextState {
    fn begin(&mut self) {
        self.in_text = true;
        self.matrix = Matrix::IDENTITY;
        self.line_matrix = Matrix::IDENTITY;
    }

    fn move_line(&mut self, tx: f32, ty: f32) {
        self.line_matrix = Matrix::translation(tx, ty).then(&self.line_matrix);
        self.matrix = self.line_matrix;
    }

    fn next_line(&mut self) {
        let leading = if self.leading != 0.0 {
            self.leading
        } else {
            self.font_size * 1.2
        };
        self.move_line(0.0, -leading);
    }

    fn set_matrix(&mut self, m: Matrix) {
        self.matrix = m;
        self.line_matrix = m;
    }

    fn advance(&mut self, units: f32) {
        self.matrix = Matrix::translation(units, 0.0).then(&self.matrix);
    }
}

/// Resources visible to the stream being interpreted.
struct Scope<'a> {
    fonts: BTreeMap<Vec<u8>, &'a Dictionary>,
    xobjects: Option<&'a Dictionary>,
    resources: Option<&'a Dictionary>,
}

impl<'a> Scope<'a> {
    fn new(doc: &'a LopdfDocument, resources: Option<&'a Dictionary>) -> Self {
        let fonts = resources
            .and_then(|r| r.get(b"Font").ok())
            .and_then(|f| resolve_dict(doc, f))
            .map(|font_dict| {
                font_dict
                    .iter()
                    .filter_map(|(key, obj)| resolve_dict(doc, obj).map(|d| (key.clone(), d)))
                    .collect()
            })
            .unwrap_or_default();

        let xobjects = resources
            .and_then(|r| r.get(b"XObject").ok())
            .and_then(|x| resolve_dict(doc, x));

        Self {
            fonts,
            xobjects,
            resources,
        }
    }

    fn base_font(&self, key: &[u8]) -> String {
        self.fonts
            .get(key)
            .and_then(|f| f.get(b"BaseFont").ok())
            .and_then(name_of)
            .unwrap_or_else(|| String::from_utf8_lossy(key).into_owned())
    }
}

/// Interprets content streams into positioned spans and image placements.
pub(crate) struct ContentInterpreter<'a> {
    doc: &'a LopdfDocument,
    output: PageContent,
}

impl<'a> ContentInterpreter<'a> {
    pub(crate) fn new(doc: &'a LopdfDocument) -> Self {
        Self {
            doc,
            output: PageContent::default(),
        }
    }

    /// Interpret a page's content with its resources.
    pub(crate) fn run(
        mut self,
        content: &[u8],
        resources: Option<&'a Dictionary>,
    ) -> Result<PageContent> {
        self.interpret(content, resources, Matrix::IDENTITY, 0)?;
        Ok(self.output)
    }

    fn interpret(
        &mut self,
        content: &[u8],
        resources: Option<&'a Dictionary>,
        base_ctm: Matrix,
        depth: usize,
    ) -> Result<()> {
        let content = Content::decode(content).map_err(|e| Error::PdfParse(e.to_string()))?;
        let scope = Scope::new(self.doc, resources);

        let mut ctm = base_ctm;
        let mut saved: Vec<Matrix> = Vec::new();
        let mut text = TextState::default();

        for op in &content.operations {
            let operands = &op.operands;
            match op.operator.as_str() {
                "q" => saved.push(ctm),
                "Q" => {
                    if let Some(m) = saved.pop() {
                        ctm = m;
                    }
                }
                "cm" => {
                    if let Some(m) = Matrix::from_operands(operands) {
                        ctm = m.then(&ctm);
                    }
                }
                "BT" => text.begin(),
                "ET" => text.in_text = false,
                "Tf" => {
                    if operands.len() >= 2 {
                        if let Object::Name(key) = &operands[0] {
                            text.font_name = scope.base_font(key);
                            text.font_key = key.clone();
                        }
                        text.font_size = get_number(&operands[1]).unwrap_or(12.0);
                    }
                }
                "TL" => {
                    if let Some(l) = operands.first().and_then(get_number) {
                        text.leading = l;
                    }
                }
                "Td" | "TD" => {
                    if operands.len() >= 2 {
                        let tx = get_number(&operands[0]).unwrap_or(0.0);
                        let ty = get_number(&operands[1]).unwrap_or(0.0);
                        if op.operator == "TD" {
                            text.leading = -ty;
                        }
                        text.move_line(tx, ty);
                    }
                }
                "Tm" => {
                    if let Some(m) = Matrix::from_operands(operands) {
                        text.set_matrix(m);
                    }
                }
                "T*" => text.next_line(),
                "Tj" => {
                    if let Some(Object::String(bytes, _)) = operands.first() {
                        self.show(&scope, &mut text, &ctm, bytes);
                    }
                }
                "'" => {
                    text.next_line();
                    if let Some(Object::String(bytes, _)) = operands.first() {
                        self.show(&scope, &mut text, &ctm, bytes);
                    }
                }
                "\"" => {
                    text.next_line();
                    if let Some(Object::String(bytes, _)) = operands.get(2) {
                        self.show(&scope, &mut text, &ctm, bytes);
                    }
                }
                "TJ" => {
                    if let Some(Object::Array(items)) = operands.first() {
                        self.show_array(&scope, &mut text, &ctm, items);
                    }
                }
                "Do" => {
                    if let Some(Object::Name(name)) = operands.first() {
                        self.paint_xobject(&scope, name, &ctm, depth);
                    }
                }
                _ => {}
            }
        }

        Ok(())
    }

    /// Decode a string operand, folding ligatures and other compatibility
    /// forms (NFKC).
    fn decode(&self, scope: &Scope<'a>, font_key: &[u8], bytes: &[u8]) -> String {
        let text = match scope
            .fonts
            .get(font_key)
            .and_then(|f| f.get_font_encoding(self.doc).ok())
        {
            Some(encoding) => LopdfDocument::decode_text(&encoding, bytes)
                .unwrap_or_else(|_| decode_text_simple(bytes)),
            None => decode_text_simple(bytes),
        };
        text.nfkc().collect()
    }

    /// Show a single string (`Tj`, `'`, `"`).
    fn show(&mut self, scope: &Scope<'a>, text: &mut TextState, ctm: &Matrix, bytes: &[u8]) {
        if !text.in_text {
            return;
        }
        let decoded = self.decode(scope, &text.font_key, bytes);
        let advance = decoded.chars().count() as f32 * text.font_size * GLYPH_WIDTH_RATIO;
        self.emit(text, ctm, decoded, advance);
    }

    /// Show a `TJ` array. Large negative kerning values become word spaces.
    fn show_array(
        &mut self,
        scope: &Scope<'a>,
        text: &mut TextState,
        ctm: &Matrix,
        items: &[Object],
    ) {
        if !text.in_text {
            return;
        }

        // 200/1000 of an em reads as a word gap in most fonts
        let space_threshold = 200.0;
        let mut combined = String::new();
        let mut advance = 0.0;

        for item in items {
            match item {
                Object::String(bytes, _) => {
                    let decoded = self.decode(scope, &text.font_key, bytes);
                    advance += decoded.chars().count() as f32 * text.font_size * GLYPH_WIDTH_RATIO;
                    combined.push_str(&decoded);
                }
                other => {
                    if let Some(n) = get_number(other) {
                        advance -= n / 1000.0 * text.font_size;
                        let gap = -n;
                        let ends_with_space =
                            combined.ends_with(' ') || combined.ends_with('\u{00A0}');
                        if gap > space_threshold && !combined.is_empty() && !ends_with_space {
                            if let Some(c) = combined.chars().last() {
                                if !is_spaceless_script_char(c) {
                                    combined.push(' ');
                                }
                            }
                        }
                    }
                }
            }
        }

        self.emit(text, ctm, combined, advance);
    }

    fn emit(&mut self, text: &mut TextState, ctm: &Matrix, decoded: String, advance: f32) {
        let rendering = text.matrix.then(ctm);
        if !decoded.trim().is_empty() {
            let (x, y) = rendering.apply(0.0, 0.0);
            let size = text.font_size * rendering.vertical_scale();
            let width = advance * rendering.horizontal_scale();
            let mut span = TextSpan::new(decoded, x, y, size, text.font_name.clone());
            span.width = width;
            self.output.spans.push(span);
        }
        text.advance(advance);
    }

    fn paint_xobject(&mut self, scope: &Scope<'a>, name: &[u8], ctm: &Matrix, depth: usize) {
        let Some(xobjects) = scope.xobjects else {
            return;
        };
        let Ok(obj_ref) = xobjects.get(name).and_then(|o| o.as_reference()) else {
            return;
        };
        let Ok(Object::Stream(stream)) = self.doc.get_object(obj_ref) else {
            return;
        };

        let subtype = stream.dict.get(b"Subtype").ok().and_then(name_of);
        match subtype.as_deref() {
            Some("Image") => {
                // Only page-level placements are matched to extracted images
                if depth == 0 {
                    let corners = [
                        ctm.apply(0.0, 0.0),
                        ctm.apply(1.0, 0.0),
                        ctm.apply(0.0, 1.0),
                        ctm.apply(1.0, 1.0),
                    ];
                    let xs = corners.iter().map(|c| c.0);
                    let ys = corners.iter().map(|c| c.1);
                    self.output.placements.push(ImagePlacement {
                        name: String::from_utf8_lossy(name).into_owned(),
                        left: xs.clone().fold(f32::MAX, f32::min),
                        right: xs.fold(f32::MIN, f32::max),
                        bottom: ys.clone().fold(f32::MAX, f32::min),
                        top: ys.fold(f32::MIN, f32::max),
                    });
                }
            }
            Some("Form") if depth < MAX_FORM_DEPTH => {
                let form_matrix = stream
                    .dict
                    .get(b"Matrix")
                    .ok()
                    .and_then(|m| m.as_array().ok())
                    .and_then(|arr| Matrix::from_operands(arr))
                    .unwrap_or(Matrix::IDENTITY);
                let resources = stream
                    .dict
                    .get(b"Resources")
                    .ok()
                    .and_then(|r| resolve_dict(self.doc, r))
                    .or(scope.resources);

                let data = stream
                    .decompressed_content()
                    .unwrap_or_else(|_| stream.content.clone());
                let form_ctm = form_matrix.then(ctm);
                if let Err(e) = self.interpret(&data, resources, form_ctm, depth + 1) {
                    log::debug!("Skipping unreadable form XObject: {}", e);
                }
            }
            _ => {}
        }
    }
}

/// Check if character is from a script that doesn't use word spaces.
/// Chinese and Japanese don't use spaces between words, but Korean does.
pub(crate) fn is_spaceless_script_char(c: char) -> bool {
    let code = c as u32;

    // CJK Unified Ideographs and extensions A-F
    (0x4E00..=0x9FFF).contains(&code)
    || (0x3400..=0x4DBF).contains(&code)
    || (0x20000..=0x2EBEF).contains(&code)
    // Hiragana, Katakana
    || (0x3040..=0x30FF).contains(&code)
    // CJK Symbols and Punctuation
    || (0x3000..=0x303F).contains(&code)
}

/// Text decoding fallback when the font has no usable encoding.
fn decode_text_simple(bytes: &[u8]) -> String {
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let utf16: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        return String::from_utf16_lossy(&utf16);
    }

    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        // Latin-1
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}
