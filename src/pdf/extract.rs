//! Recovers positioned text blocks from a page's content stream.
//!
//! Text showing operators are interpreted against the text and graphics state to
//! produce runs (one per string), runs on a shared baseline are joined into lines,
//! and vertically adjacent, horizontally overlapping lines are joined into blocks.
//! Form XObjects are entered with their own matrix and resources; inline images
//! are skipped. Coordinates come out in the page's displayed orientation.

use std::collections::HashMap;

use lopdf::content::{Content as LoContent, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId};

use crate::error::Error;
use crate::fonts::{ASCENT_RATIO, DESCENT_RATIO, helvetica_width_1000, winansi_to_char};
use crate::model::{ContentBlock, Rect};

use super::resources::{
    PageFrame, obj_to_f32, page_content_bytes, page_resources, resolve, resolve_dict,
    resource_category,
};

/// Advance assumed for composite-font glyphs without a `/W` entry.
const CID_FALLBACK_WIDTH: f32 = 500.0;

/// Forms drawn from within forms are followed this many levels deep.
const MAX_FORM_DEPTH: usize = 8;

#[derive(Clone, Copy, Debug, PartialEq)]
struct Matrix([f32; 6]);

impl Matrix {
    const IDENTITY: Matrix = Matrix([1.0, 0.0, 0.0, 1.0, 0.0, 0.0]);

    fn translate(tx: f32, ty: f32) -> Matrix {
        Matrix([1.0, 0.0, 0.0, 1.0, tx, ty])
    }

    fn from_operands(ops: &[Object]) -> Option<Matrix> {
        if ops.len() != 6 {
            return None;
        }
        let mut m = [0.0f32; 6];
        for (slot, op) in m.iter_mut().zip(ops) {
            *slot = obj_to_f32(op)?;
        }
        Some(Matrix(m))
    }

    /// `self` applied first, then `other` (row-vector convention).
    fn then(self, other: Matrix) -> Matrix {
        let [a1, b1, c1, d1, e1, f1] = self.0;
        let [a2, b2, c2, d2, e2, f2] = other.0;
        Matrix([
            a1 * a2 + b1 * c2,
            a1 * b2 + b1 * d2,
            c1 * a2 + d1 * c2,
            c1 * b2 + d1 * d2,
            e1 * a2 + f1 * c2 + e2,
            e1 * b2 + f1 * d2 + f2,
        ])
    }

    fn apply(&self, x: f32, y: f32) -> (f32, f32) {
        let [a, b, c, d, e, f] = self.0;
        (a * x + c * y + e, b * x + d * y + f)
    }

    fn vertical_scale(&self) -> f32 {
        let [_, _, c, d, _, _] = self.0;
        (c * c + d * d).sqrt()
    }
}

/// What the extractor needs from a font resource.
#[derive(Debug, Default)]
struct FontInfo {
    composite: bool,
    first_char: u32,
    widths: Vec<f32>,
    cid_widths: HashMap<u32, f32>,
    default_width: Option<f32>,
    to_unicode: Option<HashMap<u32, String>>,
}

impl FontInfo {
    fn codes(&self, bytes: &[u8]) -> Vec<u32> {
        if self.composite {
            bytes
                .chunks(2)
                .map(|c| c.iter().fold(0u32, |acc, &b| (acc << 8) | b as u32))
                .collect()
        } else {
            bytes.iter().map(|&b| b as u32).collect()
        }
    }

    fn width_1000(&self, code: u32) -> f32 {
        if self.composite {
            return self
                .cid_widths
                .get(&code)
                .copied()
                .or(self.default_width)
                .unwrap_or(CID_FALLBACK_WIDTH);
        }
        code.checked_sub(self.first_char)
            .and_then(|i| self.widths.get(i as usize).copied())
            .filter(|w| *w > 0.0)
            .unwrap_or_else(|| helvetica_width_1000(code.min(255) as u8))
    }

    fn decode(&self, code: u32, out: &mut String) {
        if let Some(text) = self.to_unicode.as_ref().and_then(|m| m.get(&code)) {
            out.push_str(text);
        } else if !self.composite {
            let ch = winansi_to_char(code as u8);
            if !ch.is_control() {
                out.push(ch);
            }
        }
    }
}

fn number_array(doc: &Document, obj: &Object) -> Vec<f32> {
    match resolve(doc, obj) {
        Object::Array(arr) => arr
            .iter()
            .map(|o| obj_to_f32(resolve(doc, o)).unwrap_or(0.0))
            .collect(),
        _ => Vec::new(),
    }
}

/// CID widths from a `/W` array: `c [w1 w2 ...]` and `c_first c_last w` forms.
fn parse_cid_widths(doc: &Document, obj: &Object) -> HashMap<u32, f32> {
    let mut out = HashMap::new();
    let Object::Array(items) = resolve(doc, obj) else {
        return out;
    };
    let mut i = 0;
    while i < items.len() {
        let Some(first) = obj_to_f32(resolve(doc, &items[i])) else {
            break;
        };
        let first = first as u32;
        match items.get(i + 1).map(|o| resolve(doc, o)) {
            Some(Object::Array(ws)) => {
                for (code, w) in (first..=u32::MAX).zip(ws) {
                    if let Some(w) = obj_to_f32(resolve(doc, w)) {
                        out.insert(code, w);
                    }
                }
                i += 2;
            }
            Some(last) => {
                let (Some(last), Some(w)) = (
                    obj_to_f32(last),
                    items.get(i + 2).and_then(|o| obj_to_f32(resolve(doc, o))),
                ) else {
                    break;
                };
                for code in first..=(last as u32).min(first.saturating_add(0xFFFF)) {
                    out.insert(code, w);
                }
                i += 3;
            }
            None => break,
        }
    }
    out
}

fn load_font(doc: &Document, dict: &Dictionary) -> FontInfo {
    let composite = matches!(dict.get(b"Subtype"), Ok(Object::Name(n)) if n.as_slice() == b"Type0");
    let mut info = FontInfo {
        composite,
        ..FontInfo::default()
    };

    if composite {
        let descendant = dict
            .get(b"DescendantFonts")
            .ok()
            .map(|o| resolve(doc, o))
            .and_then(|o| match o {
                Object::Array(arr) => arr.first().and_then(|d| resolve_dict(doc, d)),
                _ => None,
            });
        if let Some(desc) = descendant {
            info.default_width = desc.get(b"DW").ok().and_then(|o| obj_to_f32(resolve(doc, o)));
            if let Ok(w) = desc.get(b"W") {
                info.cid_widths = parse_cid_widths(doc, w);
            }
        }
    } else {
        info.first_char = dict
            .get(b"FirstChar")
            .ok()
            .and_then(|o| obj_to_f32(resolve(doc, o)))
            .unwrap_or(0.0) as u32;
        if let Ok(w) = dict.get(b"Widths") {
            info.widths = number_array(doc, w);
        }
    }

    if let Ok(tu) = dict.get(b"ToUnicode")
        && let Object::Stream(stream) = resolve(doc, tu)
    {
        let data = if stream.dict.get(b"Filter").is_ok() {
            stream.decompressed_content().ok()
        } else {
            Some(stream.content.clone())
        };
        match data {
            Some(data) => info.to_unicode = Some(parse_to_unicode(&data)),
            None => log::warn!("ToUnicode CMap could not be decompressed"),
        }
    }
    info
}

#[derive(Debug, PartialEq)]
enum CMapToken {
    Hex(Vec<u8>),
    Open,
    Close,
    Word(String),
}

fn tokenize_cmap(text: &str) -> Vec<CMapToken> {
    let mut tokens = Vec::new();
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '<' if chars.peek() == Some(&'<') => {
                chars.next();
                tokens.push(CMapToken::Word("<<".into()));
            }
            '<' => {
                let mut digits = String::new();
                for h in chars.by_ref() {
                    if h == '>' {
                        break;
                    }
                    if h.is_ascii_hexdigit() {
                        digits.push(h);
                    }
                }
                if digits.len() % 2 == 1 {
                    digits.push('0');
                }
                let bytes = (0..digits.len())
                    .step_by(2)
                    .filter_map(|i| u8::from_str_radix(&digits[i..i + 2], 16).ok())
                    .collect();
                tokens.push(CMapToken::Hex(bytes));
            }
            '[' => tokens.push(CMapToken::Open),
            ']' => tokens.push(CMapToken::Close),
            '%' => {
                for n in chars.by_ref() {
                    if n == '\n' || n == '\r' {
                        break;
                    }
                }
            }
            c if c.is_whitespace() => {}
            c => {
                let mut word = String::from(c);
                while let Some(&n) = chars.peek() {
                    if n.is_whitespace() || matches!(n, '<' | '[' | ']' | '/' | '%') {
                        break;
                    }
                    word.push(n);
                    chars.next();
                }
                tokens.push(CMapToken::Word(word));
            }
        }
    }
    tokens
}

fn code_of(bytes: &[u8]) -> u32 {
    bytes.iter().fold(0u32, |acc, &b| (acc << 8) | b as u32)
}

fn utf16_text(bytes: &[u8]) -> String {
    let units: Vec<u16> = bytes
        .chunks(2)
        .map(|c| if c.len() == 2 { u16::from_be_bytes([c[0], c[1]]) } else { c[0] as u16 })
        .collect();
    String::from_utf16_lossy(&units)
}

/// `bfchar` and `bfrange` mappings of a ToUnicode CMap.
fn parse_to_unicode(data: &[u8]) -> HashMap<u32, String> {
    let text = String::from_utf8_lossy(data);
    let tokens = tokenize_cmap(&text);
    let mut map = HashMap::new();
    let mut i = 0;
    let mut mode = "";

    while i < tokens.len() {
        match &tokens[i] {
            CMapToken::Word(w) if w == "beginbfchar" || w == "beginbfrange" => {
                mode = if w == "beginbfchar" { "char" } else { "range" };
                i += 1;
            }
            CMapToken::Word(w) if w.starts_with("endbf") => {
                mode = "";
                i += 1;
            }
            CMapToken::Hex(src) if mode == "char" => {
                if let Some(CMapToken::Hex(dst)) = tokens.get(i + 1) {
                    map.insert(code_of(src), utf16_text(dst));
                }
                i += 2;
            }
            CMapToken::Hex(lo) if mode == "range" => {
                let Some(CMapToken::Hex(hi)) = tokens.get(i + 1) else {
                    i += 1;
                    continue;
                };
                let lo = code_of(lo);
                let hi = code_of(hi).min(lo.saturating_add(0xFFFF));
                match tokens.get(i + 2) {
                    Some(CMapToken::Hex(dst)) if !dst.is_empty() => {
                        let mut units: Vec<u16> = dst
                            .chunks(2)
                            .map(|c| if c.len() == 2 { u16::from_be_bytes([c[0], c[1]]) } else { c[0] as u16 })
                            .collect();
                        for code in lo..=hi {
                            map.insert(code, String::from_utf16_lossy(&units));
                            if let Some(last) = units.last_mut() {
                                *last = last.wrapping_add(1);
                            }
                        }
                        i += 3;
                    }
                    Some(CMapToken::Open) => {
                        let mut j = i + 3;
                        let mut codes = lo..=hi;
                        while let Some(CMapToken::Hex(dst)) = tokens.get(j) {
                            if let Some(code) = codes.next() {
                                map.insert(code, utf16_text(dst));
                            }
                            j += 1;
                        }
                        i = j + 1;
                    }
                    _ => i += 2,
                }
            }
            _ => i += 1,
        }
    }
    map
}

/// Text from one string-showing operation, in page space (top-left origin).
#[derive(Clone, Debug)]
struct TextRun {
    rect: Rect,
    baseline: f32,
    size: f32,
    text: String,
}

#[derive(Clone, Debug)]
struct TextState {
    font: Option<Vec<u8>>,
    size: f32,
    char_spacing: f32,
    word_spacing: f32,
    h_scale: f32,
    leading: f32,
    rise: f32,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            font: None,
            size: 0.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            h_scale: 1.0,
            leading: 0.0,
            rise: 0.0,
        }
    }
}

struct Interpreter<'a> {
    doc: &'a Document,
    /// Fonts and XObjects of the resource scope being interpreted.
    fonts: HashMap<Vec<u8>, FontInfo>,
    xobjects: Dictionary,
    fallback_font: FontInfo,
    page_height: f32,
    ctm: Matrix,
    stack: Vec<(Matrix, TextState)>,
    state: TextState,
    tm: Matrix,
    tlm: Matrix,
    form_depth: usize,
    runs: Vec<TextRun>,
}

impl<'a> Interpreter<'a> {
    /// Starts with the CTM mapping user space to display space, so runs come
    /// out in the page's displayed orientation.
    fn new(doc: &'a Document, resources: &Dictionary, frame: &PageFrame) -> Self {
        let (_, page_height) = frame.size();
        Self {
            doc,
            fonts: load_fonts(doc, resources),
            xobjects: resource_category(doc, resources, b"XObject"),
            fallback_font: FontInfo::default(),
            page_height,
            ctm: Matrix(frame.from_user()),
            stack: Vec::new(),
            state: TextState::default(),
            tm: Matrix::IDENTITY,
            tlm: Matrix::IDENTITY,
            form_depth: 0,
            runs: Vec::new(),
        }
    }

    fn num(ops: &[Object], i: usize) -> f32 {
        ops.get(i).and_then(obj_to_f32).unwrap_or(0.0)
    }

    fn run(&mut self, operations: &[Operation]) {
        for op in operations {
            self.execute(&op.operator, &op.operands);
        }
    }

    fn move_line(&mut self, tx: f32, ty: f32) {
        self.tlm = Matrix::translate(tx, ty).then(self.tlm);
        self.tm = self.tlm;
    }

    fn execute(&mut self, operator: &str, ops: &[Object]) {
        match operator {
            "q" => self.stack.push((self.ctm, self.state.clone())),
            "Q" => {
                if let Some((ctm, state)) = self.stack.pop() {
                    self.ctm = ctm;
                    self.state = state;
                }
            }
            "cm" => {
                if let Some(m) = Matrix::from_operands(ops) {
                    self.ctm = m.then(self.ctm);
                }
            }
            "Do" => {
                if let Some(Object::Name(name)) = ops.first() {
                    self.draw_form(name);
                }
            }
            "BT" => {
                self.tm = Matrix::IDENTITY;
                self.tlm = Matrix::IDENTITY;
            }
            "Tf" => {
                if let Some(Object::Name(name)) = ops.first() {
                    self.state.font = Some(name.clone());
                }
                self.state.size = Self::num(ops, 1);
            }
            "Tc" => self.state.char_spacing = Self::num(ops, 0),
            "Tw" => self.state.word_spacing = Self::num(ops, 0),
            "Tz" => self.state.h_scale = Self::num(ops, 0) / 100.0,
            "TL" => self.state.leading = Self::num(ops, 0),
            "Ts" => self.state.rise = Self::num(ops, 0),
            "Td" => self.move_line(Self::num(ops, 0), Self::num(ops, 1)),
            "TD" => {
                self.state.leading = -Self::num(ops, 1);
                self.move_line(Self::num(ops, 0), Self::num(ops, 1));
            }
            "Tm" => {
                if let Some(m) = Matrix::from_operands(ops) {
                    self.tlm = m;
                    self.tm = m;
                }
            }
            "T*" => self.move_line(0.0, -self.state.leading),
            "Tj" => {
                if let Some(Object::String(bytes, _)) = ops.first() {
                    self.show(bytes);
                }
            }
            "'" => {
                self.move_line(0.0, -self.state.leading);
                if let Some(Object::String(bytes, _)) = ops.first() {
                    self.show(bytes);
                }
            }
            "\"" => {
                self.state.word_spacing = Self::num(ops, 0);
                self.state.char_spacing = Self::num(ops, 1);
                self.move_line(0.0, -self.state.leading);
                if let Some(Object::String(bytes, _)) = ops.get(2) {
                    self.show(bytes);
                }
            }
            "TJ" => {
                if let Some(Object::Array(items)) = ops.first() {
                    for item in items {
                        match item {
                            Object::String(bytes, _) => self.show(bytes),
                            other => {
                                if let Some(adj) = obj_to_f32(other) {
                                    let tx = -adj / 1000.0 * self.state.size * self.state.h_scale;
                                    self.tm = Matrix::translate(tx, 0.0).then(self.tm);
                                }
                            }
                        }
                    }
                }
            }
            _ => {}
        }
    }

    /// Interprets a form XObject in place: its `/Matrix` is concatenated to the
    /// CTM and its own `/Resources` (if any) replace the current scope. State
    /// is restored afterwards. Image XObjects are ignored.
    fn draw_form(&mut self, name: &[u8]) {
        let doc = self.doc;
        let Ok(Object::Reference(id)) = self.xobjects.get(name).cloned() else {
            return;
        };
        let Ok(stream) = doc.get_object(id).and_then(Object::as_stream) else {
            return;
        };
        if !matches!(stream.dict.get(b"Subtype"), Ok(Object::Name(n)) if n.as_slice() == b"Form") {
            return;
        }
        if self.form_depth >= MAX_FORM_DEPTH {
            log::warn!(
                "form XObject {} nested deeper than {MAX_FORM_DEPTH} levels, skipping",
                String::from_utf8_lossy(name)
            );
            return;
        }

        let bytes = if stream.dict.get(b"Filter").is_ok() {
            match stream.decompressed_content() {
                Ok(b) => b,
                Err(e) => {
                    log::warn!("form XObject {id:?} could not be decompressed: {e}");
                    return;
                }
            }
        } else {
            stream.content.clone()
        };
        let content = match LoContent::decode(&bytes) {
            Ok(c) => c,
            Err(e) => {
                log::warn!("form XObject {id:?} could not be decoded: {e}");
                return;
            }
        };
        let matrix = stream
            .dict
            .get(b"Matrix")
            .ok()
            .and_then(|o| resolve(doc, o).as_array().ok())
            .and_then(|a| Matrix::from_operands(a))
            .unwrap_or(Matrix::IDENTITY);

        let scope = stream
            .dict
            .get(b"Resources")
            .ok()
            .and_then(|o| resolve_dict(doc, o))
            .map(|res| {
                (
                    std::mem::replace(&mut self.fonts, load_fonts(doc, &res)),
                    std::mem::replace(&mut self.xobjects, resource_category(doc, &res, b"XObject")),
                )
            });
        let saved = (self.ctm, self.state.clone(), self.tm, self.tlm);
        let stack_len = self.stack.len();

        self.ctm = matrix.then(self.ctm);
        self.form_depth += 1;
        self.run(&content.operations);
        self.form_depth -= 1;

        self.stack.truncate(stack_len);
        (self.ctm, self.state, self.tm, self.tlm) = saved;
        if let Some((fonts, xobjects)) = scope {
            self.fonts = fonts;
            self.xobjects = xobjects;
        }
    }

    fn show(&mut self, bytes: &[u8]) {
        let font = self
            .state
            .font
            .as_ref()
            .and_then(|name| self.fonts.get(name))
            .unwrap_or(&self.fallback_font);
        let st = &self.state;

        let mut text = String::new();
        let mut advance = 0.0f32;
        for code in font.codes(bytes) {
            let mut tx = font.width_1000(code) / 1000.0 * st.size + st.char_spacing;
            if !font.composite && code == 32 {
                tx += st.word_spacing;
            }
            advance += tx * st.h_scale;
            font.decode(code, &mut text);
        }

        let m = self.tm.then(self.ctm);
        let size = st.size.abs() * m.vertical_scale();
        let top = st.rise + ASCENT_RATIO * st.size.abs();
        let bottom = st.rise - DESCENT_RATIO * st.size.abs();
        let corners = [
            m.apply(0.0, bottom),
            m.apply(advance, bottom),
            m.apply(0.0, top),
            m.apply(advance, top),
        ];
        let (_, origin_y) = m.apply(0.0, st.rise);
        self.tm = Matrix::translate(advance, 0.0).then(self.tm);

        if text.trim().is_empty() || size <= 0.0 {
            return;
        }

        let (mut x0, mut y0, mut x1, mut y1) = (f32::MAX, f32::MAX, f32::MIN, f32::MIN);
        for (x, y) in corners {
            x0 = x0.min(x);
            x1 = x1.max(x);
            y0 = y0.min(y);
            y1 = y1.max(y);
        }
        let h = self.page_height;
        self.runs.push(TextRun {
            rect: Rect::new(x0, h - y1, x1, h - y0),
            baseline: h - origin_y,
            size,
            text,
        });
    }
}

fn group_lines(runs: Vec<TextRun>) -> Vec<TextRun> {
    let mut lines: Vec<TextRun> = Vec::new();
    for run in runs {
        if let Some(line) = lines.last_mut() {
            let size = line.size.max(run.size);
            let gap = run.rect.x0 - line.rect.x1;
            if (run.baseline - line.baseline).abs() < 0.3 * size && gap > -0.5 * size && gap < 1.5 * size {
                if gap > 0.15 * size && !line.text.ends_with(' ') && !run.text.starts_with(' ') {
                    line.text.push(' ');
                }
                line.text.push_str(&run.text);
                line.rect = line.rect.union(&run.rect);
                line.size = size;
                continue;
            }
        }
        lines.push(run);
    }
    lines
}

fn group_blocks(lines: Vec<TextRun>) -> Vec<ContentBlock> {
    let mut blocks: Vec<(ContentBlock, f32)> = Vec::new();
    for line in lines {
        let text = line.text.trim().to_string();
        if let Some((block, size)) = blocks.last_mut() {
            let gap = line.rect.y0 - block.rect.y1;
            let overlaps_x = line.rect.x0 < block.rect.x1 && block.rect.x0 < line.rect.x1;
            if line.rect.y0 >= block.rect.y0 && gap < 0.6 * size.max(line.size) && overlaps_x {
                block.text.push('\n');
                block.text.push_str(&text);
                block.rect = block.rect.union(&line.rect);
                *size = size.max(line.size);
                continue;
            }
        }
        blocks.push((ContentBlock { rect: line.rect, text }, line.size));
    }
    blocks.into_iter().map(|(b, _)| b).collect()
}

fn load_fonts(doc: &Document, resources: &Dictionary) -> HashMap<Vec<u8>, FontInfo> {
    resource_category(doc, resources, b"Font")
        .iter()
        .filter_map(|(name, obj)| {
            let dict = resolve_dict(doc, obj)?;
            Some((name.clone(), load_font(doc, &dict)))
        })
        .collect()
}

/// Text blocks of the page in page space (top-left origin of the displayed
/// page), in content order.
pub(crate) fn page_content_blocks(
    doc: &Document,
    page_id: ObjectId,
    frame: &PageFrame,
) -> Result<Vec<ContentBlock>, Error> {
    let bytes = page_content_bytes(doc, page_id);
    if bytes.is_empty() {
        return Ok(Vec::new());
    }
    let content = LoContent::decode(&bytes)
        .map_err(|e| Error::Pdf(format!("content stream of page {page_id:?} could not be decoded: {e}")))?;

    let resources = page_resources(doc, page_id);
    let mut interp = Interpreter::new(doc, &resources, frame);
    interp.run(&content.operations);

    let blocks = group_blocks(group_lines(interp.runs));
    log::debug!("page {page_id:?}: {} content blocks", blocks.len());
    Ok(blocks)
}
