#![allow(dead_code)]

use std::io::Cursor;

use lopdf::{Dictionary, Document, Object, ObjectId, Stream, dictionary};
use titleblock_pdf::{
    ContentBlock, Error, Field, FieldValues, ImageRole, LopdfPage, PageSurface, Point,
    PreparedImage, Rect, RenderAssets, ResourceRegistry, Rgb, Stroke, TextStyle, layout_textbox,
};

pub const LETTER: (f32, f32) = (612.0, 792.0);

/// One line of Helvetica text placed with `Td` at PDF user-space (x, y).
pub struct TextLine<'a> {
    pub x: f32,
    pub y: f32,
    pub size: f32,
    pub text: &'a str,
}

pub fn text(x: f32, y: f32, size: f32, text: &str) -> TextLine<'_> {
    TextLine { x, y, size, text }
}

pub fn helvetica(doc: &mut Document) -> ObjectId {
    doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    })
}

/// Finish a document: a page tree at `pages_id` over `kids` (with any extra
/// inheritable entries from `tree`), a catalog, and the saved bytes.
pub fn save_pages(mut doc: Document, pages_id: ObjectId, kids: Vec<ObjectId>, tree: Dictionary) -> Vec<u8> {
    let count = kids.len() as i64;
    let mut pages = dictionary! {
        "Type" => "Pages",
        "Kids" => kids.into_iter().map(Object::from).collect::<Vec<_>>(),
        "Count" => count,
    };
    for (key, value) in tree.iter() {
        pages.set(key.clone(), value.clone());
    }
    doc.objects.insert(pages_id, Object::Dictionary(pages));
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buf = Vec::new();
    doc.save_to(&mut buf).expect("failed to save test PDF");
    buf
}

/// Build a PDF whose pages each draw the given lines with a Helvetica `/F1`.
pub fn build_pdf(pages: &[Vec<TextLine<'_>>]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id: ObjectId = doc.new_object_id();
    let font_id = helvetica(&mut doc);

    let mut kids = Vec::new();
    for lines in pages {
        let mut content = String::new();
        for l in lines {
            content.push_str(&format!(
                "BT /F1 {} Tf {} {} Td ({}) Tj ET\n",
                l.size, l.x, l.y, l.text
            ));
        }
        let content_id = doc.add_object(Stream::new(Dictionary::new(), content.into_bytes()));
        kids.push(doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Contents" => content_id,
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => font_id },
            },
        }));
    }
    save_pages(doc, pages_id, kids, Dictionary::new())
}

/// Content blocks of one page as the stamper sees them.
pub fn blocks_of(bytes: &[u8], page_index: usize) -> Vec<ContentBlock> {
    let mut doc = Document::load_mem(bytes).expect("reload");
    let mut registry = ResourceRegistry::new();
    let id = page_ids(&doc)[page_index];
    let page = LopdfPage::open(&mut doc, &mut registry, id);
    page.content_blocks()
}

pub fn find_block<'a>(blocks: &'a [ContentBlock], text: &str) -> &'a ContentBlock {
    blocks
        .iter()
        .find(|b| b.text.contains(text))
        .unwrap_or_else(|| panic!("no block containing {text:?} in {blocks:?}"))
}

/// Names registered under one resource category of a page, following references.
pub fn resource_names(doc: &Document, page: ObjectId, category: &[u8]) -> Vec<String> {
    let dict = doc.get_dictionary(page).expect("page dict");
    let res = match dict.get(b"Resources").expect("resources") {
        Object::Reference(id) => doc.get_dictionary(*id).expect("resources dict"),
        Object::Dictionary(d) => d,
        other => panic!("unexpected resources {other:?}"),
    };
    let Ok(cat) = res.get(category) else {
        return Vec::new();
    };
    let cat = match cat {
        Object::Reference(id) => doc.get_dictionary(*id).expect("category dict"),
        Object::Dictionary(d) => d,
        other => panic!("unexpected category {other:?}"),
    };
    cat.iter()
        .map(|(k, _)| String::from_utf8_lossy(k).into_owned())
        .collect()
}

pub fn blank_pdf(page_count: usize) -> Vec<u8> {
    let pages: Vec<Vec<TextLine<'_>>> = (0..page_count).map(|_| Vec::new()).collect();
    build_pdf(&pages)
}

pub fn png_bytes(width: u32, height: u32, rgba: [u8; 4]) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba(rgba));
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, image::ImageFormat::Png)
        .expect("encode png");
    buf.into_inner()
}

pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_pixel(width, height, image::Rgb([30, 60, 200]));
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, image::ImageFormat::Jpeg)
        .expect("encode jpeg");
    buf.into_inner()
}

pub fn assets() -> RenderAssets {
    RenderAssets::load(&png_bytes(120, 30, [200, 20, 20, 255]), &png_bytes(200, 100, [0, 0, 0, 128]))
        .expect("test assets decode")
}

pub fn all_fields() -> FieldValues {
    FieldValues::new()
        .with(Field::DrawingNumber, "D-100")
        .with(Field::Title, "General arrangement")
        .with(Field::Client, "Harbour Authority")
        .with(Field::Project, "Quay wall extension")
        .with(Field::WorkOrder, "WO-2291")
        .with(Field::Contractor, "Nordic Build AS")
        .with(Field::Consultant, "Structura")
        .with(Field::Submitted, "A. Engineer")
        .with(Field::Checked, "B. Checker")
        .with(Field::Approved, "C. Approver")
}

pub fn page_ids(doc: &Document) -> Vec<ObjectId> {
    doc.get_pages().values().copied().collect()
}

pub fn assert_close(actual: f32, expected: f32) {
    assert!(
        (actual - expected).abs() < 0.01,
        "expected {expected}, got {actual}"
    );
}

pub fn is_invalid_image(result: &Result<RenderAssets, Error>) -> bool {
    matches!(result, Err(Error::InvalidImage(_)))
}

#[derive(Clone, Debug, PartialEq)]
pub enum Op {
    Rect { rect: Rect, fill: Rgb, stroke: Option<Stroke> },
    Line { from: Point, to: Point, stroke: Stroke },
    Text { rect: Rect, text: String },
    Image { rect: Rect, role: ImageRole, width: u32, height: u32 },
}

/// In-memory surface that records every drawing call.
pub struct RecordingSurface {
    pub width: f32,
    pub height: f32,
    pub blocks: Vec<ContentBlock>,
    pub ops: Vec<Op>,
}

impl RecordingSurface {
    pub fn new(width: f32, height: f32, blocks: Vec<ContentBlock>) -> Self {
        Self {
            width,
            height,
            blocks,
            ops: Vec::new(),
        }
    }

    pub fn letter(blocks: Vec<ContentBlock>) -> Self {
        Self::new(LETTER.0, LETTER.1, blocks)
    }

    pub fn texts(&self) -> Vec<(Rect, String)> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                Op::Text { rect, text } => Some((*rect, text.clone())),
                _ => None,
            })
            .collect()
    }

    pub fn images(&self) -> Vec<(Rect, ImageRole, u32, u32)> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                Op::Image { rect, role, width, height } => Some((*rect, *role, *width, *height)),
                _ => None,
            })
            .collect()
    }

    pub fn lines(&self) -> usize {
        self.ops.iter().filter(|op| matches!(op, Op::Line { .. })).count()
    }
}

impl PageSurface for RecordingSurface {
    fn size(&self) -> (f32, f32) {
        (self.width, self.height)
    }

    fn content_blocks(&self) -> Vec<ContentBlock> {
        self.blocks.clone()
    }

    fn draw_filled_rect(&mut self, rect: Rect, fill: Rgb, stroke: Option<Stroke>) {
        self.ops.push(Op::Rect { rect, fill, stroke });
    }

    fn draw_line(&mut self, from: Point, to: Point, stroke: Stroke) {
        self.ops.push(Op::Line { from, to, stroke });
    }

    fn insert_text(&mut self, rect: Rect, text: &str, style: TextStyle) -> usize {
        self.ops.push(Op::Text {
            rect,
            text: text.to_string(),
        });
        layout_textbox(rect, text, style).len()
    }

    fn insert_image(&mut self, rect: Rect, image: &PreparedImage) -> Result<(), Error> {
        self.ops.push(Op::Image {
            rect,
            role: image.role(),
            width: image.width(),
            height: image.height(),
        });
        Ok(())
    }
}
