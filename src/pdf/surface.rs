use std::collections::HashMap;

use lopdf::{Dictionary, Document, Object, ObjectId, Stream, dictionary};
use pdf_writer::{Content, Name, Str};

use crate::assets::{ImageRole, PreparedImage};
use crate::error::{Error, pdf_err};
use crate::fonts::{ASCENT_RATIO, DESCENT_RATIO, LINE_HEIGHT_RATIO, STAMP_FONT, text_width, to_winansi_bytes};
use crate::model::{ContentBlock, Point, Rect, Rgb, TextAlign};

use super::extract::page_content_blocks;
use super::layout::wrap_text_with_safety;
use super::resources::{PageFrame, content_stream_ids, page_resources, resource_category};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Stroke {
    pub color: Rgb,
    pub width: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextStyle {
    pub font_size: f32,
    pub color: Rgb,
    pub align: TextAlign,
}

/// Drawing and inspection capabilities the stamper needs from a page.
///
/// All coordinates are page space: origin top-left, y downward.
pub trait PageSurface {
    fn size(&self) -> (f32, f32);

    fn content_blocks(&self) -> Vec<ContentBlock>;

    fn draw_filled_rect(&mut self, rect: Rect, fill: Rgb, stroke: Option<Stroke>);

    fn draw_line(&mut self, from: Point, to: Point, stroke: Stroke);

    /// Draws `text` into `rect` and returns the number of lines placed.
    fn insert_text(&mut self, rect: Rect, text: &str, style: TextStyle) -> usize;

    fn insert_image(&mut self, rect: Rect, image: &PreparedImage) -> Result<(), Error>;
}

/// A line of textbox output: text, left x, baseline y (page space).
#[derive(Clone, Debug, PartialEq)]
pub struct PlacedLine {
    pub text: String,
    pub x: f32,
    pub baseline: f32,
}

/// Textbox layout: newline-separated paragraphs wrapped to the rect width,
/// lines that would end below the rect dropped. The first line is always kept.
pub fn layout_textbox(rect: Rect, text: &str, style: TextStyle) -> Vec<PlacedLine> {
    let size = style.font_size;
    let line_h = size * LINE_HEIGHT_RATIO;
    let mut out = Vec::new();
    let mut index = 0usize;

    for paragraph in text.lines() {
        let wrapped = wrap_text_with_safety(paragraph, rect.width(), size, 0.0);
        let wrapped = if wrapped.is_empty() { vec![String::new()] } else { wrapped };
        for line in wrapped {
            let baseline = rect.y0 + ASCENT_RATIO * size + index as f32 * line_h;
            if index > 0 && baseline + DESCENT_RATIO * size > rect.y1 + 0.01 {
                return out;
            }
            index += 1;
            if line.is_empty() {
                continue;
            }
            let w = text_width(&line, size);
            let x = match style.align {
                TextAlign::Left => rect.x0,
                TextAlign::Center => rect.x0 + (rect.width() - w) / 2.0,
                TextAlign::Right => rect.x1 - w,
            };
            out.push(PlacedLine { text: line, x, baseline });
        }
    }
    out
}

/// Document-wide objects shared by every stamped page.
#[derive(Debug, Default)]
pub struct ResourceRegistry {
    font: Option<ObjectId>,
    images: HashMap<(ImageRole, u32, u32), (String, ObjectId)>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn font(&mut self, doc: &mut Document) -> ObjectId {
        *self.font.get_or_insert_with(|| {
            doc.add_object(dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => "Helvetica",
                "Encoding" => "WinAnsiEncoding",
            })
        })
    }

    /// Embeds each distinct (role, size) bitmap once: FlateDecode RGB plus an
    /// SMask when any pixel is not opaque.
    fn image(&mut self, doc: &mut Document, image: &PreparedImage) -> (String, ObjectId) {
        let key = (image.role(), image.width(), image.height());
        if let Some(found) = self.images.get(&key) {
            return found.clone();
        }

        let rgba = image.pixels();
        let (w, h) = (image.width() as i64, image.height() as i64);
        let rgb: Vec<u8> = rgba.pixels().flat_map(|p| [p.0[0], p.0[1], p.0[2]]).collect();

        let smask = if image.has_transparency() {
            let alpha: Vec<u8> = rgba.pixels().map(|p| p.0[3]).collect();
            let mask = Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => w,
                    "Height" => h,
                    "ColorSpace" => "DeviceGray",
                    "BitsPerComponent" => 8,
                    "Filter" => "FlateDecode",
                },
                miniz_oxide::deflate::compress_to_vec_zlib(&alpha, 6),
            );
            Some(doc.add_object(mask))
        } else {
            None
        };

        let mut dict = dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => w,
            "Height" => h,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
            "Filter" => "FlateDecode",
        };
        if let Some(mask_id) = smask {
            dict.set("SMask", mask_id);
        }
        let id = doc.add_object(Stream::new(
            dict,
            miniz_oxide::deflate::compress_to_vec_zlib(&rgb, 6),
        ));

        let prefix = match image.role() {
            ImageRole::Logo => "TbLogo",
            ImageRole::Signature => "TbSign",
        };
        let name = format!("{prefix}{}x{}", image.width(), image.height());
        self.images.insert(key, (name.clone(), id));
        (name, id)
    }
}

/// [`PageSurface`] over one page of a lopdf document.
///
/// Page space follows the displayed page: CropBox (else MediaBox) with
/// `/Rotate` applied. Drawing is buffered in display space behind a `cm` that
/// maps it back to user space, and written by [`LopdfPage::commit`].
pub struct LopdfPage<'a> {
    doc: &'a mut Document,
    registry: &'a mut ResourceRegistry,
    page_id: ObjectId,
    frame: PageFrame,
    blocks: Vec<ContentBlock>,
    content: Content,
    xobjects: Vec<(String, ObjectId)>,
    uses_font: bool,
    dirty: bool,
}

impl<'a> LopdfPage<'a> {
    pub fn open(
        doc: &'a mut Document,
        registry: &'a mut ResourceRegistry,
        page_id: ObjectId,
    ) -> Self {
        let frame = PageFrame::of(doc, page_id);
        let blocks = page_content_blocks(doc, page_id, &frame).unwrap_or_else(|e| {
            log::warn!("{e}; treating page as having no text blocks");
            Vec::new()
        });
        if frame.rotation != 0 {
            log::debug!("page {page_id:?} is displayed rotated by {}", frame.rotation);
        }
        let mut content = Content::new();
        content.transform(frame.to_user());
        Self {
            doc,
            registry,
            page_id,
            frame,
            blocks,
            content,
            xobjects: Vec::new(),
            uses_font: false,
            dirty: false,
        }
    }

    /// Page space to the display space the overlay is drawn in.
    fn pdf_point(&self, x: f32, y: f32) -> (f32, f32) {
        let (_, height) = self.frame.size();
        (x, height - y)
    }

    /// Writes buffered drawing into the page: the original content is wrapped
    /// in `q`/`Q` and the overlay appended as a new compressed stream.
    ///
    /// The merged resource dictionary is set directly on the page, so resource
    /// objects shared with other pages are left untouched.
    pub fn commit(self) -> Result<(), Error> {
        if !self.dirty {
            return Ok(());
        }
        let LopdfPage {
            doc,
            registry,
            page_id,
            content,
            xobjects,
            uses_font,
            ..
        } = self;

        let font_id = uses_font.then(|| registry.font(doc));

        let existing = content_stream_ids(doc, page_id);
        let mut overlay = Vec::new();
        if !existing.is_empty() {
            overlay.extend_from_slice(b"Q\n");
        }
        overlay.extend_from_slice(&content.finish());
        let overlay_id = doc.add_object(Stream::new(
            dictionary! { "Filter" => "FlateDecode" },
            miniz_oxide::deflate::compress_to_vec_zlib(&overlay, 6),
        ));

        let mut contents: Vec<Object> = Vec::with_capacity(existing.len() + 2);
        if !existing.is_empty() {
            let open_id = doc.add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
            contents.push(open_id.into());
            contents.extend(existing.iter().map(|id| Object::Reference(*id)));
        }
        contents.push(overlay_id.into());

        let mut resources = page_resources(doc, page_id);
        let mut fonts = resource_category(doc, &resources, b"Font");
        let mut images = resource_category(doc, &resources, b"XObject");
        if let Some(id) = font_id {
            fonts.set(STAMP_FONT, id);
            resources.set("Font", fonts);
        }
        if !xobjects.is_empty() {
            for (name, id) in &xobjects {
                images.set(name.as_str(), *id);
            }
            resources.set("XObject", images);
        }

        let page = doc
            .get_object_mut(page_id)
            .and_then(Object::as_dict_mut)
            .map_err(|e| pdf_err("page is not a dictionary", e))?;
        page.set("Resources", resources);
        page.set("Contents", contents);
        Ok(())
    }
}

impl PageSurface for LopdfPage<'_> {
    fn size(&self) -> (f32, f32) {
        self.frame.size()
    }

    fn content_blocks(&self) -> Vec<ContentBlock> {
        self.blocks.clone()
    }

    fn draw_filled_rect(&mut self, rect: Rect, fill: Rgb, stroke: Option<Stroke>) {
        let (x, y) = self.pdf_point(rect.x0, rect.y1);
        let c = &mut self.content;
        c.save_state();
        c.set_fill_rgb(fill[0], fill[1], fill[2]);
        c.rect(x, y, rect.width(), rect.height());
        match stroke {
            Some(s) => {
                c.set_stroke_rgb(s.color[0], s.color[1], s.color[2]);
                c.set_line_width(s.width);
                c.fill_nonzero_and_stroke();
            }
            None => {
                c.fill_nonzero();
            }
        }
        c.restore_state();
        self.dirty = true;
    }

    fn draw_line(&mut self, from: Point, to: Point, stroke: Stroke) {
        let (x0, y0) = self.pdf_point(from.x, from.y);
        let (x1, y1) = self.pdf_point(to.x, to.y);
        let c = &mut self.content;
        c.save_state();
        c.set_stroke_rgb(stroke.color[0], stroke.color[1], stroke.color[2]);
        c.set_line_width(stroke.width);
        c.move_to(x0, y0);
        c.line_to(x1, y1);
        c.stroke();
        c.restore_state();
        self.dirty = true;
    }

    fn insert_text(&mut self, rect: Rect, text: &str, style: TextStyle) -> usize {
        let lines = layout_textbox(rect, text, style);
        if lines.is_empty() {
            return 0;
        }
        let clip = self.pdf_point(rect.x0, rect.y1);
        let placed: Vec<(f32, f32, Vec<u8>)> = lines
            .iter()
            .map(|l| {
                let (x, y) = self.pdf_point(l.x, l.baseline);
                (x, y, to_winansi_bytes(&l.text))
            })
            .collect();

        let c = &mut self.content;
        c.save_state();
        c.rect(clip.0, clip.1, rect.width().max(0.0), rect.height().max(0.0));
        c.clip_nonzero();
        c.end_path();
        c.set_fill_rgb(style.color[0], style.color[1], style.color[2]);
        for (x, y, bytes) in &placed {
            c.begin_text();
            c.set_font(Name(STAMP_FONT.as_bytes()), style.font_size);
            c.next_line(*x, *y);
            c.show(Str(bytes));
            c.end_text();
        }
        c.restore_state();
        self.uses_font = true;
        self.dirty = true;
        lines.len()
    }

    fn insert_image(&mut self, rect: Rect, image: &PreparedImage) -> Result<(), Error> {
        if rect.is_empty() {
            return Ok(());
        }
        let (name, id) = self.registry.image(self.doc, image);
        if !self.xobjects.iter().any(|(n, _)| *n == name) {
            self.xobjects.push((name.clone(), id));
        }
        let (x, y) = self.pdf_point(rect.x0, rect.y1);
        let c = &mut self.content;
        c.save_state();
        c.transform([rect.width(), 0.0, 0.0, rect.height(), x, y]);
        c.x_object(Name(name.as_bytes()));
        c.restore_state();
        self.dirty = true;
        Ok(())
    }
}
