//! Lookups over the lopdf object graph: inherited page attributes, resource
//! dictionaries, and content stream lists.

use lopdf::{Dictionary, Document, Object, ObjectId};

/// Guards walks up the page tree against reference cycles in malformed files.
const MAX_TREE_DEPTH: usize = 32;

/// US Letter, for pages that carry no usable box.
const DEFAULT_BOX: [f32; 4] = [0.0, 0.0, 612.0, 792.0];

pub(crate) fn obj_to_f32(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

/// Follow a single indirect reference, if any.
pub(crate) fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> &'a Object {
    match obj {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
        other => other,
    }
}

/// Clone of a dictionary that may be stored inline or behind a reference.
pub(crate) fn resolve_dict(doc: &Document, obj: &Object) -> Option<Dictionary> {
    match resolve(doc, obj) {
        Object::Dictionary(d) => Some(d.clone()),
        Object::Stream(s) => Some(s.dict.clone()),
        _ => None,
    }
}

/// Look up `key` on the page, then on its ancestors in the page tree.
pub(crate) fn inherited_attribute<'a>(
    doc: &'a Document,
    page_id: ObjectId,
    key: &[u8],
) -> Option<&'a Object> {
    let mut current = Some(page_id);
    let mut depth = 0;
    while let Some(id) = current {
        if depth > MAX_TREE_DEPTH {
            break;
        }
        depth += 1;
        let dict = doc.get_object(id).ok()?.as_dict().ok()?;
        if let Ok(value) = dict.get(key) {
            return Some(value);
        }
        current = dict.get(b"Parent").and_then(Object::as_reference).ok();
    }
    None
}

fn box_from(doc: &Document, obj: &Object) -> Option<[f32; 4]> {
    let Object::Array(arr) = resolve(doc, obj) else {
        return None;
    };
    if arr.len() != 4 {
        return None;
    }
    let v: Vec<f32> = arr
        .iter()
        .filter_map(|o| obj_to_f32(resolve(doc, o)))
        .collect();
    if v.len() != 4 {
        return None;
    }
    let b = [v[0].min(v[2]), v[1].min(v[3]), v[0].max(v[2]), v[1].max(v[3])];
    (b[2] > b[0] && b[3] > b[1]).then_some(b)
}

/// Visible page area `[llx, lly, urx, ury]` in PDF user space: CropBox, else MediaBox.
fn page_box(doc: &Document, page_id: ObjectId) -> [f32; 4] {
    inherited_attribute(doc, page_id, b"CropBox")
        .and_then(|o| box_from(doc, o))
        .or_else(|| inherited_attribute(doc, page_id, b"MediaBox").and_then(|o| box_from(doc, o)))
        .unwrap_or(DEFAULT_BOX)
}

/// Inherited `/Rotate`, normalized to 0, 90, 180 or 270 degrees clockwise.
fn page_rotation(doc: &Document, page_id: ObjectId) -> u16 {
    let raw = inherited_attribute(doc, page_id, b"Rotate")
        .and_then(|o| obj_to_f32(resolve(doc, o)))
        .unwrap_or(0.0) as i64;
    let degrees = raw.rem_euclid(360);
    if degrees % 90 != 0 {
        log::warn!("page {page_id:?} has /Rotate {raw}, not a multiple of 90; ignoring it");
        return 0;
    }
    degrees as u16
}

/// Visible page area and the rotation it is displayed with.
///
/// Display space has its origin at the displayed bottom-left corner, y up, and
/// spans [`PageFrame::size`]. Page space is the same area flipped to a
/// top-left origin.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct PageFrame {
    pub(crate) bbox: [f32; 4],
    pub(crate) rotation: u16,
}

impl PageFrame {
    pub(crate) fn of(doc: &Document, page_id: ObjectId) -> Self {
        Self {
            bbox: page_box(doc, page_id),
            rotation: page_rotation(doc, page_id),
        }
    }

    /// Width and height as displayed.
    pub(crate) fn size(&self) -> (f32, f32) {
        let [llx, lly, urx, ury] = self.bbox;
        let (w, h) = (urx - llx, ury - lly);
        if self.rotation % 180 == 90 { (h, w) } else { (w, h) }
    }

    /// Display space to user space, as `cm` operands.
    pub(crate) fn to_user(&self) -> [f32; 6] {
        let [llx, lly, urx, ury] = self.bbox;
        match self.rotation {
            90 => [0.0, 1.0, -1.0, 0.0, urx, lly],
            180 => [-1.0, 0.0, 0.0, -1.0, urx, ury],
            270 => [0.0, -1.0, 1.0, 0.0, llx, ury],
            _ => [1.0, 0.0, 0.0, 1.0, llx, lly],
        }
    }

    /// User space to display space; the inverse of [`PageFrame::to_user`].
    pub(crate) fn from_user(&self) -> [f32; 6] {
        let [llx, lly, urx, ury] = self.bbox;
        match self.rotation {
            90 => [0.0, -1.0, 1.0, 0.0, -lly, urx],
            180 => [-1.0, 0.0, 0.0, -1.0, urx, ury],
            270 => [0.0, 1.0, -1.0, 0.0, ury, -llx],
            _ => [1.0, 0.0, 0.0, 1.0, -llx, -lly],
        }
    }
}

/// The page's effective resource dictionary (possibly inherited), cloned.
pub(crate) fn page_resources(doc: &Document, page_id: ObjectId) -> Dictionary {
    inherited_attribute(doc, page_id, b"Resources")
        .and_then(|o| resolve_dict(doc, o))
        .unwrap_or_default()
}

/// Named entries of one resource category (`Font`, `XObject`, ...), cloned.
pub(crate) fn resource_category(doc: &Document, resources: &Dictionary, key: &[u8]) -> Dictionary {
    resources
        .get(key)
        .ok()
        .and_then(|o| resolve_dict(doc, o))
        .unwrap_or_default()
}

/// Object ids of the page's content streams, in drawing order.
pub(crate) fn content_stream_ids(doc: &Document, page_id: ObjectId) -> Vec<ObjectId> {
    let Ok(page) = doc.get_object(page_id).and_then(Object::as_dict) else {
        return Vec::new();
    };
    let Ok(contents) = page.get(b"Contents") else {
        return Vec::new();
    };
    let items: Vec<Object> = match contents {
        Object::Reference(id) => match doc.get_object(*id) {
            Ok(Object::Array(arr)) => arr.clone(),
            Ok(_) => return vec![*id],
            Err(_) => return Vec::new(),
        },
        Object::Array(arr) => arr.clone(),
        _ => return Vec::new(),
    };
    items
        .iter()
        .filter_map(|o| o.as_reference().ok())
        .collect()
}

/// Decoded bytes of all content streams, joined by whitespace.
pub(crate) fn page_content_bytes(doc: &Document, page_id: ObjectId) -> Vec<u8> {
    let mut out = Vec::new();
    for id in content_stream_ids(doc, page_id) {
        let Ok(stream) = doc.get_object(id).and_then(Object::as_stream) else {
            log::warn!("content entry {id:?} is not a stream, skipping");
            continue;
        };
        let bytes = if stream.dict.get(b"Filter").is_ok() {
            match stream.decompressed_content() {
                Ok(b) => b,
                Err(e) => {
                    log::warn!("content stream {id:?} could not be decompressed: {e}");
                    continue;
                }
            }
        } else {
            stream.content.clone()
        };
        if !out.is_empty() {
            out.push(b'\n');
        }
        out.extend_from_slice(&bytes);
    }
    out
}
