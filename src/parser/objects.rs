//! Small helpers for walking lopdf objects.

use lopdf::{Dictionary, Document as LopdfDocument, Object, ObjectId};

use crate::model::BoundingBox;

/// Maximum Pages-tree depth followed when looking up inherited attributes.
const MAX_INHERIT_DEPTH: usize = 32;

/// Resolve an object to a dictionary, following one indirect reference.
pub(crate) fn resolve_dict<'a>(doc: &'a LopdfDocument, obj: &'a Object) -> Option<&'a Dictionary> {
    match obj {
        Object::Dictionary(d) => Some(d),
        Object::Reference(id) => match doc.get_object(*id).ok()? {
            Object::Dictionary(d) => Some(d),
            Object::Stream(s) => Some(&s.dict),
            _ => None,
        },
        Object::Stream(s) => Some(&s.dict),
        _ => None,
    }
}

/// Resolve an indirect reference, or return the object itself.
pub(crate) fn resolve<'a>(doc: &'a LopdfDocument, obj: &'a Object) -> &'a Object {
    match obj {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
        _ => obj,
    }
}

/// Numeric value of an integer or real operand.
pub(crate) fn get_number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

/// Name object as an owned string.
pub(crate) fn name_of(obj: &Object) -> Option<String> {
    obj.as_name()
        .ok()
        .map(|n| String::from_utf8_lossy(n).into_owned())
}

/// Look up a page attribute, walking up the Pages tree for inherited keys.
pub(crate) fn inherited_attribute<'a>(
    doc: &'a LopdfDocument,
    page_id: ObjectId,
    key: &[u8],
) -> Option<&'a Object> {
    let mut node = doc.get_dictionary(page_id).ok()?;
    for _ in 0..MAX_INHERIT_DEPTH {
        if let Ok(value) = node.get(key) {
            return Some(value);
        }
        let parent = node.get(b"Parent").ok()?.as_reference().ok()?;
        node = doc.get_dictionary(parent).ok()?;
    }
    None
}

/// The page's resource dictionary, possibly inherited.
pub(crate) fn page_resources(doc: &LopdfDocument, page_id: ObjectId) -> Option<&Dictionary> {
    inherited_attribute(doc, page_id, b"Resources").and_then(|r| resolve_dict(doc, r))
}

/// The page's MediaBox as `(x0, y0, x1, y1)`; US Letter when absent.
pub(crate) fn page_media_box(doc: &LopdfDocument, page_id: ObjectId) -> (f32, f32, f32, f32) {
    let values: Option<Vec<f32>> = inherited_attribute(doc, page_id, b"MediaBox")
        .map(|obj| resolve(doc, obj))
        .and_then(|obj| obj.as_array().ok())
        .map(|arr| {
            arr.iter()
                .filter_map(|o| get_number(resolve(doc, o)))
                .collect()
        });

    match values.as_deref() {
        Some([x0, y0, x1, y1]) => (
            x0.min(*x1),
            y0.min(*y1),
            x0.max(*x1),
            y0.max(*y1),
        ),
        _ => (0.0, 0.0, 612.0, 792.0),
    }
}

/// Converts PDF user-space coordinates (origin bottom-left, y up) into
/// top-down page coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub origin_x: f32,
    pub origin_y: f32,
    pub width: f32,
    pub height: f32,
}

impl PageGeometry {
    pub fn new(origin_x: f32, origin_y: f32, width: f32, height: f32) -> Self {
        Self {
            origin_x,
            origin_y,
            width,
            height,
        }
    }

    pub(crate) fn from_media_box((x0, y0, x1, y1): (f32, f32, f32, f32)) -> Self {
        Self::new(x0, y0, x1 - x0, y1 - y0)
    }

    /// Map a user-space rectangle (`bottom < top`) to a top-down box.
    pub fn to_top_down(&self, left: f32, bottom: f32, right: f32, top: f32) -> BoundingBox {
        let top_down_y = self.height - (top - self.origin_y);
        BoundingBox::from_corners(
            left - self.origin_x,
            top_down_y,
            right - self.origin_x,
            top_down_y + (top - bottom).abs(),
        )
    }
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self::new(0.0, 0.0, 612.0, 792.0)
    }
}
