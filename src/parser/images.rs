//! Image XObject decoding.
//!
//! JPEG and JPEG 2000 streams are passed through untouched. Raw sample
//! streams are unpacked according to their colour space and re-encoded as
//! PNG.

use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};
use lopdf::{Dictionary, Document as LopdfDocument, Object, Stream};

use crate::error::{Error, Result};
use crate::model::ImageFormat;

use super::objects::{name_of, resolve};

/// An image stream decoded into a saveable file.
#[derive(Debug, Clone)]
pub(crate) struct DecodedImage {
    pub data: Vec<u8>,
    pub format: ImageFormat,
    pub width: u32,
    pub height: u32,
}

/// Colour space of the raw samples, with everything needed to expand them
/// to 8-bit gray or RGB.
#[derive(Debug, Clone, PartialEq)]
enum ColorSpace {
    Gray,
    Rgb,
    Cmyk,
    /// Palette lookup: base components and the packed palette bytes
    Indexed { base: Box<ColorSpace>, palette: Vec<u8> },
}

impl ColorSpace {
    fn components(&self) -> usize {
        match self {
            ColorSpace::Gray => 1,
            ColorSpace::Rgb => 3,
            ColorSpace::Cmyk => 4,
            ColorSpace::Indexed { .. } => 1,
        }
    }

    fn resolve(doc: &LopdfDocument, obj: &Object) -> Option<Self> {
        match resolve(doc, obj) {
            Object::Name(name) => Self::from_name(name),
            Object::Array(items) => {
                let family = items.first().and_then(name_of)?;
                match family.as_str() {
                    "ICCBased" => {
                        let n = items
                            .get(1)
                            .map(|o| resolve(doc, o))
                            .and_then(|o| match o {
                                Object::Stream(s) => s.dict.get(b"N").ok()?.as_i64().ok(),
                                _ => None,
                            })
                            .unwrap_or(3);
                        match n {
                            1 => Some(ColorSpace::Gray),
                            4 => Some(ColorSpace::Cmyk),
                            _ => Some(ColorSpace::Rgb),
                        }
                    }
                    "Indexed" | "I" => {
                        let base = Self::resolve(doc, items.get(1)?)?;
                        if matches!(base, ColorSpace::Indexed { .. }) {
                            return None;
                        }
                        let palette = match resolve(doc, items.get(3)?) {
                            Object::String(bytes, _) => bytes.clone(),
                            Object::Stream(s) => s
                                .decompressed_content()
                                .unwrap_or_else(|_| s.content.clone()),
                            _ => return None,
                        };
                        Some(ColorSpace::Indexed {
                            base: Box::new(base),
                            palette,
                        })
                    }
                    "CalGray" => Some(ColorSpace::Gray),
                    "CalRGB" | "Lab" => Some(ColorSpace::Rgb),
                    _ => None,
                }
            }
            _ => None,
        }
    }

    fn from_name(name: &[u8]) -> Option<Self> {
        match name {
            b"DeviceGray" | b"G" | b"CalGray" => Some(ColorSpace::Gray),
            b"DeviceRGB" | b"RGB" | b"CalRGB" => Some(ColorSpace::Rgb),
            b"DeviceCMYK" | b"CMYK" => Some(ColorSpace::Cmyk),
            _ => None,
        }
    }
}

/// Whether an XObject stream is an image (as opposed to a form).
pub(crate) fn is_image(stream: &Stream) -> bool {
    stream.dict.get(b"Subtype").ok().and_then(name_of).as_deref() == Some("Image")
}

/// Decode an image XObject into JPEG, JPX or PNG bytes.
///
/// Returns `Ok(None)` for streams that are not images.
pub(crate) fn decode_image(doc: &LopdfDocument, stream: &Stream) -> Result<Option<DecodedImage>> {
    let dict = &stream.dict;
    if !is_image(stream) {
        return Ok(None);
    }

    let width = dimension(doc, dict, b"Width")?;
    let height = dimension(doc, dict, b"Height")?;
    let filters = filters(doc, dict);

    if filters.iter().any(|f| f == "DCTDecode" || f == "DCT") {
        return Ok(Some(DecodedImage {
            data: stream.content.clone(),
            format: ImageFormat::Jpeg,
            width,
            height,
        }));
    }
    if filters.iter().any(|f| f == "JPXDecode") {
        return Ok(Some(DecodedImage {
            data: stream.content.clone(),
            format: ImageFormat::Jpx,
            width,
            height,
        }));
    }
    if let Some(unsupported) = filters
        .iter()
        .find(|f| !matches!(f.as_str(), "FlateDecode" | "Fl" | "LZWDecode" | "LZW"))
    {
        return Err(Error::ImageExtract(format!(
            "unsupported image filter {}",
            unsupported
        )));
    }

    let samples = if filters.is_empty() {
        stream.content.clone()
    } else {
        stream
            .decompressed_content()
            .map_err(|e| Error::ImageExtract(e.to_string()))?
    };

    let is_mask = matches!(dict.get(b"ImageMask"), Ok(Object::Boolean(true)));
    let (color_space, bits) = if is_mask {
        (ColorSpace::Gray, 1)
    } else {
        let cs = dict
            .get(b"ColorSpace")
            .ok()
            .and_then(|cs| ColorSpace::resolve(doc, cs))
            .ok_or_else(|| Error::ImageExtract("unsupported colour space".to_string()))?;
        let bits = dict
            .get(b"BitsPerComponent")
            .ok()
            .and_then(|b| resolve(doc, b).as_i64().ok())
            .unwrap_or(8) as u8;
        (cs, bits)
    };

    let (pixels, color_type) = expand_samples(&samples, width, height, &color_space, bits)?;
    let data = encode_png(&pixels, width, height, color_type)?;

    Ok(Some(DecodedImage {
        data,
        format: ImageFormat::Png,
        width,
        height,
    }))
}

fn dimension(doc: &LopdfDocument, dict: &Dictionary, key: &[u8]) -> Result<u32> {
    dict.get(key)
        .ok()
        .and_then(|v| resolve(doc, v).as_i64().ok())
        .filter(|v| *v > 0)
        .map(|v| v as u32)
        .ok_or_else(|| {
            Error::ImageExtract(format!(
                "missing {}",
                String::from_utf8_lossy(key)
            ))
        })
}

fn filters(doc: &LopdfDocument, dict: &Dictionary) -> Vec<String> {
    match dict.get(b"Filter").map(|f| resolve(doc, f)) {
        Ok(Object::Name(name)) => vec![String::from_utf8_lossy(name).into_owned()],
        Ok(Object::Array(items)) => items.iter().filter_map(name_of).collect(),
        _ => Vec::new(),
    }
}

/// Expand packed samples to 8-bit gray or RGB pixels.
fn expand_samples(
    samples: &[u8],
    width: u32,
    height: u32,
    color_space: &ColorSpace,
    bits: u8,
) -> Result<(Vec<u8>, ExtendedColorType)> {
    if !matches!(bits, 1 | 2 | 4 | 8) {
        return Err(Error::ImageExtract(format!(
            "unsupported bits per component {}",
            bits
        )));
    }

    let components = color_space.components();
    let row_bytes = (width as usize * components * bits as usize).div_ceil(8);
    let needed = row_bytes * height as usize;
    if samples.len() < needed {
        return Err(Error::ImageExtract(format!(
            "image data too short ({} < {} bytes)",
            samples.len(),
            needed
        )));
    }

    let indexed = matches!(color_space, ColorSpace::Indexed { .. });
    let max = (1u16 << bits) - 1;
    let mut values = Vec::with_capacity(width as usize * height as usize * components);
    for row in samples[..needed].chunks_exact(row_bytes) {
        for i in 0..width as usize * components {
            let raw = sample_at(row, i, bits);
            values.push(if indexed || bits == 8 {
                raw
            } else {
                (raw as u16 * 255 / max) as u8
            });
        }
    }

    Ok(match color_space {
        ColorSpace::Gray => (values, ExtendedColorType::L8),
        ColorSpace::Rgb => (values, ExtendedColorType::Rgb8),
        ColorSpace::Cmyk => (cmyk_to_rgb(&values), ExtendedColorType::Rgb8),
        ColorSpace::Indexed { base, palette } => {
            let stride = base.components();
            let mut expanded = Vec::with_capacity(values.len() * stride);
            for &index in &values {
                let start = index as usize * stride;
                match palette.get(start..start + stride) {
                    Some(entry) => expanded.extend_from_slice(entry),
                    None => expanded.extend(std::iter::repeat(0).take(stride)),
                }
            }
            match base.as_ref() {
                ColorSpace::Gray => (expanded, ExtendedColorType::L8),
                ColorSpace::Cmyk => (cmyk_to_rgb(&expanded), ExtendedColorType::Rgb8),
                _ => (expanded, ExtendedColorType::Rgb8),
            }
        }
    })
}

/// The `i`th sample of a packed row.
fn sample_at(row: &[u8], i: usize, bits: u8) -> u8 {
    if bits == 8 {
        return row[i];
    }
    let bit = i * bits as usize;
    let byte = row[bit / 8];
    let shift = 8 - bits as usize - bit % 8;
    (byte >> shift) & ((1u16 << bits) - 1) as u8
}

fn cmyk_to_rgb(values: &[u8]) -> Vec<u8> {
    values
        .chunks_exact(4)
        .flat_map(|px| {
            let k = 255 - px[3] as u16;
            [
                ((255 - px[0] as u16) * k / 255) as u8,
                ((255 - px[1] as u16) * k / 255) as u8,
                ((255 - px[2] as u16) * k / 255) as u8,
            ]
        })
        .collect()
}

fn encode_png(pixels: &[u8], width: u32, height: u32, color: ExtendedColorType) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    PngEncoder::new(&mut buffer)
        .write_image(pixels, width, height, color)
        .map_err(|e| Error::ImageExtract(format!("PNG encoding failed: {}", e)))?;
    Ok(buffer)
}
