use anyhow::Context;
use base64::Engine;

use crate::foundation::error::{PackError, PackResult};

/// JPEG quality used when re-encoding images (0.8 on a 0..1 scale).
pub const JPEG_QUALITY_DEFAULT: u8 = 80;

const BASE64_MARKER: &str = ";base64,";

/// Image normalized to a baseline JPEG, ready to embed in a document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodedImage {
    /// Intrinsic width in pixels.
    pub width: u32,
    /// Intrinsic height in pixels.
    pub height: u32,
    /// JPEG bytes as standard padded base64, without a data-URI prefix.
    pub jpeg_base64: String,
}

/// Decode `bytes` in any supported format and re-encode them as JPEG at `quality`.
///
/// Transparent pixels are flattened over black before encoding.
pub fn transcode_to_jpeg(bytes: &[u8], quality: u8) -> PackResult<EncodedImage> {
    let dyn_img = image::load_from_memory(bytes)
        .map_err(|e| PackError::decode(format!("decode image from memory: {e}")))?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();
    if width == 0 || height == 0 {
        return Err(PackError::decode("image has zero width or height"));
    }

    let rgb = image::RgbImage::from_raw(width, height, flatten_rgba8_over_black(rgba.as_raw()))
        .context("rebuild flattened rgb buffer")?;

    let mut jpeg = Vec::new();
    {
        let mut encoder =
            image::codecs::jpeg::JpegEncoder::new_with_quality(&mut jpeg, quality.clamp(1, 100));
        encoder
            .encode_image(&rgb)
            .map_err(|e| PackError::decode(format!("encode jpeg: {e}")))?;
    }

    Ok(EncodedImage {
        width,
        height,
        jpeg_base64: base64::engine::general_purpose::STANDARD.encode(&jpeg),
    })
}

/// Return the payload following the first `;base64,` marker of a data URI.
///
/// Input without the marker is returned unchanged.
pub fn strip_data_uri(data_uri: &str) -> &str {
    match data_uri.find(BASE64_MARKER) {
        Some(idx) => &data_uri[idx + BASE64_MARKER.len()..],
        None => data_uri,
    }
}

/// Decode a base64 image payload, tolerating a leading data-URI prefix.
pub fn decode_base64_payload(payload: &str) -> PackResult<Vec<u8>> {
    base64::engine::general_purpose::STANDARD
        .decode(strip_data_uri(payload).trim())
        .map_err(|e| PackError::decode(format!("invalid base64 image payload: {e}")))
}

fn flatten_rgba8_over_black(rgba: &[u8]) -> Vec<u8> {
    let mut rgb = Vec::with_capacity(rgba.len() / 4 * 3);
    for px in rgba.chunks_exact(4) {
        let a = px[3] as u16;
        if a == 255 {
            rgb.extend_from_slice(&px[..3]);
            continue;
        }
        rgb.push(((px[0] as u16 * a + 127) / 255) as u8);
        rgb.push(((px[1] as u16 * a + 127) / 255) as u8);
        rgb.push(((px[2] as u16 * a + 127) / 255) as u8);
    }
    rgb
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
