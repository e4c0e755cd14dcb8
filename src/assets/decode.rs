use std::io::Cursor;

use base64::Engine as _;

use crate::foundation::{
    core::RasterImage,
    error::{MemeError, MemeResult},
};

/// Prefix of every artifact's encoded image.
pub const PNG_DATA_URI_PREFIX: &str = "data:image/png;base64,";

/// Decode any raster format the `image` crate understands into a premultiplied raster.
pub fn decode_image(bytes: &[u8]) -> MemeResult<RasterImage> {
    let dyn_img = image::load_from_memory(bytes)
        .map_err(|e| MemeError::decode(format!("decode image from memory: {e}")))?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();

    let mut rgba8_premul = rgba.into_raw();
    premultiply_rgba8_in_place(&mut rgba8_premul);

    RasterImage::from_rgba8_premul(width, height, rgba8_premul)
}

/// Encode a raster as a straight-alpha PNG.
pub fn encode_png(img: &RasterImage) -> MemeResult<Vec<u8>> {
    let straight = image::RgbaImage::from_raw(img.width(), img.height(), img.to_straight_rgba8())
        .ok_or_else(|| MemeError::render("raster buffer does not match its dimensions"))?;

    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(straight)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .map_err(|e| MemeError::render(format!("encode png: {e}")))?;
    Ok(buf)
}

/// Self-contained `data:image/png;base64,...` URI for a raster.
pub fn encode_png_data_uri(img: &RasterImage) -> MemeResult<String> {
    let png = encode_png(img)?;
    let mut out = String::with_capacity(PNG_DATA_URI_PREFIX.len() + png.len() * 4 / 3 + 4);
    out.push_str(PNG_DATA_URI_PREFIX);
    base64::engine::general_purpose::STANDARD.encode_string(&png, &mut out);
    Ok(out)
}

/// Extract the payload bytes of a `data:` URI. Both base64 and percent-encoded payloads are
/// accepted.
pub fn data_uri_bytes(uri: &str) -> MemeResult<Vec<u8>> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| MemeError::decode("not a data URI"))?;
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| MemeError::decode("invalid data URI: missing comma"))?;

    if meta.split(';').any(|part| part.eq_ignore_ascii_case("base64")) {
        base64::engine::general_purpose::STANDARD
            .decode(payload.trim())
            .map_err(|e| MemeError::decode(format!("invalid base64 payload: {e}")))
    } else {
        percent_decode(payload)
    }
}

/// Decode the image carried by a `data:` URI.
pub fn decode_data_uri(uri: &str) -> MemeResult<RasterImage> {
    decode_image(&data_uri_bytes(uri)?)
}

fn percent_decode(input: &str) -> MemeResult<Vec<u8>> {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = bytes
                .get(i + 1..i + 3)
                .and_then(|h| std::str::from_utf8(h).ok())
                .and_then(|h| u8::from_str_radix(h, 16).ok())
                .ok_or_else(|| MemeError::decode("invalid percent escape in data URI"))?;
            out.push(hex);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    Ok(out)
}

fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        px[0] = ((px[0] as u16 * a + 127) / 255) as u8;
        px[1] = ((px[1] as u16 * a + 127) / 255) as u8;
        px[2] = ((px[2] as u16 * a + 127) / 255) as u8;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
