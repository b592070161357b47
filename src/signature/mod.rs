//! Signature image cleanup.
//!
//! Scanned or photographed signatures come back with a grey paper tone.
//! Whitening snaps every near-white pixel to opaque white so the ink sits on
//! a clean background. The operation is pure and idempotent.

use std::borrow::Cow;
use std::io::Cursor;

use image::{Rgba, RgbaImage};
use thiserror::Error;

/// Pixels whose RGB average is above this become white
pub const WHITE_THRESHOLD: u32 = 235;

const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

#[derive(Debug, Error)]
pub enum SignatureError {
    #[error("Failed to decode signature image: {0}")]
    Decode(#[source] image::ImageError),

    #[error("Failed to encode signature image: {0}")]
    Encode(#[source] image::ImageError),
}

/// Force near-white pixels to opaque white in place
pub fn whiten(img: &mut RgbaImage) {
    for pixel in img.pixels_mut() {
        let [r, g, b, _] = pixel.0;
        // avg > 235 without the rounding of an integer divide
        if u32::from(r) + u32::from(g) + u32::from(b) > WHITE_THRESHOLD * 3 {
            *pixel = WHITE;
        }
    }
}

/// Decode any supported format, whiten, and re-encode as PNG
pub fn normalize(bytes: &[u8]) -> Result<Vec<u8>, SignatureError> {
    let mut img = image::load_from_memory(bytes)
        .map_err(SignatureError::Decode)?
        .to_rgba8();
    whiten(&mut img);
    encode_png(&img)
}

/// Like [`normalize`], but hands back the input untouched when it cannot be read.
///
/// `Cow::Owned` means the result is PNG; `Cow::Borrowed` is the original.
pub fn normalize_or_original(bytes: &[u8]) -> Cow<'_, [u8]> {
    match normalize(bytes) {
        Ok(png) => Cow::Owned(png),
        Err(e) => {
            tracing::debug!("Serving signature unmodified: {}", e);
            Cow::Borrowed(bytes)
        }
    }
}

/// File extension for image bytes, judged from their magic number; `bin` when unknown
pub fn file_extension(bytes: &[u8]) -> &'static str {
    image::guess_format(bytes)
        .ok()
        .and_then(|format| format.extensions_str().first().copied())
        .unwrap_or("bin")
}

/// Numeric id from a backend signature path such as `/api/v1/signature/file/12`.
///
/// The first `/file/` that is followed by digits wins; earlier ones that are
/// not are skipped.
pub fn signature_file_id(path: &str) -> Option<&str> {
    const MARKER: &str = "/file/";
    let mut from = 0;
    while let Some(found) = path[from..].find(MARKER) {
        let rest = &path[from + found + MARKER.len()..];
        let end = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        if end > 0 {
            return Some(&rest[..end]);
        }
        // markers can share their slash, as in `/file/file/3`
        from += found + 1;
    }
    None
}

pub fn encode_png(img: &RgbaImage) -> Result<Vec<u8>, SignatureError> {
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, image::ImageFormat::Png)
        .map_err(SignatureError::Encode)?;
    Ok(buf.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> RgbaImage {
        let mut img = RgbaImage::new(4, 1);
        img.put_pixel(0, 0, Rgba([240, 236, 236, 120])); // sum 712, whitened
        img.put_pixel(1, 0, Rgba([235, 235, 235, 255])); // sum 705, kept
        img.put_pixel(2, 0, Rgba([10, 10, 40, 255]));
        img.put_pixel(3, 0, Rgba([255, 255, 230, 0])); // sum 740, whitened
        img
    }

    #[test]
    fn whitens_only_above_threshold() {
        let mut img = sample();
        whiten(&mut img);
        assert_eq!(*img.get_pixel(0, 0), WHITE);
        assert_eq!(*img.get_pixel(1, 0), Rgba([235, 235, 235, 255]));
        assert_eq!(*img.get_pixel(2, 0), Rgba([10, 10, 40, 255]));
        assert_eq!(*img.get_pixel(3, 0), WHITE);
    }

    #[test]
    fn normalize_is_idempotent() {
        let png = encode_png(&sample()).unwrap();
        let once = normalize(&png).unwrap();
        let twice = normalize(&once).unwrap();
        let a = image::load_from_memory(&once).unwrap().to_rgba8();
        let b = image::load_from_memory(&twice).unwrap().to_rgba8();
        assert_eq!(a.as_raw(), b.as_raw());
    }

    #[test]
    fn unreadable_input_is_returned_as_is() {
        let junk = b"definitely not an image";
        let out = normalize_or_original(junk);
        assert!(matches!(out, Cow::Borrowed(_)));
        assert_eq!(&*out, &junk[..]);
    }

    #[test]
    fn extension_follows_the_bytes() {
        let png = encode_png(&sample()).unwrap();
        assert_eq!(file_extension(&png), "png");
        assert_eq!(file_extension(&normalize(&png).unwrap()), "png");
        assert_eq!(file_extension(&[0xFF, 0xD8, 0xFF, 0xE0, 0, 0x10, b'J', b'F', b'I', b'F']), "jpg");
        assert_eq!(file_extension(b"definitely not an image"), "bin");
    }

    #[test]
    fn file_id_extraction() {
        assert_eq!(signature_file_id("/api/v1/signature/file/12"), Some("12"));
        assert_eq!(signature_file_id("/signature/file/7/raw"), Some("7"));
        assert_eq!(signature_file_id("/signature/file/abc"), None);
        assert_eq!(signature_file_id("/signature/user/a@b.c"), None);
        assert_eq!(signature_file_id("/file/x/file/3"), Some("3"));
        assert_eq!(signature_file_id("/file/file/3"), Some("3"));
        assert_eq!(signature_file_id("/file/"), None);
    }
}
