//! Image decoding and encoding.
//!
//! Photos and overlay assets arrive as raw bytes or base64 data URIs and are
//! decoded into premultiplied [`Pixmap`]s ready for compositing.

use base64::Engine;
use tiny_skia::{IntSize, Pixmap};

use crate::error::{RenderError, RenderResult};

/// Supported image formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    /// PNG with alpha support.
    Png,
    /// JPEG (no alpha).
    Jpeg,
    /// WebP (alpha support).
    WebP,
    /// Unknown/other format.
    Unknown,
}

impl ImageFormat {
    /// Detect format from magic bytes.
    #[must_use]
    pub fn from_magic_bytes(data: &[u8]) -> Self {
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
            Self::Png
        } else if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Self::Jpeg
        } else if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
            Self::WebP
        } else {
            Self::Unknown
        }
    }

    /// MIME type, `application/octet-stream` when unknown.
    #[must_use]
    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::WebP => "image/webp",
            Self::Unknown => "application/octet-stream",
        }
    }
}

/// A decoded image.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedImage {
    /// Format sniffed from the input bytes.
    pub format: ImageFormat,
    /// Premultiplied RGBA pixels.
    pub pixmap: Pixmap,
}

impl DecodedImage {
    /// Width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    /// Height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }
}

/// Decode an image from raw bytes.
///
/// # Errors
///
/// Returns [`RenderError::Decode`] if the bytes are not a supported image or
/// the image is empty.
pub fn load_image_from_bytes(data: &[u8]) -> RenderResult<DecodedImage> {
    let format = ImageFormat::from_magic_bytes(data);
    let img = image::load_from_memory(data).map_err(|e| RenderError::Decode(e.to_string()))?;
    let pixmap = rgba_to_pixmap(img.to_rgba8())?;
    tracing::trace!(
        ?format,
        width = pixmap.width(),
        height = pixmap.height(),
        "Image decoded"
    );
    Ok(DecodedImage { format, pixmap })
}

/// Decode an image from a data URI such as `data:image/png;base64,iVBOR...`.
///
/// # Errors
///
/// Returns an error if the URI is malformed or the payload cannot be decoded.
pub fn load_image_from_data_uri(uri: &str) -> RenderResult<DecodedImage> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| RenderError::Resource("Not a data URI".to_string()))?;
    let (metadata, payload) = rest
        .split_once(',')
        .ok_or_else(|| RenderError::Resource("Invalid data URI: missing comma".to_string()))?;

    let bytes = if metadata.ends_with(";base64") {
        base64::engine::general_purpose::STANDARD
            .decode(payload)
            .map_err(|e| RenderError::Resource(format!("Failed to decode base64: {e}")))?
    } else {
        percent_decode(payload)?
    };

    load_image_from_bytes(&bytes)
}

fn percent_decode(input: &str) -> RenderResult<Vec<u8>> {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let byte = input
                .get(i + 1..i + 3)
                .and_then(|hex| u8::from_str_radix(hex, 16).ok())
                .ok_or_else(|| RenderError::Resource("Invalid URL encoding".to_string()))?;
            out.push(byte);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    Ok(out)
}

/// Convert straight-alpha RGBA into a premultiplied pixmap.
///
/// # Errors
///
/// Returns [`RenderError::Decode`] for zero-sized images.
#[allow(clippy::cast_possible_truncation)]
pub fn rgba_to_pixmap(rgba: image::RgbaImage) -> RenderResult<Pixmap> {
    let (width, height) = rgba.dimensions();
    let size = IntSize::from_wh(width, height)
        .ok_or_else(|| RenderError::Decode(format!("image has no pixels ({width}x{height})")))?;

    let mut data = rgba.into_raw();
    for px in data.chunks_exact_mut(4) {
        let alpha = u16::from(px[3]);
        if alpha < 255 {
            for channel in &mut px[..3] {
                *channel = ((u16::from(*channel) * alpha + 127) / 255) as u8;
            }
        }
    }

    Pixmap::from_vec(data, size)
        .ok_or_else(|| RenderError::Decode("pixel buffer does not match image size".to_string()))
}

/// Encode a pixmap as PNG.
///
/// # Errors
///
/// Returns [`RenderError::Encode`] if encoding fails.
pub fn encode_png(pixmap: &Pixmap) -> RenderResult<Vec<u8>> {
    pixmap
        .encode_png()
        .map_err(|e| RenderError::Encode(format!("PNG encoding failed: {e}")))
}

/// Wrap PNG bytes in a `data:image/png;base64,` URI.
#[must_use]
pub fn png_data_uri(png: &[u8]) -> String {
    format!(
        "data:{};base64,{}",
        ImageFormat::Png.mime_type(),
        base64::engine::general_purpose::STANDARD.encode(png)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    // 1x1 red pixel.
    const RED_PNG_BASE64: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mP8z8DwHwAFBQIAX8jx0gAAAABJRU5ErkJggg==";

    #[test]
    fn test_format_detection_from_magic_bytes() {
        assert_eq!(
            ImageFormat::from_magic_bytes(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]),
            ImageFormat::Png
        );
        assert_eq!(
            ImageFormat::from_magic_bytes(&[0xFF, 0xD8, 0xFF, 0xE0]),
            ImageFormat::Jpeg
        );
        assert_eq!(
            ImageFormat::from_magic_bytes(b"RIFF\x00\x00\x00\x00WEBP"),
            ImageFormat::WebP
        );
        assert_eq!(ImageFormat::from_magic_bytes(&[0x00]), ImageFormat::Unknown);
    }

    #[test]
    fn test_data_uri_parsing() {
        let uri = format!("data:image/png;base64,{RED_PNG_BASE64}");
        let decoded = load_image_from_data_uri(&uri).expect("valid data URI");
        assert_eq!((decoded.width(), decoded.height()), (1, 1));
        assert_eq!(decoded.format, ImageFormat::Png);
        let px = decoded.pixmap.pixel(0, 0).expect("pixel");
        assert_eq!((px.red(), px.alpha()), (255, 255));
    }

    #[test]
    fn test_invalid_data_uri() {
        assert!(load_image_from_data_uri("not a data uri").is_err());
        assert!(load_image_from_data_uri("data:image/png").is_err());
        assert!(load_image_from_data_uri("data:image/png,%zz").is_err());
    }

    #[test]
    fn test_garbage_bytes_fail_to_decode() {
        let err = load_image_from_bytes(b"definitely not an image").unwrap_err();
        assert!(matches!(err, RenderError::Decode(_)));
    }

    #[test]
    fn test_alpha_is_premultiplied() {
        let rgba = image::RgbaImage::from_pixel(1, 1, image::Rgba([200, 100, 0, 128]));
        let pixmap = rgba_to_pixmap(rgba).expect("pixmap");
        let px = pixmap.pixel(0, 0).expect("pixel");
        assert_eq!((px.red(), px.green(), px.blue(), px.alpha()), (100, 50, 0, 128));
    }

    #[test]
    fn test_png_data_uri_prefix() {
        let pixmap = Pixmap::new(2, 2).expect("pixmap");
        let png = encode_png(&pixmap).expect("png");
        let uri = png_data_uri(&png);
        assert!(uri.starts_with("data:image/png;base64,iVBOR"));
        let back = load_image_from_data_uri(&uri).expect("decode");
        assert_eq!((back.width(), back.height()), (2, 2));
    }
}
