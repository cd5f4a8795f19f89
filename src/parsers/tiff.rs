use image::ImageFormat;
use serde_json::{json, Value};

use crate::core::error::ParseError;

/// Decode TIFF bytes and summarise what the decoder produced.
///
/// The result is raster metadata, not geometry.
pub fn parse(bytes: &[u8]) -> Result<Value, ParseError> {
    let image = image::load_from_memory_with_format(bytes, ImageFormat::Tiff)
        .map_err(|e| ParseError::TiffDecode(e.to_string()))?;

    let color = image.color();

    Ok(json!({
        "format": "tiff",
        "width": image.width(),
        "height": image.height(),
        "colorType": format!("{:?}", color),
        "channels": color.channel_count(),
        "byteLength": bytes.len(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Luma};
    use std::io::Cursor;

    fn encode_tiff(width: u32, height: u32) -> Vec<u8> {
        let img: ImageBuffer<Luma<u8>, Vec<u8>> =
            ImageBuffer::from_fn(width, height, |x, y| Luma([((x + y) % 256) as u8]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Tiff).unwrap();
        out.into_inner()
    }

    #[test]
    fn test_decode_summary() {
        let bytes = encode_tiff(4, 3);
        let summary = parse(&bytes).unwrap();

        assert_eq!(summary["format"], "tiff");
        assert_eq!(summary["width"], 4);
        assert_eq!(summary["height"], 3);
        assert_eq!(summary["channels"], 1);
        assert_eq!(summary["byteLength"], bytes.len());
    }

    #[test]
    fn test_garbage_fails() {
        assert!(matches!(
            parse(b"definitely not a tiff"),
            Err(ParseError::TiffDecode(_))
        ));
    }
}
