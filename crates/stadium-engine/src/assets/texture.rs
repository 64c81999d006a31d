use crate::build::BuildError;
use crate::device::DecodedImage;

/// Decodes an encoded image (PNG, JPEG, BMP or DDS) into RGBA8 pixels.
pub fn decode_texture(name: &str, bytes: &[u8]) -> Result<DecodedImage, BuildError> {
    let img = image::load_from_memory(bytes).map_err(|e| BuildError::decode(name, e))?;
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    log::debug!("decoded texture {name}: {width}x{height}");
    Ok(DecodedImage { width, height, rgba: rgba.into_raw() })
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn decodes_png_into_rgba() {
        let src = image::RgbaImage::from_raw(2, 1, vec![255, 0, 0, 255, 0, 0, 255, 128]).unwrap();
        let mut encoded = Vec::new();
        image::DynamicImage::ImageRgba8(src)
            .write_to(&mut Cursor::new(&mut encoded), image::ImageFormat::Png)
            .unwrap();

        let decoded = decode_texture("two.png", &encoded).unwrap();
        assert_eq!((decoded.width, decoded.height), (2, 1));
        assert_eq!(decoded.rgba, vec![255, 0, 0, 255, 0, 0, 255, 128]);
    }

    #[test]
    fn garbage_is_a_decode_error() {
        let err = decode_texture("Castle1.dds", b"not an image").unwrap_err();
        assert!(matches!(err, BuildError::Decode { name, .. } if name == "Castle1.dds"));
    }
}
