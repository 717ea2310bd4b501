use image::{ImageFormat, RgbImage};

use crate::error::Result;
use crate::geometry::Point;
use crate::pixmap::{PixMap, PixMapFormat};

fn to_pixmap(rgb: RgbImage) -> PixMap<'static> {
    let (width, height) = rgb.dimensions();
    let mut image = PixMap::with_size(Point::new(width as i32, height as i32), PixMapFormat::Rgb24);
    let packed = width as usize * 3;
    for (yy, src) in rgb.as_raw().chunks_exact(packed.max(1)).enumerate() {
        image.row_mut(yy)[..packed].copy_from_slice(src);
    }
    image
}

/// Decode a JPEG skin image into 24-bit RGB.
pub fn decode_jpeg(bytes: &[u8]) -> Result<PixMap<'static>> {
    let decoded = image::load_from_memory_with_format(bytes, ImageFormat::Jpeg)?;
    Ok(to_pixmap(decoded.to_rgb8()))
}

/// Decode any image format the `image` crate was built with.
pub fn decode_image(bytes: &[u8]) -> Result<PixMap<'static>> {
    let decoded = image::load_from_memory(bytes)?;
    Ok(to_pixmap(decoded.to_rgb8()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::codecs::jpeg::JpegEncoder;
    use image::{ImageEncoder, Rgb};
    use std::io::Cursor;

    #[test]
    fn png_decodes_exactly() {
        let mut src = RgbImage::new(3, 2);
        src.put_pixel(2, 1, Rgb([10, 20, 30]));
        let mut png = Vec::new();
        src.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .unwrap();

        let image = decode_image(&png).unwrap();
        assert_eq!(image.size(), Point::new(3, 2));
        assert_eq!(image.format(), PixMapFormat::Rgb24);
        assert_eq!(&image.row(1)[6..9], &[10, 20, 30]);
        assert!(decode_jpeg(&png).is_err());
    }

    #[test]
    fn jpeg_decodes_close_to_source() {
        let src = RgbImage::from_pixel(16, 8, Rgb([120, 140, 90]));
        let mut jpeg = Vec::new();
        JpegEncoder::new_with_quality(&mut jpeg, 95)
            .write_image(src.as_raw(), 16, 8, image::ExtendedColorType::Rgb8)
            .unwrap();

        let image = decode_jpeg(&jpeg).unwrap();
        assert_eq!(image.size(), Point::new(16, 8));
        for (got, want) in image.row(4)[..3].iter().zip([120u8, 140, 90]) {
            assert!(got.abs_diff(want) <= 4, "{got} vs {want}");
        }
    }
}
