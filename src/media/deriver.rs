//! Rendition derivation for product images.
//!
//! One source raster in, two JPEG renditions out. Pure: no storage, no
//! database, no clock.

use image::{
    codecs::jpeg::JpegEncoder, imageops::FilterType, DynamicImage, ExtendedColorType,
    GenericImageView,
};

use super::MediaError;

/// Bounding box of the medium rendition (width, height).
pub const MEDIUM_BOX: (u32, u32) = (310, 466);
/// Bounding box of the small rendition (width, height).
pub const SMALL_BOX: (u32, u32) = (85, 124);
/// Encoder quality for both renditions.
pub const JPEG_QUALITY: u8 = 95;

/// Encoded renditions of one source image.
#[derive(Debug, Clone)]
pub struct Renditions {
    pub medium: Vec<u8>,
    pub small: Vec<u8>,
}

/// Decodes `source`, normalises it to RGB and produces the medium and small
/// renditions.
pub fn derive(source: &[u8]) -> Result<Renditions, MediaError> {
    let decoded =
        image::load_from_memory(source).map_err(|e| MediaError::Decode(e.to_string()))?;
    let rgb = DynamicImage::ImageRgb8(decoded.to_rgb8());

    Ok(Renditions {
        medium: render(&rgb, MEDIUM_BOX)?,
        small: render(&rgb, SMALL_BOX)?,
    })
}

fn render(source: &DynamicImage, bounds: (u32, u32)) -> Result<Vec<u8>, MediaError> {
    let (width, height) = fit_within(source.width(), source.height(), bounds);
    let resized = if (width, height) == source.dimensions() {
        source.clone()
    } else {
        source.resize_exact(width, height, FilterType::CatmullRom)
    };
    encode_jpeg(&resized)
}

fn encode_jpeg(img: &DynamicImage) -> Result<Vec<u8>, MediaError> {
    let rgb = img.to_rgb8();
    let mut out = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY);
    encoder
        .encode(rgb.as_raw(), rgb.width(), rgb.height(), ExtendedColorType::Rgb8)
        .map_err(|e| MediaError::Encode(e.to_string()))?;
    Ok(out)
}

/// Dimensions of `width`×`height` scaled down to fit `bounds`, keeping the
/// aspect ratio. Images that already fit are returned unchanged.
///
/// The free dimension is rounded to whichever neighbouring integer keeps the
/// ratio closest to the source, and never drops below one pixel.
pub fn fit_within(width: u32, height: u32, bounds: (u32, u32)) -> (u32, u32) {
    let (max_w, max_h) = bounds;
    if width <= max_w && height <= max_h {
        return (width, height);
    }

    let aspect = f64::from(width) / f64::from(height);
    let (box_w, box_h) = (f64::from(max_w), f64::from(max_h));

    if box_w / box_h >= aspect {
        let w = round_aspect(box_h * aspect, |n| (aspect - n / box_h).abs());
        (w, max_h)
    } else {
        let h = round_aspect(box_w / aspect, |n| {
            if n == 0.0 {
                0.0
            } else {
                (aspect - box_w / n).abs()
            }
        });
        (max_w, h)
    }
}

fn round_aspect(number: f64, distance: impl Fn(f64) -> f64) -> u32 {
    let floor = number.floor();
    let ceil = number.ceil();
    let best = if distance(ceil) < distance(floor) {
        ceil
    } else {
        floor
    };
    (best as u32).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, ImageFormat, Luma, Rgb, RgbImage, Rgba, RgbaImage};
    use proptest::prelude::*;
    use std::io::Cursor;

    fn encode(img: DynamicImage, format: ImageFormat) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, format).expect("encode fixture");
        buf.into_inner()
    }

    fn decode(bytes: &[u8]) -> DynamicImage {
        image::load_from_memory(bytes).expect("decode rendition")
    }

    #[test]
    fn portrait_source_fits_both_boxes() {
        let source = RgbImage::from_pixel(600, 912, Rgb([200, 40, 40]));
        let png = encode(DynamicImage::ImageRgb8(source), ImageFormat::Png);

        let renditions = derive(&png).expect("derive");

        let medium = decode(&renditions.medium);
        assert_eq!(medium.height(), 466);
        assert!(medium.width() <= 310);
        assert_eq!(medium.dimensions(), (307, 466));

        let small = decode(&renditions.small);
        assert_eq!(small.height(), 124);
        assert!(small.width() <= 85);
        assert_eq!(small.dimensions(), (82, 124));
    }

    #[test]
    fn renditions_are_jpeg() {
        let source = RgbImage::from_pixel(400, 400, Rgb([10, 120, 10]));
        let png = encode(DynamicImage::ImageRgb8(source), ImageFormat::Png);

        let renditions = derive(&png).unwrap();
        for bytes in [&renditions.medium, &renditions.small] {
            assert_eq!(&bytes[..3], &[0xFF, 0xD8, 0xFF]);
            assert_eq!(
                image::guess_format(bytes).unwrap(),
                ImageFormat::Jpeg
            );
        }
    }

    #[test]
    fn grayscale_and_alpha_sources_are_normalised() {
        let gray = GrayImage::from_pixel(320, 480, Luma([128]));
        let rgba = RgbaImage::from_pixel(320, 480, Rgba([1, 2, 3, 100]));

        for bytes in [
            encode(DynamicImage::ImageLuma8(gray), ImageFormat::Png),
            encode(DynamicImage::ImageRgba8(rgba), ImageFormat::Png),
        ] {
            let renditions = derive(&bytes).expect("derive");
            assert_eq!(decode(&renditions.medium).color(), image::ColorType::Rgb8);
        }
    }

    #[test]
    fn small_sources_are_not_upscaled() {
        let source = RgbImage::from_pixel(50, 60, Rgb([0, 0, 255]));
        let png = encode(DynamicImage::ImageRgb8(source), ImageFormat::Png);

        let renditions = derive(&png).unwrap();
        assert_eq!(decode(&renditions.medium).dimensions(), (50, 60));
        assert_eq!(decode(&renditions.small).dimensions(), (50, 60));
    }

    #[test]
    fn unreadable_source_is_a_decode_error() {
        let err = derive(b"definitely not an image").unwrap_err();
        assert!(matches!(err, MediaError::Decode(_)));
    }

    #[test]
    fn landscape_source_is_bounded_by_width() {
        assert_eq!(fit_within(1240, 930, MEDIUM_BOX), (310, 233));
        assert_eq!(fit_within(1240, 930, SMALL_BOX), (85, 64));
    }

    proptest! {
        #[test]
        fn fitted_size_never_exceeds_box_or_source(
            w in 1u32..4000,
            h in 1u32..4000,
        ) {
            for bounds in [MEDIUM_BOX, SMALL_BOX] {
                let (fw, fh) = fit_within(w, h, bounds);
                prop_assert!(fw >= 1 && fh >= 1);
                prop_assert!(fw <= bounds.0.max(1) && fh <= bounds.1.max(1));
                prop_assert!(fw <= w && fh <= h);
            }
        }
    }
}
