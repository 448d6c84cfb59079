//! Still capture: crop the frame to the face box and encode it.

use crate::types::FaceBox;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageEncoder};
use thiserror::Error;

/// Default JPEG quality for the uploaded face crop.
pub const DEFAULT_JPEG_QUALITY: u8 = 90;

#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("no frame available for capture")]
    NoFrame,
    #[error("no face to capture")]
    NoFace,
    #[error("failed to decode image: {0}")]
    Decode(String),
    #[error("face box {0:?} does not overlap the captured image")]
    EmptyCrop(FaceBox),
    #[error("failed to encode image: {0}")]
    Encode(String),
}

/// Crop region within the still image, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Pixel region of `image_size` covered by `face`, which was detected in a
/// frame of `frame_size`. The box is scaled when the sizes differ and
/// clamped to the image.
pub fn crop_region(
    face: &FaceBox,
    frame_size: (u32, u32),
    image_size: (u32, u32),
) -> Result<CropRegion, CaptureError> {
    let scaled = face.scale(frame_size, image_size);
    let (img_w, img_h) = (image_size.0 as f32, image_size.1 as f32);

    let x0 = scaled.x.max(0.0).min(img_w);
    let y0 = scaled.y.max(0.0).min(img_h);
    let x1 = (scaled.x + scaled.width).max(0.0).min(img_w);
    let y1 = (scaled.y + scaled.height).max(0.0).min(img_h);

    let x = x0.round() as u32;
    let y = y0.round() as u32;
    let width = (x1.round() as u32).saturating_sub(x);
    let height = (y1.round() as u32).saturating_sub(y);

    if width == 0 || height == 0 {
        return Err(CaptureError::EmptyCrop(*face));
    }
    Ok(CropRegion {
        x,
        y,
        width,
        height,
    })
}

/// Crop `still` to the face and encode it as JPEG.
pub fn crop_and_encode(
    still: &DynamicImage,
    face: &FaceBox,
    frame_size: (u32, u32),
    quality: u8,
) -> Result<Vec<u8>, CaptureError> {
    let CropRegion {
        x,
        y,
        width,
        height,
    } = crop_region(face, frame_size, (still.width(), still.height()))?;
    let cropped = still.crop_imm(x, y, width, height);
    tracing::debug!(x, y, width, height, "face crop");
    encode_jpeg(&cropped, quality)
}

/// Encode as baseline RGB JPEG.
pub fn encode_jpeg(image: &DynamicImage, quality: u8) -> Result<Vec<u8>, CaptureError> {
    let rgb = image.to_rgb8();
    let mut buffer = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100));
    encoder
        .write_image(
            rgb.as_raw(),
            rgb.width(),
            rgb.height(),
            image::ExtendedColorType::Rgb8,
        )
        .map_err(|e| CaptureError::Encode(e.to_string()))?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    fn gradient(width: u32, height: u32) -> DynamicImage {
        let mut img = RgbImage::new(width, height);
        for (x, y, pixel) in img.enumerate_pixels_mut() {
            *pixel = image::Rgb([(x % 256) as u8, (y % 256) as u8, 128]);
        }
        DynamicImage::ImageRgb8(img)
    }

    #[test]
    fn test_crop_region_same_size() {
        let face = FaceBox::new(10.0, 20.0, 50.0, 60.0);
        let r = crop_region(&face, (360, 270), (360, 270)).unwrap();
        assert_eq!(
            r,
            CropRegion {
                x: 10,
                y: 20,
                width: 50,
                height: 60
            }
        );
    }

    #[test]
    fn test_crop_region_scales_to_still() {
        let face = FaceBox::new(90.0, 27.0, 180.0, 135.0);
        let r = crop_region(&face, (360, 270), (720, 540)).unwrap();
        assert_eq!(
            r,
            CropRegion {
                x: 180,
                y: 54,
                width: 360,
                height: 270
            }
        );
    }

    #[test]
    fn test_crop_region_clamps_to_image() {
        let face = FaceBox::new(-10.0, 250.0, 50.0, 50.0);
        let r = crop_region(&face, (360, 270), (360, 270)).unwrap();
        assert_eq!(
            r,
            CropRegion {
                x: 0,
                y: 250,
                width: 40,
                height: 20
            }
        );
    }

    #[test]
    fn test_crop_region_outside_image_fails() {
        let face = FaceBox::new(400.0, 10.0, 50.0, 50.0);
        let err = crop_region(&face, (360, 270), (360, 270)).unwrap_err();
        assert!(matches!(err, CaptureError::EmptyCrop(_)));
    }

    #[test]
    fn test_crop_and_encode_produces_jpeg_of_crop_size() {
        let still = gradient(64, 48);
        let face = FaceBox::new(8.0, 8.0, 32.0, 24.0);
        let data = crop_and_encode(&still, &face, (64, 48), DEFAULT_JPEG_QUALITY).unwrap();
        assert_eq!(&data[..2], &[0xFF, 0xD8]);

        let decoded = image::load_from_memory(&data).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (32, 24));
    }
}
