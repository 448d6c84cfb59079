use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::time::Instant;

/// Bounding box of a detected face, in the coordinates of the frame it was
/// detected in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FaceBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub confidence: f32,
}

impl FaceBox {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            confidence: 1.0,
        }
    }

    /// Map this box from a `from` (width, height) frame into a `to` frame.
    pub fn scale(&self, from: (u32, u32), to: (u32, u32)) -> FaceBox {
        if from == to || from.0 == 0 || from.1 == 0 {
            return *self;
        }
        let sx = to.0 as f32 / from.0 as f32;
        let sy = to.1 as f32 / from.1 as f32;
        FaceBox {
            x: self.x * sx,
            y: self.y * sy,
            width: self.width * sx,
            height: self.height * sy,
            confidence: self.confidence,
        }
    }
}

/// A live video frame handed to the detector.
#[derive(Clone)]
pub struct Frame {
    pub image: Arc<DynamicImage>,
    pub timestamp: Instant,
    pub sequence: u32,
}

impl Frame {
    pub fn size(&self) -> (u32, u32) {
        (self.image.width(), self.image.height())
    }
}

/// Outcome of one detector poll.
#[derive(Debug, Clone, PartialEq)]
pub struct FaceDetectionSample {
    /// Primary face, or `None` when nothing was found.
    pub face: Option<FaceBox>,
    /// Size of the frame `face` is expressed in.
    pub frame_size: (u32, u32),
    pub timestamp: Instant,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_identity() {
        let b = FaceBox::new(10.0, 20.0, 30.0, 40.0);
        assert_eq!(b.scale((360, 270), (360, 270)), b);
    }

    #[test]
    fn test_scale_display_to_source() {
        // 360x270 overlay -> 1280x960 still
        let b = FaceBox::new(90.0, 27.0, 180.0, 135.0);
        let s = b.scale((360, 270), (1280, 960));
        assert!((s.x - 320.0).abs() < 1e-3);
        assert!((s.y - 96.0).abs() < 1e-3);
        assert!((s.width - 640.0).abs() < 1e-3);
        assert!((s.height - 480.0).abs() < 1e-3);
    }

    #[test]
    fn test_scale_from_empty_frame_is_noop() {
        let b = FaceBox::new(1.0, 2.0, 3.0, 4.0);
        assert_eq!(b.scale((0, 0), (100, 100)), b);
    }
}
