//! Frame sources: where live frames and capture stills come from.

use crate::capture::CaptureError;
use crate::types::Frame;
use image::DynamicImage;
use std::path::Path;
use std::sync::Arc;
use tokio::time::Instant;

/// A live camera-like source.
pub trait FrameSource: Send {
    /// Latest frame for detection, or `None` if the source isn't ready yet.
    fn frame(&mut self) -> Option<Frame>;

    /// Full-resolution still taken at capture time.
    fn still(&mut self) -> Result<DynamicImage, CaptureError>;
}

/// Serves one decoded image as both the live feed and the still.
pub struct StillImageSource {
    image: Arc<DynamicImage>,
    sequence: u32,
}

impl StillImageSource {
    pub fn new(image: DynamicImage) -> Self {
        Self {
            image: Arc::new(image),
            sequence: 0,
        }
    }

    /// Decode an image file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, CaptureError> {
        let path = path.as_ref();
        let image = image::open(path)
            .map_err(|e| CaptureError::Decode(format!("{}: {e}", path.display())))?;
        tracing::info!(
            path = %path.display(),
            width = image.width(),
            height = image.height(),
            "still image loaded"
        );
        Ok(Self::new(image))
    }
}

impl FrameSource for StillImageSource {
    fn frame(&mut self) -> Option<Frame> {
        self.sequence = self.sequence.wrapping_add(1);
        Some(Frame {
            image: Arc::clone(&self.image),
            timestamp: Instant::now(),
            sequence: self.sequence,
        })
    }

    fn still(&mut self) -> Result<DynamicImage, CaptureError> {
        Ok(self.image.as_ref().clone())
    }
}
