//! Face detector seam.

use crate::types::{FaceBox, Frame};

/// Pluggable face detection backend.
///
/// Implementations return every candidate they found, best first. The
/// capture controller only looks at the first one. A detector that can't
/// process a frame should return an empty list: a bad frame is "no face
/// this tick", never a session failure.
pub trait FaceDetector: Send {
    fn detect(&mut self, frame: &Frame) -> Vec<FaceBox>;
}

impl<F> FaceDetector for F
where
    F: FnMut(&Frame) -> Vec<FaceBox> + Send,
{
    fn detect(&mut self, frame: &Frame) -> Vec<FaceBox> {
        self(frame)
    }
}

/// Reports the same box on every frame.
///
/// Used by `passbook face-verify` when the face position is known up front,
/// and for driving the controller without a model.
#[derive(Debug, Clone)]
pub struct StaticDetector {
    face: FaceBox,
}

impl StaticDetector {
    pub fn new(face: FaceBox) -> Self {
        Self { face }
    }
}

impl FaceDetector for StaticDetector {
    fn detect(&mut self, frame: &Frame) -> Vec<FaceBox> {
        let (width, height) = frame.size();
        let inside = self.face.x >= 0.0
            && self.face.y >= 0.0
            && self.face.x + self.face.width <= width as f32
            && self.face.y + self.face.height <= height as f32;
        if inside {
            vec![self.face]
        } else {
            tracing::debug!(face = ?self.face, width, height, "static box outside frame");
            Vec::new()
        }
    }
}
