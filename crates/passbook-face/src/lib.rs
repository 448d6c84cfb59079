//! passbook-face — Countdown-triggered face capture and verification.
//!
//! Watches a frame source through a face detector. Once a face stays in view
//! for the countdown, one still is cropped to the face box and sent to the
//! verification endpoint. Failures drop back to watching; success ends the
//! session.

pub mod capture;
pub mod controller;
pub mod detector;
pub mod session;
pub mod source;
pub mod types;
pub mod verifier;

pub use capture::CaptureError;
pub use controller::{
    CaptureConfig, CaptureEvent, CaptureHandle, FaceCaptureController, SessionOutcome, Subject,
};
pub use detector::{FaceDetector, StaticDetector};
pub use session::{CaptureSession, CaptureState};
pub use source::{FrameSource, StillImageSource};
pub use types::{FaceBox, FaceDetectionSample, Frame};
pub use verifier::{HttpVerifier, Verdict, VerificationRequest, Verifier, VerifyError};
