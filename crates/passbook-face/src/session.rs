//! Capture session state machine.
//!
//! Pure and synchronous: it is fed detection samples and countdown ticks and
//! answers with the [`Effect`] the driver has to carry out. Timers, capture
//! and the network call live in [`crate::controller`].

use crate::types::{FaceBox, FaceDetectionSample};
use uuid::Uuid;

/// Seconds of continuous detection before the still is taken.
pub const DEFAULT_COUNTDOWN_SECS: u32 = 3;

#[derive(Debug, Clone, PartialEq)]
pub enum CaptureState {
    /// Created, not yet watching.
    Idle,
    /// Watching for a face.
    Detecting,
    CountingDown {
        remaining: u32,
    },
    /// Still taken; submission about to start.
    Captured,
    Submitting,
    /// Terminal.
    Succeeded,
    /// Last attempt failed. Behaves like `Detecting`.
    Failed {
        reason: String,
    },
    /// Terminal.
    Cancelled,
}

/// Work the driver must do after a transition.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Start the one-second countdown timer.
    StartCountdown { seconds: u32 },
    /// Stop the countdown timer; the face was lost.
    CancelCountdown,
    /// Countdown advanced.
    Countdown { remaining: u32 },
    /// Take the still and submit it. Issued at most once per cycle.
    Capture(FaceDetectionSample),
}

#[derive(Debug)]
pub struct CaptureSession {
    id: Uuid,
    state: CaptureState,
    countdown_secs: u32,
    /// Most recent sample with a face, kept while counting down.
    last_detection: Option<FaceDetectionSample>,
    /// Set the moment capture is triggered, before any async work.
    in_flight: bool,
}

impl CaptureSession {
    pub fn new(countdown_secs: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            state: CaptureState::Idle,
            countdown_secs: countdown_secs.max(1),
            last_detection: None,
            in_flight: false,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> &CaptureState {
        &self.state
    }

    pub fn last_box(&self) -> Option<&FaceBox> {
        self.last_detection.as_ref().and_then(|s| s.face.as_ref())
    }

    pub fn in_flight(&self) -> bool {
        self.in_flight
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.state, CaptureState::Succeeded | CaptureState::Cancelled)
    }

    /// Begin watching.
    pub fn start(&mut self) {
        if self.state == CaptureState::Idle {
            self.state = CaptureState::Detecting;
            tracing::debug!(session = %self.id, "detecting");
        }
    }

    /// Feed one detection sample.
    pub fn observe(&mut self, sample: &FaceDetectionSample) -> Option<Effect> {
        match (&self.state, sample.face.is_some()) {
            (CaptureState::Detecting | CaptureState::Failed { .. }, true) if !self.in_flight => {
                self.state = CaptureState::CountingDown {
                    remaining: self.countdown_secs,
                };
                self.last_detection = Some(sample.clone());
                tracing::debug!(session = %self.id, seconds = self.countdown_secs, "face detected, countdown started");
                Some(Effect::StartCountdown {
                    seconds: self.countdown_secs,
                })
            }
            (CaptureState::CountingDown { .. }, true) => {
                self.last_detection = Some(sample.clone());
                None
            }
            (CaptureState::CountingDown { .. }, false) => {
                self.state = CaptureState::Detecting;
                self.last_detection = None;
                tracing::debug!(session = %self.id, "face lost, countdown reset");
                Some(Effect::CancelCountdown)
            }
            _ => None,
        }
    }

    /// One second of countdown elapsed.
    pub fn tick(&mut self) -> Option<Effect> {
        let CaptureState::CountingDown { remaining } = self.state else {
            return None;
        };
        let remaining = remaining.saturating_sub(1);
        if remaining > 0 {
            self.state = CaptureState::CountingDown { remaining };
            return Some(Effect::Countdown { remaining });
        }

        if self.in_flight {
            return None;
        }
        let sample = self.last_detection.clone()?;
        self.in_flight = true;
        self.state = CaptureState::Captured;
        tracing::debug!(session = %self.id, "countdown finished, capturing");
        Some(Effect::Capture(sample))
    }

    /// `Captured -> Submitting`. Returns false from any other state.
    pub fn begin_submit(&mut self) -> bool {
        if self.state == CaptureState::Captured {
            self.state = CaptureState::Submitting;
            true
        } else {
            false
        }
    }

    /// Verification matched.
    pub fn succeed(&mut self) {
        if matches!(self.state, CaptureState::Captured | CaptureState::Submitting) {
            self.state = CaptureState::Succeeded;
            self.in_flight = false;
            self.last_detection = None;
        }
    }

    /// Capture or submission failed. Clears the guard so a new countdown
    /// can start on the next detection.
    pub fn fail(&mut self, reason: impl Into<String>) {
        if matches!(self.state, CaptureState::Captured | CaptureState::Submitting) {
            self.state = CaptureState::Failed {
                reason: reason.into(),
            };
            self.in_flight = false;
            self.last_detection = None;
        }
    }

    /// `Failed -> Detecting`.
    pub fn resume(&mut self) {
        if matches!(self.state, CaptureState::Failed { .. }) {
            self.state = CaptureState::Detecting;
        }
    }

    /// Stop the session. Returns false if it had already ended.
    pub fn cancel(&mut self) -> bool {
        if self.is_terminal() {
            return false;
        }
        self.state = CaptureState::Cancelled;
        self.in_flight = false;
        self.last_detection = None;
        true
    }
}
