//! Capture controller: runs a [`CaptureSession`] against real timers.
//!
//! One tokio task per session. The detector poll interval runs for the
//! whole session; the one-second countdown interval exists only while
//! counting down. Submission is awaited inline, so there is never more
//! than one request in flight. Every timer is dropped with the task.

use crate::capture::{crop_and_encode, CaptureError, DEFAULT_JPEG_QUALITY};
use crate::detector::FaceDetector;
use crate::session::{CaptureSession, CaptureState, Effect, DEFAULT_COUNTDOWN_SECS};
use crate::source::FrameSource;
use crate::types::{FaceBox, FaceDetectionSample};
use crate::verifier::{VerificationRequest, Verdict, Verifier};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval, interval_at, Instant, Interval, MissedTickBehavior};

/// Default detector poll period.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(300);

const COUNTDOWN_PERIOD: Duration = Duration::from_secs(1);

/// Shown when the endpoint can't be reached or answers nonsense.
pub const GENERIC_SUBMIT_FAILURE: &str = "서버 오류 발생";

/// Shown when the endpoint rejects the face without saying why.
pub const GENERIC_MISMATCH: &str = "얼굴이 일치하지 않습니다";

/// Shown when the still can't be taken, cropped or encoded.
pub const CAPTURE_FAILURE: &str = "캡처 실패";

#[derive(Debug, Clone)]
pub struct CaptureConfig {
    pub poll_interval: Duration,
    pub countdown_secs: u32,
    pub jpeg_quality: u8,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            countdown_secs: DEFAULT_COUNTDOWN_SECS,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

/// Who is being verified.
#[derive(Debug, Clone)]
pub struct Subject {
    pub id: String,
    pub reference_image_url: String,
}

/// Notifications sent to the caller as the session moves.
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureEvent {
    CountdownStarted { seconds: u32 },
    CountdownTick { remaining: u32 },
    CountdownReset,
    Captured { face: FaceBox },
    Submitting,
    Succeeded,
    Failed { reason: String },
    Cancelled,
}

impl CaptureEvent {
    /// Status line for the capture overlay.
    pub fn message(&self) -> String {
        match self {
            CaptureEvent::CountdownStarted { seconds: n } | CaptureEvent::CountdownTick { remaining: n } => {
                format!("얼굴 감지됨! {n}초 후 캡처합니다.")
            }
            CaptureEvent::CountdownReset => "얼굴을 정면으로 비춰주세요".to_string(),
            CaptureEvent::Captured { .. } => "캡처되었습니다! 잠시만 기다려주세요.".to_string(),
            CaptureEvent::Submitting => "얼굴 인증 중...".to_string(),
            CaptureEvent::Succeeded => "얼굴 인증 완료".to_string(),
            CaptureEvent::Failed { reason } => format!("얼굴 인증 실패: {reason}"),
            CaptureEvent::Cancelled => "얼굴 인증이 취소되었습니다".to_string(),
        }
    }
}

/// How a session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    Succeeded,
    Cancelled,
}

/// Caller's handle on a running session. Dropping it cancels the session.
pub struct CaptureHandle {
    cancel: watch::Sender<bool>,
    task: Option<JoinHandle<SessionOutcome>>,
}

impl CaptureHandle {
    /// Stop the session and its timers. Idempotent.
    pub fn cancel(&self) {
        self.cancel.send_replace(true);
    }

    /// Wait for the session to end.
    pub async fn join(mut self) -> SessionOutcome {
        let Some(task) = self.task.take() else {
            return SessionOutcome::Cancelled;
        };
        match task.await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!(error = %e, "capture task ended abnormally");
                SessionOutcome::Cancelled
            }
        }
    }
}

impl Drop for CaptureHandle {
    fn drop(&mut self) {
        self.cancel.send_replace(true);
    }
}

/// Drives detection, countdown, capture and verification for one subject.
pub struct FaceCaptureController<S, D, V: ?Sized> {
    source: S,
    detector: D,
    verifier: Arc<V>,
    subject: Subject,
    config: CaptureConfig,
}

impl<S, D, V> FaceCaptureController<S, D, V>
where
    S: FrameSource + 'static,
    D: FaceDetector + 'static,
    V: Verifier + ?Sized + 'static,
{
    pub fn new(source: S, detector: D, verifier: Arc<V>, subject: Subject, config: CaptureConfig) -> Self {
        Self {
            source,
            detector,
            verifier,
            subject,
            config,
        }
    }

    /// Start the session on the current tokio runtime.
    pub fn spawn(self) -> (CaptureHandle, mpsc::UnboundedReceiver<CaptureEvent>) {
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(self.run(cancel_rx, event_tx));
        (
            CaptureHandle {
                cancel: cancel_tx,
                task: Some(task),
            },
            event_rx,
        )
    }

    async fn run(
        mut self,
        mut cancel: watch::Receiver<bool>,
        events: mpsc::UnboundedSender<CaptureEvent>,
    ) -> SessionOutcome {
        let mut session = CaptureSession::new(self.config.countdown_secs);
        session.start();
        tracing::info!(
            session = %session.id(),
            subject = %self.subject.id,
            poll_ms = self.config.poll_interval.as_millis() as u64,
            "face capture started"
        );

        let mut poll = interval(self.config.poll_interval);
        poll.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut countdown: Option<Interval> = None;

        loop {
            tokio::select! {
                biased;

                _ = cancelled(&mut cancel) => {
                    session.cancel();
                    tracing::info!(session = %session.id(), "face capture cancelled");
                    let _ = events.send(CaptureEvent::Cancelled);
                    return SessionOutcome::Cancelled;
                }

                _ = next_tick(&mut countdown) => {
                    match session.tick() {
                        Some(Effect::Countdown { remaining }) => {
                            let _ = events.send(CaptureEvent::CountdownTick { remaining });
                        }
                        Some(Effect::Capture(sample)) => {
                            countdown = None;
                            if let Some(outcome) =
                                self.capture_and_submit(&mut session, sample, &mut cancel, &events).await
                            {
                                return outcome;
                            }
                        }
                        _ => countdown = None,
                    }
                }

                _ = poll.tick() => {
                    let Some(sample) = self.sample() else {
                        continue;
                    };
                    match session.observe(&sample) {
                        Some(Effect::StartCountdown { seconds }) => {
                            countdown = Some(interval_at(Instant::now() + COUNTDOWN_PERIOD, COUNTDOWN_PERIOD));
                            let _ = events.send(CaptureEvent::CountdownStarted { seconds });
                        }
                        Some(Effect::CancelCountdown) => {
                            countdown = None;
                            let _ = events.send(CaptureEvent::CountdownReset);
                        }
                        _ => {}
                    }
                }
            }
        }
    }

    /// Poll the detector once. `None` when the source has no frame yet.
    fn sample(&mut self) -> Option<FaceDetectionSample> {
        let frame = self.source.frame()?;
        let face = self.detector.detect(&frame).into_iter().next();
        Some(FaceDetectionSample {
            face,
            frame_size: frame.size(),
            timestamp: frame.timestamp,
        })
    }

    fn prepare(&mut self, sample: &FaceDetectionSample) -> Result<VerificationRequest, CaptureError> {
        let face = sample.face.as_ref().ok_or(CaptureError::NoFace)?;
        let still = self.source.still()?;
        let image_jpeg = crop_and_encode(&still, face, sample.frame_size, self.config.jpeg_quality)?;
        Ok(VerificationRequest {
            image_jpeg,
            subject: self.subject.id.clone(),
            reference_image_url: self.subject.reference_image_url.clone(),
        })
    }

    /// Returns `Some` when the session ended (success or cancel), `None` to
    /// keep detecting after a failure.
    async fn capture_and_submit(
        &mut self,
        session: &mut CaptureSession,
        sample: FaceDetectionSample,
        cancel: &mut watch::Receiver<bool>,
        events: &mpsc::UnboundedSender<CaptureEvent>,
    ) -> Option<SessionOutcome> {
        if let Some(face) = sample.face {
            let _ = events.send(CaptureEvent::Captured { face });
        }

        let request = match self.prepare(&sample) {
            Ok(request) => request,
            Err(e) => {
                tracing::warn!(session = %session.id(), error = %e, "capture failed");
                self.recover(session, CAPTURE_FAILURE.to_string(), events);
                return None;
            }
        };

        session.begin_submit();
        let _ = events.send(CaptureEvent::Submitting);
        tracing::info!(session = %session.id(), bytes = request.image_jpeg.len(), "submitting face crop");

        let result = tokio::select! {
            biased;
            _ = cancelled(cancel) => {
                session.cancel();
                tracing::info!(session = %session.id(), "face capture cancelled during submission");
                let _ = events.send(CaptureEvent::Cancelled);
                return Some(SessionOutcome::Cancelled);
            }
            result = self.verifier.verify(request) => result,
        };

        match result {
            Ok(Verdict::Match) => {
                session.succeed();
                tracing::info!(session = %session.id(), "face verified");
                let _ = events.send(CaptureEvent::Succeeded);
                Some(SessionOutcome::Succeeded)
            }
            Ok(Verdict::NoMatch { reason }) => {
                let reason = reason.unwrap_or_else(|| GENERIC_MISMATCH.to_string());
                tracing::info!(session = %session.id(), reason = %reason, "face rejected");
                self.recover(session, reason, events);
                None
            }
            Err(e) => {
                tracing::warn!(session = %session.id(), error = %e, "verification request failed");
                self.recover(session, GENERIC_SUBMIT_FAILURE.to_string(), events);
                None
            }
        }
    }

    fn recover(
        &self,
        session: &mut CaptureSession,
        reason: String,
        events: &mpsc::UnboundedSender<CaptureEvent>,
    ) {
        session.fail(reason.clone());
        let _ = events.send(CaptureEvent::Failed { reason });
        session.resume();
        debug_assert_eq!(session.state(), &CaptureState::Detecting);
    }
}

/// Resolves once cancellation is requested or the handle is gone.
async fn cancelled(cancel: &mut watch::Receiver<bool>) {
    while !*cancel.borrow_and_update() {
        if cancel.changed().await.is_err() {
            return;
        }
    }
}

async fn next_tick(countdown: &mut Option<Interval>) {
    match countdown {
        Some(timer) => {
            timer.tick().await;
        }
        None => std::future::pending().await,
    }
}
