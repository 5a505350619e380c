//! Gesture recording state machine
//!
//! `idle -> countdown -> capturing -> averaging -> committed`, with `aborted`
//! reachable from countdown and capturing. The machine is advanced by frame
//! time (`dt_ms`) rather than background timers, so a test can drive it
//! frame by frame.
//!
//! The countdown only counts ticks: hand presence is checked once capture
//! starts, and only cancellation aborts a countdown.

pub mod session;

pub use session::{CapturedGesture, RecordRequest, RecordingSession};

use crate::error::{EngineError, Result};
use handkey_core::features::{FIELD_COUNT, FeatureVector, FrameFeatures, ROTATION_FIELD};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordingStatus {
    Idle,
    Countdown,
    Capturing,
    Averaging,
    Committed,
    Aborted,
}

/// (floor, ceiling) per field family for the stored tolerance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToleranceBounds {
    pub finger: (f64, f64),
    pub rotation_deg: (f64, f64),
    pub palm_spread: (f64, f64),
    pub distance: (f64, f64),
}

impl Default for ToleranceBounds {
    fn default() -> Self {
        Self {
            finger: (0.08, 0.6),
            rotation_deg: (10.0, 60.0),
            palm_spread: (0.05, 0.5),
            distance: (0.05, 0.6),
        }
    }
}

impl ToleranceBounds {
    fn bounds(&self, field: usize) -> (f64, f64) {
        match field {
            0..=4 => self.finger,
            ROTATION_FIELD => self.rotation_deg,
            6 => self.palm_spread,
            _ => self.distance,
        }
    }

    /// Clamp each field into its (floor, ceiling).
    pub fn clamp(&self, raw: &FeatureVector) -> FeatureVector {
        let mut out = raw.to_array();
        for (field, value) in out.iter_mut().enumerate() {
            let (lo, hi) = self.bounds(field);
            *value = if value.is_finite() { value.clamp(lo, hi) } else { hi };
        }
        FeatureVector::from_array(out)
    }

    pub fn floor(&self) -> FeatureVector {
        let mut out = [0.0; FIELD_COUNT];
        for (field, value) in out.iter_mut().enumerate() {
            *value = self.bounds(field).0;
        }
        FeatureVector::from_array(out)
    }
}

/// Recorder timing and tolerance configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecorderConfig {
    /// Countdown ticks before capture starts.
    pub countdown_ticks: u32,
    pub tick_ms: u64,
    /// Length of the capture window.
    pub capture_ms: u64,
    /// Fewest usable frames for a capture to be accepted.
    pub min_samples: usize,
    /// How long the required hand(s) may be missing before the capture aborts.
    pub grace_ms: u64,
    /// Stored tolerance = scale * standard deviation, then clamped.
    pub tolerance_scale: f64,
    pub tolerance_bounds: ToleranceBounds,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            countdown_ticks: 3,
            tick_ms: 1000,
            capture_ms: 3000,
            min_samples: 10,
            grace_ms: 500,
            tolerance_scale: 2.5,
            tolerance_bounds: ToleranceBounds::default(),
        }
    }
}

impl RecorderConfig {
    pub fn tolerance_from_std(&self, std_dev: &FeatureVector) -> FeatureVector {
        let scaled = std_dev.to_array().map(|sd| sd * self.tolerance_scale);
        self.tolerance_bounds.clamp(&FeatureVector::from_array(scaled))
    }
}

/// What one `advance` call did.
#[derive(Debug, Clone, PartialEq)]
pub enum RecorderProgress {
    Idle,
    Countdown { remaining: u32 },
    CaptureStarted,
    Capturing { samples: usize, elapsed_ms: u64 },
    Finished(CapturedGesture),
    Cancelled,
}

/// Cancels the running recording from any thread. Takes effect on the next
/// `advance` call, so it never races with a sample append.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    requested: Arc<AtomicBool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.requested.store(true, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }

    fn take(&self) -> bool {
        self.requested.swap(false, Ordering::SeqCst)
    }

    fn clear(&self) {
        self.requested.store(false, Ordering::SeqCst);
    }
}

/// Drives at most one [`RecordingSession`] at a time.
#[derive(Debug)]
pub struct Recorder {
    config: RecorderConfig,
    session: Option<RecordingSession>,
    cancel: CancelHandle,
    /// `Committed` or `Aborted` of the session that just ended, reported by
    /// `status()` until the next `advance` or `start`.
    ended: Option<RecordingStatus>,
}

impl Recorder {
    pub fn new(config: RecorderConfig) -> Self {
        Self {
            config,
            session: None,
            cancel: CancelHandle::default(),
            ended: None,
        }
    }

    pub fn config(&self) -> &RecorderConfig {
        &self.config
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    pub fn status(&self) -> RecordingStatus {
        match &self.session {
            Some(session) => session.status(),
            None => self.ended.unwrap_or(RecordingStatus::Idle),
        }
    }

    pub fn session(&self) -> Option<&RecordingSession> {
        self.session.as_ref()
    }

    pub fn start(&mut self, request: RecordRequest) -> Result<()> {
        if self.session.is_some() {
            return Err(EngineError::RecordingInProgress);
        }
        self.cancel.clear();
        self.ended = None;
        info!(
            "Recording '{}' ({} hand) for profile '{}' in {} ticks",
            request.gesture, request.hand_type, request.profile, self.config.countdown_ticks
        );
        self.session = Some(RecordingSession::new(request, self.config.countdown_ticks));
        Ok(())
    }

    /// Request cancellation. Returns false when nothing is recording.
    pub fn cancel(&mut self) -> bool {
        if self.session.is_none() {
            return false;
        }
        self.cancel.cancel();
        true
    }

    /// Advance the session by one frame.
    ///
    /// Errors end the session: `InsufficientSamples` when the window closed
    /// with too few usable frames, `NoHandDetected` when the hand(s) stayed
    /// missing past the grace period.
    pub fn advance(&mut self, frame: &FrameFeatures, dt_ms: u64) -> Result<RecorderProgress> {
        self.ended = None;
        if self.cancel.take() {
            if let Some(session) = self.session.take() {
                info!(
                    "Recording '{}' cancelled ({} samples discarded)",
                    session.request.gesture,
                    session.sample_count()
                );
                self.ended = Some(RecordingStatus::Aborted);
                return Ok(RecorderProgress::Cancelled);
            }
        }

        let Some(session) = self.session.as_mut() else {
            return Ok(RecorderProgress::Idle);
        };

        match session.status() {
            RecordingStatus::Countdown => {
                let remaining = session.tick(dt_ms, self.config.tick_ms);
                if remaining > 0 {
                    return Ok(RecorderProgress::Countdown { remaining });
                }
                session.begin_capture();
                info!("Recording '{}' now, hold the gesture steady", session.request.gesture);
                Ok(RecorderProgress::CaptureStarted)
            }
            RecordingStatus::Capturing => {
                if session.push_frame(frame) {
                    debug!("Sample {} for '{}'", session.sample_count(), session.request.gesture);
                } else {
                    session.add_absence(dt_ms);
                    if session.absent_ms() > self.config.grace_ms {
                        let absent_ms = session.absent_ms();
                        warn!(
                            "Recording '{}' aborted: required hands missing for {} ms",
                            session.request.gesture, absent_ms
                        );
                        self.session = None;
                        self.ended = Some(RecordingStatus::Aborted);
                        return Err(EngineError::NoHandDetected { absent_ms });
                    }
                }

                if session.add_capture_time(dt_ms) < self.config.capture_ms {
                    return Ok(RecorderProgress::Capturing {
                        samples: session.sample_count(),
                        elapsed_ms: session.capture_elapsed_ms(),
                    });
                }

                let mut finished = match self.session.take() {
                    Some(s) => s,
                    None => return Ok(RecorderProgress::Idle),
                };
                let averaged = finished.average(&self.config);
                self.ended = Some(finished.status());
                let captured = averaged?;
                info!(
                    "Recorded '{}' from {} samples",
                    captured.request.gesture, captured.samples
                );
                Ok(RecorderProgress::Finished(captured))
            }
            status => {
                // terminal states never stay stored
                warn!("Dropping recording session left in {:?}", status);
                self.session = None;
                Ok(RecorderProgress::Idle)
            }
        }
    }
}
