//! One recording attempt

use super::{RecorderConfig, RecordingStatus};
use crate::error::{EngineError, Result};
use crate::utils::{FieldStats, summarize};
use handkey_core::features::{FeatureVector, FrameFeatures};
use handkey_core::{GestureSignature, HandTemplate, HandType, Handedness, Signature};

/// What to record and where to store it.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordRequest {
    pub profile: String,
    pub gesture: String,
    pub key_binding: String,
    pub hand_type: HandType,
}

/// Result of a completed capture, ready to commit into a profile.
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedGesture {
    pub request: RecordRequest,
    pub signature: Signature,
    /// Usable frames averaged into the signature.
    pub samples: usize,
}

impl CapturedGesture {
    pub fn into_gesture(self) -> GestureSignature {
        GestureSignature::new(self.request.gesture, self.request.key_binding, self.signature)
            .with_samples(self.samples)
    }
}

#[derive(Debug)]
pub struct RecordingSession {
    pub request: RecordRequest,
    status: RecordingStatus,
    countdown_ticks: u32,
    countdown_elapsed_ms: u64,
    capture_elapsed_ms: u64,
    absent_ms: u64,
    /// Side a single-hand capture locked onto with its first sample.
    locked_side: Option<Handedness>,
    left: Vec<FeatureVector>,
    right: Vec<FeatureVector>,
}

impl RecordingSession {
    pub fn new(request: RecordRequest, countdown_ticks: u32) -> Self {
        Self {
            request,
            status: RecordingStatus::Countdown,
            countdown_ticks,
            countdown_elapsed_ms: 0,
            capture_elapsed_ms: 0,
            absent_ms: 0,
            locked_side: None,
            left: Vec::new(),
            right: Vec::new(),
        }
    }

    pub fn status(&self) -> RecordingStatus {
        self.status
    }

    /// Advance the countdown, returning the ticks still to go.
    pub fn tick(&mut self, dt_ms: u64, tick_ms: u64) -> u32 {
        self.countdown_elapsed_ms += dt_ms;
        let done = self.countdown_elapsed_ms / tick_ms.max(1);
        let done = u32::try_from(done).unwrap_or(u32::MAX);
        self.countdown_ticks.saturating_sub(done)
    }

    pub fn begin_capture(&mut self) {
        self.status = RecordingStatus::Capturing;
    }

    /// Buffer the hand(s) this recording needs. Returns false when the frame
    /// is unusable.
    pub fn push_frame(&mut self, frame: &FrameFeatures) -> bool {
        let pushed = match self.request.hand_type {
            HandType::Both => match (frame.left, frame.right) {
                (Some(l), Some(r)) => {
                    self.left.push(l);
                    self.right.push(r);
                    true
                }
                _ => false,
            },
            HandType::Single => {
                let side = match self.locked_side {
                    Some(side) => side,
                    None if frame.right.is_some() => Handedness::Right,
                    None if frame.left.is_some() => Handedness::Left,
                    None => return false,
                };
                match frame.get(side) {
                    Some(fv) => {
                        self.locked_side = Some(side);
                        self.buffer_mut(side).push(*fv);
                        true
                    }
                    None => false,
                }
            }
        };
        if pushed {
            self.absent_ms = 0;
        }
        pushed
    }

    fn buffer_mut(&mut self, side: Handedness) -> &mut Vec<FeatureVector> {
        match side {
            Handedness::Left => &mut self.left,
            Handedness::Right => &mut self.right,
        }
    }

    pub fn add_absence(&mut self, dt_ms: u64) {
        self.absent_ms += dt_ms;
    }

    pub fn absent_ms(&self) -> u64 {
        self.absent_ms
    }

    /// Returns the capture time elapsed so far.
    pub fn add_capture_time(&mut self, dt_ms: u64) -> u64 {
        self.capture_elapsed_ms += dt_ms;
        self.capture_elapsed_ms
    }

    pub fn capture_elapsed_ms(&self) -> u64 {
        self.capture_elapsed_ms
    }

    pub fn sample_count(&self) -> usize {
        match self.request.hand_type {
            HandType::Both => self.left.len().min(self.right.len()),
            HandType::Single => self.left.len().max(self.right.len()),
        }
    }

    /// Close the window and build the signature from the buffered samples.
    pub fn average(&mut self, config: &RecorderConfig) -> Result<CapturedGesture> {
        self.status = RecordingStatus::Averaging;
        let captured = self.sample_count();
        let required = config.min_samples.max(1);
        if captured < required {
            self.status = RecordingStatus::Aborted;
            return Err(EngineError::InsufficientSamples { captured, required });
        }

        let template = |side: Handedness, samples: &[FeatureVector]| -> Result<HandTemplate> {
            let FieldStats { mean, std_dev, .. } =
                summarize(samples).ok_or(EngineError::InsufficientSamples { captured: 0, required })?;
            Ok(HandTemplate::new(side, mean, config.tolerance_from_std(&std_dev)))
        };

        let signature = match self.request.hand_type {
            HandType::Both => Signature::both(
                template(Handedness::Left, &self.left)?,
                template(Handedness::Right, &self.right)?,
            )?,
            HandType::Single => {
                let side = self.locked_side.unwrap_or(Handedness::Right);
                let samples = match side {
                    Handedness::Left => &self.left,
                    Handedness::Right => &self.right,
                };
                Signature::Single(template(side, samples)?)
            }
        };

        self.status = RecordingStatus::Committed;
        Ok(CapturedGesture {
            request: self.request.clone(),
            signature,
            samples: captured,
        })
    }
}
