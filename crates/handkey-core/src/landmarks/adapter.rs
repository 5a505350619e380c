//! Normalizes raw tracker output into per-side hand measurements

use super::{FrameHands, HandMeasurement, Handedness, LANDMARK_COUNT, Landmark};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// One hand exactly as the external tracker reports it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawHand {
    /// Handedness label, e.g. "Left" / "Right".
    pub label: String,
    /// Handedness confidence in [0, 1].
    pub score: f64,
    pub landmarks: Vec<[f64; 3]>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdapterConfig {
    /// Hands reported below this confidence are dropped.
    pub min_confidence: f64,
    /// Swap left/right labels (mirrored camera feeds report them swapped).
    pub mirror_handedness: bool,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            min_confidence: 0.5,
            mirror_handedness: false,
        }
    }
}

/// Landmark frame adapter
#[derive(Debug, Clone, Default)]
pub struct FrameAdapter {
    config: AdapterConfig,
}

impl FrameAdapter {
    pub fn new(config: AdapterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AdapterConfig {
        &self.config
    }

    /// Convert one frame of raw detections. Unusable hands are dropped; when
    /// two hands claim the same side the more confident one is kept.
    pub fn adapt(&self, raw_hands: &[RawHand]) -> FrameHands {
        let mut frame = FrameHands::empty();

        for raw in raw_hands {
            let Some(hand) = self.convert(raw) else {
                continue;
            };

            let slot = frame.slot_mut(hand.handedness);
            if let Some(existing) = slot.as_ref().filter(|e| e.confidence >= hand.confidence) {
                debug!(
                    "Dropping duplicate {} hand ({:.2} <= {:.2})",
                    hand.handedness, hand.confidence, existing.confidence
                );
                continue;
            }
            *slot = Some(hand);
        }

        frame
    }

    fn convert(&self, raw: &RawHand) -> Option<HandMeasurement> {
        if raw.landmarks.len() != LANDMARK_COUNT {
            warn!(
                "Skipping hand with {} landmarks (expected {})",
                raw.landmarks.len(),
                LANDMARK_COUNT
            );
            return None;
        }

        let mut handedness = match raw.label.parse::<Handedness>() {
            Ok(h) => h,
            Err(e) => {
                warn!("Skipping hand: {}", e);
                return None;
            }
        };
        if self.config.mirror_handedness {
            handedness = handedness.opposite();
        }

        if !raw.score.is_finite() || raw.score < self.config.min_confidence {
            debug!(
                "Skipping {} hand below confidence floor ({:.2} < {:.2})",
                handedness, raw.score, self.config.min_confidence
            );
            return None;
        }

        let mut landmarks = [Landmark::default(); LANDMARK_COUNT];
        for (slot, [x, y, z]) in landmarks.iter_mut().zip(raw.landmarks.iter().copied()) {
            *slot = Landmark::new(x, y, z);
            if !slot.is_finite() {
                warn!("Skipping {} hand with non-finite landmark", handedness);
                return None;
            }
        }

        Some(HandMeasurement::new(landmarks, handedness, raw.score))
    }
}
