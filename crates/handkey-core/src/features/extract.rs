//! Feature extraction from 21-point hand landmarks

use super::{FeatureVector, FrameFeatures};
use crate::landmarks::index::*;
use crate::landmarks::{FrameHands, HandMeasurement, Landmark};

/// Below this hand size (normalized image units) lengths are not divided further.
const MIN_HAND_SIZE: f64 = 1e-6;

/// Fingertip pairs reported as named distances.
const DISTANCE_PAIRS: [(usize, usize); 4] = [
    (THUMB_TIP, INDEX_TIP),
    (THUMB_TIP, MIDDLE_TIP),
    (THUMB_TIP, PINKY_TIP),
    (INDEX_TIP, PINKY_TIP),
];

/// Derives a [`FeatureVector`] from a complete hand measurement.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureExtractor;

impl FeatureExtractor {
    pub fn new() -> Self {
        Self
    }

    pub fn extract(&self, hand: &HandMeasurement) -> FeatureVector {
        let wrist = hand.point(WRIST);
        let scale = hand_size(hand).max(MIN_HAND_SIZE);

        let mut fingers = [0.0; 5];
        for (finger, ratio) in fingers.iter_mut().enumerate() {
            *ratio = extension_ratio(wrist, hand.point(FINGER_TIPS[finger]), hand.point(FINGER_BASES[finger]));
        }

        let spread = FINGER_TIPS
            .windows(2)
            .map(|pair| hand.point(pair[0]).distance_2d(hand.point(pair[1])))
            .sum::<f64>()
            / (FINGER_TIPS.len() - 1) as f64;

        let mut distances = [0.0; 4];
        for (slot, (a, b)) in distances.iter_mut().zip(DISTANCE_PAIRS) {
            *slot = hand.point(a).distance_2d(hand.point(b)) / scale;
        }

        FeatureVector {
            fingers,
            rotation_deg: rotation_deg(wrist, hand.point(MIDDLE_MCP)),
            palm_spread: spread / scale,
            distances,
        }
    }

    pub fn extract_frame(&self, hands: &FrameHands) -> FrameFeatures {
        FrameFeatures {
            left: hands.left.as_ref().map(|h| self.extract(h)),
            right: hands.right.as_ref().map(|h| self.extract(h)),
        }
    }
}

/// Wrist to middle-finger knuckle distance.
pub fn hand_size(hand: &HandMeasurement) -> f64 {
    hand.point(WRIST).distance_2d(hand.point(MIDDLE_MCP))
}

/// Tip-to-wrist over base-to-wrist. Continuous so that averaging over a
/// capture window does not flip between discrete states.
fn extension_ratio(wrist: &Landmark, tip: &Landmark, base: &Landmark) -> f64 {
    let base_dist = base.distance_2d(wrist).max(MIN_HAND_SIZE);
    tip.distance_2d(wrist) / base_dist
}

/// Angle of the wrist to middle-knuckle vector against the +x image axis.
fn rotation_deg(wrist: &Landmark, middle_mcp: &Landmark) -> f64 {
    let angle = (middle_mcp.y - wrist.y).atan2(middle_mcp.x - wrist.x).to_degrees();
    let normalized = angle.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative angles
    if normalized >= 360.0 { 0.0 } else { normalized }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::{Handedness, LANDMARK_COUNT};

    fn upright_hand() -> HandMeasurement {
        let mut points = [Landmark::default(); LANDMARK_COUNT];
        points[WRIST] = Landmark::new(0.5, 0.9, 0.0);
        points[MIDDLE_MCP] = Landmark::new(0.5, 0.7, 0.0);
        HandMeasurement::new(points, Handedness::Right, 0.9)
    }

    #[test]
    fn test_upright_rotation() {
        // image y grows downward, so "up" is -90 degrees
        let fv = FeatureExtractor::new().extract(&upright_hand());
        assert!((fv.rotation_deg - 270.0).abs() < 1e-9);
    }

    #[test]
    fn test_rotation_in_range() {
        let mut hand = upright_hand();
        hand.landmarks[MIDDLE_MCP] = Landmark::new(0.7, 0.9, 0.0);
        let fv = FeatureExtractor::new().extract(&hand);
        assert!(fv.rotation_deg.abs() < 1e-9);
    }

    #[test]
    fn test_degenerate_hand_stays_finite() {
        let points = [Landmark::new(0.3, 0.3, 0.0); LANDMARK_COUNT];
        let hand = HandMeasurement::new(points, Handedness::Left, 1.0);
        assert!(FeatureExtractor::new().extract(&hand).is_finite());
    }
}
