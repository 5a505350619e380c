//! Per-hand feature vectors

pub mod extract;

pub use extract::FeatureExtractor;

use crate::landmarks::Handedness;
use serde::{Deserialize, Serialize};

/// Number of scalar fields in a [`FeatureVector`].
pub const FIELD_COUNT: usize = 11;

/// Position of the rotation angle in [`FeatureVector::to_array`].
pub const ROTATION_FIELD: usize = 5;

/// Field names in array order.
pub const FIELD_NAMES: [&str; FIELD_COUNT] = [
    "thumb",
    "index",
    "middle",
    "ring",
    "pinky",
    "rotation_deg",
    "palm_spread",
    "thumb_index",
    "thumb_middle",
    "thumb_pinky",
    "index_pinky",
];

/// Named fingertip distances carried in [`FeatureVector::distances`].
pub const DISTANCE_NAMES: [&str; 4] = ["thumb_index", "thumb_middle", "thumb_pinky", "index_pinky"];

/// Fixed-shape summary of one hand pose.
///
/// All lengths are divided by the wrist to middle-knuckle distance, so the
/// vector does not change as the hand moves toward or away from the camera.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    /// Extension ratio per finger, thumb first. Around 1.0 at the bend point,
    /// above when extended, below when curled.
    pub fingers: [f64; 5],
    /// Wrist to middle-knuckle direction in degrees, [0, 360).
    pub rotation_deg: f64,
    /// Mean distance between adjacent fingertips.
    pub palm_spread: f64,
    /// See [`DISTANCE_NAMES`].
    pub distances: [f64; 4],
}

impl FeatureVector {
    pub fn splat(value: f64) -> Self {
        Self::from_array([value; FIELD_COUNT])
    }

    pub fn to_array(&self) -> [f64; FIELD_COUNT] {
        let f = &self.fingers;
        let d = &self.distances;
        [
            f[0],
            f[1],
            f[2],
            f[3],
            f[4],
            self.rotation_deg,
            self.palm_spread,
            d[0],
            d[1],
            d[2],
            d[3],
        ]
    }

    pub fn from_array(a: [f64; FIELD_COUNT]) -> Self {
        Self {
            fingers: [a[0], a[1], a[2], a[3], a[4]],
            rotation_deg: a[5],
            palm_spread: a[6],
            distances: [a[7], a[8], a[9], a[10]],
        }
    }

    pub fn is_finite(&self) -> bool {
        self.to_array().iter().all(|v| v.is_finite())
    }

    /// Per-field absolute difference. Rotation wraps around 360 degrees.
    pub fn abs_diff(&self, other: &FeatureVector) -> [f64; FIELD_COUNT] {
        let a = self.to_array();
        let b = other.to_array();
        let mut out = [0.0; FIELD_COUNT];
        for i in 0..FIELD_COUNT {
            out[i] = if i == ROTATION_FIELD {
                angle_diff_deg(a[i], b[i])
            } else {
                (a[i] - b[i]).abs()
            };
        }
        out
    }
}

/// Smallest absolute difference between two angles, in [0, 180].
pub fn angle_diff_deg(a: f64, b: f64) -> f64 {
    let d = (a - b).rem_euclid(360.0);
    d.min(360.0 - d)
}

/// Feature vectors for the hands present in one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameFeatures {
    pub left: Option<FeatureVector>,
    pub right: Option<FeatureVector>,
}

impl FrameFeatures {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn single(side: Handedness, features: FeatureVector) -> Self {
        let mut frame = Self::default();
        match side {
            Handedness::Left => frame.left = Some(features),
            Handedness::Right => frame.right = Some(features),
        }
        frame
    }

    pub fn both(left: FeatureVector, right: FeatureVector) -> Self {
        Self {
            left: Some(left),
            right: Some(right),
        }
    }

    pub fn get(&self, side: Handedness) -> Option<&FeatureVector> {
        match side {
            Handedness::Left => self.left.as_ref(),
            Handedness::Right => self.right.as_ref(),
        }
    }

    /// Present hands, left first.
    pub fn present(&self) -> impl Iterator<Item = (Handedness, &FeatureVector)> {
        self.left
            .iter()
            .map(|f| (Handedness::Left, f))
            .chain(self.right.iter().map(|f| (Handedness::Right, f)))
    }

    pub fn hand_count(&self) -> usize {
        self.left.is_some() as usize + self.right.is_some() as usize
    }
}
