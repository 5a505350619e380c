//! Hand landmarks as delivered by the external hand tracker

pub mod adapter;
pub mod trace;

pub use adapter::{AdapterConfig, FrameAdapter, RawHand};
pub use trace::{Trace, TraceFrame};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of tracked points per hand.
pub const LANDMARK_COUNT: usize = 21;

/// Landmark indices in the 21-point hand model.
#[allow(dead_code)]
pub mod index {
    pub const WRIST: usize = 0;
    pub const THUMB_CMC: usize = 1;
    pub const THUMB_MCP: usize = 2;
    pub const THUMB_IP: usize = 3;
    pub const THUMB_TIP: usize = 4;
    pub const INDEX_MCP: usize = 5;
    pub const INDEX_PIP: usize = 6;
    pub const INDEX_DIP: usize = 7;
    pub const INDEX_TIP: usize = 8;
    pub const MIDDLE_MCP: usize = 9;
    pub const MIDDLE_PIP: usize = 10;
    pub const MIDDLE_DIP: usize = 11;
    pub const MIDDLE_TIP: usize = 12;
    pub const RING_MCP: usize = 13;
    pub const RING_PIP: usize = 14;
    pub const RING_DIP: usize = 15;
    pub const RING_TIP: usize = 16;
    pub const PINKY_MCP: usize = 17;
    pub const PINKY_PIP: usize = 18;
    pub const PINKY_DIP: usize = 19;
    pub const PINKY_TIP: usize = 20;

    /// Fingertips, thumb first.
    pub const FINGER_TIPS: [usize; 5] = [THUMB_TIP, INDEX_TIP, MIDDLE_TIP, RING_TIP, PINKY_TIP];

    /// Lower reference joint per finger. The thumb has no PIP, so its MCP is used.
    pub const FINGER_BASES: [usize; 5] = [THUMB_MCP, INDEX_PIP, MIDDLE_PIP, RING_PIP, PINKY_PIP];
}

/// A single landmark. `x`/`y` are normalized image coordinates, `z` is depth
/// relative to the wrist.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Landmark {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Planar distance in image space.
    pub fn distance_2d(&self, other: &Landmark) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Handedness {
    Left,
    Right,
}

impl Handedness {
    pub fn opposite(self) -> Self {
        match self {
            Handedness::Left => Handedness::Right,
            Handedness::Right => Handedness::Left,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Handedness::Left => "left",
            Handedness::Right => "right",
        }
    }
}

impl fmt::Display for Handedness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Handedness {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" | "l" => Ok(Handedness::Left),
            "right" | "r" => Ok(Handedness::Right),
            other => Err(format!("unknown handedness label '{}'", other)),
        }
    }
}

/// One detected hand in one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct HandMeasurement {
    pub landmarks: [Landmark; LANDMARK_COUNT],
    pub handedness: Handedness,
    pub confidence: f64,
}

impl HandMeasurement {
    pub fn new(landmarks: [Landmark; LANDMARK_COUNT], handedness: Handedness, confidence: f64) -> Self {
        Self {
            landmarks,
            handedness,
            confidence,
        }
    }

    pub fn point(&self, idx: usize) -> &Landmark {
        &self.landmarks[idx]
    }
}

/// The hands present in one frame, at most one per side.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameHands {
    pub left: Option<HandMeasurement>,
    pub right: Option<HandMeasurement>,
}

impl FrameHands {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn get(&self, side: Handedness) -> Option<&HandMeasurement> {
        match side {
            Handedness::Left => self.left.as_ref(),
            Handedness::Right => self.right.as_ref(),
        }
    }

    pub fn slot_mut(&mut self, side: Handedness) -> &mut Option<HandMeasurement> {
        match side {
            Handedness::Left => &mut self.left,
            Handedness::Right => &mut self.right,
        }
    }

    pub fn hand_count(&self) -> usize {
        self.left.is_some() as usize + self.right.is_some() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.hand_count() == 0
    }
}
