//! Live gesture matching

pub mod debounce;
pub mod matcher;

pub use debounce::{Debouncer, GestureFire};
pub use matcher::{GestureMatcher, MatchOutcome};

use serde::{Deserialize, Serialize};

/// Whether a single-hand gesture may be performed with the other hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SidePolicy {
    /// Any present hand is compared; the better one counts.
    #[default]
    HandAgnostic,
    /// Only the hand on the recorded side is compared.
    SameSide,
}

/// Matcher configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatcherConfig {
    /// Consecutive winning frames before a gesture fires.
    pub debounce_frames: u32,
    /// Minimum time between two fires of the same gesture.
    pub cooldown_ms: u64,
    /// Per-field normalized distance a candidate may not exceed.
    pub field_ceiling: f64,
    /// Confidence floor applied after the ceiling gate.
    pub min_confidence: f64,
    pub side_policy: SidePolicy,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            debounce_frames: 5,
            cooldown_ms: 1000,
            field_ceiling: 1.0,
            min_confidence: 0.0,
            side_policy: SidePolicy::HandAgnostic,
        }
    }
}

impl MatcherConfig {
    /// Fires sooner, for fast-paced games.
    pub fn responsive() -> Self {
        Self {
            debounce_frames: 3,
            cooldown_ms: 500,
            ..Default::default()
        }
    }

    /// Longer hold, tighter gate.
    pub fn strict() -> Self {
        Self {
            debounce_frames: 8,
            cooldown_ms: 1500,
            field_ceiling: 0.8,
            min_confidence: 0.3,
            side_policy: SidePolicy::HandAgnostic,
        }
    }
}
