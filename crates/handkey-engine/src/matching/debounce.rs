//! Temporal smoothing for match results
//!
//! A gesture fires once it has been the frame winner for `debounce_frames`
//! consecutive frames. It then stays latched until the streak breaks, and it
//! cannot fire again before its cooldown has elapsed.

use crate::candidate::MatchCandidate;
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, info};

/// A debounced detection, handed to the key injector exactly once.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GestureFire {
    pub gesture: String,
    pub key_binding: String,
    pub distance: f64,
    /// Engine clock time of the fire.
    pub at_ms: u64,
}

#[derive(Debug, Clone)]
struct Streak {
    gesture: String,
    frames: u32,
    fired: bool,
}

#[derive(Debug, Clone)]
pub struct Debouncer {
    window: u32,
    cooldown_ms: u64,
    streak: Option<Streak>,
    last_fired: HashMap<String, u64>,
    now_ms: u64,
}

impl Debouncer {
    pub fn new(window: u32, cooldown_ms: u64) -> Self {
        Self {
            window: window.max(1),
            cooldown_ms,
            streak: None,
            last_fired: HashMap::new(),
            now_ms: 0,
        }
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Frames the current winner has held, if any.
    pub fn streak_len(&self) -> u32 {
        self.streak.as_ref().map_or(0, |s| s.frames)
    }

    /// Feed this frame's winner. Returns a fire at most once per streak.
    pub fn observe(&mut self, winner: Option<&MatchCandidate>, dt_ms: u64) -> Option<GestureFire> {
        self.now_ms += dt_ms;

        let Some(candidate) = winner else {
            if let Some(streak) = self.streak.take() {
                debug!("Streak for '{}' ended after {} frames", streak.gesture, streak.frames);
            }
            return None;
        };

        match self.streak.as_mut() {
            Some(s) if s.gesture == candidate.gesture => s.frames = s.frames.saturating_add(1),
            _ => {
                self.streak = Some(Streak {
                    gesture: candidate.gesture.clone(),
                    frames: 1,
                    fired: false,
                })
            }
        }
        let Some(streak) = self.streak.as_mut() else {
            return None;
        };

        if streak.fired || streak.frames < self.window {
            return None;
        }

        if let Some(&last) = self.last_fired.get(&candidate.gesture) {
            if self.now_ms.saturating_sub(last) < self.cooldown_ms {
                debug!("'{}' held but still cooling down", candidate.gesture);
                return None;
            }
        }

        streak.fired = true;
        self.last_fired.insert(candidate.gesture.clone(), self.now_ms);
        info!(
            "Gesture '{}' fired -> '{}' (distance {:.3})",
            candidate.gesture, candidate.key_binding, candidate.distance
        );
        Some(GestureFire {
            gesture: candidate.gesture.clone(),
            key_binding: candidate.key_binding.clone(),
            distance: candidate.distance,
            at_ms: self.now_ms,
        })
    }

    /// Forget streaks and cooldowns, e.g. after the active profile changes.
    pub fn reset(&mut self) {
        self.streak = None;
        self.last_fired.clear();
    }
}
