//! Tolerance-normalized signature matching

use super::{Debouncer, GestureFire, MatcherConfig, SidePolicy};
use crate::candidate::{CandidateSet, MatchCandidate};
use handkey_core::features::{FIELD_NAMES, FrameFeatures};
use handkey_core::{GestureSignature, Handedness, Signature};
use tracing::debug;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// One frame's best candidate and whether it fired.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MatchOutcome {
    pub candidate: Option<MatchCandidate>,
    pub fired: Option<GestureFire>,
}

/// Scores live features against signatures and debounces the winner
pub struct GestureMatcher {
    config: MatcherConfig,
    debouncer: Debouncer,
}

impl GestureMatcher {
    pub fn new(config: MatcherConfig) -> Self {
        let debouncer = Debouncer::new(config.debounce_frames, config.cooldown_ms);
        Self { config, debouncer }
    }

    pub fn config(&self) -> &MatcherConfig {
        &self.config
    }

    /// Score one gesture against the frame. `None` when the frame cannot
    /// satisfy the gesture's hand type.
    ///
    /// A single-hand gesture is scored against each usable live hand. The
    /// closest hand with every field within the ceiling wins; only when no
    /// hand qualifies is the closest one returned.
    pub fn score(&self, frame: &FrameFeatures, gesture: &GestureSignature) -> Option<MatchCandidate> {
        match &gesture.signature {
            Signature::Both { left, right } => {
                let (l, r) = (frame.left.as_ref()?, frame.right.as_ref()?);
                let mut d = left.normalized_distance(l).to_vec();
                d.extend(right.normalized_distance(r));
                Some(build_candidate(gesture, &d, None))
            }
            Signature::Single(template) => {
                let sides: Vec<Handedness> = match self.config.side_policy {
                    SidePolicy::HandAgnostic => frame.present().map(|(side, _)| side).collect(),
                    SidePolicy::SameSide => vec![template.side],
                };
                let per_side: CandidateSet = sides
                    .into_iter()
                    .filter_map(|side| {
                        let live = frame.get(side)?;
                        let d = template.normalized_distance(live);
                        Some(build_candidate(gesture, &d, Some(side)))
                    })
                    .collect();

                let ceiling = self.config.field_ceiling;
                if per_side.iter().any(|c| c.is_eligible(ceiling)) {
                    per_side.filter_eligible(ceiling).into_best()
                } else {
                    per_side.into_best()
                }
            }
        }
    }

    /// Score every active gesture the frame can satisfy.
    pub fn candidates(&self, frame: &FrameFeatures, gestures: &[GestureSignature]) -> CandidateSet {
        #[cfg(feature = "parallel")]
        let scored: Vec<MatchCandidate> = gestures
            .par_iter()
            .filter(|g| g.active)
            .filter_map(|g| self.score(frame, g))
            .collect();

        #[cfg(not(feature = "parallel"))]
        let scored: Vec<MatchCandidate> = gestures
            .iter()
            .filter(|g| g.active)
            .filter_map(|g| self.score(frame, g))
            .collect();

        CandidateSet::from_vec(scored)
    }

    /// Best eligible candidate for this frame. Pure: no debounce state is touched.
    pub fn evaluate(&self, frame: &FrameFeatures, gestures: &[GestureSignature]) -> Option<MatchCandidate> {
        let ceiling = self.config.field_ceiling;
        let all = self.candidates(frame, gestures);
        if !all.is_empty() {
            let stats = all.stats(ceiling);
            debug!(
                "{} candidates, {} eligible, best distance {:.3}",
                stats.total, stats.eligible, stats.min_distance
            );
        }
        all.filter_eligible(ceiling)
            .filter_by_confidence(ceiling, self.config.min_confidence)
            .into_best()
    }

    /// Evaluate and feed the winner through the debouncer.
    pub fn observe(&mut self, frame: &FrameFeatures, gestures: &[GestureSignature], dt_ms: u64) -> MatchOutcome {
        let candidate = self.evaluate(frame, gestures);
        let fired = self.debouncer.observe(candidate.as_ref(), dt_ms);
        MatchOutcome { candidate, fired }
    }

    pub fn reset(&mut self) {
        self.debouncer.reset();
    }
}

fn build_candidate(gesture: &GestureSignature, distances: &[f64], matched_side: Option<Handedness>) -> MatchCandidate {
    let (worst_idx, worst_distance) = distances
        .iter()
        .map(|d| if d.is_nan() { f64::INFINITY } else { *d })
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |acc, (i, d)| if d > acc.1 { (i, d) } else { acc });

    MatchCandidate {
        gesture: gesture.name.clone(),
        key_binding: gesture.key_binding.clone(),
        distance: mean(distances),
        worst_field: FIELD_NAMES[worst_idx % FIELD_NAMES.len()],
        worst_distance,
        matched_side,
        activated_seq: gesture.activated_seq,
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::INFINITY;
    }
    values.iter().sum::<f64>() / values.len() as f64
}
