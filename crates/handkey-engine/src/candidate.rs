//! Scored match candidates and ranking
//!
//! One candidate per active gesture per frame. The matcher keeps the best
//! eligible one.

use handkey_core::Handedness;
use serde::Serialize;
use std::cmp::Ordering;

/// How well one gesture fits the current frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchCandidate {
    pub gesture: String,
    pub key_binding: String,
    /// Mean normalized distance over all compared fields.
    pub distance: f64,
    /// Name of the field furthest from the signature.
    pub worst_field: &'static str,
    pub worst_distance: f64,
    /// Live hand that matched a single-hand gesture. `None` for two-hand gestures.
    pub matched_side: Option<Handedness>,
    pub activated_seq: u64,
}

impl MatchCandidate {
    /// Every field within the ceiling.
    pub fn is_eligible(&self, field_ceiling: f64) -> bool {
        self.worst_distance <= field_ceiling && self.distance.is_finite()
    }

    /// Map the mean distance to [0, 1], where 1 is an exact match.
    pub fn confidence(&self, field_ceiling: f64) -> f64 {
        if field_ceiling <= 0.0 || !self.distance.is_finite() {
            return 0.0;
        }
        (1.0 - self.distance / field_ceiling).clamp(0.0, 1.0)
    }

    /// Lowest distance first, then the most recently activated gesture,
    /// then the name.
    pub fn rank_cmp(&self, other: &MatchCandidate) -> Ordering {
        self.distance
            .total_cmp(&other.distance)
            .then_with(|| other.activated_seq.cmp(&self.activated_seq))
            .then_with(|| self.gesture.cmp(&other.gesture))
    }
}

/// Collection of candidates with batch operations
#[derive(Debug, Clone, Default, Serialize)]
pub struct CandidateSet {
    candidates: Vec<MatchCandidate>,
}

impl CandidateSet {
    pub fn from_vec(candidates: Vec<MatchCandidate>) -> Self {
        Self { candidates }
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MatchCandidate> {
        self.candidates.iter()
    }

    /// Drop candidates with any field past the ceiling.
    pub fn filter_eligible(mut self, field_ceiling: f64) -> Self {
        self.candidates.retain(|c| c.is_eligible(field_ceiling));
        self
    }

    pub fn filter_by_confidence(mut self, field_ceiling: f64, min_confidence: f64) -> Self {
        self.candidates
            .retain(|c| c.confidence(field_ceiling) >= min_confidence);
        self
    }

    pub fn into_best(self) -> Option<MatchCandidate> {
        self.candidates.into_iter().min_by(|a, b| a.rank_cmp(b))
    }

    pub fn stats(&self, field_ceiling: f64) -> CandidateStats {
        let eligible = self.iter().filter(|c| c.is_eligible(field_ceiling)).count();
        let finite: Vec<f64> = self
            .iter()
            .map(|c| c.distance)
            .filter(|d| d.is_finite())
            .collect();

        let (min_distance, avg_distance) = if finite.is_empty() {
            (0.0, 0.0)
        } else {
            (
                finite.iter().copied().fold(f64::INFINITY, f64::min),
                finite.iter().sum::<f64>() / finite.len() as f64,
            )
        };

        CandidateStats {
            total: self.len(),
            eligible,
            min_distance,
            avg_distance,
        }
    }
}

impl FromIterator<MatchCandidate> for CandidateSet {
    fn from_iter<T: IntoIterator<Item = MatchCandidate>>(iter: T) -> Self {
        Self::from_vec(iter.into_iter().collect())
    }
}

/// Summary of one frame's candidates
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateStats {
    pub total: usize,
    pub eligible: usize,
    pub min_distance: f64,
    pub avg_distance: f64,
}
