//! Stored gesture signatures

use crate::error::ModelError;
use crate::features::{FIELD_COUNT, FeatureVector};
use crate::landmarks::Handedness;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HandType {
    Single,
    Both,
}

impl HandType {
    pub fn as_str(&self) -> &'static str {
        match self {
            HandType::Single => "single",
            HandType::Both => "both",
        }
    }

    pub fn hands_required(&self) -> usize {
        match self {
            HandType::Single => 1,
            HandType::Both => 2,
        }
    }
}

impl fmt::Display for HandType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HandType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "single" | "one" => Ok(HandType::Single),
            "both" | "two" => Ok(HandType::Both),
            other => Err(format!("unknown hand type '{}'", other)),
        }
    }
}

/// Averaged pose of one hand plus the per-field tolerance around it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HandTemplate {
    /// Side the hand was recorded on.
    pub side: Handedness,
    pub mean: FeatureVector,
    pub tolerance: FeatureVector,
}

impl HandTemplate {
    pub fn new(side: Handedness, mean: FeatureVector, tolerance: FeatureVector) -> Self {
        Self { side, mean, tolerance }
    }

    /// Per-field distance to `live`, in units of this template's tolerance.
    pub fn normalized_distance(&self, live: &FeatureVector) -> [f64; FIELD_COUNT] {
        let diff = self.mean.abs_diff(live);
        let tol = self.tolerance.to_array();
        let mut out = [0.0; FIELD_COUNT];
        for i in 0..FIELD_COUNT {
            out[i] = diff[i] / tol[i];
        }
        out
    }

    fn validate(&self) -> Result<(), ModelError> {
        if !self.mean.is_finite() {
            return Err(ModelError::MalformedSignature(format!(
                "{} hand mean has non-finite fields",
                self.side
            )));
        }
        if let Some(i) = self.tolerance.to_array().iter().position(|t| !t.is_finite() || *t <= 0.0) {
            return Err(ModelError::MalformedSignature(format!(
                "{} hand tolerance field {} must be positive",
                self.side, i
            )));
        }
        Ok(())
    }
}

/// One hand or a full left/right pair. A partial pair is not representable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SignatureRecord", into = "SignatureRecord")]
pub enum Signature {
    Single(HandTemplate),
    Both { left: HandTemplate, right: HandTemplate },
}

impl Signature {
    pub fn single(side: Handedness, mean: FeatureVector, tolerance: FeatureVector) -> Self {
        Signature::Single(HandTemplate::new(side, mean, tolerance))
    }

    pub fn both(left: HandTemplate, right: HandTemplate) -> Result<Self, ModelError> {
        if left.side != Handedness::Left || right.side != Handedness::Right {
            return Err(ModelError::MalformedSignature(
                "two-hand signature needs one left and one right hand".to_string(),
            ));
        }
        Ok(Signature::Both { left, right })
    }

    pub fn hand_type(&self) -> HandType {
        match self {
            Signature::Single(_) => HandType::Single,
            Signature::Both { .. } => HandType::Both,
        }
    }

    pub fn hands(&self) -> Vec<&HandTemplate> {
        match self {
            Signature::Single(hand) => vec![hand],
            Signature::Both { left, right } => vec![left, right],
        }
    }
}

/// On-disk shape: `{"hands": [...]}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SignatureRecord {
    hands: Vec<HandTemplate>,
}

impl TryFrom<SignatureRecord> for Signature {
    type Error = ModelError;

    fn try_from(record: SignatureRecord) -> Result<Self, Self::Error> {
        for hand in &record.hands {
            hand.validate()?;
        }
        match record.hands.as_slice() {
            [hand] => Ok(Signature::Single(*hand)),
            [a, b] => {
                let (left, right) = if a.side == Handedness::Left { (*a, *b) } else { (*b, *a) };
                Signature::both(left, right)
            }
            hands => Err(ModelError::MalformedSignature(format!(
                "expected 1 or 2 hands, found {}",
                hands.len()
            ))),
        }
    }
}

impl From<Signature> for SignatureRecord {
    fn from(signature: Signature) -> Self {
        SignatureRecord {
            hands: signature.hands().into_iter().copied().collect(),
        }
    }
}

/// A recorded gesture: name, binding and signature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "GestureRecord", into = "GestureRecord")]
pub struct GestureSignature {
    pub name: String,
    pub key_binding: String,
    pub signature: Signature,
    pub active: bool,
    pub description: String,
    /// Frames averaged into the signature.
    pub recorded_samples: usize,
    /// Profile-local activation order; higher means activated more recently.
    pub activated_seq: u64,
}

impl GestureSignature {
    pub fn new(name: impl Into<String>, key_binding: impl Into<String>, signature: Signature) -> Self {
        let name = name.into();
        Self {
            description: format!("Custom gesture: {}", name),
            name,
            key_binding: key_binding.into(),
            signature,
            active: true,
            recorded_samples: 0,
            activated_seq: 0,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_samples(mut self, samples: usize) -> Self {
        self.recorded_samples = samples;
        self
    }

    pub fn hand_type(&self) -> HandType {
        self.signature.hand_type()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct GestureRecord {
    name: String,
    key_binding: String,
    hand_type: HandType,
    active: bool,
    #[serde(default)]
    description: String,
    #[serde(default)]
    recorded_samples: usize,
    #[serde(default)]
    activated_seq: u64,
    signature: Signature,
}

impl TryFrom<GestureRecord> for GestureSignature {
    type Error = ModelError;

    fn try_from(record: GestureRecord) -> Result<Self, Self::Error> {
        if record.name.trim().is_empty() {
            return Err(ModelError::MalformedSignature("gesture name is empty".to_string()));
        }
        if record.signature.hand_type() != record.hand_type {
            return Err(ModelError::MalformedSignature(format!(
                "gesture '{}' declares {} hands but stores {}",
                record.name,
                record.hand_type,
                record.signature.hand_type()
            )));
        }
        Ok(GestureSignature {
            name: record.name,
            key_binding: record.key_binding,
            signature: record.signature,
            active: record.active,
            description: record.description,
            recorded_samples: record.recorded_samples,
            activated_seq: record.activated_seq,
        })
    }
}

impl From<GestureSignature> for GestureRecord {
    fn from(g: GestureSignature) -> Self {
        GestureRecord {
            hand_type: g.signature.hand_type(),
            name: g.name,
            key_binding: g.key_binding,
            active: g.active,
            description: g.description,
            recorded_samples: g.recorded_samples,
            activated_seq: g.activated_seq,
            signature: g.signature,
        }
    }
}
