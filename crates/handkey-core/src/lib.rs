//! Handkey core model
//!
//! Hand landmarks, the per-hand feature vector derived from them, and the
//! gesture/profile records that the engine stores and matches against.

pub mod error;
pub mod features;
pub mod keys;
pub mod landmarks;
pub mod profile;

pub use error::{EntityKind, ModelError};
pub use features::{FeatureExtractor, FeatureVector, FrameFeatures};
pub use keys::{Key, KeyBinding, Modifier, NamedKey};
pub use landmarks::{FrameAdapter, FrameHands, HandMeasurement, Handedness, Landmark, RawHand};
pub use profile::{
    GesturePlaceholder, GestureSignature, HandTemplate, HandType, Profile, ProfileSummary,
    Signature, TemplateKind,
};
