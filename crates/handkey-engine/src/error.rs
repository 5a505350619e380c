//! Engine error kinds

use handkey_core::{EntityKind, ModelError};
use thiserror::Error;

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

#[derive(Debug, Error)]
pub enum EngineError {
    /// Profile or gesture name collision.
    #[error("{kind} '{name}' already exists")]
    DuplicateName { kind: EntityKind, name: String },

    /// Profile or gesture lookup miss.
    #[error("{kind} '{name}' not found")]
    NotFound { kind: EntityKind, name: String },

    /// The capture window produced too few usable frames.
    #[error("insufficient samples: captured {captured}, need at least {required}")]
    InsufficientSamples { captured: usize, required: usize },

    /// Recording aborted after the hand(s) were missing past the grace period.
    #[error("no hand detected for {absent_ms} ms")]
    NoHandDetected { absent_ms: u64 },

    /// A persisted record failed schema validation.
    #[error("malformed profile record '{key}': {reason}")]
    MalformedSignature { key: String, reason: String },

    /// Durable storage read/write failure.
    #[error("storage I/O error on '{key}': {source}")]
    StorageIo {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid key binding '{binding}': {reason}")]
    InvalidKeyBinding { binding: String, reason: String },

    /// A recording session is already running.
    #[error("a recording is already in progress")]
    RecordingInProgress,

    #[error("no active profile")]
    NoActiveProfile,
}

impl EngineError {
    pub fn profile_not_found(name: &str) -> Self {
        Self::NotFound {
            kind: EntityKind::Profile,
            name: name.to_string(),
        }
    }

    pub fn duplicate_profile(name: &str) -> Self {
        Self::DuplicateName {
            kind: EntityKind::Profile,
            name: name.to_string(),
        }
    }

    pub fn storage(key: &str, source: std::io::Error) -> Self {
        Self::StorageIo {
            key: key.to_string(),
            source,
        }
    }
}

impl From<ModelError> for EngineError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::DuplicateName { kind, name } => EngineError::DuplicateName { kind, name },
            ModelError::NotFound { kind, name } => EngineError::NotFound { kind, name },
            ModelError::MalformedSignature(reason) => EngineError::MalformedSignature {
                key: String::new(),
                reason,
            },
            ModelError::InvalidKeyBinding { binding, reason } => EngineError::InvalidKeyBinding { binding, reason },
        }
    }
}
