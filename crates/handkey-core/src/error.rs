//! Model-level errors

use std::fmt;
use thiserror::Error;

/// What kind of named entity an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Profile,
    Gesture,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Profile => f.write_str("profile"),
            EntityKind::Gesture => f.write_str("gesture"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    #[error("{kind} '{name}' already exists")]
    DuplicateName { kind: EntityKind, name: String },

    #[error("{kind} '{name}' not found")]
    NotFound { kind: EntityKind, name: String },

    #[error("malformed signature: {0}")]
    MalformedSignature(String),

    #[error("invalid key binding '{binding}': {reason}")]
    InvalidKeyBinding { binding: String, reason: String },
}

impl ModelError {
    pub fn duplicate_gesture(name: &str) -> Self {
        Self::DuplicateName {
            kind: EntityKind::Gesture,
            name: name.to_string(),
        }
    }

    pub fn gesture_not_found(name: &str) -> Self {
        Self::NotFound {
            kind: EntityKind::Gesture,
            name: name.to_string(),
        }
    }
}
