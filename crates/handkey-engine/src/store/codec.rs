//! Profile record encoding and storage keys

use crate::error::{EngineError, Result};
use handkey_core::Profile;

pub fn encode(profile: &Profile) -> Result<String> {
    serde_json::to_string_pretty(profile).map_err(|e| EngineError::MalformedSignature {
        key: profile.name.clone(),
        reason: e.to_string(),
    })
}

/// Parse and validate one stored record.
pub fn decode(key: &str, contents: &str) -> Result<Profile> {
    serde_json::from_str(contents).map_err(|e| EngineError::MalformedSignature {
        key: key.to_string(),
        reason: e.to_string(),
    })
}

/// Storage key for a profile name: lower-case, non-alphanumerics become `_`.
pub fn profile_key(name: &str) -> String {
    let key: String = name
        .trim()
        .chars()
        .map(|c| if c.is_alphanumeric() { c.to_lowercase().next().unwrap_or(c) } else { '_' })
        .collect();
    if key.is_empty() { "_".to_string() } else { key }
}
