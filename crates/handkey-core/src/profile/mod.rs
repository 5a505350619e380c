//! Gesture profiles

pub mod signature;
pub mod template;

pub use signature::{GestureSignature, HandTemplate, HandType, Signature};
pub use template::{GesturePlaceholder, TemplateKind};

use crate::error::ModelError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::{SystemTime, UNIX_EPOCH};

pub(crate) fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// A named set of gestures. Gesture names are unique within a profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ProfileRecord", into = "ProfileRecord")]
pub struct Profile {
    pub name: String,
    pub description: String,
    gestures: Vec<GestureSignature>,
    /// Template entries not recorded yet.
    pub placeholders: Vec<GesturePlaceholder>,
    pub created_at: u64,
    pub modified_at: u64,
}

/// Listing info for a profile.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileSummary {
    pub name: String,
    pub description: String,
    pub gesture_count: usize,
    pub active_gesture_count: usize,
    pub pending_placeholders: usize,
    pub created_at: u64,
    pub modified_at: u64,
}

impl Profile {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        let now = unix_now();
        Self {
            name: name.into(),
            description: description.into(),
            gestures: Vec::new(),
            placeholders: Vec::new(),
            created_at: now,
            modified_at: now,
        }
    }

    pub fn gestures(&self) -> &[GestureSignature] {
        &self.gestures
    }

    pub fn gesture(&self, name: &str) -> Option<&GestureSignature> {
        self.gestures.iter().find(|g| g.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.gesture(name).is_some()
    }

    /// Gestures with `active == true`, in profile order.
    pub fn active_gestures(&self) -> impl Iterator<Item = &GestureSignature> {
        self.gestures.iter().filter(|g| g.active)
    }

    pub fn next_activation_seq(&self) -> u64 {
        self.gestures.iter().map(|g| g.activated_seq).max().unwrap_or(0) + 1
    }

    pub fn add_gesture(&mut self, gesture: GestureSignature) -> Result<(), ModelError> {
        if self.contains(&gesture.name) {
            return Err(ModelError::duplicate_gesture(&gesture.name));
        }
        self.gestures.push(gesture);
        Ok(())
    }

    /// Replace an existing gesture in place.
    pub fn update_gesture(&mut self, gesture: GestureSignature) -> Result<(), ModelError> {
        let slot = self
            .gestures
            .iter_mut()
            .find(|g| g.name == gesture.name)
            .ok_or_else(|| ModelError::gesture_not_found(&gesture.name))?;
        *slot = gesture;
        Ok(())
    }

    /// Store a freshly recorded gesture: replaces a same-named gesture in
    /// place or appends, marks it active and consumes a matching placeholder.
    /// Returns true when an existing gesture was replaced.
    pub fn commit_recorded(&mut self, mut gesture: GestureSignature) -> bool {
        gesture.active = true;
        gesture.activated_seq = self.next_activation_seq();
        self.placeholders.retain(|p| p.name != gesture.name);

        match self.gestures.iter_mut().find(|g| g.name == gesture.name) {
            Some(slot) => {
                *slot = gesture;
                true
            }
            None => {
                self.gestures.push(gesture);
                false
            }
        }
    }

    pub fn remove_gesture(&mut self, name: &str) -> Result<GestureSignature, ModelError> {
        let pos = self
            .gestures
            .iter()
            .position(|g| g.name == name)
            .ok_or_else(|| ModelError::gesture_not_found(name))?;
        Ok(self.gestures.remove(pos))
    }

    pub fn set_gesture_active(&mut self, name: &str, active: bool) -> Result<(), ModelError> {
        let seq = self.next_activation_seq();
        let gesture = self
            .gestures
            .iter_mut()
            .find(|g| g.name == name)
            .ok_or_else(|| ModelError::gesture_not_found(name))?;
        if active && !gesture.active {
            gesture.activated_seq = seq;
        }
        gesture.active = active;
        Ok(())
    }

    pub fn placeholder(&self, name: &str) -> Option<&GesturePlaceholder> {
        self.placeholders.iter().find(|p| p.name == name)
    }

    pub fn touch(&mut self) {
        self.modified_at = unix_now().max(self.created_at);
    }

    pub fn summary(&self) -> ProfileSummary {
        ProfileSummary {
            name: self.name.clone(),
            description: self.description.clone(),
            gesture_count: self.gestures.len(),
            active_gesture_count: self.active_gestures().count(),
            pending_placeholders: self.placeholders.len(),
            created_at: self.created_at,
            modified_at: self.modified_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ProfileRecord {
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    gestures: Vec<GestureSignature>,
    #[serde(default)]
    placeholders: Vec<GesturePlaceholder>,
    #[serde(default)]
    created_at: u64,
    #[serde(default)]
    modified_at: u64,
}

impl TryFrom<ProfileRecord> for Profile {
    type Error = ModelError;

    fn try_from(record: ProfileRecord) -> Result<Self, Self::Error> {
        if record.name.trim().is_empty() {
            return Err(ModelError::MalformedSignature("profile name is empty".to_string()));
        }
        let mut seen = HashSet::new();
        for g in &record.gestures {
            if !seen.insert(g.name.as_str()) {
                return Err(ModelError::MalformedSignature(format!(
                    "gesture '{}' appears twice in profile '{}'",
                    g.name, record.name
                )));
            }
        }
        Ok(Profile {
            name: record.name,
            description: record.description,
            gestures: record.gestures,
            placeholders: record.placeholders,
            created_at: record.created_at,
            modified_at: record.modified_at,
        })
    }
}

impl From<Profile> for ProfileRecord {
    fn from(p: Profile) -> Self {
        ProfileRecord {
            name: p.name,
            description: p.description,
            gestures: p.gestures,
            placeholders: p.placeholders,
            created_at: p.created_at,
            modified_at: p.modified_at,
        }
    }
}
