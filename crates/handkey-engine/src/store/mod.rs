//! Profile store
//!
//! In-memory profiles backed by a [`ProfileStorage`]. Every mutation is
//! persisted immediately. When persisting fails the in-memory change is kept
//! and the `StorageIo` error is returned, so nothing the user did is lost.
//!
//! The active profile's enabled gestures are published as an immutable
//! snapshot. Readers on other threads see either the old or the new set.

pub mod codec;
pub mod storage;

pub use codec::profile_key;
pub use storage::{JsonDirStorage, MemoryStorage};

use crate::error::{EngineError, Result};
use crate::traits::ProfileStorage;
use handkey_core::{GestureSignature, ModelError, Profile, ProfileSummary};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};
use tracing::{debug, info, warn};

/// Enabled gestures of the active profile, frozen at publish time.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveProfile {
    pub name: String,
    pub gestures: Vec<GestureSignature>,
}

impl ActiveProfile {
    fn from_profile(profile: &Profile) -> Self {
        Self {
            name: profile.name.clone(),
            gestures: profile.active_gestures().cloned().collect(),
        }
    }
}

/// Shared read handle on the active-profile snapshot.
#[derive(Debug, Clone, Default)]
pub struct ActiveHandle {
    slot: Arc<RwLock<Option<Arc<ActiveProfile>>>>,
}

impl ActiveHandle {
    pub fn snapshot(&self) -> Option<Arc<ActiveProfile>> {
        self.slot.read().unwrap_or_else(|p| p.into_inner()).clone()
    }

    fn publish(&self, next: Option<Arc<ActiveProfile>>) {
        *self.slot.write().unwrap_or_else(|p| p.into_inner()) = next;
    }
}

/// What `load_all` found.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LoadReport {
    pub loaded: Vec<String>,
    /// (storage key, reason) for every record that was skipped.
    pub skipped: Vec<(String, String)>,
}

#[derive(Debug, Clone)]
struct Entry {
    profile: Profile,
    key: String,
}

pub struct ProfileStore<S: ProfileStorage> {
    storage: S,
    profiles: BTreeMap<String, Entry>,
    active: Option<String>,
    snapshot: ActiveHandle,
}

impl<S: ProfileStorage> ProfileStore<S> {
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            profiles: BTreeMap::new(),
            active: None,
            snapshot: ActiveHandle::default(),
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Replace the in-memory set with every readable record in storage.
    /// Malformed records are skipped and reported, not fatal.
    pub fn load_all(&mut self) -> Result<LoadReport> {
        let keys = self.storage.keys().map_err(|e| EngineError::storage("*", e))?;
        let mut report = LoadReport::default();
        let mut profiles = BTreeMap::new();

        for key in keys {
            let contents = match self.storage.read(&key) {
                Ok(c) => c,
                Err(e) => {
                    warn!("Skipping profile record '{}': {}", key, e);
                    report.skipped.push((key, e.to_string()));
                    continue;
                }
            };
            let profile = match codec::decode(&key, &contents) {
                Ok(p) => p,
                Err(e) => {
                    warn!("Skipping profile record: {}", e);
                    report.skipped.push((key, e.to_string()));
                    continue;
                }
            };
            if profiles.contains_key(&profile.name) {
                let reason = format!("profile '{}' already loaded from another record", profile.name);
                warn!("Skipping profile record '{}': {}", key, reason);
                report.skipped.push((key, reason));
                continue;
            }
            debug!("Loaded profile '{}' from '{}'", profile.name, key);
            report.loaded.push(profile.name.clone());
            profiles.insert(profile.name.clone(), Entry { profile, key });
        }

        self.profiles = profiles;
        if let Some(active) = self.active.clone() {
            if !self.profiles.contains_key(&active) {
                self.clear_active();
            }
        }
        self.refresh_snapshot();

        info!(
            "Loaded {} profiles ({} skipped)",
            report.loaded.len(),
            report.skipped.len()
        );
        Ok(report)
    }

    pub fn get(&self, name: &str) -> Option<&Profile> {
        self.profiles.get(name).map(|e| &e.profile)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.profiles.contains_key(name)
    }

    /// Profiles in name order.
    pub fn profiles(&self) -> impl Iterator<Item = &Profile> {
        self.profiles.values().map(|e| &e.profile)
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    pub fn summaries(&self) -> Vec<ProfileSummary> {
        self.profiles().map(Profile::summary).collect()
    }

    pub fn create(&mut self, name: &str, description: &str) -> Result<&Profile> {
        let name = name.trim();
        self.insert(Profile::new(name, description))?;
        self.get(name).ok_or_else(|| EngineError::profile_not_found(name))
    }

    /// Add a complete profile, e.g. an instantiated template.
    pub fn insert(&mut self, profile: Profile) -> Result<()> {
        if profile.name.trim().is_empty() {
            return Err(EngineError::MalformedSignature {
                key: String::new(),
                reason: "profile name is empty".to_string(),
            });
        }
        if self.profiles.contains_key(&profile.name) {
            return Err(EngineError::duplicate_profile(&profile.name));
        }
        let key = profile_key(&profile.name);
        if let Some(other) = self.profiles.values().find(|e| e.key == key) {
            debug!("'{}' and '{}' share storage key '{}'", profile.name, other.profile.name, key);
            return Err(EngineError::duplicate_profile(&profile.name));
        }

        let name = profile.name.clone();
        info!("Created profile '{}'", name);
        self.profiles.insert(name.clone(), Entry { profile, key });
        self.persist(&name)
    }

    /// Write the profile's current state to storage.
    pub fn save(&mut self, name: &str) -> Result<()> {
        let entry = self
            .profiles
            .get_mut(name)
            .ok_or_else(|| EngineError::profile_not_found(name))?;
        entry.profile.touch();
        self.persist(name)
    }

    /// Remove from storage, then from memory. Clears the active pointer when
    /// the deleted profile was active.
    pub fn delete(&mut self, name: &str) -> Result<Profile> {
        let key = self
            .profiles
            .get(name)
            .map(|e| e.key.clone())
            .ok_or_else(|| EngineError::profile_not_found(name))?;
        self.storage
            .remove(&key)
            .map_err(|e| EngineError::storage(&key, e))?;

        if self.active.as_deref() == Some(name) {
            self.clear_active();
        }
        let entry = self
            .profiles
            .remove(name)
            .ok_or_else(|| EngineError::profile_not_found(name))?;
        info!("Deleted profile '{}'", name);
        Ok(entry.profile)
    }

    /// Make `name` the one active profile.
    pub fn set_active(&mut self, name: &str) -> Result<()> {
        if !self.profiles.contains_key(name) {
            return Err(EngineError::profile_not_found(name));
        }
        if let Some(previous) = self.active.replace(name.to_string()) {
            if previous != name {
                debug!("Deactivated profile '{}'", previous);
            }
        }
        self.refresh_snapshot();
        info!("Active profile is now '{}'", name);
        Ok(())
    }

    pub fn clear_active(&mut self) {
        if let Some(previous) = self.active.take() {
            info!("Profile '{}' is no longer active", previous);
        }
        self.snapshot.publish(None);
    }

    pub fn active_name(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn active_profile(&self) -> Option<&Profile> {
        self.active.as_deref().and_then(|name| self.get(name))
    }

    pub fn active_snapshot(&self) -> Option<Arc<ActiveProfile>> {
        self.snapshot.snapshot()
    }

    /// A handle that follows the active snapshot from any thread.
    pub fn watch_active(&self) -> ActiveHandle {
        self.snapshot.clone()
    }

    pub fn add_gesture(&mut self, profile: &str, gesture: GestureSignature) -> Result<()> {
        self.mutate(profile, |p| p.add_gesture(gesture))
    }

    pub fn update_gesture(&mut self, profile: &str, gesture: GestureSignature) -> Result<()> {
        self.mutate(profile, |p| p.update_gesture(gesture))
    }

    pub fn remove_gesture(&mut self, profile: &str, gesture: &str) -> Result<GestureSignature> {
        self.mutate(profile, |p| p.remove_gesture(gesture))
    }

    pub fn set_gesture_active(&mut self, profile: &str, gesture: &str, active: bool) -> Result<()> {
        self.mutate(profile, |p| p.set_gesture_active(gesture, active))
    }

    /// Store a freshly recorded gesture. Returns true when it replaced one.
    pub fn commit_recorded(&mut self, profile: &str, gesture: GestureSignature) -> Result<bool> {
        self.mutate(profile, |p| Ok(p.commit_recorded(gesture)))
    }

    fn mutate<T>(
        &mut self,
        name: &str,
        f: impl FnOnce(&mut Profile) -> std::result::Result<T, ModelError>,
    ) -> Result<T> {
        let entry = self
            .profiles
            .get_mut(name)
            .ok_or_else(|| EngineError::profile_not_found(name))?;
        let out = f(&mut entry.profile)?;
        entry.profile.touch();

        if self.active.as_deref() == Some(name) {
            self.refresh_snapshot();
        }
        self.persist(name)?;
        Ok(out)
    }

    fn persist(&self, name: &str) -> Result<()> {
        let entry = self
            .profiles
            .get(name)
            .ok_or_else(|| EngineError::profile_not_found(name))?;
        let text = codec::encode(&entry.profile)?;
        self.storage.write(&entry.key, &text).map_err(|e| {
            warn!("Saving profile '{}' failed, keeping it in memory: {}", name, e);
            EngineError::storage(&entry.key, e)
        })
    }

    fn refresh_snapshot(&self) {
        let next = self.active_profile().map(|p| Arc::new(ActiveProfile::from_profile(p)));
        self.snapshot.publish(next);
    }
}
