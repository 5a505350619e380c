//! Gesture engine controller
//!
//! Owns the recorder, matcher and profile store and feeds each frame to
//! exactly one of them, selected by a single mode flag.

use super::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::matching::{GestureMatcher, MatchOutcome};
use crate::recorder::{CancelHandle, RecordRequest, Recorder, RecorderProgress};
use crate::store::{ActiveHandle, JsonDirStorage, LoadReport, ProfileStore};
use crate::traits::{KeyInjector, ProfileStorage};
use handkey_core::{
    FeatureExtractor, FrameAdapter, FrameFeatures, FrameHands, GestureSignature, HandType, KeyBinding, Profile,
    ProfileSummary, RawHand, TemplateKind,
};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Idle,
    Recording,
    Matching,
}

/// What one frame did.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameOutcome {
    Idle,
    Recording(RecorderProgress),
    /// A recording finished and was stored.
    Committed {
        profile: String,
        gesture: String,
        replaced: bool,
    },
    Matching(MatchOutcome),
}

pub struct GestureEngine<S: ProfileStorage, K: KeyInjector> {
    config: EngineConfig,
    adapter: FrameAdapter,
    extractor: FeatureExtractor,
    recorder: Recorder,
    matcher: GestureMatcher,
    store: ProfileStore<S>,
    injector: K,
    mode: Mode,
    /// Mode to return to once a recording ends.
    resume_mode: Mode,
}

impl<K: KeyInjector> GestureEngine<JsonDirStorage, K> {
    /// Engine over the configured profile directory, with every readable
    /// profile loaded.
    pub fn open(config: EngineConfig, injector: K) -> Result<(Self, LoadReport)> {
        let storage =
            JsonDirStorage::new(&config.storage.profiles_dir).with_extension(&config.storage.extension);
        let mut engine = Self::new(config, storage, injector);
        let report = engine.store.load_all()?;
        Ok((engine, report))
    }
}

impl<S: ProfileStorage, K: KeyInjector> GestureEngine<S, K> {
    pub fn new(config: EngineConfig, storage: S, injector: K) -> Self {
        Self {
            adapter: FrameAdapter::new(config.adapter.clone()),
            extractor: FeatureExtractor::new(),
            recorder: Recorder::new(config.recorder.clone()),
            matcher: GestureMatcher::new(config.matcher.clone()),
            store: ProfileStore::new(storage),
            config,
            injector,
            mode: Mode::Idle,
            resume_mode: Mode::Idle,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn store(&self) -> &ProfileStore<S> {
        &self.store
    }

    pub fn recorder(&self) -> &Recorder {
        &self.recorder
    }

    pub fn injector(&self) -> &K {
        &self.injector
    }

    pub fn injector_mut(&mut self) -> &mut K {
        &mut self.injector
    }

    /// Reload every profile from storage.
    pub fn reload(&mut self) -> Result<LoadReport> {
        let report = self.store.load_all()?;
        self.leave_matching_without_profile();
        Ok(report)
    }

    // Per-frame entry points

    pub fn process_frame(&mut self, raw_hands: &[RawHand], dt_ms: u64) -> Result<FrameOutcome> {
        let hands = self.adapter.adapt(raw_hands);
        self.process_hands(&hands, dt_ms)
    }

    pub fn process_hands(&mut self, hands: &FrameHands, dt_ms: u64) -> Result<FrameOutcome> {
        let features = self.extractor.extract_frame(hands);
        self.process_features(&features, dt_ms)
    }

    pub fn process_features(&mut self, frame: &FrameFeatures, dt_ms: u64) -> Result<FrameOutcome> {
        match self.mode {
            Mode::Idle => Ok(FrameOutcome::Idle),
            Mode::Recording => self.advance_recording(frame, dt_ms),
            Mode::Matching => Ok(FrameOutcome::Matching(self.match_frame(frame, dt_ms))),
        }
    }

    fn advance_recording(&mut self, frame: &FrameFeatures, dt_ms: u64) -> Result<FrameOutcome> {
        let progress = match self.recorder.advance(frame, dt_ms) {
            Ok(p) => p,
            Err(e) => {
                self.finish_recording();
                return Err(e);
            }
        };

        match progress {
            RecorderProgress::Finished(captured) => {
                self.finish_recording();
                let profile = captured.request.profile.clone();
                let mut gesture = captured.into_gesture();
                if let Some(placeholder) = self
                    .store
                    .get(&profile)
                    .and_then(|p| p.placeholder(&gesture.name))
                    .filter(|p| !p.description.is_empty())
                {
                    gesture.description = placeholder.description.clone();
                }
                let name = gesture.name.clone();
                let replaced = self.store.commit_recorded(&profile, gesture)?;
                info!(
                    "{} gesture '{}' in profile '{}'",
                    if replaced { "Re-recorded" } else { "Recorded" },
                    name,
                    profile
                );
                Ok(FrameOutcome::Committed {
                    profile,
                    gesture: name,
                    replaced,
                })
            }
            RecorderProgress::Cancelled | RecorderProgress::Idle => {
                self.finish_recording();
                Ok(FrameOutcome::Recording(progress))
            }
            other => Ok(FrameOutcome::Recording(other)),
        }
    }

    fn match_frame(&mut self, frame: &FrameFeatures, dt_ms: u64) -> MatchOutcome {
        let snapshot = self.store.active_snapshot();
        let gestures = snapshot.as_deref().map(|a| a.gestures.as_slice()).unwrap_or(&[]);
        let outcome = self.matcher.observe(frame, gestures, dt_ms);

        if let Some(fire) = &outcome.fired {
            match KeyBinding::parse(&fire.key_binding) {
                Ok(binding) => {
                    if let Err(e) = self.injector.inject(&binding) {
                        warn!("Key injection for '{}' failed: {:#}", fire.gesture, e);
                    }
                }
                Err(e) => warn!("Gesture '{}' has an unusable binding: {}", fire.gesture, e),
            }
        }
        outcome
    }

    fn finish_recording(&mut self) {
        self.mode = self.resume_mode;
        self.resume_mode = Mode::Idle;
        self.matcher.reset();
        debug!("Recording ended, back to {:?}", self.mode);
        self.leave_matching_without_profile();
    }

    fn leave_matching_without_profile(&mut self) {
        if self.store.active_name().is_none() {
            if self.mode == Mode::Matching {
                info!("No active profile, matching stopped");
                self.mode = Mode::Idle;
            }
            if self.resume_mode == Mode::Matching {
                self.resume_mode = Mode::Idle;
            }
        }
    }

    // Control surface

    /// Begin recording `gesture` into `profile`. An empty binding falls back
    /// to the profile's placeholder of the same name.
    pub fn start_recording(&mut self, profile: &str, gesture: &str, key_binding: &str, hand_type: HandType) -> Result<()> {
        if self.mode == Mode::Recording {
            return Err(EngineError::RecordingInProgress);
        }
        let target = self
            .store
            .get(profile)
            .ok_or_else(|| EngineError::profile_not_found(profile))?;

        let gesture = gesture.trim();
        if gesture.is_empty() {
            return Err(EngineError::MalformedSignature {
                key: profile.to_string(),
                reason: "gesture name is empty".to_string(),
            });
        }

        let binding = match key_binding.trim() {
            "" => target
                .placeholder(gesture)
                .map(|p| p.key_binding.clone())
                .unwrap_or_default(),
            given => given.to_string(),
        };
        KeyBinding::parse(&binding)?;

        self.recorder.start(RecordRequest {
            profile: profile.to_string(),
            gesture: gesture.to_string(),
            key_binding: binding,
            hand_type,
        })?;
        self.resume_mode = self.mode;
        self.mode = Mode::Recording;
        Ok(())
    }

    /// Abort the running recording. Returns false when nothing was recording.
    pub fn cancel_recording(&mut self) -> bool {
        if !self.recorder.cancel() {
            return false;
        }
        // apply now rather than on the next frame
        if let Err(e) = self.advance_recording(&FrameFeatures::none(), 0) {
            debug!("Recording ended while cancelling: {}", e);
        }
        true
    }

    /// Cancel handle usable from another thread. Takes effect on the next frame.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.recorder.cancel_handle()
    }

    pub fn start_matching(&mut self) -> Result<()> {
        if self.mode == Mode::Recording {
            return Err(EngineError::RecordingInProgress);
        }
        let Some(active) = self.store.active_name() else {
            return Err(EngineError::NoActiveProfile);
        };
        info!("Matching gestures of profile '{}'", active);
        self.matcher.reset();
        self.mode = Mode::Matching;
        Ok(())
    }

    pub fn stop_matching(&mut self) {
        if self.mode == Mode::Matching {
            info!("Matching stopped");
            self.mode = Mode::Idle;
        }
        if self.resume_mode == Mode::Matching {
            self.resume_mode = Mode::Idle;
        }
        self.matcher.reset();
    }

    pub fn create_profile(&mut self, name: &str, description: &str) -> Result<()> {
        self.store.create(name, description).map(|_| ())
    }

    pub fn set_active_profile(&mut self, name: &str) -> Result<()> {
        self.store.set_active(name)?;
        self.matcher.reset();
        Ok(())
    }

    /// Add a gesture built elsewhere. Its key binding must parse.
    pub fn add_gesture(&mut self, profile: &str, gesture: GestureSignature) -> Result<()> {
        KeyBinding::parse(&gesture.key_binding)?;
        self.store.add_gesture(profile, gesture)
    }

    pub fn update_gesture(&mut self, profile: &str, gesture: GestureSignature) -> Result<()> {
        KeyBinding::parse(&gesture.key_binding)?;
        self.store.update_gesture(profile, gesture)
    }

    pub fn toggle_gesture_active(&mut self, profile: &str, gesture: &str, active: bool) -> Result<()> {
        self.store.set_gesture_active(profile, gesture, active)
    }

    pub fn delete_gesture(&mut self, profile: &str, gesture: &str) -> Result<GestureSignature> {
        self.store.remove_gesture(profile, gesture)
    }

    /// Delete a profile. A recording targeting it is cancelled and matching
    /// stops when it was the active profile.
    pub fn delete_profile(&mut self, name: &str) -> Result<Profile> {
        if !self.store.contains(name) {
            return Err(EngineError::profile_not_found(name));
        }
        let recording_into = self
            .recorder
            .session()
            .is_some_and(|s| s.request.profile == name);
        if recording_into {
            self.cancel_recording();
        }

        let removed = self.store.delete(name)?;
        self.leave_matching_without_profile();
        Ok(removed)
    }

    /// Profile draft for a built-in template. Nothing is stored.
    pub fn instantiate_template(&self, kind: TemplateKind) -> Profile {
        kind.instantiate()
    }

    /// Store a template draft as a new profile.
    pub fn add_template_profile(&mut self, kind: TemplateKind) -> Result<()> {
        self.store.insert(kind.instantiate())
    }

    pub fn list_profiles(&self) -> Vec<ProfileSummary> {
        self.store.summaries()
    }

    pub fn watch_active(&self) -> ActiveHandle {
        self.store.watch_active()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::MatcherConfig;
    use crate::recorder::RecorderConfig;
    use crate::store::MemoryStorage;
    use handkey_core::features::FeatureVector;
    use handkey_core::{Handedness, Signature};

    #[derive(Default)]
    struct Keys(Vec<String>);

    impl KeyInjector for Keys {
        fn inject(&mut self, binding: &KeyBinding) -> anyhow::Result<()> {
            self.0.push(binding.to_string());
            Ok(())
        }
    }

    fn engine() -> GestureEngine<MemoryStorage, Keys> {
        let config = EngineConfig {
            recorder: RecorderConfig {
                countdown_ticks: 1,
                tick_ms: 100,
                capture_ms: 300,
                min_samples: 3,
                grace_ms: 150,
                ..Default::default()
            },
            matcher: MatcherConfig {
                debounce_frames: 2,
                ..Default::default()
            },
            ..Default::default()
        };
        GestureEngine::new(config, MemoryStorage::new(), Keys::default())
    }

    #[test]
    fn test_record_then_match() -> Result<()> {
        let mut engine = engine();
        engine.add_template_profile(TemplateKind::GeneralGaming)?;
        engine.start_recording("General Gaming", "jump", "", HandType::Single)?;
        assert_eq!(engine.mode(), Mode::Recording);

        let pose = FrameFeatures::single(Handedness::Right, FeatureVector::splat(1.0));
        let mut committed = None;
        for _ in 0..10 {
            if let FrameOutcome::Committed { gesture, replaced, .. } = engine.process_features(&pose, 100)? {
                committed = Some((gesture, replaced));
                break;
            }
        }
        assert_eq!(committed, Some(("jump".to_string(), false)));
        assert_eq!(engine.mode(), Mode::Idle);

        let profile = engine.store().get("General Gaming").unwrap();
        let jump = profile.gesture("jump").unwrap();
        assert_eq!(jump.key_binding, "space");
        assert_eq!(jump.description, "Jump");
        assert!(profile.placeholder("jump").is_none());

        engine.set_active_profile("General Gaming")?;
        engine.start_matching()?;
        for _ in 0..5 {
            engine.process_features(&pose, 33)?;
        }
        assert_eq!(engine.injector().0, vec!["space".to_string()]);
        Ok(())
    }

    #[test]
    fn test_invalid_binding_is_rejected_before_recording() {
        let mut engine = engine();
        engine.create_profile("P", "").unwrap();
        let err = engine
            .start_recording("P", "g", "hyper+q", HandType::Single)
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidKeyBinding { .. }));
        assert_eq!(engine.mode(), Mode::Idle);
        assert!(matches!(
            engine.start_recording("nope", "g", "q", HandType::Single),
            Err(EngineError::NotFound { .. })
        ));
    }

    #[test]
    fn test_added_gestures_need_a_valid_binding() -> Result<()> {
        let mut engine = engine();
        engine.create_profile("P", "")?;
        let sig = Signature::single(Handedness::Right, FeatureVector::splat(1.0), FeatureVector::splat(0.1));

        let err = engine
            .add_gesture("P", GestureSignature::new("g", "hyper+q", sig))
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidKeyBinding { .. }));
        assert!(engine.store().get("P").unwrap().gestures().is_empty());

        engine.add_gesture("P", GestureSignature::new("g", "ctrl+q", sig))?;
        let err = engine
            .update_gesture("P", GestureSignature::new("g", "", sig))
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidKeyBinding { .. }));
        assert_eq!(engine.store().get("P").unwrap().gesture("g").unwrap().key_binding, "ctrl+q");
        Ok(())
    }

    #[test]
    fn test_cancel_returns_to_previous_mode() -> Result<()> {
        let mut engine = engine();
        engine.create_profile("P", "")?;
        engine.set_active_profile("P")?;
        engine.start_matching()?;
        engine.start_recording("P", "g", "q", HandType::Both)?;
        assert!(matches!(
            engine.start_recording("P", "h", "q", HandType::Both),
            Err(EngineError::RecordingInProgress)
        ));

        assert!(engine.cancel_recording());
        assert_eq!(engine.mode(), Mode::Matching);
        assert!(!engine.cancel_recording());
        assert!(engine.store().get("P").unwrap().gestures().is_empty());
        Ok(())
    }

    #[test]
    fn test_matching_requires_active_profile() {
        let mut engine = engine();
        assert!(matches!(engine.start_matching(), Err(EngineError::NoActiveProfile)));
    }

    #[test]
    fn test_deleting_active_profile_stops_matching() -> Result<()> {
        let mut engine = engine();
        engine.create_profile("P", "")?;
        engine.set_active_profile("P")?;
        engine.start_matching()?;
        engine.delete_profile("P")?;
        assert_eq!(engine.mode(), Mode::Idle);
        assert!(engine.watch_active().snapshot().is_none());
        assert_eq!(engine.process_features(&FrameFeatures::none(), 10)?, FrameOutcome::Idle);
        Ok(())
    }

    #[test]
    fn test_absent_hand_aborts_recording() -> Result<()> {
        let mut engine = engine();
        engine.create_profile("P", "")?;
        engine.start_recording("P", "g", "q", HandType::Single)?;
        let none = FrameFeatures::none();
        engine.process_features(&none, 100)?;

        let mut result = Ok(FrameOutcome::Idle);
        for _ in 0..10 {
            result = engine.process_features(&none, 100);
            if result.is_err() {
                break;
            }
        }
        assert!(matches!(result, Err(EngineError::NoHandDetected { .. })));
        assert_eq!(engine.mode(), Mode::Idle);
        Ok(())
    }
}
