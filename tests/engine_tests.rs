// tests/engine_tests.rs
use handkey_core::features::FIELD_COUNT;
use handkey_core::{
    FeatureVector, FrameFeatures, GestureSignature, HandTemplate, HandType, Handedness, KeyBinding, Signature,
};
use handkey_engine::{
    EngineConfig, EngineError, FrameOutcome, GestureEngine, GestureMatcher, JsonDirStorage, KeyInjector,
    MatcherConfig, MemoryStorage, Mode, ProfileStorage, ProfileStore, RecorderConfig, RecorderProgress,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const DT_MS: u64 = 33;

#[derive(Default)]
struct Keys(Vec<String>);

impl KeyInjector for Keys {
    fn inject(&mut self, binding: &KeyBinding) -> anyhow::Result<()> {
        self.0.push(binding.to_string());
        Ok(())
    }
}

fn features(fingers: [f64; 5], palm_spread: f64, distances: [f64; 4]) -> FeatureVector {
    FeatureVector {
        fingers,
        rotation_deg: 270.0,
        palm_spread,
        distances,
    }
}

fn fist() -> FeatureVector {
    features([0.8, 0.7, 0.7, 0.7, 0.7], 0.3, [0.3, 0.3, 0.4, 0.4])
}

fn open_hand() -> FeatureVector {
    features([1.8, 1.3, 1.3, 1.3, 1.3], 0.6, [0.9, 1.1, 1.3, 0.8])
}

fn half_open() -> FeatureVector {
    features([1.3, 1.0, 1.0, 1.0, 1.0], 0.45, [0.6, 0.7, 0.85, 0.6])
}

fn tolerance(finger: f64) -> FeatureVector {
    FeatureVector {
        fingers: [finger; 5],
        rotation_deg: 30.0,
        palm_spread: 0.1,
        distances: [0.2; 4],
    }
}

fn right(fv: FeatureVector) -> FrameFeatures {
    FrameFeatures::single(Handedness::Right, fv)
}

fn test_config() -> EngineConfig {
    EngineConfig {
        recorder: RecorderConfig {
            countdown_ticks: 1,
            tick_ms: 100,
            capture_ms: 3000,
            min_samples: 10,
            ..Default::default()
        },
        matcher: MatcherConfig {
            debounce_frames: 3,
            cooldown_ms: 1000,
            ..Default::default()
        },
        ..Default::default()
    }
}

fn racing_engine() -> GestureEngine<MemoryStorage, Keys> {
    let mut engine = GestureEngine::new(test_config(), MemoryStorage::new(), Keys::default());
    engine.create_profile("Racing", "arcade racer").unwrap();
    let accelerate = Signature::single(Handedness::Right, fist(), tolerance(0.3));
    let brake = Signature::single(Handedness::Right, open_hand(), tolerance(0.2));
    engine
        .add_gesture("Racing", GestureSignature::new("accelerate", "w", accelerate))
        .unwrap();
    engine
        .add_gesture("Racing", GestureSignature::new("brake", "s", brake))
        .unwrap();
    engine.set_active_profile("Racing").unwrap();
    engine.start_matching().unwrap();
    engine
}

fn feed<S: ProfileStorage, K: KeyInjector>(engine: &mut GestureEngine<S, K>, frame: &FrameFeatures, frames: usize) {
    for _ in 0..frames {
        engine.process_features(frame, DT_MS).unwrap();
    }
}

/// Drive a recording to completion, returning what was committed.
fn record<S: ProfileStorage, K: KeyInjector>(
    engine: &mut GestureEngine<S, K>,
    profile: &str,
    gesture: &str,
    key: &str,
    mut next_frame: impl FnMut() -> FrameFeatures,
) -> Result<GestureSignature, EngineError> {
    engine.start_recording(profile, gesture, key, HandType::Single)?;
    for _ in 0..200 {
        if let FrameOutcome::Committed { .. } = engine.process_features(&next_frame(), 100)? {
            let stored = engine.store().get(profile).and_then(|p| p.gesture(gesture)).cloned();
            return Ok(stored.expect("committed gesture is stored"));
        }
    }
    panic!("recording never finished");
}

#[test]
fn test_racing_scenario() {
    let mut engine = racing_engine();

    feed(&mut engine, &right(fist()), 10);
    assert_eq!(engine.injector().0, vec!["w"]);

    feed(&mut engine, &right(open_hand()), 10);
    assert_eq!(engine.injector().0, vec!["w", "s"]);

    feed(&mut engine, &right(half_open()), 30);
    assert_eq!(engine.injector().0, vec!["w", "s"]);
}

#[test]
fn test_short_holds_never_fire() {
    let mut engine = racing_engine();
    for _ in 0..10 {
        feed(&mut engine, &right(fist()), 2);
        feed(&mut engine, &FrameFeatures::none(), 1);
    }
    assert!(engine.injector().0.is_empty());
}

#[test]
fn test_steady_hold_fires_once() {
    let mut engine = racing_engine();
    feed(&mut engine, &right(fist()), 100);
    assert_eq!(engine.injector().0.len(), 1);
}

#[test]
fn test_refire_waits_for_cooldown() {
    let mut engine = racing_engine();
    feed(&mut engine, &right(fist()), 10);
    assert_eq!(engine.injector().0.len(), 1);

    // released and re-held well inside the 1000 ms cooldown
    feed(&mut engine, &FrameFeatures::none(), 1);
    feed(&mut engine, &right(fist()), 5);
    assert_eq!(engine.injector().0.len(), 1);

    feed(&mut engine, &FrameFeatures::none(), 40);
    feed(&mut engine, &right(fist()), 5);
    assert_eq!(engine.injector().0.len(), 2);
}

#[test]
fn test_evaluation_is_idempotent() {
    let matcher = GestureMatcher::new(MatcherConfig::default());
    let gestures = vec![
        GestureSignature::new("accelerate", "w", Signature::single(Handedness::Right, fist(), tolerance(0.3))),
        GestureSignature::new("brake", "s", Signature::single(Handedness::Right, open_hand(), tolerance(0.2))),
    ];
    let mut live = fist();
    live.fingers[0] = 0.9;
    let frame = right(live);

    let first = matcher.evaluate(&frame, &gestures).unwrap();
    for _ in 0..10 {
        assert_eq!(matcher.evaluate(&frame, &gestures).unwrap(), first);
    }
    assert_eq!(first.gesture, "accelerate");
}

#[test]
fn test_both_hand_signature_needs_both_hands() {
    let matcher = GestureMatcher::new(MatcherConfig::default());
    let mut rng = StdRng::seed_from_u64(11);

    for _ in 0..200 {
        let mut values = [0.0; FIELD_COUNT];
        for v in values.iter_mut() {
            *v = rng.gen_range(0.0..2.0);
        }
        values[5] = rng.gen_range(0.0..360.0);
        let pose = FeatureVector::from_array(values);
        let wide = FeatureVector::from_array([100.0; FIELD_COUNT]);
        let sig = Signature::both(
            HandTemplate::new(Handedness::Left, pose, wide),
            HandTemplate::new(Handedness::Right, pose, wide),
        )
        .unwrap();
        let gestures = vec![GestureSignature::new("clap", "c", sig)];

        for side in [Handedness::Left, Handedness::Right] {
            let frame = FrameFeatures::single(side, pose);
            assert!(matcher.evaluate(&frame, &gestures).is_none());
        }
        assert!(matcher.evaluate(&FrameFeatures::both(pose, pose), &gestures).is_some());
    }
}

#[test]
fn test_steady_recording_matches_input() {
    let mut engine = GestureEngine::new(test_config(), MemoryStorage::new(), Keys::default());
    engine.create_profile("P", "").unwrap();
    let pose = half_open();

    let gesture = record(&mut engine, "P", "wave", "space", || right(pose)).unwrap();
    assert_eq!(gesture.recorded_samples, 30);
    assert!(gesture.active);
    match gesture.signature {
        Signature::Single(hand) => {
            assert_eq!(hand.side, Handedness::Right);
            let diff = hand.mean.abs_diff(&pose);
            assert!(diff.iter().all(|d| *d < 1e-12));
            assert_eq!(hand.tolerance, engine.config().recorder.tolerance_bounds.floor());
        }
        other => panic!("expected a single-hand signature, got {:?}", other),
    }
}

#[test]
fn test_jitter_widens_tolerance() {
    let mut engine = GestureEngine::new(test_config(), MemoryStorage::new(), Keys::default());
    engine.create_profile("P", "").unwrap();
    let base = half_open();

    let tight = record(&mut engine, "P", "tight", "t", || right(base)).unwrap();

    let mut rng = StdRng::seed_from_u64(42);
    let jittered = record(&mut engine, "P", "loose", "l", || {
        let mut fv = base;
        for f in fv.fingers.iter_mut() {
            *f += rng.gen_range(-0.25..0.25);
        }
        fv.palm_spread += rng.gen_range(-0.25..0.25);
        for d in fv.distances.iter_mut() {
            *d += rng.gen_range(-0.25..0.25);
        }
        right(fv)
    })
    .unwrap();

    let tol = |g: &GestureSignature| match g.signature {
        Signature::Single(hand) => hand.tolerance,
        _ => unreachable!(),
    };
    for i in 0..5 {
        assert!(tol(&jittered).fingers[i] > tol(&tight).fingers[i]);
    }

    let mut noisy = base;
    for f in noisy.fingers.iter_mut() {
        *f += 0.15;
    }
    let matcher = GestureMatcher::new(MatcherConfig::default());
    let frame = right(noisy);
    assert!(matcher.evaluate(&frame, std::slice::from_ref(&tight)).is_none());
    assert_eq!(
        matcher.evaluate(&frame, std::slice::from_ref(&jittered)).map(|c| c.gesture),
        Some("loose".to_string())
    );
}

#[test]
fn test_rerecording_replaces_in_place() {
    let mut engine = GestureEngine::new(test_config(), MemoryStorage::new(), Keys::default());
    engine.create_profile("P", "").unwrap();
    record(&mut engine, "P", "a", "a", || right(fist())).unwrap();
    record(&mut engine, "P", "b", "b", || right(fist())).unwrap();
    let again = record(&mut engine, "P", "a", "x", || right(open_hand())).unwrap();

    let profile = engine.store().get("P").unwrap();
    let names: Vec<&str> = profile.gestures().iter().map(|g| g.name.as_str()).collect();
    assert_eq!(names, vec!["a", "b"]);
    assert_eq!(again.key_binding, "x");
    // the newest recording wins ties
    assert!(again.activated_seq > profile.gesture("b").unwrap().activated_seq);
}

#[test]
fn test_too_few_samples_commits_nothing() {
    let mut engine = GestureEngine::new(test_config(), MemoryStorage::new(), Keys::default());
    engine.create_profile("P", "").unwrap();
    let mut n = 0;
    // one usable frame in five, the gaps stay inside the grace period
    let err = record(&mut engine, "P", "sparse", "q", || {
        n += 1;
        if n % 5 == 0 { right(fist()) } else { FrameFeatures::none() }
    })
    .unwrap_err();
    assert!(matches!(
        err,
        EngineError::InsufficientSamples { captured: 6, required: 10 }
    ));
    assert!(engine.store().get("P").unwrap().gestures().is_empty());
    assert_eq!(engine.mode(), Mode::Idle);
}

#[test]
fn test_long_absence_aborts_recording() {
    let mut engine = GestureEngine::new(test_config(), MemoryStorage::new(), Keys::default());
    engine.create_profile("P", "").unwrap();
    let err = record(&mut engine, "P", "gone", "q", FrameFeatures::none).unwrap_err();
    assert!(matches!(err, EngineError::NoHandDetected { absent_ms: 600 }));
    assert_eq!(engine.mode(), Mode::Idle);
}

#[test]
fn test_cancel_from_another_thread() {
    let mut engine = GestureEngine::new(test_config(), MemoryStorage::new(), Keys::default());
    engine.create_profile("P", "").unwrap();
    engine.start_recording("P", "g", "g", HandType::Single).unwrap();
    feed(&mut engine, &right(fist()), 5);

    let handle = engine.cancel_handle();
    std::thread::spawn(move || handle.cancel()).join().unwrap();

    let outcome = engine.process_features(&right(fist()), DT_MS).unwrap();
    assert_eq!(outcome, FrameOutcome::Recording(RecorderProgress::Cancelled));
    assert_eq!(engine.mode(), Mode::Idle);
    assert!(engine.store().get("P").unwrap().gestures().is_empty());
}

#[test]
fn test_readers_see_whole_snapshots() {
    let mut engine = racing_engine();
    let handle = engine.watch_active();

    std::thread::scope(|scope| {
        let reader = scope.spawn(|| {
            for _ in 0..2000 {
                let snapshot = handle.snapshot().expect("profile stays active");
                let n = snapshot.gestures.len();
                assert!(n == 1 || n == 2, "saw {} gestures", n);
            }
        });
        for i in 0..200 {
            engine.toggle_gesture_active("Racing", "brake", i % 2 == 0).unwrap();
        }
        reader.join().unwrap();
    });
}

#[test]
fn test_profiles_survive_restart() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config();
    config.storage.profiles_dir = dir.path().join("profiles");

    let saved = {
        let (mut engine, report) = GestureEngine::open(config.clone(), Keys::default()).unwrap();
        assert!(report.loaded.is_empty());
        engine.create_profile("Racing Game", "").unwrap();
        record(&mut engine, "Racing Game", "accelerate", "up", || right(fist())).unwrap();
        engine.store().get("Racing Game").cloned().unwrap()
    };

    let (engine, report) = GestureEngine::open(config, Keys::default()).unwrap();
    assert_eq!(report.loaded, vec!["Racing Game".to_string()]);
    assert_eq!(engine.store().get("Racing Game"), Some(&saved));
}

#[test]
fn test_delete_removes_from_disk_and_clears_active() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = ProfileStore::new(JsonDirStorage::new(dir.path()));
    store.create("Keep", "").unwrap();
    store.create("Gone", "").unwrap();
    store.set_active("Gone").unwrap();
    assert!(dir.path().join("gone.json").exists());

    store.delete("Gone").unwrap();
    assert!(store.active_name().is_none());
    assert!(store.active_snapshot().is_none());
    assert!(!dir.path().join("gone.json").exists());

    let mut reloaded = ProfileStore::new(JsonDirStorage::new(dir.path()));
    let report = reloaded.load_all().unwrap();
    assert_eq!(report.loaded, vec!["Keep".to_string()]);
}

#[test]
fn test_corrupt_file_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let storage = JsonDirStorage::new(dir.path());
    storage.write("broken", "{\"name\": \"Broken\", \"gestures\": [{}]}").unwrap();
    storage.write("truncated", "{\"name\": \"Tru").unwrap();

    let mut store = ProfileStore::new(storage);
    store.create("Fine", "").unwrap();
    let report = store.load_all().unwrap();
    assert_eq!(report.loaded, vec!["Fine".to_string()]);
    assert_eq!(report.skipped.len(), 2);
    assert!(report.skipped.iter().any(|(key, _)| key == "broken"));
}
