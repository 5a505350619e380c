// tests/core_tests.rs
use handkey_core::features::{angle_diff_deg, FIELD_COUNT};
use handkey_core::landmarks::{index::*, Trace, LANDMARK_COUNT};
use handkey_core::{
    FeatureExtractor, FeatureVector, FrameAdapter, GestureSignature, HandMeasurement, HandTemplate, Handedness,
    KeyBinding, Landmark, Profile, RawHand, Signature, TemplateKind,
};

/// Upright hand layout in hand units: wrist at the origin, middle knuckle
/// one unit up (image y grows downward).
fn canonical(open: bool) -> [(f64, f64); LANDMARK_COUNT] {
    let mut p = [(0.0, 0.0); LANDMARK_COUNT];
    p[WRIST] = (0.0, 0.0);
    p[THUMB_CMC] = (-0.3, -0.2);
    p[THUMB_MCP] = (-0.5, -0.45);
    p[THUMB_IP] = (-0.65, -0.7);
    p[INDEX_MCP] = (-0.25, -1.0);
    p[INDEX_PIP] = (-0.28, -1.35);
    p[INDEX_DIP] = (-0.3, -1.6);
    p[MIDDLE_MCP] = (0.0, -1.0);
    p[MIDDLE_PIP] = (0.0, -1.4);
    p[MIDDLE_DIP] = (0.0, -1.65);
    p[RING_MCP] = (0.22, -0.95);
    p[RING_PIP] = (0.24, -1.3);
    p[RING_DIP] = (0.25, -1.55);
    p[PINKY_MCP] = (0.42, -0.85);
    p[PINKY_PIP] = (0.46, -1.1);
    p[PINKY_DIP] = (0.48, -1.3);

    if open {
        p[THUMB_TIP] = (-0.8, -0.9);
        p[INDEX_TIP] = (-0.32, -1.85);
        p[MIDDLE_TIP] = (0.0, -1.9);
        p[RING_TIP] = (0.26, -1.78);
        p[PINKY_TIP] = (0.5, -1.45);
    } else {
        p[THUMB_TIP] = (-0.3, -0.6);
        p[INDEX_TIP] = (-0.22, -1.05);
        p[MIDDLE_TIP] = (0.0, -1.05);
        p[RING_TIP] = (0.2, -1.0);
        p[PINKY_TIP] = (0.38, -0.9);
    }
    p
}

/// Place the canonical hand in the image: scaled, rotated by `angle_deg`
/// and moved to `origin`.
fn synthetic_hand(open: bool, origin: (f64, f64), scale: f64, angle_deg: f64, side: Handedness) -> HandMeasurement {
    let (sin, cos) = angle_deg.to_radians().sin_cos();
    let mut landmarks = [Landmark::default(); LANDMARK_COUNT];
    for (slot, (x, y)) in landmarks.iter_mut().zip(canonical(open)) {
        let rx = x * cos - y * sin;
        let ry = x * sin + y * cos;
        *slot = Landmark::new(origin.0 + scale * rx, origin.1 + scale * ry, 0.0);
    }
    HandMeasurement::new(landmarks, side, 0.95)
}

fn assert_close(a: &FeatureVector, b: &FeatureVector, eps: f64) {
    let diff = a.abs_diff(b);
    for (i, d) in diff.iter().enumerate() {
        assert!(*d < eps, "field {} differs by {}", i, d);
    }
}

#[test]
fn test_open_hand_extends_further_than_fist() {
    let extractor = FeatureExtractor::new();
    let open = extractor.extract(&synthetic_hand(true, (0.5, 0.8), 0.15, 0.0, Handedness::Right));
    let fist = extractor.extract(&synthetic_hand(false, (0.5, 0.8), 0.15, 0.0, Handedness::Right));

    for finger in 0..5 {
        assert!(
            open.fingers[finger] > fist.fingers[finger] + 0.2,
            "finger {}: open {} fist {}",
            finger,
            open.fingers[finger],
            fist.fingers[finger]
        );
    }
    assert!(open.palm_spread > fist.palm_spread);
    assert!(open.distances[2] > fist.distances[2]);
    assert!((open.rotation_deg - 270.0).abs() < 1e-9);
}

#[test]
fn test_features_ignore_position_and_scale() {
    let extractor = FeatureExtractor::new();
    let near = extractor.extract(&synthetic_hand(true, (0.5, 0.8), 0.25, 0.0, Handedness::Left));
    let far = extractor.extract(&synthetic_hand(true, (0.2, 0.4), 0.08, 0.0, Handedness::Left));
    assert_close(&near, &far, 1e-9);
}

#[test]
fn test_rotating_the_hand_only_moves_rotation() {
    let extractor = FeatureExtractor::new();
    let upright = extractor.extract(&synthetic_hand(false, (0.5, 0.5), 0.2, 0.0, Handedness::Right));

    for angle in [30.0, 90.0, 135.0, 200.0] {
        let turned = extractor.extract(&synthetic_hand(false, (0.5, 0.5), 0.2, angle, Handedness::Right));
        let expected = (270.0 + angle) % 360.0;
        assert!(
            angle_diff_deg(turned.rotation_deg, expected) < 1e-9,
            "angle {}: got {}",
            angle,
            turned.rotation_deg
        );
        assert!((0.0..360.0).contains(&turned.rotation_deg));

        let mut aligned = turned;
        aligned.rotation_deg = upright.rotation_deg;
        assert_close(&aligned, &upright, 1e-9);
    }
}

#[test]
fn test_adapter_feeds_extractor() {
    let hand = synthetic_hand(true, (0.5, 0.8), 0.15, 0.0, Handedness::Left);
    let raw = RawHand {
        label: "Left".to_string(),
        score: 0.9,
        landmarks: hand.landmarks.iter().map(|l| [l.x, l.y, l.z]).collect(),
    };
    let low = RawHand {
        label: "Right".to_string(),
        score: 0.2,
        ..raw.clone()
    };

    let frame = FrameAdapter::default().adapt(&[raw, low]);
    assert_eq!(frame.hand_count(), 1);

    let features = FeatureExtractor::new().extract_frame(&frame);
    assert!(features.right.is_none());
    assert_close(&features.left.unwrap(), &FeatureExtractor::new().extract(&hand), 1e-12);
}

#[test]
fn test_trace_line_parses() {
    let points: Vec<String> = (0..LANDMARK_COUNT).map(|i| format!("[0.{:02},0.5,0.0]", i)).collect();
    let line = format!(
        "{{\"dt_ms\":33,\"hands\":[{{\"label\":\"Right\",\"score\":0.97,\"landmarks\":[{}]}}]}}\n\n{{\"dt_ms\":34}}\n",
        points.join(",")
    );
    let trace = Trace::from_reader(line.as_bytes()).unwrap();
    assert_eq!(trace.frames.len(), 2);
    assert_eq!(trace.duration_ms(), 67);
    assert!(trace.frames[1].hands.is_empty());

    let frame = FrameAdapter::default().adapt(&trace.frames[0].hands);
    assert!(frame.get(Handedness::Right).is_some());
}

#[test]
fn test_every_template_binding_is_valid() {
    for kind in TemplateKind::ALL {
        let draft = kind.instantiate();
        assert_eq!(draft.description, kind.description());
        for placeholder in &draft.placeholders {
            let binding = KeyBinding::parse(&placeholder.key_binding).unwrap();
            assert!(!binding.has_modifiers());
        }
    }
}

#[test]
fn test_profile_roundtrip_with_both_hand_gesture() {
    let extractor = FeatureExtractor::new();
    let left = extractor.extract(&synthetic_hand(true, (0.3, 0.7), 0.12, -15.0, Handedness::Left));
    let right = extractor.extract(&synthetic_hand(false, (0.7, 0.7), 0.12, 20.0, Handedness::Right));
    let tolerance = FeatureVector::from_array([0.13; FIELD_COUNT]);

    let mut profile = TemplateKind::Racing.instantiate();
    let both = Signature::both(
        HandTemplate::new(Handedness::Left, left, tolerance),
        HandTemplate::new(Handedness::Right, right, tolerance),
    )
    .unwrap();
    profile.commit_recorded(GestureSignature::new("nitro", "space", both).with_samples(88));
    profile.commit_recorded(GestureSignature::new(
        "horn",
        "ctrl+h",
        Signature::single(Handedness::Right, right, tolerance),
    ));
    profile.set_gesture_active("horn", false).unwrap();

    let json = serde_json::to_string_pretty(&profile).unwrap();
    let back: Profile = serde_json::from_str(&json).unwrap();
    assert_eq!(back, profile);
    assert_eq!(back.placeholders.len(), 4);
    assert_eq!(back.active_gestures().count(), 1);
}
