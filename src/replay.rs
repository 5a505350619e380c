//! Drives the engine from recorded landmark traces

use anyhow::{bail, Context, Result};
use handkey_core::landmarks::Trace;
use handkey_core::{HandType, KeyBinding};
use handkey_engine::{FrameOutcome, GestureEngine, GestureFire, KeyInjector, ProfileStorage, RecorderProgress};
use tracing::{debug, info};

/// Stands in for the OS key injector: prints every binding it is handed.
#[derive(Debug, Default)]
pub struct LogInjector {
    pub sent: Vec<String>,
}

impl KeyInjector for LogInjector {
    fn inject(&mut self, binding: &KeyBinding) -> anyhow::Result<()> {
        info!("Key press: {}", binding);
        println!("{}", binding);
        self.sent.push(binding.to_string());
        Ok(())
    }
}

/// Record one gesture from a trace. Fails when the trace ends before the
/// capture window closes.
pub fn record_from_trace<S: ProfileStorage, K: KeyInjector>(
    engine: &mut GestureEngine<S, K>,
    trace: &Trace,
    profile: &str,
    gesture: &str,
    key_binding: &str,
    hand_type: HandType,
) -> Result<bool> {
    engine
        .start_recording(profile, gesture, key_binding, hand_type)
        .with_context(|| format!("Cannot record '{}' into '{}'", gesture, profile))?;

    for (i, frame) in trace.frames.iter().enumerate() {
        let outcome = engine
            .process_frame(&frame.hands, frame.dt_ms)
            .with_context(|| format!("Recording failed at frame {}", i + 1))?;
        match outcome {
            FrameOutcome::Recording(RecorderProgress::Countdown { remaining }) => {
                println!("{}...", remaining)
            }
            FrameOutcome::Recording(RecorderProgress::CaptureStarted) => println!("Hold the gesture"),
            FrameOutcome::Committed { replaced, .. } => return Ok(replaced),
            other => debug!("Frame {}: {:?}", i + 1, other),
        }
    }

    engine.cancel_recording();
    bail!(
        "Trace ended after {} ms before the recording finished",
        trace.duration_ms()
    )
}

/// Replay a trace against the profile's gestures and collect the fires.
pub fn run_trace<S: ProfileStorage, K: KeyInjector>(
    engine: &mut GestureEngine<S, K>,
    trace: &Trace,
    profile: &str,
) -> Result<Vec<GestureFire>> {
    engine.set_active_profile(profile)?;
    engine.start_matching()?;

    let mut fires = Vec::new();
    for frame in &trace.frames {
        if let FrameOutcome::Matching(outcome) = engine.process_frame(&frame.hands, frame.dt_ms)? {
            fires.extend(outcome.fired);
        }
    }
    engine.stop_matching();
    Ok(fires)
}
