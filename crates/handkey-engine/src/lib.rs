//! Handkey Engine
//!
//! Records gestures by demonstration and matches live hand features against
//! the active profile, firing key bindings through an injection collaborator.

pub mod candidate;
pub mod engine;
pub mod error;
pub mod matching;
pub mod recorder;
pub mod store;
pub mod utils;

// Re-export commonly used types
pub use candidate::{CandidateSet, MatchCandidate};
pub use engine::{EngineConfig, FrameOutcome, GestureEngine, Mode, StorageConfig};
pub use error::{EngineError, Result};
pub use matching::{GestureFire, GestureMatcher, MatchOutcome, MatcherConfig, SidePolicy};
pub use recorder::{CancelHandle, RecordRequest, Recorder, RecorderConfig, RecorderProgress, RecordingStatus};
pub use store::{ActiveHandle, ActiveProfile, JsonDirStorage, LoadReport, MemoryStorage, ProfileStore};
pub use traits::{KeyInjector, ProfileStorage};

/// Seams to the collaborators outside the engine
pub mod traits {
    use handkey_core::KeyBinding;
    use std::io;

    /// Issues the OS-level key event for a fired gesture.
    pub trait KeyInjector {
        fn inject(&mut self, binding: &KeyBinding) -> anyhow::Result<()>;
    }

    impl<F> KeyInjector for F
    where
        F: FnMut(&KeyBinding) -> anyhow::Result<()>,
    {
        fn inject(&mut self, binding: &KeyBinding) -> anyhow::Result<()> {
            self(binding)
        }
    }

    /// Flat keyed record storage. Keys are storage-safe profile slugs.
    pub trait ProfileStorage: Send + Sync {
        fn keys(&self) -> io::Result<Vec<String>>;
        fn read(&self, key: &str) -> io::Result<String>;
        /// Replace the record atomically.
        fn write(&self, key: &str, contents: &str) -> io::Result<()>;
        /// Removing a missing record is not an error.
        fn remove(&self, key: &str) -> io::Result<()>;
    }
}
