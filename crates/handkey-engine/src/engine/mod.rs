//! Top-level engine: mode switching and the control surface

pub mod config;
pub mod controller;

pub use config::{EngineConfig, StorageConfig};
pub use controller::{FrameOutcome, GestureEngine, Mode};
