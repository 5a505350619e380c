//! Utility modules

pub mod stats;

pub use stats::{FieldStats, summarize};
