//! Engine configuration

use crate::matching::MatcherConfig;
use crate::recorder::RecorderConfig;
use anyhow::Context;
use handkey_core::landmarks::AdapterConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main engine configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub adapter: AdapterConfig,
    pub recorder: RecorderConfig,
    pub matcher: MatcherConfig,
    pub storage: StorageConfig,
}

/// Where profile records live
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub profiles_dir: PathBuf,
    pub extension: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            profiles_dir: "gesture_profiles".into(),
            extension: "json".to_string(),
        }
    }
}

impl EngineConfig {
    /// Load from a JSON file. Missing fields take their defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {:?}", path))?;
        serde_json::from_str(&text).with_context(|| format!("Invalid config: {:?}", path))
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, json).with_context(|| format!("Failed to write config: {:?}", path))
    }

    /// Quick fires for fast-paced games.
    pub fn responsive() -> Self {
        Self {
            matcher: MatcherConfig::responsive(),
            ..Default::default()
        }
    }

    /// Longer holds and tighter matching.
    pub fn strict() -> Self {
        Self {
            matcher: MatcherConfig::strict(),
            ..Default::default()
        }
    }

    /// Short countdown and capture, for scripted runs.
    pub fn quick_record() -> Self {
        Self {
            recorder: RecorderConfig {
                countdown_ticks: 1,
                tick_ms: 500,
                capture_ms: 1500,
                min_samples: 5,
                ..Default::default()
            },
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: EngineConfig = serde_json::from_str(r#"{"matcher": {"debounce_frames": 2}}"#).unwrap();
        assert_eq!(config.matcher.debounce_frames, 2);
        assert_eq!(config.matcher.cooldown_ms, 1000);
        assert_eq!(config.recorder, RecorderConfig::default());
        assert_eq!(config.storage.extension, "json");
    }

    #[test]
    fn test_save_and_load() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("engine.json");
        let config = EngineConfig::strict();
        config.save(&path)?;
        assert_eq!(EngineConfig::load(&path)?, config);
        Ok(())
    }

    #[test]
    fn test_missing_file_has_context() {
        let err = EngineConfig::load("/nonexistent/handkey.json").unwrap_err();
        assert!(err.to_string().contains("Failed to read config"));
    }
}
