use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use facecam_core::overlay::domain::overlay_renderer::MaskPolicy;
use facecam_core::pipeline::pipeline_config::{PipelineConfig, RearmStrategy};
use facecam_core::shared::constants::{DEFAULT_IDLE_POLL_MS, PROCESSING_RESOLUTION_WIDTH};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RearmMode {
    Result,
    Tick,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum MaskMode {
    Off,
    Replace,
    Union,
}

impl From<MaskMode> for MaskPolicy {
    fn from(mode: MaskMode) -> Self {
        match mode {
            MaskMode::Off => MaskPolicy::Disabled,
            MaskMode::Replace => MaskPolicy::ReplacePerFace,
            MaskMode::Union => MaskPolicy::Union,
        }
    }
}

/// Persistent defaults; command-line flags override every field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub processing_width: u32,
    pub rearm: RearmMode,
    pub tick_ms: u64,
    pub timeout_ms: Option<u64>,
    pub mask: MaskMode,
    pub detector: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            processing_width: PROCESSING_RESOLUTION_WIDTH,
            rearm: RearmMode::Result,
            tick_ms: 16,
            timeout_ms: None,
            mask: MaskMode::Union,
            detector: Vec::new(),
        }
    }
}

impl Settings {
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("facecam").join("settings.json"))
    }

    /// Reads settings from `path`. A missing file yields the defaults; a
    /// malformed one is an error.
    pub fn load_from(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        match fs::read_to_string(path) {
            Ok(json) => serde_json::from_str(&json)
                .map_err(|e| format!("Invalid settings file {}: {e}", path.display()).into()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn validate(&self) -> Result<(), Box<dyn std::error::Error>> {
        if self.processing_width == 0 {
            return Err("Processing width must be positive".into());
        }
        if self.rearm == RearmMode::Tick && self.tick_ms == 0 {
            return Err("Tick interval must be positive".into());
        }
        if self.timeout_ms == Some(0) {
            return Err("Detector timeout must be positive".into());
        }
        if self.detector.is_empty() {
            return Err(
                "No detector command given; pass one after `--` or set \"detector\" in the settings file"
                    .into(),
            );
        }
        Ok(())
    }

    pub fn pipeline_config(&self, max_cycles: Option<u64>) -> PipelineConfig {
        PipelineConfig {
            processing_width: self.processing_width,
            rearm: match self.rearm {
                RearmMode::Result => RearmStrategy::OnResult,
                RearmMode::Tick => RearmStrategy::OnTick(Duration::from_millis(self.tick_ms)),
            },
            detector_timeout: self.timeout_ms.map(Duration::from_millis),
            mask_policy: self.mask.into(),
            idle_poll: Duration::from_millis(DEFAULT_IDLE_POLL_MS),
            max_cycles,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let settings = Settings::load_from(&dir.path().join("settings.json")).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"rearm":"tick","tick_ms":33,"mask":"replace"}"#).unwrap();

        let settings = Settings::load_from(&path).unwrap();
        assert_eq!(settings.rearm, RearmMode::Tick);
        assert_eq!(settings.tick_ms, 33);
        assert_eq!(settings.mask, MaskMode::Replace);
        assert_eq!(settings.processing_width, 240);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ not json").unwrap();
        let err = Settings::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("Invalid settings file"));
    }

    #[test]
    fn test_pipeline_config_from_settings() {
        let settings = Settings {
            rearm: RearmMode::Tick,
            tick_ms: 20,
            timeout_ms: Some(500),
            mask: MaskMode::Off,
            ..Settings::default()
        };
        let config = settings.pipeline_config(Some(7));
        assert_eq!(config.rearm, RearmStrategy::OnTick(Duration::from_millis(20)));
        assert_eq!(config.detector_timeout, Some(Duration::from_millis(500)));
        assert_eq!(config.mask_policy, MaskPolicy::Disabled);
        assert_eq!(config.max_cycles, Some(7));
    }

    #[test]
    fn test_validate_requires_detector() {
        assert!(Settings::default().validate().is_err());
        let settings = Settings {
            detector: vec!["detect".into()],
            ..Settings::default()
        };
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_width() {
        let settings = Settings {
            processing_width: 0,
            detector: vec!["detect".into()],
            ..Settings::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_config_path_is_under_facecam() {
        if let Some(path) = Settings::config_path() {
            assert!(path.ends_with("facecam/settings.json"));
        }
    }
}
