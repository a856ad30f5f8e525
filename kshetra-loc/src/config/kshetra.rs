//! Main KshetraConfig.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::error::ConfigLoadError;
use crate::corridor::CorridorConfig;
use crate::global::GlobalConfig;
use crate::intersect::IntersectConfig;
use crate::modes::LocalizerConfig;
use crate::preprocess::PreprocessConfig;
use crate::tracking::{AreaTrackerConfig, TrackingConfig};

/// Default config location, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "configs/kshetra.yaml";

/// Full localization configuration loaded from YAML.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct KshetraConfig {
    /// Scan preprocessing.
    #[serde(default)]
    pub preprocess: PreprocessConfig,

    /// Ray casting against the map.
    #[serde(default)]
    pub intersect: IntersectConfig,

    /// Corridor weighting.
    #[serde(default)]
    pub corridor: CorridorConfig,

    /// Global search.
    #[serde(default)]
    pub global: GlobalConfig,

    /// Pose refinement.
    #[serde(default)]
    pub tracking: TrackingConfig,

    /// Area bookkeeping.
    #[serde(default)]
    pub area: AreaTrackerConfig,

    /// Pipeline driver.
    #[serde(default)]
    pub localizer: LocalizerConfig,
}

impl KshetraConfig {
    /// Load and validate a YAML file.
    pub fn load(path: &Path) -> Result<Self, ConfigLoadError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Load from [`DEFAULT_CONFIG_PATH`], or built-in defaults when absent.
    pub fn load_default() -> Result<Self, ConfigLoadError> {
        let path = Path::new(DEFAULT_CONFIG_PATH);
        if path.exists() {
            Self::load(path)
        } else {
            log::debug!("{} not found, using built-in defaults", DEFAULT_CONFIG_PATH);
            Ok(Self::default())
        }
    }

    /// Parse and validate a YAML string. Missing fields take their defaults.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigLoadError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every section.
    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        self.preprocess
            .validate()
            .and_then(|_| self.corridor.validate())
            .and_then(|_| self.global.validate())
            .and_then(|_| self.tracking.validate())
            .and_then(|_| self.localizer.validate())
            .and_then(|_| self.validate_intersect())
            .map_err(ConfigLoadError::Validation)
    }

    fn validate_intersect(&self) -> Result<(), String> {
        if self.intersect.max_range <= 0.0 {
            return Err("intersect.max_range".into());
        }
        if self.intersect.tie_epsilon < 0.0 {
            return Err("intersect.tie_epsilon".into());
        }
        Ok(())
    }
}
