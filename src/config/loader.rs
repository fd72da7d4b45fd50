//! Configuration loader

use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::error::{ConfigError, QaError};
use crate::rules::index::Collection;
use crate::rules::Severity;

use super::presets::Preset;
use super::{NamingConfig, RuleConfig, TexturesConfig};

pub const CONFIG_FILENAME: &str = ".sceneqa.toml";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Collection used when none is given on the command line
    #[serde(default = "default_collection")]
    pub collection: String,

    /// Node path globs whose subjects are never reported
    #[serde(default)]
    pub ignore: Vec<String>,

    /// Rule overrides keyed by rule id
    #[serde(default)]
    pub rules: HashMap<String, RuleConfig>,

    /// Collections replacing or adding to the built-in ones
    #[serde(default)]
    pub collections: Vec<Collection>,

    /// Naming rules configuration
    #[serde(default)]
    pub naming: NamingConfig,

    /// Texture rules configuration
    #[serde(default)]
    pub textures: TexturesConfig,
}

fn default_collection() -> String {
    Preset::Modelling.name().to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            collection: default_collection(),
            ignore: Vec::new(),
            rules: HashMap::new(),
            collections: Vec::new(),
            naming: NamingConfig::default(),
            textures: TexturesConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from the working directory or return default
    pub fn load_or_default() -> Result<Self, QaError> {
        let config_path = Path::new(CONFIG_FILENAME);

        if config_path.exists() {
            Self::load_from_file(config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &Path) -> Result<Self, QaError> {
        let content = fs::read_to_string(path).map_err(|e| {
            QaError::Config(ConfigError::FileRead {
                path: path.display().to_string(),
                source: e,
            })
        })?;

        toml::from_str(&content).map_err(Into::into)
    }

    /// Create a new configuration defaulting to a built-in collection
    pub fn from_preset(preset: Preset) -> Self {
        Self {
            collection: preset.name().to_string(),
            ..Default::default()
        }
    }

    /// Serialize configuration to TOML
    pub fn to_toml(&self) -> Result<String, QaError> {
        toml::to_string_pretty(self).map_err(Into::into)
    }

    /// Check if a rule is enabled
    pub fn is_rule_enabled(&self, rule_id: &str) -> bool {
        self.rules.get(rule_id).map(|r| r.enabled).unwrap_or(true)
    }

    /// Get the severity override for a rule
    pub fn rule_severity(&self, rule_id: &str) -> Result<Option<Severity>, ConfigError> {
        let Some(raw) = self.rules.get(rule_id).and_then(|r| r.severity.as_deref()) else {
            return Ok(None);
        };

        // Neutral is the state of a clean rule, not a severity
        match Severity::from_string(raw) {
            Some(Severity::Neutral) | None => Err(ConfigError::InvalidSeverity {
                rule: rule_id.to_string(),
                value: raw.to_string(),
            }),
            severity => Ok(severity),
        }
    }

    /// Compile the ignore globs. `None` when no pattern is configured.
    pub fn ignore_set(&self) -> Result<Option<GlobSet>, ConfigError> {
        if self.ignore.is_empty() {
            return Ok(None);
        }

        let mut builder = GlobSetBuilder::new();
        for pattern in &self.ignore {
            let glob = Glob::new(pattern).map_err(|e| ConfigError::InvalidPattern {
                pattern: pattern.clone(),
                message: e.to_string(),
            })?;
            builder.add(glob);
        }

        builder
            .build()
            .map(Some)
            .map_err(|e| ConfigError::InvalidPattern {
                pattern: self.ignore.join(", "),
                message: e.to_string(),
            })
    }
}
