//! Configuration module

pub mod loader;
pub mod presets;

pub use loader::{Config, CONFIG_FILENAME};
pub use presets::Preset;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Rule configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RuleConfig {
    /// Whether the rule is registered at all
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Severity override (critical, warning, neutral)
    pub severity: Option<String>,
}

fn default_true() -> bool {
    true
}

/// Naming rules configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamingConfig {
    /// Node types checked against the naming convention
    #[serde(default = "default_naming_types")]
    pub node_types: Vec<String>,

    /// Name prefixes treated as default names, on top of the built-in list
    #[serde(default)]
    pub extra_default_names: Vec<String>,
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            node_types: default_naming_types(),
            extra_default_names: Vec::new(),
        }
    }
}

fn default_naming_types() -> Vec<String> {
    vec!["transform".to_string(), "joint".to_string()]
}

/// Texture rules configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TexturesConfig {
    /// Directory relative texture paths are resolved against.
    /// Falls back to the scene file's directory.
    pub root: Option<PathBuf>,
}
