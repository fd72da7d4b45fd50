//! Error types for SceneQA
//!
//! This module defines custom error types using `thiserror` for better error handling
//! and more descriptive error messages throughout the application.

use thiserror::Error;

/// Main error type for SceneQA
#[derive(Error, Debug)]
pub enum QaError {
    /// A find or fix was requested on a rule that does not implement it
    #[error("{rule} doesn't allow for error {capability}")]
    Capability {
        /// Display name of the rule
        rule: String,
        /// The missing capability
        capability: Capability,
    },

    /// Scene query or mutation errors
    #[error("Scene error: {0}")]
    Scene(#[from] SceneError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Rule id not present in the registry
    #[error("Unknown rule '{0}'")]
    UnknownRule(String),

    /// Report serialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Failed to write an output file
    #[error("Failed to write '{path}': {source}")]
    FileWrite {
        /// Destination path
        path: String,
        /// The underlying I/O error
        source: std::io::Error,
    },
}

/// Capabilities a rule may or may not implement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Detection
    Find,
    /// Remediation
    Fix,
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Capability::Find => write!(f, "finding"),
            Capability::Fix => write!(f, "fixing"),
        }
    }
}

/// Errors raised by a scene adapter
#[derive(Error, Debug)]
pub enum SceneError {
    /// No node or plug matches the identifier
    #[error("'{0}' does not exist")]
    NotFound(String),

    /// A short name matches more than one node
    #[error("More than one object matches name: {0}")]
    Ambiguous(String),

    /// The node exists but has no such attribute
    #[error("No attribute '{attribute}' on '{node}'")]
    MissingAttribute {
        /// Node path
        node: String,
        /// Attribute name
        attribute: String,
    },

    /// Attribute value of an unexpected kind
    #[error("'{plug}' holds a {found} value, expected {expected}")]
    TypeMismatch {
        /// Plug that was read
        plug: String,
        /// Expected value kind
        expected: &'static str,
        /// Actual value kind
        found: &'static str,
    },

    /// A sibling already carries the requested name
    #[error("Name '{0}' already exists under the same parent")]
    NameClash(String),

    /// Name that cannot be used for a node
    #[error("'{0}' is not a valid node name")]
    InvalidName(String),

    /// Mutation refused on a locked node
    #[error("Cannot modify locked node '{0}'")]
    Locked(String),

    /// Mutation refused on referenced content
    #[error("Cannot modify referenced node '{0}'")]
    Referenced(String),

    /// Connection already exists or is invalid
    #[error("Cannot connect '{source_plug}' to '{destination}': {reason}")]
    Connection {
        /// Source plug
        source_plug: String,
        /// Destination plug
        destination: String,
        /// Why it failed
        reason: String,
    },

    /// Failed to read or write a scene document
    #[error("Failed to access scene file '{path}': {source}")]
    Io {
        /// Path to the scene file
        path: String,
        /// The underlying I/O error
        source: std::io::Error,
    },

    /// Failed to parse a scene document
    #[error("Failed to parse scene file '{path}': {message}")]
    Parse {
        /// Path to the scene file
        path: String,
        /// Parser message
        message: String,
    },
}

/// Errors raised while remediating a single subject
#[derive(Error, Debug)]
pub enum RemediationError {
    /// The underlying scene call failed
    #[error(transparent)]
    Scene(#[from] SceneError),

    /// The subject cannot be fixed automatically
    #[error("{0}")]
    Unfixable(String),
}

/// Errors that occur while loading or writing configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the configuration file
    #[error("Failed to read config file '{path}': {source}")]
    FileRead {
        /// Path to the configuration file
        path: String,
        /// The underlying I/O error
        source: std::io::Error,
    },

    /// Failed to parse the configuration file
    #[error("Invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// Failed to serialize the configuration
    #[error("Failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// A glob in the ignore list does not compile
    #[error("Invalid ignore pattern '{pattern}': {message}")]
    InvalidPattern {
        /// The offending pattern
        pattern: String,
        /// The globset message
        message: String,
    },

    /// Severity override that does not parse
    #[error("Invalid severity '{value}' for rule '{rule}'")]
    InvalidSeverity {
        /// Rule id
        rule: String,
        /// Raw value
        value: String,
    },
}

impl From<toml::de::Error> for QaError {
    fn from(err: toml::de::Error) -> Self {
        QaError::Config(ConfigError::Parse(err))
    }
}

impl From<toml::ser::Error> for QaError {
    fn from(err: toml::ser::Error) -> Self {
        QaError::Config(ConfigError::Serialize(err))
    }
}
