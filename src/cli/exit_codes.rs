//! Exit codes for the CLI
//!
//! Exit codes used by sceneqa so pipelines can gate on a scene's state.
//!
//! # Exit Code Reference
//!
//! | Code | Constant | Meaning | Example |
//! |------|----------|---------|---------|
//! | 0 | `SUCCESS` | Success | Scene is clean |
//! | 1 | `CRITICAL_ISSUES` | Critical issues | Clashing node names, empty meshes |
//! | 2 | `WARNINGS` | Warnings | Default node names |
//! | 3 | `ERROR` | Runtime error | Unreadable scene, a rule failed to evaluate |
//! | 4 | `INVALID_ARGS` | Invalid arguments | Unknown rule id, unknown collection for `init`/`list` |
//!
//! # Usage
//!
//! ```rust,ignore
//! use sceneqa::cli::exit_codes;
//!
//! std::process::exit(exit_codes::CRITICAL_ISSUES);
//! ```

/// Success - no issues found or operation completed successfully.
pub const SUCCESS: i32 = 0;

/// At least one rule holding errors has critical severity.
pub const CRITICAL_ISSUES: i32 = 1;

/// Only warning rules hold errors.
pub const WARNINGS: i32 = 2;

/// Runtime error.
///
/// Used when:
/// - Configuration or scene file unreadable or invalid
/// - A rule could not be evaluated
/// - The configuration file exists and `init` may not overwrite it
pub const ERROR: i32 = 3;

/// Invalid arguments (unknown collection, unknown rule id).
pub const INVALID_ARGS: i32 = 4;
