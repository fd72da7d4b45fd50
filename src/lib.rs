//! sceneqa Library
//!
//! A rule engine that audits a 3D scene graph and repairs what it can.
//!
//! - [`scene`] - The host scene abstraction and an in-memory scene
//! - [`rules`] - Rules, their registry, collections and the execution engine
//! - [`config`] - `.sceneqa.toml` loading and workflow presets
//! - [`cli`] - Command-line interface and report renderers

pub mod cli;
pub mod config;
pub mod error;
pub mod rules;
pub mod scene;
pub mod utils;

pub use error::QaError;
