//! Utility modules for SceneQA

pub mod naming;
pub mod path;
pub mod timing;

pub use timing::{format_duration, Timer};
