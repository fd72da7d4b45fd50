//! Output formatting module for CLI

pub mod json;
mod terminal;

pub use json::JsonOutput;
pub use terminal::TerminalOutput;

use crate::error::QaError;
use crate::rules::results::AuditResults;

/// Trait for rendering audit reports
pub trait ReportRenderer {
    fn render_report(&self, results: &AuditResults) -> Result<String, QaError>;
}
