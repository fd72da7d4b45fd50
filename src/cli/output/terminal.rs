//! Terminal output formatting with colors

use colored::Colorize;

use super::ReportRenderer;
use crate::error::QaError;
use crate::rules::check::CheckStatus;
use crate::rules::results::{AuditResults, RuleReport, Severity};

/// Subjects printed per rule before the list is cut short
const MAX_SUBJECTS: usize = 10;

pub struct TerminalOutput;

impl TerminalOutput {
    pub fn new() -> Self {
        Self
    }

    fn format_header(&self, results: &AuditResults) -> String {
        let scope = if results.selection_only {
            "selection"
        } else {
            "scene"
        };
        format!(
            r#"
{} v{}

{} {}
{} {} ({})
"#,
            "sceneqa".cyan().bold(),
            env!("CARGO_PKG_VERSION"),
            "Scene:".dimmed(),
            results.scene.white().bold(),
            "Collection:".dimmed(),
            results.collection.yellow(),
            scope
        )
    }

    fn format_categories(&self, results: &AuditResults) -> String {
        let mut output = String::new();

        output.push_str(&format!(
            "\n{}\n{}\n",
            "━".repeat(50).dimmed(),
            "  AUDIT RESULTS".bold()
        ));

        for category in results.categories() {
            output.push_str(&format!("\n{}\n", category.name.bold()));
            for id in &category.rules {
                if let Some(rule) = results.rule(id) {
                    output.push_str(&self.format_rule(rule));
                }
            }
        }

        output
    }

    fn format_rule(&self, rule: &RuleReport) -> String {
        let marker = match rule.status {
            CheckStatus::Unevaluated => "-".dimmed(),
            CheckStatus::Clean => "✓".green(),
            CheckStatus::Failing(Severity::Critical) => "✗".red().bold(),
            CheckStatus::Failing(_) => "!".yellow().bold(),
        };

        let mut output = match rule.status {
            CheckStatus::Failing(_) => format!(
                "  {} {} [{}] {}\n",
                marker,
                rule.name,
                rule.id.cyan(),
                rule.message
            ),
            _ => format!("  {} {}\n", marker, rule.name.dimmed()),
        };

        for subject in rule.subjects.iter().take(MAX_SUBJECTS) {
            output.push_str(&format!("      {} {}\n", "└─".dimmed(), subject.to_string().dimmed()));
        }
        if rule.subjects.len() > MAX_SUBJECTS {
            output.push_str(&format!(
                "      {} ... and {} more\n",
                "└─".dimmed(),
                rule.subjects.len() - MAX_SUBJECTS
            ));
        }

        output
    }

    fn format_summary(&self, results: &AuditResults) -> String {
        let mut output = String::new();

        output.push_str(&format!(
            "\n{}\n{}\n\n",
            "━".repeat(50).dimmed(),
            "  SUMMARY".bold()
        ));

        let critical_count = results.count_by_state(Severity::Critical);
        let warning_count = results.count_by_state(Severity::Warning);
        let fixable = results.failing().filter(|r| r.fixable).count();

        output.push_str(&format!(
            "Critical: {} │ Warnings: {} │ Subjects: {}\n",
            critical_count.to_string().red().bold(),
            warning_count.to_string().yellow().bold(),
            results.total_subjects().to_string().bold()
        ));

        if results.is_clean() {
            output.push_str(&format!("\n{}\n", "Scene is clean.".green()));
        } else if fixable > 0 {
            output.push_str(&format!(
                "\n{} rule(s) can be fixed automatically. Run '{}'.\n",
                fixable,
                "sceneqa fix".cyan()
            ));
        }

        output
    }
}

impl Default for TerminalOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportRenderer for TerminalOutput {
    fn render_report(&self, results: &AuditResults) -> Result<String, QaError> {
        let mut output = String::new();

        output.push_str(&self.format_header(results));
        output.push_str(&self.format_categories(results));
        output.push_str(&self.format_summary(results));

        Ok(output)
    }
}
