//! Explain command - Describe one rule

use anyhow::Result;
use colored::Colorize;
use std::path::Path;

use super::{load_config, ExplainArgs};
use crate::cli::exit_codes;
use crate::error::QaError;
use crate::rules::registry::RuleRegistry;

pub async fn execute(args: ExplainArgs, config_path: Option<&Path>) -> Result<i32> {
    let config = load_config(config_path)?;
    let registry = RuleRegistry::from_config(&config)?;

    let check = match registry.find_by_id(&args.rule) {
        Ok(check) => check,
        Err(QaError::UnknownRule(id)) => {
            eprintln!(
                "{} Unknown rule '{}'. Run '{}' to see every rule.",
                "Error:".red().bold(),
                id,
                "sceneqa list".cyan()
            );
            return Ok(exit_codes::INVALID_ARGS);
        }
        Err(e) => return Err(e.into()),
    };

    let yes_no = |flag: bool| if flag { "yes".green() } else { "no".dimmed() };

    println!("{} {}", check.name().bold(), format!("[{}]", check.id()).cyan());
    println!();
    println!("{:<12} {}", "Categories:".dimmed(), check.categories().join(", "));
    println!("{:<12} {}", "Severity:".dimmed(), check.severity().name());
    println!("{:<12} {}", "Fixable:".dimmed(), yes_no(check.is_fixable()));
    println!("{:<12} {}", "Selectable:".dimmed(), yes_no(check.is_selectable()));
    if !check.documentation().is_empty() {
        println!();
        println!("{}", check.documentation());
    }

    Ok(exit_codes::SUCCESS)
}
