//! List command - Show the registered rules

use anyhow::Result;
use colored::Colorize;
use serde::Serialize;
use std::path::Path;

use super::{load_config, ListArgs, OutputFormat};
use crate::cli::exit_codes;
use crate::rules::check::Check;
use crate::rules::index::{CategoryIndex, CollectionIndex};
use crate::rules::registry::RuleRegistry;
use crate::rules::results::Severity;

#[derive(Debug, Serialize)]
struct RuleEntry<'a> {
    ordinal: usize,
    id: &'a str,
    name: &'a str,
    categories: &'a [String],
    severity: Severity,
    findable: bool,
    fixable: bool,
    selectable: bool,
}

impl<'a> From<&'a Check> for RuleEntry<'a> {
    fn from(check: &'a Check) -> Self {
        Self {
            ordinal: check.ordinal().index(),
            id: check.id(),
            name: check.name(),
            categories: check.categories(),
            severity: check.severity(),
            findable: check.is_findable(),
            fixable: check.is_fixable(),
            selectable: check.is_selectable(),
        }
    }
}

pub async fn execute(args: ListArgs, config_path: Option<&Path>) -> Result<i32> {
    let config = load_config(config_path)?;
    let registry = RuleRegistry::from_config(&config)?;

    let checks: Vec<&Check> = match &args.collection {
        Some(name) => {
            let collections = CollectionIndex::from_config(&config);
            if collections.get(name).is_none() {
                eprintln!(
                    "{} Unknown collection '{}'. Available: {}",
                    "Error:".red().bold(),
                    name,
                    collections.names().collect::<Vec<_>>().join(", ")
                );
                return Ok(exit_codes::INVALID_ARGS);
            }
            let categories = CategoryIndex::categorize(&registry);
            collections
                .resolve(name, &categories)
                .rule_ids()
                .into_iter()
                .filter_map(|id| registry.get(id))
                .collect()
        }
        None => registry.iter().collect(),
    };

    match args.format {
        OutputFormat::Json => {
            let entries: Vec<RuleEntry> = checks.into_iter().map(RuleEntry::from).collect();
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
        OutputFormat::Terminal => {
            for check in &checks {
                println!("{}", format_check(check));
            }
            println!("\n{} rule(s)", checks.len());
        }
    }

    Ok(exit_codes::SUCCESS)
}

fn format_check(check: &Check) -> String {
    let mut capabilities = Vec::new();
    if check.is_fixable() {
        capabilities.push("fix");
    }
    if check.is_selectable() {
        capabilities.push("select");
    }

    let severity = match check.severity() {
        Severity::Critical => check.severity().name().red(),
        Severity::Warning => check.severity().name().yellow(),
        Severity::Neutral => check.severity().name().dimmed(),
    };

    format!(
        "{:>3}  {:<40} {:<8} {} {}",
        check.ordinal().index(),
        check.id().cyan(),
        severity,
        check.name(),
        format!("[{}] {}", check.categories().join(", "), capabilities.join(" ")).dimmed()
    )
}
