//! Collections command - Show the workflow collections

use anyhow::Result;
use colored::Colorize;
use serde::Serialize;
use std::path::Path;

use super::{load_config, CollectionsArgs, OutputFormat};
use crate::cli::exit_codes;
use crate::rules::index::{CategoryIndex, CollectionIndex};
use crate::rules::registry::RuleRegistry;

#[derive(Debug, Serialize)]
struct CollectionEntry<'a> {
    name: &'a str,
    default: bool,
    categories: Vec<CategoryEntry<'a>>,
}

#[derive(Debug, Serialize)]
struct CategoryEntry<'a> {
    name: &'a str,
    rules: usize,
}

pub async fn execute(args: CollectionsArgs, config_path: Option<&Path>) -> Result<i32> {
    let config = load_config(config_path)?;
    let registry = RuleRegistry::from_config(&config)?;
    let categories = CategoryIndex::categorize(&registry);
    let collections = CollectionIndex::from_config(&config);
    let default = collections
        .get(&config.collection)
        .map(|c| c.name.as_str());

    let entries: Vec<CollectionEntry> = collections
        .iter()
        .map(|collection| CollectionEntry {
            name: &collection.name,
            default: Some(collection.name.as_str()) == default,
            categories: collection
                .categories
                .iter()
                .map(|name| CategoryEntry {
                    name,
                    rules: categories.get(name).map_or(0, <[_]>::len),
                })
                .collect(),
        })
        .collect();

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&entries)?),
        OutputFormat::Terminal => {
            for entry in &entries {
                let marker = if entry.default {
                    " (default)".green().to_string()
                } else {
                    String::new()
                };
                println!("{}{}", entry.name.bold(), marker);
                for category in &entry.categories {
                    let line = format!("  {:<16} {} rule(s)", category.name, category.rules);
                    if category.rules == 0 {
                        println!("{}", line.dimmed());
                    } else {
                        println!("{}", line);
                    }
                }
            }
        }
    }

    Ok(exit_codes::SUCCESS)
}
