//! CLI commands module

pub mod audit;
pub mod collections;
pub mod explain;
pub mod fix;
pub mod init;
pub mod list;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use colored::Colorize;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::cli::output::{JsonOutput, ReportRenderer, TerminalOutput};
use crate::config::Config;
use crate::rules::index::{CategoryIndex, CollectionIndex, ResolvedView};
use crate::rules::registry::RuleRegistry;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Default collection (animation, modelling, rigging, look-dev)
    #[arg(long, value_name = "COLLECTION")]
    pub collection: Option<String>,

    /// Force overwrite existing configuration
    #[arg(short, long)]
    pub force: bool,

    /// Skip interactive prompts
    #[arg(long)]
    pub non_interactive: bool,
}

/// Arguments for the list command
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Only list the rules of this collection
    #[arg(long, value_name = "COLLECTION")]
    pub collection: Option<String>,

    /// Output format (terminal, json)
    #[arg(short, long, default_value = "terminal")]
    pub format: OutputFormat,
}

/// Arguments for the collections command
#[derive(Args, Debug)]
pub struct CollectionsArgs {
    /// Output format (terminal, json)
    #[arg(short, long, default_value = "terminal")]
    pub format: OutputFormat,
}

/// Arguments for the explain command
#[derive(Args, Debug)]
pub struct ExplainArgs {
    /// Rule id (e.g. scene/unique-names)
    #[arg(value_name = "RULE")]
    pub rule: String,
}

/// Arguments for the audit command
#[derive(Args, Debug)]
pub struct AuditArgs {
    /// Scene document (JSON or YAML)
    #[arg(value_name = "SCENE")]
    pub scene: PathBuf,

    #[command(flatten)]
    pub selection: SelectionArgs,

    /// Output format (terminal, json)
    #[arg(short, long, default_value = "terminal")]
    pub format: OutputFormat,

    /// Output file (defaults to stdout)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Store the subjects of this rule as the scene's selection and save it
    #[arg(long, value_name = "RULE")]
    pub select: Option<String>,
}

/// Arguments for the fix command
#[derive(Args, Debug)]
pub struct FixArgs {
    /// Scene document (JSON or YAML)
    #[arg(value_name = "SCENE")]
    pub scene: PathBuf,

    #[command(flatten)]
    pub selection: SelectionArgs,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,

    /// Show what would be fixed without touching the scene
    #[arg(long)]
    pub dry_run: bool,

    /// Write the fixed scene here instead of overwriting SCENE
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

/// Which rules a scene command evaluates
#[derive(Args, Debug, Default)]
pub struct SelectionArgs {
    /// Collection to run (defaults to the configured one)
    #[arg(long, value_name = "COLLECTION")]
    pub collection: Option<String>,

    /// Only consider the nodes selected in the scene
    #[arg(long)]
    pub selection_only: bool,

    /// Only run specific categories
    #[arg(long, value_delimiter = ',')]
    pub only: Option<Vec<String>>,

    /// Skip specific categories
    #[arg(long, value_delimiter = ',')]
    pub skip: Option<Vec<String>>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Terminal,
    Json,
}

impl OutputFormat {
    pub(crate) fn renderer(self) -> Box<dyn ReportRenderer> {
        match self {
            OutputFormat::Terminal => Box::new(TerminalOutput::new()),
            OutputFormat::Json => Box::new(JsonOutput::new()),
        }
    }
}

/// Load the configuration from `path`, or from the working directory
pub(crate) fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load_from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display())),
        None => Config::load_or_default().context("Failed to load configuration"),
    }
}

/// Registry and resolved view a scene command runs on
pub(crate) struct Session {
    pub config: Config,
    pub registry: RuleRegistry,
    pub view: ResolvedView,
}

impl Session {
    /// Build the session.
    ///
    /// Relative texture paths resolve against the scene's directory unless
    /// the configuration names a root. An unknown collection is reported and
    /// runs every category.
    pub fn open(
        config_path: Option<&Path>,
        scene: Option<&Path>,
        selection: &SelectionArgs,
    ) -> Result<Self> {
        let mut config = load_config(config_path)?;
        if config.textures.root.is_none() {
            config.textures.root = scene
                .and_then(Path::parent)
                .filter(|dir| !dir.as_os_str().is_empty())
                .map(Path::to_path_buf);
        }

        let mut registry = RuleRegistry::from_config(&config)?;
        registry.restrict_to_selection(selection.selection_only);

        let collections = CollectionIndex::from_config(&config);
        let name = selection
            .collection
            .clone()
            .unwrap_or_else(|| config.collection.clone());
        if collections.get(&name).is_none() {
            warn!(collection = %name, "Unknown collection");
            eprintln!(
                "{} Unknown collection '{}', running every category. Available: {}",
                "Warning:".yellow().bold(),
                name,
                collections.names().collect::<Vec<_>>().join(", ")
            );
        }

        let categories = CategoryIndex::categorize(&registry);
        let mut view = collections.resolve(&name, &categories);
        view.retain_categories(selection.only.as_deref(), selection.skip.as_deref());

        Ok(Self {
            config,
            registry,
            view,
        })
    }
}
