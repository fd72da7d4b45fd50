//! Audit command - Run the rules of a collection on a scene
//!
//! Loads the scene, runs detection for every rule of the resolved collection
//! and renders the results in the requested format.

use anyhow::{Context, Result};
use colored::Colorize;
use std::fs;
use std::path::Path;
use tracing::debug;

use super::{AuditArgs, Session};
use crate::cli::exit_codes;
use crate::error::QaError;
use crate::rules::engine::{ExecutionEngine, FindReport, FindStatus};
use crate::rules::registry::RuleRegistry;
use crate::rules::results::AuditResults;
use crate::scene::{MemoryScene, SceneAdapter};
use crate::utils::timing::{format_duration, slowest};

/// Rules listed in the debug timing breakdown
const SLOWEST_RULES: usize = 5;

/// Execute the audit command
///
/// # Returns
///
/// An exit code: 0 when clean, 1 for critical rules, 2 for warnings, 3 when
/// a rule could not be evaluated
pub async fn execute(args: AuditArgs, config_path: Option<&Path>) -> Result<i32> {
    let mut session = Session::open(config_path, Some(&args.scene), &args.selection)?;
    debug!(
        collection = session.view.collection(),
        fallback = session.view.is_fallback(),
        textures = ?session.config.textures.root,
        "Session ready"
    );

    eprintln!("{}", "Loading scene...".dimmed());
    let mut scene = MemoryScene::load(&args.scene)
        .with_context(|| format!("Failed to load scene {}", args.scene.display()))?;

    let engine = progress_engine();
    let ids = session.view.rule_ids();
    let report = engine
        .find_all(&mut session.registry, &ids, &scene)
        .await
        .context("Audit failed")?;
    warn_failed(&report);
    eprintln!(
        "{}",
        format!("Audit finished in {}", format_duration(report.duration)).dimmed()
    );
    for (name, duration) in slowest(
        report.rules.iter().map(|run| (run.name.as_str(), run.duration)),
        SLOWEST_RULES,
    ) {
        debug!(rule = name, duration = %format_duration(duration), "Slow rule");
    }

    let results = AuditResults::collect(
        args.scene.display().to_string(),
        &session.registry,
        &session.view,
        args.selection.selection_only,
    );

    if let Some(rule) = &args.select {
        if !select_subjects(&session.registry, rule, &mut scene, &args.scene)? {
            return Ok(exit_codes::INVALID_ARGS);
        }
    }

    let rendered = args.format.renderer().render_report(&results)?;
    match &args.output {
        Some(path) => {
            fs::write(path, &rendered)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            eprintln!(
                "{} Report written to {}",
                "Success:".green().bold(),
                path.display().to_string().cyan()
            );
        }
        None => println!("{}", rendered),
    }

    Ok(exit_code(&results, &report))
}

/// Replace the scene's selection with one rule's subjects and save the scene.
/// Returns `false` when the rule is unknown.
fn select_subjects(
    registry: &RuleRegistry,
    rule: &str,
    scene: &mut MemoryScene,
    path: &Path,
) -> Result<bool> {
    let check = match registry.find_by_id(rule) {
        Ok(check) => check,
        Err(QaError::UnknownRule(id)) => {
            eprintln!("{} Unknown rule '{}'", "Error:".red().bold(), id);
            return Ok(false);
        }
        Err(e) => return Err(e.into()),
    };

    if !check.is_selectable() {
        eprintln!(
            "{} {} does not support selection",
            "Warning:".yellow().bold(),
            check.id()
        );
        return Ok(true);
    }

    check.select(scene)?;
    scene
        .save(path)
        .with_context(|| format!("Failed to save scene to {}", path.display()))?;
    eprintln!(
        "Selected {} node(s) of {}",
        scene.selection().len(),
        check.id().cyan()
    );
    Ok(true)
}

/// Engine printing each rule as it starts
pub(crate) fn progress_engine() -> ExecutionEngine {
    let mut engine = ExecutionEngine::new();
    engine.set_progress_callback(Box::new(|name, current, total| {
        eprintln!(
            "  {} {} ({}/{})...",
            "→".dimmed(),
            name.dimmed(),
            current,
            total
        );
    }));
    engine
}

pub(crate) fn warn_failed(report: &FindReport) {
    for run in report.failed() {
        if let FindStatus::Failed { message } = &run.status {
            eprintln!(
                "{} {} could not be evaluated: {}",
                "Warning:".yellow().bold(),
                run.name,
                message
            );
        }
    }
}

pub(crate) fn exit_code(results: &AuditResults, report: &FindReport) -> i32 {
    if results.has_critical() {
        exit_codes::CRITICAL_ISSUES
    } else if report.failed().next().is_some() {
        exit_codes::ERROR
    } else if results.has_warnings() {
        exit_codes::WARNINGS
    } else {
        exit_codes::SUCCESS
    }
}
