//! Fix command - Repair what the fixable rules report
//!
//! Runs detection, asks for confirmation, fixes every fixable failing rule in
//! collection order, saves the scene and audits it again.

use anyhow::{Context, Result};
use colored::Colorize;
use dialoguer::Confirm;
use std::path::Path;

use super::audit::{exit_code, progress_engine, warn_failed};
use super::{FixArgs, Session};
use crate::cli::exit_codes;
use crate::rules::results::AuditResults;
use crate::scene::MemoryScene;

pub async fn execute(args: FixArgs, config_path: Option<&Path>) -> Result<i32> {
    let mut session = Session::open(config_path, Some(&args.scene), &args.selection)?;

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

    let pending: Vec<_> = ids
        .iter()
        .filter_map(|id| session.registry.get(*id))
        .filter(|check| check.is_fixable() && !check.errors().is_empty())
        .collect();

    if pending.is_empty() {
        println!("{}", "Nothing to fix.".green());
        let results = AuditResults::collect(
            args.scene.display().to_string(),
            &session.registry,
            &session.view,
            args.selection.selection_only,
        );
        return Ok(exit_code(&results, &report));
    }

    println!("\n{}", "Fixes to apply:".bold());
    for check in &pending {
        println!(
            "  {} {} [{}] {}",
            "•".cyan(),
            check.name(),
            check.id().cyan(),
            check.message()
        );
    }

    if args.dry_run {
        println!("\n{}", "Dry run, the scene was not modified.".yellow());
        return Ok(exit_codes::SUCCESS);
    }

    if !args.yes {
        let proceed = Confirm::new()
            .with_prompt(format!("Apply {} fix(es)?", pending.len()))
            .default(false)
            .interact()?;
        if !proceed {
            println!("{}", "Aborted.".yellow());
            return Ok(exit_codes::SUCCESS);
        }
    }

    let fixed = engine
        .fix_all(&mut session.registry, &ids, &mut scene)
        .await
        .context("Fix failed")?;

    for run in &fixed.rules {
        for failure in &run.outcome.failures {
            eprintln!(
                "{} {}: {} ({})",
                "Failed:".red().bold(),
                run.name,
                failure.subject,
                failure.message
            );
        }
    }
    println!(
        "\n{} Fixed {} subject(s), {} stale, {} failed",
        "Done:".green().bold(),
        fixed.fixed(),
        fixed.dropped_stale(),
        fixed.failures()
    );

    let destination = args.output.as_deref().unwrap_or(&args.scene);
    scene
        .save(destination)
        .with_context(|| format!("Failed to save scene to {}", destination.display()))?;
    println!("Scene saved to {}", destination.display().to_string().cyan());

    // Audit the fixed scene so the exit code reflects what is left
    let report = engine
        .find_all(&mut session.registry, &ids, &scene)
        .await
        .context("Audit failed")?;
    let results = AuditResults::collect(
        destination.display().to_string(),
        &session.registry,
        &session.view,
        args.selection.selection_only,
    );
    let remaining = results.failing().count();
    if remaining > 0 {
        println!(
            "{} rule(s) still report issues. Run '{}' for details.",
            remaining,
            "sceneqa audit".cyan()
        );
    }

    Ok(exit_code(&results, &report))
}
