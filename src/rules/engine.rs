//! Batch execution of checks
//!
//! [`ExecutionEngine`] drives `find` and `fix` over an ordered list of rule
//! ids. Rules run one after the other on the calling task. The engine yields
//! to the runtime between rules so a caller can interleave feedback, and it
//! checks its [`CancellationFlag`] at the same points. Nothing is interrupted
//! in the middle of a rule.

use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, span, warn, Level};

use super::check::{FixOutcome, RuleId};
use super::registry::RuleRegistry;
use crate::error::QaError;
use crate::scene::SceneAdapter;
use crate::utils::timing::Timer;

/// Progress callback: rule name, position (1-based) and total
pub type ProgressCallback = Box<dyn Fn(&str, usize, usize) + Send + Sync>;

/// Shared flag to stop a batch between two rules
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Clear the flag so the engine can run another batch
    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// What happened to one rule during `find_all`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum FindStatus {
    /// Detection completed
    Completed { errors: usize },
    /// Detection failed, the message says why
    Failed { message: String },
    /// The rule is not findable
    Skipped,
}

/// Result of one rule during `find_all`
#[derive(Debug, Clone, Serialize)]
pub struct RuleRun {
    pub rule_id: RuleId,
    pub name: String,
    pub status: FindStatus,
    pub duration: Duration,
}

/// Result of a `find_all` batch
#[derive(Debug, Clone, Default, Serialize)]
pub struct FindReport {
    pub rules: Vec<RuleRun>,
    /// Set when the batch stopped early
    pub cancelled: bool,
    pub duration: Duration,
}

impl FindReport {
    pub fn total_errors(&self) -> usize {
        self.rules
            .iter()
            .map(|run| match run.status {
                FindStatus::Completed { errors } => errors,
                _ => 0,
            })
            .sum()
    }

    pub fn failed(&self) -> impl Iterator<Item = &RuleRun> {
        self.rules
            .iter()
            .filter(|run| matches!(run.status, FindStatus::Failed { .. }))
    }
}

/// Result of one rule during `fix_all`
#[derive(Debug, Clone, Serialize)]
pub struct FixRun {
    pub rule_id: RuleId,
    pub name: String,
    pub outcome: FixOutcome,
    pub duration: Duration,
}

/// Result of a `fix_all` batch
#[derive(Debug, Clone, Default, Serialize)]
pub struct FixReport {
    pub rules: Vec<FixRun>,
    /// Set when the batch stopped early
    pub cancelled: bool,
    pub duration: Duration,
}

impl FixReport {
    pub fn fixed(&self) -> usize {
        self.rules.iter().map(|run| run.outcome.fixed).sum()
    }

    pub fn dropped_stale(&self) -> usize {
        self.rules.iter().map(|run| run.outcome.dropped_stale).sum()
    }

    pub fn failures(&self) -> usize {
        self.rules.iter().map(|run| run.outcome.failures.len()).sum()
    }
}

/// Batch find/fix driver
#[derive(Default)]
pub struct ExecutionEngine {
    cancel: CancellationFlag,
    progress_callback: Option<ProgressCallback>,
}

impl ExecutionEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a callback invoked before each rule
    pub fn set_progress_callback(&mut self, callback: ProgressCallback) {
        self.progress_callback = Some(callback);
    }

    /// Handle to cancel a running batch
    pub fn cancellation(&self) -> CancellationFlag {
        self.cancel.clone()
    }

    fn report_progress(&self, name: &str, current: usize, total: usize) {
        if let Some(callback) = &self.progress_callback {
            callback(name, current, total);
        }
    }

    /// Run `find` on every findable rule of `ids`, in order.
    ///
    /// Each rule is evaluated on its own: a detection failure is logged and
    /// recorded for that rule and the batch goes on.
    pub async fn find_all(
        &self,
        registry: &mut RuleRegistry,
        ids: &[RuleId],
        scene: &dyn SceneAdapter,
    ) -> Result<FindReport, QaError> {
        let timer = Timer::start();
        let mut report = FindReport::default();
        info!(rules = ids.len(), "Starting find");

        for (position, id) in ids.iter().enumerate() {
            if self.cancel.is_cancelled() {
                info!(completed = position, "Find cancelled");
                report.cancelled = true;
                break;
            }

            let check = registry
                .get_mut(*id)
                .ok_or_else(|| QaError::UnknownRule(id.to_string()))?;
            let span = span!(Level::INFO, "rule", rule = check.id(), ordinal = id.index());
            let guard = span.enter();

            self.report_progress(check.name(), position + 1, ids.len());

            let rule_timer = Timer::start();
            let status = if !check.is_findable() {
                debug!("Rule is not findable, skipping");
                FindStatus::Skipped
            } else {
                match check.find(scene) {
                    Ok(errors) => {
                        debug!(errors, "Rule evaluated");
                        FindStatus::Completed { errors }
                    }
                    Err(e) => {
                        warn!(error = %e, "Detection failed");
                        FindStatus::Failed {
                            message: e.to_string(),
                        }
                    }
                }
            };

            report.rules.push(RuleRun {
                rule_id: *id,
                name: check.name().to_string(),
                status,
                duration: rule_timer.elapsed(),
            });

            drop(guard);
            tokio::task::yield_now().await;
        }

        report.duration = timer.elapsed();
        info!(
            errors = report.total_errors(),
            failed = report.failed().count(),
            "Find complete"
        );
        Ok(report)
    }

    /// Run `fix` on every fixable rule of `ids` holding errors, in order.
    ///
    /// Each rule's fix runs to completion, with its own undo chunk, before
    /// the next one starts.
    pub async fn fix_all(
        &self,
        registry: &mut RuleRegistry,
        ids: &[RuleId],
        scene: &mut dyn SceneAdapter,
    ) -> Result<FixReport, QaError> {
        let timer = Timer::start();
        let mut report = FixReport::default();

        let pending: Vec<RuleId> = ids
            .iter()
            .copied()
            .filter(|id| {
                registry
                    .get(*id)
                    .is_some_and(|c| c.is_fixable() && !c.errors().is_empty())
            })
            .collect();
        info!(rules = pending.len(), "Starting fix");

        for (position, id) in pending.iter().enumerate() {
            if self.cancel.is_cancelled() {
                info!(completed = position, "Fix cancelled");
                report.cancelled = true;
                break;
            }

            let check = registry
                .get_mut(*id)
                .ok_or_else(|| QaError::UnknownRule(id.to_string()))?;
            let span = span!(Level::INFO, "rule", rule = check.id(), ordinal = id.index());
            let guard = span.enter();

            self.report_progress(check.name(), position + 1, pending.len());

            let rule_timer = Timer::start();
            let outcome = check.fix(scene)?;
            debug!(
                fixed = outcome.fixed,
                stale = outcome.dropped_stale,
                failed = outcome.failures.len(),
                "Rule fixed"
            );

            report.rules.push(FixRun {
                rule_id: *id,
                name: check.name().to_string(),
                outcome,
                duration: rule_timer.elapsed(),
            });

            drop(guard);
            tokio::task::yield_now().await;
        }

        report.duration = timer.elapsed();
        info!(
            fixed = report.fixed(),
            failures = report.failures(),
            "Fix complete"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::index::{CategoryIndex, Collection, CollectionIndex};
    use crate::rules::testing::{scripted, ScriptedRule};
    use crate::rules::Severity;
    use crate::scene::MemoryScene;
    use std::sync::Mutex;

    fn scene_with(nodes: &[&str]) -> MemoryScene {
        let mut scene = MemoryScene::new();
        for node in nodes {
            scene.add_node(node, "transform", None).unwrap();
        }
        scene
    }

    #[tokio::test]
    async fn test_find_all_runs_in_order() {
        let mut registry = RuleRegistry::new();
        registry.register(Box::new(ScriptedRule::new("test/a", "A", "Lint").finds(["|a"])));
        registry.register(Box::new(ScriptedRule::new("test/b", "B", "Lint").finds(["|b"])));

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let mut engine = ExecutionEngine::new();
        engine.set_progress_callback(Box::new(move |name, current, total| {
            sink.lock().unwrap().push(format!("{name} {current}/{total}"));
        }));

        let ids = registry.ids();
        let report = engine
            .find_all(&mut registry, &ids, &MemoryScene::new())
            .await
            .unwrap();

        assert_eq!(report.total_errors(), 2);
        assert!(!report.cancelled);
        assert_eq!(*seen.lock().unwrap(), vec!["A 1/2", "B 2/2"]);
    }

    #[tokio::test]
    async fn test_find_all_isolates_detection_failures() {
        let mut registry = RuleRegistry::new();
        registry.register(Box::new(
            ScriptedRule::new("test/broken", "Broken", "Lint")
                .finds(["|a"])
                .fails_detection_after(0),
        ));
        let healthy = registry.register(Box::new(
            ScriptedRule::new("test/ok", "Ok", "Lint").finds(["|b"]),
        ));
        registry.register(Box::new(
            ScriptedRule::new("test/fix-only", "Fix Only", "Lint").not_findable(),
        ));

        let ids = registry.ids();
        let report = ExecutionEngine::new()
            .find_all(&mut registry, &ids, &MemoryScene::new())
            .await
            .unwrap();

        assert_eq!(report.failed().count(), 1);
        assert_eq!(report.rules[2].status, FindStatus::Skipped);
        assert_eq!(registry.get(healthy).unwrap().errors().len(), 1);
    }

    #[tokio::test]
    async fn test_fix_all_skips_clean_and_report_only_rules() {
        let mut registry = RuleRegistry::new();
        let fixable = registry.register(Box::new(
            ScriptedRule::new("test/a", "A", "Lint").finds(["|a"]).fixable(),
        ));
        let report_only =
            registry.register(Box::new(ScriptedRule::new("test/b", "B", "Lint").finds(["|b"])));
        registry.register(Box::new(ScriptedRule::new("test/c", "C", "Lint").fixable()));

        let mut scene = scene_with(&["a", "b"]);
        let engine = ExecutionEngine::new();
        let ids = registry.ids();
        engine.find_all(&mut registry, &ids, &scene).await.unwrap();
        let report = engine.fix_all(&mut registry, &ids, &mut scene).await.unwrap();

        assert_eq!(report.rules.len(), 1);
        assert_eq!(report.rules[0].rule_id, fixable);
        assert_eq!(registry.get(fixable).unwrap().state(), Severity::Neutral);
        assert_eq!(registry.get(report_only).unwrap().state(), Severity::Critical);
        assert!(!scene.exists("|a"));
        assert!(scene.exists("|b"));
    }

    #[tokio::test]
    async fn test_fix_all_drops_subjects_removed_by_earlier_rules() {
        let mut scene = scene_with(&["x", "y"]);
        scene.select(&["x".to_string(), "y".to_string()]).unwrap();

        let mut registry = RuleRegistry::new();
        registry.register(Box::new(
            ScriptedRule::new("test/first", "First", "Lint")
                .finds(["|x"])
                .fixable(),
        ));
        let second = ScriptedRule::new("test/second", "Second", "Lint")
            .finding_selection()
            .selectable()
            .fixable();
        let attempts = second.attempts();
        let second = registry.register(Box::new(second));

        let engine = ExecutionEngine::new();
        let ids = registry.ids();
        engine.find_all(&mut registry, &ids, &scene).await.unwrap();
        let report = engine.fix_all(&mut registry, &ids, &mut scene).await.unwrap();

        assert_eq!(report.dropped_stale(), 1);
        assert!(registry.get(second).unwrap().errors().is_empty());
        assert_eq!(attempts.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_cancellation_between_rules() {
        let mut registry = RuleRegistry::new();
        registry.register(scripted("test/a", "A", "Lint"));
        registry.register(scripted("test/b", "B", "Lint"));
        registry.register(scripted("test/c", "C", "Lint"));

        let mut engine = ExecutionEngine::new();
        let cancel = engine.cancellation();
        engine.set_progress_callback(Box::new(move |_, current, _| {
            if current == 2 {
                cancel.cancel();
            }
        }));

        let ids = registry.ids();
        let report = engine
            .find_all(&mut registry, &ids, &MemoryScene::new())
            .await
            .unwrap();

        assert!(report.cancelled);
        assert_eq!(report.rules.len(), 2);
        assert_eq!(
            registry.get(ids[2]).unwrap().status(),
            crate::rules::CheckStatus::Unevaluated
        );
    }

    #[tokio::test]
    async fn test_collection_batch_undo_per_rule() {
        let mut registry = RuleRegistry::new();
        registry.register(Box::new(
            ScriptedRule::new("test/a", "A", "Rigging").finds(["|a"]).fixable(),
        ));
        registry.register(Box::new(
            ScriptedRule::new("test/b", "B", "Geometry").finds(["|b"]).fixable(),
        ));

        let categories = CategoryIndex::categorize(&registry);
        let collections = CollectionIndex::new(vec![Collection::new("rig", ["Rigging"])]);
        let view = collections.resolve("rig", &categories);

        let mut scene = scene_with(&["a", "b"]);
        let engine = ExecutionEngine::new();
        let ids = view.rule_ids();
        engine.find_all(&mut registry, &ids, &scene).await.unwrap();
        engine.fix_all(&mut registry, &ids, &mut scene).await.unwrap();

        assert!(!scene.exists("|a"));
        assert!(scene.exists("|b"));
        assert_eq!(scene.undo_depth(), 1);
        scene.undo();
        assert!(scene.exists("|a"));
    }

    #[test]
    fn test_cancellation_flag_reset() {
        let flag = CancellationFlag::new();
        let shared = flag.clone();
        shared.cancel();
        assert!(flag.is_cancelled());
        flag.reset();
        assert!(!shared.is_cancelled());
    }
}
