//! # Audit Results Structures
//!
//! This module defines the severity scale and the snapshot of rule state that
//! renderers consume after a batch run.
//!
//! ## Overview
//!
//! - [`Severity`] - Ordered urgency of a rule with outstanding errors
//! - [`RuleReport`] - State of one rule after find or fix
//! - [`AuditResults`] - Every rule of a resolved collection view
//!
//! ## Examples
//!
//! ```rust
//! use sceneqa::rules::Severity;
//!
//! assert!(Severity::Critical > Severity::Warning);
//! assert_eq!(Severity::from_string("warn"), Some(Severity::Warning));
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::check::CheckStatus;
use super::index::ResolvedView;
use super::registry::RuleRegistry;
use super::subject::Subject;

/// Severity levels of a rule.
///
/// A rule reports its declared severity while it holds errors and
/// [`Severity::Neutral`] otherwise:
///
/// - **Critical** - Must be resolved before the scene is published
/// - **Warning** - Should be reviewed, may be intentional
/// - **Neutral** - Nothing to report
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Neutral = 0,
    Warning = 1,
    Critical = 2,
}

impl Severity {
    pub fn from_string(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "critical" | "error" => Some(Self::Critical),
            "warning" | "warn" => Some(Self::Warning),
            "neutral" | "none" | "info" => Some(Self::Neutral),
            _ => None,
        }
    }

    /// Numeric urgency level
    pub fn level(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Neutral => "neutral",
            Self::Warning => "warning",
            Self::Critical => "critical",
        }
    }
}

/// Snapshot of a single rule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleReport {
    /// Stable rule slug (e.g. "scene/unique-names")
    pub id: String,

    /// Registration ordinal
    pub ordinal: usize,

    pub name: String,

    pub categories: Vec<String>,

    /// Declared severity
    pub severity: Severity,

    /// Current state: neutral when clean, else the declared severity
    pub state: Severity,

    pub status: CheckStatus,

    /// Formatted message, empty when clean
    pub message: String,

    pub findable: bool,
    pub fixable: bool,
    pub selectable: bool,

    /// Outstanding subjects
    pub subjects: Vec<Subject>,
}

/// A category of the resolved view and the rules listed under it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryReport {
    pub name: String,
    /// Rule ids in execution order
    pub rules: Vec<String>,
}

/// Rule state for every rule of a resolved collection view.
///
/// # Examples
///
/// ```rust
/// use sceneqa::rules::index::{CategoryIndex, CollectionIndex};
/// use sceneqa::rules::registry::RuleRegistry;
/// use sceneqa::rules::results::AuditResults;
///
/// let registry = RuleRegistry::standard();
/// let categories = CategoryIndex::categorize(&registry);
/// let view = CollectionIndex::builtin().resolve("rigging", &categories);
///
/// let results = AuditResults::collect("scene.json", &registry, &view, false);
/// assert!(results.is_clean());
/// assert_eq!(results.collection, "rigging");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditResults {
    /// Scene file or label
    pub scene: String,

    /// Collection the view was resolved from
    pub collection: String,

    /// Whether detection was restricted to the selection
    pub selection_only: bool,

    pub generated_at: DateTime<Utc>,

    categories: Vec<CategoryReport>,

    rules: Vec<RuleReport>,
}

impl AuditResults {
    /// Snapshot the rules of `view` as they currently stand
    pub fn collect(
        scene: impl Into<String>,
        registry: &RuleRegistry,
        view: &ResolvedView,
        selection_only: bool,
    ) -> Self {
        let categories = view
            .groups()
            .map(|(name, ids)| CategoryReport {
                name: name.to_string(),
                rules: ids
                    .iter()
                    .filter_map(|id| registry.get(*id))
                    .map(|check| check.id().to_string())
                    .collect(),
            })
            .collect();

        let rules = view
            .rule_ids()
            .into_iter()
            .filter_map(|id| registry.get(id))
            .map(|check| RuleReport {
                id: check.id().to_string(),
                ordinal: check.ordinal().index(),
                name: check.name().to_string(),
                categories: check.categories().to_vec(),
                severity: check.severity(),
                state: check.state(),
                status: check.status(),
                message: check.message(),
                findable: check.is_findable(),
                fixable: check.is_fixable(),
                selectable: check.is_selectable(),
                subjects: check.errors().snapshot(),
            })
            .collect();

        Self {
            scene: scene.into(),
            collection: view.collection().to_string(),
            selection_only,
            generated_at: Utc::now(),
            categories,
            rules,
        }
    }

    pub fn categories(&self) -> &[CategoryReport] {
        &self.categories
    }

    pub fn rules(&self) -> &[RuleReport] {
        &self.rules
    }

    pub fn rule(&self, id: &str) -> Option<&RuleReport> {
        self.rules.iter().find(|r| r.id == id)
    }

    /// Rules holding errors
    pub fn failing(&self) -> impl Iterator<Item = &RuleReport> {
        self.rules.iter().filter(|r| r.state != Severity::Neutral)
    }

    /// Count rules by current state
    pub fn count_by_state(&self, state: Severity) -> usize {
        self.rules.iter().filter(|r| r.state == state).count()
    }

    /// Outstanding subjects across all rules
    pub fn total_subjects(&self) -> usize {
        self.rules.iter().map(|r| r.subjects.len()).sum()
    }

    pub fn has_critical(&self) -> bool {
        self.rules.iter().any(|r| r.state == Severity::Critical)
    }

    pub fn has_warnings(&self) -> bool {
        self.rules.iter().any(|r| r.state == Severity::Warning)
    }

    /// Rules that were never evaluated
    pub fn unevaluated(&self) -> impl Iterator<Item = &RuleReport> {
        self.rules
            .iter()
            .filter(|r| r.status == CheckStatus::Unevaluated)
    }

    pub fn is_clean(&self) -> bool {
        self.failing().next().is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::index::{CategoryIndex, Collection, CollectionIndex};
    use crate::rules::testing::{scripted, ScriptedRule};
    use crate::scene::MemoryScene;

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Neutral < Severity::Warning);
        assert!(Severity::Warning < Severity::Critical);
        assert_eq!(Severity::Critical.level(), 2);
        assert_eq!(Severity::default(), Severity::Neutral);
    }

    #[test]
    fn test_severity_from_string() {
        assert_eq!(Severity::from_string("critical"), Some(Severity::Critical));
        assert_eq!(Severity::from_string("ERROR"), Some(Severity::Critical));
        assert_eq!(Severity::from_string("warn"), Some(Severity::Warning));
        assert_eq!(Severity::from_string("none"), Some(Severity::Neutral));
        assert_eq!(Severity::from_string("urgent"), None);
    }

    #[test]
    fn test_collect_reports_state_per_rule() {
        let mut registry = RuleRegistry::new();
        let loud = registry.register(Box::new(
            ScriptedRule::new("test/loud", "Loud", "Lint").finds(["|a", "|b"]),
        ));
        registry.register(scripted("test/quiet", "Quiet", "Lint"));

        let scene = MemoryScene::new();
        if let Some(check) = registry.get_mut(loud) {
            check.find(&scene).unwrap();
        }

        let categories = CategoryIndex::categorize(&registry);
        let collections = CollectionIndex::new(vec![Collection::new("lint", ["Lint"])]);
        let view = collections.resolve("lint", &categories);
        let results = AuditResults::collect("inline", &registry, &view, false);

        assert_eq!(results.rules().len(), 2);
        assert!(results.has_critical());
        assert_eq!(results.total_subjects(), 2);
        assert_eq!(results.rule("test/loud").unwrap().message, "2 scripted issue(s)");
        assert_eq!(results.unevaluated().count(), 1);
        assert_eq!(results.categories()[0].rules, vec!["test/loud", "test/quiet"]);
    }
}
