//! The rule contract and the stateful check wrapping it
//!
//! A [`Rule`] is a stateless body: metadata, a lazy detection pass and an
//! optional per-subject remediation. A [`Check`] owns one rule body together
//! with the state the engine drives: the ordered error list, the selection
//! scope flag and whether the rule was evaluated at all.

use globset::GlobSet;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{trace, warn};

use super::results::Severity;
use super::subject::{ErrorList, Subject};
use crate::error::{Capability, QaError, RemediationError, SceneError};
use crate::scene::{SceneAdapter, Scope, UndoChunk};

/// Lazy, finite sequence of detected subjects.
///
/// Draining it must not mutate the scene, so a second pass over an unchanged
/// scene yields the same subjects in the same order.
pub type Detection<'a> = Box<dyn Iterator<Item = Result<Subject, SceneError>> + 'a>;

/// Placeholder replaced by the error count in message templates
pub const COUNT_PLACEHOLDER: &str = "{count}";

/// Static metadata of a rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleInfo {
    /// Stable slug, `category/name`
    pub id: String,
    /// Display name
    pub name: String,
    /// Message template, `{count}` is replaced by the error count
    pub message: String,
    pub severity: Severity,
    pub categories: Vec<String>,
    /// Whether found errors can drive the host selection
    pub selectable: bool,
    pub documentation: String,
}

impl RuleInfo {
    /// Metadata with Critical severity and no categories
    pub fn new(id: impl Into<String>, name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            message: message.into(),
            severity: Severity::Critical,
            categories: Vec::new(),
            selectable: false,
            documentation: String::new(),
        }
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.categories.push(category.into());
        self
    }

    pub fn selectable(mut self) -> Self {
        self.selectable = true;
        self
    }

    pub fn with_documentation(mut self, documentation: impl Into<String>) -> Self {
        self.documentation = documentation.into();
        self
    }
}

/// The body of an audit rule.
///
/// Detection is required. Fixing is a separate capability: a fixable body
/// implements [`Remedy`] and hands itself out through [`Rule::remedy`].
pub trait Rule: Send + Sync {
    fn info(&self) -> &RuleInfo;

    fn is_findable(&self) -> bool {
        true
    }

    /// Start a detection pass over `scene`, limited to the selection when
    /// `scope` is [`Scope::SelectionOnly`]
    fn detect<'a>(
        &'a self,
        scene: &'a dyn SceneAdapter,
        scope: Scope,
    ) -> Result<Detection<'a>, SceneError>;

    /// The remediation of this rule, `None` for report-only rules
    fn remedy(&self) -> Option<&dyn Remedy> {
        None
    }

    fn is_fixable(&self) -> bool {
        self.remedy().is_some()
    }
}

/// Per-subject remediation of a fixable rule
pub trait Remedy: Send + Sync {
    fn remediate(
        &self,
        scene: &mut dyn SceneAdapter,
        subject: &Subject,
    ) -> Result<(), RemediationError>;
}

/// Registration ordinal of a check
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleId(pub(crate) usize);

impl RuleId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02}", self.0)
    }
}

/// Evaluation status of a check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "severity", rename_all = "lowercase")]
pub enum CheckStatus {
    /// `find` never ran
    Unevaluated,
    /// Evaluated, no outstanding errors
    Clean,
    /// Evaluated, errors outstanding at the given severity
    Failing(Severity),
}

/// A subject whose remediation failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixFailure {
    pub subject: Subject,
    pub message: String,
}

/// What a single `fix` call did
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixOutcome {
    /// Subjects remediated and removed
    pub fixed: usize,
    /// Subjects that no longer resolved and were dropped
    pub dropped_stale: usize,
    /// Subjects kept because remediation failed
    pub failures: Vec<FixFailure>,
}

impl FixOutcome {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// A registered rule and its error state
pub struct Check {
    ordinal: RuleId,
    rule: Box<dyn Rule>,
    severity: Severity,
    errors: ErrorList,
    restrict_to_selection: bool,
    evaluated: bool,
    ignore: Option<Arc<GlobSet>>,
}

impl fmt::Debug for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Check")
            .field("ordinal", &self.ordinal)
            .field("id", &self.id())
            .field("severity", &self.severity)
            .field("errors", &self.errors.len())
            .field("evaluated", &self.evaluated)
            .finish()
    }
}

impl Check {
    pub fn new(ordinal: RuleId, rule: Box<dyn Rule>) -> Self {
        let severity = failing_severity(rule.info().severity);
        Self {
            ordinal,
            rule,
            severity,
            errors: ErrorList::new(),
            restrict_to_selection: false,
            evaluated: false,
            ignore: None,
        }
    }

    /// Never report subjects whose node paths match `ignore`
    pub fn with_ignore(mut self, ignore: Arc<GlobSet>) -> Self {
        self.ignore = Some(ignore);
        self
    }

    /// Override the declared severity. A neutral override reports as a warning.
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = failing_severity(severity);
        self
    }

    pub fn ordinal(&self) -> RuleId {
        self.ordinal
    }

    pub fn info(&self) -> &RuleInfo {
        self.rule.info()
    }

    pub fn id(&self) -> &str {
        &self.rule.info().id
    }

    pub fn name(&self) -> &str {
        &self.rule.info().name
    }

    pub fn categories(&self) -> &[String] {
        &self.rule.info().categories
    }

    pub fn documentation(&self) -> &str {
        &self.rule.info().documentation
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn errors(&self) -> &ErrorList {
        &self.errors
    }

    pub fn is_findable(&self) -> bool {
        self.rule.is_findable()
    }

    pub fn is_fixable(&self) -> bool {
        self.rule.is_fixable()
    }

    pub fn is_selectable(&self) -> bool {
        self.rule.info().selectable
    }

    pub fn restricts_to_selection(&self) -> bool {
        self.restrict_to_selection
    }

    pub fn set_restrict_to_selection(&mut self, restrict: bool) {
        self.restrict_to_selection = restrict;
    }

    fn scope(&self) -> Scope {
        if self.restrict_to_selection {
            Scope::SelectionOnly
        } else {
            Scope::All
        }
    }

    fn unsupported(&self, capability: Capability) -> QaError {
        QaError::Capability {
            rule: self.name().to_string(),
            capability,
        }
    }

    /// Re-evaluate the rule against `scene`.
    ///
    /// Clears the error list and drains the detection pass into it. Duplicate
    /// subjects, subjects touching referenced content and ignored subjects
    /// are discarded. A
    /// failing detection item aborts the pass; subjects appended before it
    /// stay. Returns the number of errors found.
    pub fn find(&mut self, scene: &dyn SceneAdapter) -> Result<usize, QaError> {
        if !self.rule.is_findable() {
            return Err(self.unsupported(Capability::Find));
        }

        self.errors.clear();
        self.evaluated = true;

        for item in self.rule.detect(scene, self.scope())? {
            let subject = item?;
            let nodes = subject.nodes();
            if nodes.iter().any(|node| scene.is_referenced(node)) {
                trace!(rule = %self.rule.info().id, %subject, "Skipping referenced subject");
                continue;
            }
            if let Some(ignore) = &self.ignore {
                if nodes.iter().any(|node| ignore.is_match(node)) {
                    trace!(rule = %self.rule.info().id, %subject, "Skipping ignored subject");
                    continue;
                }
            }
            self.errors.push(subject);
        }

        Ok(self.errors.len())
    }

    /// Remediate every outstanding error inside one undo chunk.
    ///
    /// Each subject is handled on its own: a failure is logged and the subject
    /// kept, the rest of the batch still runs. For selectable rules a subject
    /// that no longer resolves is dropped without calling the remediation.
    pub fn fix(&mut self, scene: &mut dyn SceneAdapter) -> Result<FixOutcome, QaError> {
        let Some(remedy) = self.rule.remedy() else {
            return Err(self.unsupported(Capability::Fix));
        };

        let mut outcome = FixOutcome::default();
        let selectable = self.is_selectable();
        let mut chunk = UndoChunk::open(scene, &self.rule.info().name);

        for subject in self.errors.snapshot() {
            if selectable && is_stale(&*chunk, &subject) {
                trace!(rule = %self.rule.info().id, %subject, "Dropping stale subject");
                self.errors.remove(&subject);
                outcome.dropped_stale += 1;
                continue;
            }

            match remedy.remediate(&mut *chunk, &subject) {
                Ok(()) => {
                    self.errors.remove(&subject);
                    outcome.fixed += 1;
                }
                Err(e) => {
                    warn!(
                        rule = %self.rule.info().id,
                        %subject,
                        error = %e,
                        "Unable to fix subject"
                    );
                    outcome.failures.push(FixFailure {
                        subject,
                        message: e.to_string(),
                    });
                }
            }
        }

        Ok(outcome)
    }

    /// Push the outstanding subjects to the host selection
    pub fn select(&self, scene: &mut dyn SceneAdapter) -> Result<(), QaError> {
        if !self.is_selectable() || self.errors.is_empty() {
            return Ok(());
        }
        scene.select(&self.errors.flatten())?;
        Ok(())
    }

    /// Neutral when clean, the severity otherwise
    pub fn state(&self) -> Severity {
        if self.errors.is_empty() {
            Severity::Neutral
        } else {
            self.severity
        }
    }

    /// Formatted message, empty when clean
    pub fn message(&self) -> String {
        if self.errors.is_empty() {
            return String::new();
        }
        self.rule
            .info()
            .message
            .replace(COUNT_PLACEHOLDER, &self.errors.len().to_string())
    }

    pub fn status(&self) -> CheckStatus {
        if !self.evaluated {
            CheckStatus::Unevaluated
        } else if self.errors.is_empty() {
            CheckStatus::Clean
        } else {
            CheckStatus::Failing(self.severity)
        }
    }
}

/// A rule holding errors is never neutral
fn failing_severity(severity: Severity) -> Severity {
    severity.max(Severity::Warning)
}

/// A single-identifier subject that no longer resolves
fn is_stale(scene: &dyn SceneAdapter, subject: &Subject) -> bool {
    subject.primary().is_some_and(|id| !scene.exists(id))
}
