//! Rule bodies driven by a script, for unit tests

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use super::check::{Detection, Remedy, Rule, RuleInfo};
use super::results::Severity;
use super::subject::Subject;
use crate::error::{RemediationError, SceneError};
use crate::scene::{NodeFilter, SceneAdapter, Scope};

/// Rule reporting a fixed list of node subjects, or the scoped node listing.
///
/// Remediation records every attempt, fails on the configured subjects and
/// deletes the subject's node when it exists.
pub struct ScriptedRule {
    info: RuleInfo,
    subjects: Vec<Subject>,
    from_listing: bool,
    findable: bool,
    fixable: bool,
    failing: HashSet<Subject>,
    fail_after: Option<usize>,
    attempts: Arc<Mutex<Vec<Subject>>>,
}

impl ScriptedRule {
    pub fn new(id: &str, name: &str, category: &str) -> Self {
        Self {
            info: RuleInfo::new(id, name, "{count} scripted issue(s)").with_category(category),
            subjects: Vec::new(),
            from_listing: false,
            findable: true,
            fixable: false,
            failing: HashSet::new(),
            fail_after: None,
            attempts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn finds<const N: usize>(mut self, nodes: [&str; N]) -> Self {
        self.subjects = nodes.iter().map(|n| Subject::node(*n)).collect();
        self
    }

    /// Report every node the scoped listing returns
    pub fn finding_selection(mut self) -> Self {
        self.from_listing = true;
        self
    }

    pub fn with_category(mut self, category: &str) -> Self {
        self.info.categories.push(category.to_string());
        self
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.info.severity = severity;
        self
    }

    pub fn selectable(mut self) -> Self {
        self.info.selectable = true;
        self
    }

    pub fn fixable(mut self) -> Self {
        self.fixable = true;
        self
    }

    pub fn not_findable(mut self) -> Self {
        self.findable = false;
        self
    }

    pub fn failing_on<const N: usize>(mut self, nodes: [&str; N]) -> Self {
        self.failing = nodes.iter().map(|n| Subject::node(*n)).collect();
        self
    }

    /// Yield a scene error after `count` subjects
    pub fn fails_detection_after(mut self, count: usize) -> Self {
        self.fail_after = Some(count);
        self
    }

    /// Shared record of remediation calls
    pub fn attempts(&self) -> Arc<Mutex<Vec<Subject>>> {
        Arc::clone(&self.attempts)
    }
}

impl Rule for ScriptedRule {
    fn info(&self) -> &RuleInfo {
        &self.info
    }

    fn is_findable(&self) -> bool {
        self.findable
    }

    fn remedy(&self) -> Option<&dyn Remedy> {
        self.fixable.then_some(self as &dyn Remedy)
    }

    fn detect<'a>(
        &'a self,
        scene: &'a dyn SceneAdapter,
        scope: Scope,
    ) -> Result<Detection<'a>, SceneError> {
        let subjects: Vec<Subject> = if self.from_listing {
            scene
                .list(&NodeFilter::any(), scope)?
                .into_iter()
                .map(Subject::Node)
                .collect()
        } else {
            self.subjects.clone()
        };

        let items = subjects.into_iter().map(Ok);
        match self.fail_after {
            Some(count) => Ok(Box::new(items.take(count).chain(std::iter::once(Err(
                SceneError::NotFound("|scripted".to_string()),
            ))))),
            None => Ok(Box::new(items)),
        }
    }
}

impl Remedy for ScriptedRule {
    fn remediate(
        &self,
        scene: &mut dyn SceneAdapter,
        subject: &Subject,
    ) -> Result<(), RemediationError> {
        if let Ok(mut attempts) = self.attempts.lock() {
            attempts.push(subject.clone());
        }
        if self.failing.contains(subject) {
            return Err(RemediationError::Unfixable(format!("scripted failure on {subject}")));
        }
        if let Some(node) = subject.primary() {
            if scene.exists(node) {
                scene.delete(node)?;
            }
        }
        Ok(())
    }
}

/// Boxed scripted rule with no subjects
pub fn scripted(id: &str, name: &str, category: &str) -> Box<dyn Rule> {
    Box::new(ScriptedRule::new(id, name, category))
}
