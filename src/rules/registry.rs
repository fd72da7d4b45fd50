//! Rule registry
//!
//! Rules are registered from an explicit table, so the registration order is
//! the execution and presentation order. Some rules are declared after the
//! rules they conceptually build on, which makes the order part of the
//! contract.

use std::sync::Arc;
use tracing::debug;

use super::categories::builtin_rules;
use super::check::{Check, Rule, RuleId};
use crate::config::Config;
use crate::error::QaError;

/// Registry holding every registered check, in registration order
#[derive(Debug, Default)]
pub struct RuleRegistry {
    checks: Vec<Check>,
}

impl RuleRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self { checks: Vec::new() }
    }

    fn next_id(&self) -> RuleId {
        RuleId(self.checks.last().map_or(0, |c| c.ordinal().index() + 1))
    }

    /// Append a rule, returning its ordinal
    pub fn register(&mut self, rule: Box<dyn Rule>) -> RuleId {
        let id = self.next_id();
        self.checks.push(Check::new(id, rule));
        id
    }

    /// Create registry with all built-in rules and default options
    pub fn standard() -> Self {
        let mut registry = Self::new();
        for rule in builtin_rules(&Config::default()) {
            registry.register(rule);
        }
        registry
    }

    /// Create registry from configuration.
    ///
    /// Disabled rules are left out; the remaining ones keep the ordinal of
    /// their position in the built-in table. Severity overrides and ignore
    /// globs are applied to every check.
    pub fn from_config(config: &Config) -> Result<Self, QaError> {
        let ignore = config.ignore_set()?.map(Arc::new);
        let mut checks = Vec::new();

        for (index, rule) in builtin_rules(config).into_iter().enumerate() {
            let id = rule.info().id.clone();
            if !config.is_rule_enabled(&id) {
                debug!(rule = %id, "Rule disabled by configuration");
                continue;
            }

            let mut check = Check::new(RuleId(index), rule);
            if let Some(severity) = config.rule_severity(&id)? {
                check = check.with_severity(severity);
            }
            if let Some(ignore) = &ignore {
                check = check.with_ignore(Arc::clone(ignore));
            }
            checks.push(check);
        }

        Ok(Self { checks })
    }

    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    /// Checks in registration order
    pub fn iter(&self) -> impl Iterator<Item = &Check> {
        self.checks.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Check> {
        self.checks.iter_mut()
    }

    fn position(&self, id: RuleId) -> Option<usize> {
        self.checks
            .binary_search_by_key(&id, |check| check.ordinal())
            .ok()
    }

    pub fn get(&self, id: RuleId) -> Option<&Check> {
        self.position(id).map(|i| &self.checks[i])
    }

    pub fn get_mut(&mut self, id: RuleId) -> Option<&mut Check> {
        self.position(id).map(move |i| &mut self.checks[i])
    }

    /// Look a check up by its slug
    pub fn id_of(&self, rule_id: &str) -> Option<RuleId> {
        self.checks
            .iter()
            .find(|c| c.id() == rule_id)
            .map(Check::ordinal)
    }

    /// Look a check up by its slug, failing with [`QaError::UnknownRule`]
    pub fn find_by_id(&self, rule_id: &str) -> Result<&Check, QaError> {
        self.checks
            .iter()
            .find(|c| c.id() == rule_id)
            .ok_or_else(|| QaError::UnknownRule(rule_id.to_string()))
    }

    /// Ordinals in registration order
    pub fn ids(&self) -> Vec<RuleId> {
        self.checks.iter().map(Check::ordinal).collect()
    }

    /// Scope every check's detection to the host selection
    pub fn restrict_to_selection(&mut self, restrict: bool) {
        for check in &mut self.checks {
            check.set_restrict_to_selection(restrict);
        }
    }
}
