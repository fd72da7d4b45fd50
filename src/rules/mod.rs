//! Rules module - Audit rules, their registry and evaluation engine
//!
//! - [`check`] - The rule contract and the stateful check around it
//! - [`registry`] - Ordered registration table
//! - [`index`] - Category and collection views over the registry
//! - [`engine`] - Batch find and fix with progress and cancellation
//! - [`results`] - Audit snapshot for reporting
//! - [`categories`] - Built-in rules

pub mod categories;
pub mod check;
pub mod engine;
pub mod index;
pub mod registry;
pub mod results;
pub mod subject;

#[cfg(test)]
pub(crate) mod testing;

pub use check::{
    Check, CheckStatus, Detection, FixFailure, FixOutcome, Remedy, Rule, RuleId, RuleInfo,
};
pub use engine::{CancellationFlag, ExecutionEngine, FindReport, FindStatus, FixReport};
pub use index::{CategoryIndex, Collection, CollectionIndex, ResolvedView};
pub use registry::RuleRegistry;
pub use results::{AuditResults, Severity};
pub use subject::{ErrorList, Subject};
