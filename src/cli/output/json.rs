//! JSON output formatting

use serde::Serialize;

use super::ReportRenderer;
use crate::error::QaError;
use crate::rules::results::{AuditResults, Severity};

pub struct JsonOutput;

impl JsonOutput {
    pub fn new() -> Self {
        Self
    }
}

impl Default for JsonOutput {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Serialize)]
struct ReportOutput<'a> {
    version: &'static str,
    summary: Summary,
    #[serde(flatten)]
    results: &'a AuditResults,
}

#[derive(Serialize)]
struct Summary {
    critical_count: usize,
    warning_count: usize,
    subject_count: usize,
    unevaluated_count: usize,
}

impl ReportRenderer for JsonOutput {
    fn render_report(&self, results: &AuditResults) -> Result<String, QaError> {
        let output = ReportOutput {
            version: env!("CARGO_PKG_VERSION"),
            summary: Summary {
                critical_count: results.count_by_state(Severity::Critical),
                warning_count: results.count_by_state(Severity::Warning),
                subject_count: results.total_subjects(),
                unevaluated_count: results.unevaluated().count(),
            },
            results,
        };

        Ok(serde_json::to_string_pretty(&output)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::index::{CategoryIndex, CollectionIndex};
    use crate::rules::registry::RuleRegistry;
    use crate::rules::testing::ScriptedRule;
    use crate::scene::MemoryScene;

    #[test]
    fn test_render_report() {
        let mut scene = MemoryScene::new();
        scene.add_node("pCube1", "transform", None).unwrap();

        let mut registry = RuleRegistry::new();
        registry.register(Box::new(
            ScriptedRule::new("scene/scripted", "Scripted", "Scene").finds(["|pCube1"]),
        ));
        let categories = CategoryIndex::categorize(&registry);
        let view = CollectionIndex::builtin().resolve("modelling", &categories);
        for check in registry.iter_mut() {
            check.find(&scene).unwrap();
        }

        let results = AuditResults::collect("hero.json", &registry, &view, false);
        let rendered = JsonOutput::new().render_report(&results).unwrap();
        let json: serde_json::Value = serde_json::from_str(&rendered).unwrap();

        assert_eq!(json["scene"], "hero.json");
        assert_eq!(json["collection"], "modelling");
        assert_eq!(json["summary"]["critical_count"], 1);
        assert_eq!(json["summary"]["subject_count"], 1);
        assert_eq!(json["rules"][0]["message"], "1 scripted issue(s)");
    }
}
