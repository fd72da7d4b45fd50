//! Render stats rules
//!
//! One parameterized rule per mesh render flag. A mesh fails when the flag
//! holds its error value; meshes that do not carry the attribute use the
//! renderer default and pass.

use super::{local_nodes, nodes_where, read_attribute, subject_node};
use crate::error::{RemediationError, SceneError};
use crate::rules::check::{Detection, Remedy, Rule, RuleInfo};
use crate::rules::subject::Subject;
use crate::scene::{plug, AttrValue, NodeFilter, SceneAdapter, Scope};

const CATEGORY: &str = "Render Stats";

/// `(id, name, attribute, error value, message)`
const RENDER_FLAGS: &[(&str, &str, &str, bool, &str)] = &[
    (
        "render-stats/primary-visibility",
        "Primary Visibility",
        "primaryVisibility",
        false,
        "{count} mesh(es) are not visible",
    ),
    (
        "render-stats/visible-in-refraction",
        "Visible In Refraction",
        "visibleInRefractions",
        false,
        "{count} mesh(es) are not visible in refraction",
    ),
    (
        "render-stats/visible-in-reflection",
        "Visible In Reflection",
        "visibleInReflections",
        false,
        "{count} mesh(es) are not visible in reflection",
    ),
    (
        "render-stats/cast-shadows",
        "Cast Shadows",
        "castsShadows",
        false,
        "{count} mesh(es) don't cast shadows",
    ),
    (
        "render-stats/receive-shadows",
        "Receive Shadows",
        "receiveShadows",
        false,
        "{count} mesh(es) don't receive shadows",
    ),
    (
        "render-stats/smooth-shading",
        "Smooth Shading",
        "smoothShading",
        false,
        "{count} mesh(es) are not smooth shaded",
    ),
    (
        "render-stats/double-sided",
        "Double Sided",
        "doubleSided",
        false,
        "{count} mesh(es) are not double sided",
    ),
    (
        "render-stats/opposite",
        "Opposite",
        "opposite",
        true,
        "{count} mesh(es) are set to opposite",
    ),
];

pub fn rules() -> Vec<Box<dyn Rule>> {
    RENDER_FLAGS
        .iter()
        .map(|&(id, name, attribute, error_value, message)| {
            let info = RuleInfo::new(id, name, message)
                .with_category(CATEGORY)
                .selectable();
            Box::new(AttributeToggleRule::new(info, attribute, error_value)) as Box<dyn Rule>
        })
        .collect()
}

/// Meshes whose boolean `attribute` equals `error_value`. Fixing flips it.
pub struct AttributeToggleRule {
    info: RuleInfo,
    attribute: String,
    error_value: bool,
}

impl AttributeToggleRule {
    pub fn new(info: RuleInfo, attribute: impl Into<String>, error_value: bool) -> Self {
        let attribute = attribute.into();
        let info = info.with_documentation(format!(
            "Meshes with `{attribute}` set to {error_value}. Fixing sets it to {}.",
            !error_value
        ));
        Self {
            info,
            attribute,
            error_value,
        }
    }
}

impl Rule for AttributeToggleRule {
    fn info(&self) -> &RuleInfo {
        &self.info
    }

    fn remedy(&self) -> Option<&dyn Remedy> {
        Some(self)
    }

    fn detect<'a>(
        &'a self,
        scene: &'a dyn SceneAdapter,
        scope: Scope,
    ) -> Result<Detection<'a>, SceneError> {
        let meshes = local_nodes(scene, &NodeFilter::of_type("mesh"), scope)?;
        Ok(nodes_where(meshes, move |mesh| {
            let value = read_attribute(scene, &plug(mesh, &self.attribute))?;
            Ok(value.and_then(|v| v.as_bool()) == Some(self.error_value))
        }))
    }
}

impl Remedy for AttributeToggleRule {
    fn remediate(
        &self,
        scene: &mut dyn SceneAdapter,
        subject: &Subject,
    ) -> Result<(), RemediationError> {
        let mesh = subject_node(subject)?;
        scene.set_attribute(&plug(mesh, &self.attribute), AttrValue::Bool(!self.error_value))?;
        Ok(())
    }
}
