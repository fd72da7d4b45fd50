//! Rigging rules

use super::{delete_subject, local_nodes, nodes_where};
use crate::error::{RemediationError, SceneError};
use crate::rules::check::{Detection, Remedy, Rule, RuleInfo};
use crate::rules::subject::Subject;
use crate::scene::{plug, Direction, NodeFilter, SceneAdapter, Scope};

pub fn rules() -> Vec<Box<dyn Rule>> {
    vec![Box::new(NonSetDrivenAnimation::new())]
}

/// Animation curves keyed on time instead of driven by another attribute.
///
/// A rig only carries set-driven curves, which read their input from a
/// driver plug.
pub struct NonSetDrivenAnimation {
    info: RuleInfo,
}

impl NonSetDrivenAnimation {
    pub fn new() -> Self {
        Self {
            info: RuleInfo::new(
                "rigging/non-set-driven-animation",
                "Non Set-Driven Animation",
                "{count} non set-driven animation curve(s) in the scene",
            )
            .with_category("Rigging")
            .selectable()
            .with_documentation(
                "Animation curves without a connected `.input` are time based keys. \
                 Fixing deletes them.",
            ),
        }
    }
}

impl Default for NonSetDrivenAnimation {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for NonSetDrivenAnimation {
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
        let curves = local_nodes(scene, &NodeFilter::of_type("animCurve"), scope)?;
        Ok(nodes_where(curves, move |curve| {
            Ok(scene
                .connections(&plug(curve, "input"), Direction::Incoming)?
                .is_empty())
        }))
    }
}

impl Remedy for NonSetDrivenAnimation {
    fn remediate(
        &self,
        scene: &mut dyn SceneAdapter,
        subject: &Subject,
    ) -> Result<(), RemediationError> {
        delete_subject(scene, subject)
    }
}
