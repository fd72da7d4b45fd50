//! Modelling rules

use super::{all_nodes, delete_subject, local_nodes};
use crate::error::{RemediationError, SceneError};
use crate::rules::check::{Detection, Remedy, Rule, RuleInfo};
use crate::rules::subject::Subject;
use crate::scene::{NodeFilter, SceneAdapter, Scope};

pub fn rules() -> Vec<Box<dyn Rule>> {
    vec![Box::new(Animation::new())]
}

/// Any animation curve in a model
pub struct Animation {
    info: RuleInfo,
}

impl Animation {
    pub fn new() -> Self {
        Self {
            info: RuleInfo::new(
                "modelling/animation",
                "Animation",
                "{count} animation curve(s) in the scene",
            )
            .with_category("Modelling")
            .selectable()
            .with_documentation("Models are delivered static. Fixing deletes every curve."),
        }
    }
}

impl Default for Animation {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for Animation {
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
        Ok(all_nodes(local_nodes(
            scene,
            &NodeFilter::of_type("animCurve"),
            scope,
        )?))
    }
}

impl Remedy for Animation {
    fn remediate(
        &self,
        scene: &mut dyn SceneAdapter,
        subject: &Subject,
    ) -> Result<(), RemediationError> {
        delete_subject(scene, subject)
    }
}
