//! Animation rules

use super::{all_nodes, delete_subject, local_nodes, nodes_where};
use crate::error::{RemediationError, SceneError};
use crate::rules::check::{Detection, Remedy, Rule, RuleInfo};
use crate::rules::subject::Subject;
use crate::scene::{plug, Direction, NodeFilter, SceneAdapter, Scope};

const CATEGORY: &str = "Animation";

pub fn rules() -> Vec<Box<dyn Rule>> {
    vec![
        Box::new(UnusedAnimation::new()),
        Box::new(ComponentAnimation::new()),
    ]
}

/// Animation curves whose output drives nothing
pub struct UnusedAnimation {
    info: RuleInfo,
}

impl UnusedAnimation {
    pub fn new() -> Self {
        Self {
            info: RuleInfo::new(
                "animation/unused-animation",
                "Unused Animation",
                "{count} animation curve(s) are unused",
            )
            .with_category(CATEGORY)
            .selectable()
            .with_documentation(
                "Animation curves with a disconnected output. Fixing deletes them.",
            ),
        }
    }
}

impl Default for UnusedAnimation {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for UnusedAnimation {
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
                .connections(&plug(curve, "output"), Direction::Outgoing)?
                .is_empty())
        }))
    }
}

impl Remedy for UnusedAnimation {
    fn remediate(
        &self,
        scene: &mut dyn SceneAdapter,
        subject: &Subject,
    ) -> Result<(), RemediationError> {
        delete_subject(scene, subject)
    }
}

/// Animation curves driving mesh components
pub struct ComponentAnimation {
    info: RuleInfo,
}

impl ComponentAnimation {
    pub fn new() -> Self {
        Self {
            info: RuleInfo::new(
                "animation/component-animation",
                "Component Animation",
                "{count} animation curve(s) are connected to a shape",
            )
            .with_category(CATEGORY)
            .selectable()
            .with_documentation(
                "Animation curves keyed on mesh points (`.pnts`). Fixing deletes them.",
            ),
        }
    }
}

impl Default for ComponentAnimation {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for ComponentAnimation {
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

        let mut curves = Vec::new();
        for mesh in meshes {
            for connection in scene.connections(&plug(&mesh, "pnts"), Direction::Incoming)? {
                let source = connection.source_node();
                if scene.is_type(source, "animCurve")? && !curves.iter().any(|c| c == source) {
                    curves.push(source.to_string());
                }
            }
        }

        Ok(all_nodes(curves))
    }
}

impl Remedy for ComponentAnimation {
    fn remediate(
        &self,
        scene: &mut dyn SceneAdapter,
        subject: &Subject,
    ) -> Result<(), RemediationError> {
        delete_subject(scene, subject)
    }
}
