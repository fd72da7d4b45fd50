//! Geometry rules

use super::{delete_subject, local_nodes, nodes_where, read_attribute};
use crate::error::{RemediationError, SceneError};
use crate::rules::check::{Detection, Remedy, Rule, RuleInfo};
use crate::rules::subject::Subject;
use crate::scene::{plug, NodeFilter, SceneAdapter, Scope};

pub fn rules() -> Vec<Box<dyn Rule>> {
    vec![Box::new(EmptyMeshes::new())]
}

/// Meshes without a single vertex
pub struct EmptyMeshes {
    info: RuleInfo,
}

impl EmptyMeshes {
    pub fn new() -> Self {
        Self {
            info: RuleInfo::new("geometry/empty-meshes", "Empty Meshes", "{count} mesh(es) are empty")
                .with_category("Geometry")
                .selectable()
                .with_documentation(
                    "Non intermediate meshes whose `vertexCount` is zero. Fixing deletes them.",
                ),
        }
    }
}

impl Default for EmptyMeshes {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for EmptyMeshes {
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
        let meshes = local_nodes(scene, &NodeFilter::of_type("mesh").intermediate(false), scope)?;
        Ok(nodes_where(meshes, move |mesh| {
            let count = read_attribute(scene, &plug(mesh, "vertexCount"))?;
            Ok(count.and_then(|c| c.as_f64()) == Some(0.0))
        }))
    }
}

impl Remedy for EmptyMeshes {
    fn remediate(
        &self,
        scene: &mut dyn SceneAdapter,
        subject: &Subject,
    ) -> Result<(), RemediationError> {
        delete_subject(scene, subject)
    }
}
