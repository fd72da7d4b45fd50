//! UV rules

use lazy_static::lazy_static;
use regex::Regex;

use super::{local_nodes, read_attribute};
use crate::error::SceneError;
use crate::rules::check::{Detection, Rule, RuleInfo};
use crate::rules::subject::Subject;
use crate::scene::{plug, NodeFilter, SceneAdapter, Scope};

lazy_static! {
    static ref UV_SET_NAME: Regex = Regex::new(r"^uvSet\[(\d+)\]\.uvSetName$").unwrap();
}

pub fn rules() -> Vec<Box<dyn Rule>> {
    vec![Box::new(EmptyUvSets::new())]
}

/// Secondary UV sets holding no coordinates.
///
/// Reported as `mesh.uvSet[i].uvSetName` attribute subjects. The default set
/// (index 0) is never reported.
pub struct EmptyUvSets {
    info: RuleInfo,
}

impl EmptyUvSets {
    pub fn new() -> Self {
        Self {
            info: RuleInfo::new("uv/empty-uv-sets", "Empty UV Sets", "{count} empty uv set(s)")
                .with_category("UV"),
        }
    }
}

impl Default for EmptyUvSets {
    fn default() -> Self {
        Self::new()
    }
}

fn empty_sets(scene: &dyn SceneAdapter, mesh: &str) -> Result<Vec<Subject>, SceneError> {
    let mut subjects = Vec::new();
    for attribute in scene.attributes(mesh)? {
        let Some(index) = UV_SET_NAME
            .captures(&attribute)
            .and_then(|c| c[1].parse::<u32>().ok())
        else {
            continue;
        };
        if index == 0 {
            continue;
        }

        let count = read_attribute(scene, &plug(mesh, &format!("uvSet[{index}].uvCount")))?;
        if count.and_then(|c| c.as_f64()).unwrap_or(0.0) == 0.0 {
            subjects.push(Subject::attribute(plug(mesh, &attribute)));
        }
    }
    Ok(subjects)
}

impl Rule for EmptyUvSets {
    fn info(&self) -> &RuleInfo {
        &self.info
    }

    fn detect<'a>(
        &'a self,
        scene: &'a dyn SceneAdapter,
        scope: Scope,
    ) -> Result<Detection<'a>, SceneError> {
        let meshes = local_nodes(scene, &NodeFilter::of_type("mesh").intermediate(false), scope)?;
        Ok(Box::new(meshes.into_iter().flat_map(move |mesh| {
            match empty_sets(scene, &mesh) {
                Ok(subjects) => subjects.into_iter().map(Ok).collect::<Vec<_>>(),
                Err(e) => vec![Err(e)],
            }
        })))
    }
}
