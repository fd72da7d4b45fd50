//! Shader assignment rules
//!
//! Both rules only report: picking the right material is an artist decision.

use super::{all_nodes, local_nodes, nodes_where};
use crate::error::SceneError;
use crate::rules::check::{Detection, Rule, RuleInfo};
use crate::scene::{Direction, NodeFilter, SceneAdapter, Scope};

const CATEGORY: &str = "Shaders";

/// Shading group every new mesh is assigned to
pub const INITIAL_SHADING_GROUP: &str = "initialShadingGroup";

pub fn rules() -> Vec<Box<dyn Rule>> {
    vec![
        Box::new(NoShadingGroup::new()),
        Box::new(InitialShadingGroup::new()),
    ]
}

/// Meshes not assigned to any shading group
pub struct NoShadingGroup {
    info: RuleInfo,
}

impl NoShadingGroup {
    pub fn new() -> Self {
        Self {
            info: RuleInfo::new(
                "shaders/no-shading-group",
                "No Shading Group Assignment",
                "{count} mesh(es) are not connected to any shading group",
            )
            .with_category(CATEGORY)
            .selectable(),
        }
    }
}

impl Default for NoShadingGroup {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for NoShadingGroup {
    fn info(&self) -> &RuleInfo {
        &self.info
    }

    fn detect<'a>(
        &'a self,
        scene: &'a dyn SceneAdapter,
        scope: Scope,
    ) -> Result<Detection<'a>, SceneError> {
        let meshes = local_nodes(scene, &NodeFilter::of_type("mesh").intermediate(false), scope)?;
        Ok(nodes_where(meshes, move |mesh| {
            for connection in scene.connections(mesh, Direction::Both)? {
                let other = if connection.source_node() == mesh {
                    connection.destination_node()
                } else {
                    connection.source_node()
                };
                if scene.is_type(other, "shadingEngine")? {
                    return Ok(false);
                }
            }
            Ok(true)
        }))
    }
}

/// Members of the default shading group
pub struct InitialShadingGroup {
    info: RuleInfo,
}

impl InitialShadingGroup {
    pub fn new() -> Self {
        Self {
            info: RuleInfo::new(
                "shaders/initial-shading-group",
                "Initial Shading Group Assignment",
                "{count} object(s) are connected to the initial shading group",
            )
            .with_category(CATEGORY)
            .selectable()
            .with_documentation(
                "Objects still using the default material were never shaded.",
            ),
        }
    }
}

impl Default for InitialShadingGroup {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for InitialShadingGroup {
    fn info(&self) -> &RuleInfo {
        &self.info
    }

    fn detect<'a>(
        &'a self,
        scene: &'a dyn SceneAdapter,
        scope: Scope,
    ) -> Result<Detection<'a>, SceneError> {
        if !scene.exists(INITIAL_SHADING_GROUP)
            || !scene.is_type(INITIAL_SHADING_GROUP, "shadingEngine")?
        {
            return Ok(all_nodes(Vec::new()));
        }

        let candidates = local_nodes(scene, &NodeFilter::any(), scope)?;
        let mut members: Vec<String> = Vec::new();
        for connection in scene.connections(INITIAL_SHADING_GROUP, Direction::Incoming)? {
            let member = connection.source_node();
            if candidates.iter().any(|c| c == member) && !members.iter().any(|m| m == member) {
                members.push(member.to_string());
            }
        }

        Ok(all_nodes(members))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::categories::test_support::{found, nodes};
    use crate::scene::MemoryScene;
    use pretty_assertions::assert_eq;

    fn shaded_scene() -> MemoryScene {
        let mut scene = MemoryScene::new();
        scene.add_node(INITIAL_SHADING_GROUP, "shadingEngine", None).unwrap();
        scene.add_node("skinSG", "shadingEngine", None).unwrap();
        for (transform, shape) in [("head", "headShape"), ("hat", "hatShape"), ("cup", "cupShape")] {
            scene.add_node(transform, "transform", None).unwrap();
            scene.add_node(shape, "mesh", Some(transform)).unwrap();
        }
        scene
            .connect("headShape.instObjGroups[0]", "skinSG.dagSetMembers[0]")
            .unwrap();
        scene
            .connect(
                "hatShape.instObjGroups[0]",
                "initialShadingGroup.dagSetMembers[0]",
            )
            .unwrap();
        scene
    }

    #[test]
    fn test_meshes_without_shading_group() {
        let scene = shaded_scene();
        let subjects = found(NoShadingGroup::new(), &scene);
        assert_eq!(nodes(&subjects), vec!["|cup|cupShape"]);
    }

    #[test]
    fn test_initial_shading_group_members() {
        let scene = shaded_scene();
        let subjects = found(InitialShadingGroup::new(), &scene);
        assert_eq!(nodes(&subjects), vec!["|hat|hatShape"]);
    }

    #[test]
    fn test_missing_initial_shading_group_is_clean() {
        let mut scene = MemoryScene::new();
        scene.add_node("cupShape", "mesh", None).unwrap();
        assert!(found(InitialShadingGroup::new(), &scene).is_empty());
        assert!(!InitialShadingGroup::new().is_fixable());
    }
}
