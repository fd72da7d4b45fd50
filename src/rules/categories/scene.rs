//! Scene rules
//!
//! Naming, namespaces and leftover nodes that carry no data:
//! - Default and non-conventional names
//! - Names shared between nodes
//! - Unknown nodes, disconnected intermediate shapes and group ids
//! - Empty transforms and display layers

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashMap;

use super::{all_nodes, delete_subject, local_nodes, nodes_where, subject_node};
use crate::config::Config;
use crate::error::{RemediationError, SceneError};
use crate::rules::check::{Detection, Remedy, Rule, RuleInfo};
use crate::rules::results::Severity;
use crate::rules::subject::Subject;
use crate::scene::{Direction, NodeFilter, SceneAdapter, Scope};
use crate::utils::naming::{follows_naming_convention, to_naming_convention};
use crate::utils::path::{base_name, depth, namespace, root_name};

const CATEGORY: &str = "Scene";

lazy_static! {
    static ref DEFAULT_NAME: Regex = Regex::new(concat!(
        "^(?:set|locator|imagePlane|plane|Text|distanceDimension|curve|camera|",
        "volumeLight|areaLight|spotLight|pointLight|directionalLight|ambientLight|",
        "pSolid|pHelix|nurbsSquare|nurbsCircle|cone|box|sphere|group|nurbsTorus|",
        "nurbsPlane|nurbsCone|nurbsCylinder|nurbsCube|nurbsSphere|pPipe|pPyramid|",
        "pTorus|pPlane|pCone|pCylinder|pCube|pSphere|null|Char)"
    ))
    .unwrap();
}

pub fn rules(config: &Config) -> Vec<Box<dyn Rule>> {
    vec![
        Box::new(DefaultNames::new(&config.naming.extra_default_names)),
        Box::new(NamingConvention::new(&config.naming.node_types)),
        Box::new(UniqueNames::new()),
        Box::new(UnknownNodes::new()),
        Box::new(NotConnectedIntermediateShapes::new()),
        Box::new(NotConnectedGroupIds::new()),
        Box::new(EmptyTransforms::new()),
        Box::new(EmptyDisplayLayers::new()),
        Box::new(NonReferencedNamespaces::new()),
    ]
}

/// Transforms whose name starts with a name the host hands out by default
pub struct DefaultNames {
    info: RuleInfo,
    extra: Vec<String>,
}

impl DefaultNames {
    pub fn new(extra: &[String]) -> Self {
        Self {
            info: RuleInfo::new(
                "scene/default-names",
                "Default Names",
                "{count} transform(s) have a default name",
            )
            .with_severity(Severity::Warning)
            .with_category(CATEGORY)
            .selectable()
            .with_documentation(
                "Transforms starting with a name the host generates (pCube, group, \
                 locator...) were never named by hand. Rename them.",
            ),
            extra: extra.to_vec(),
        }
    }

    fn is_default(&self, node: &str) -> bool {
        let name = root_name(node);
        DEFAULT_NAME.is_match(name) || self.extra.iter().any(|prefix| name.starts_with(prefix))
    }
}

impl Rule for DefaultNames {
    fn info(&self) -> &RuleInfo {
        &self.info
    }

    fn detect<'a>(
        &'a self,
        scene: &'a dyn SceneAdapter,
        scope: Scope,
    ) -> Result<Detection<'a>, SceneError> {
        let transforms = local_nodes(scene, &NodeFilter::of_type("transform"), scope)?;
        Ok(nodes_where(transforms, move |node| Ok(self.is_default(node))))
    }
}

/// Nodes not named in lower case words split by `_`
pub struct NamingConvention {
    info: RuleInfo,
    node_types: Vec<String>,
}

impl NamingConvention {
    pub fn new(node_types: &[String]) -> Self {
        Self {
            info: RuleInfo::new(
                "scene/naming-convention",
                "Naming Convention",
                "{count} node(s) don't follow the naming convention",
            )
            .with_severity(Severity::Warning)
            .with_category(CATEGORY)
            .selectable()
            .with_documentation(
                "Names are lower case words separated by underscores. Fixing renames \
                 the node, splitting camel case and digit runs into words.",
            ),
            node_types: node_types.to_vec(),
        }
    }
}

impl Rule for NamingConvention {
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
        let filter = NodeFilter::of_types(self.node_types.iter().cloned());
        let mut nodes = local_nodes(scene, &filter, scope)?;
        // Deepest first, so renaming never invalidates a pending path
        nodes.sort_by_key(|node| std::cmp::Reverse(depth(node)));
        Ok(nodes_where(nodes, |node| Ok(!follows_naming_convention(node))))
    }
}

impl Remedy for NamingConvention {
    fn remediate(
        &self,
        scene: &mut dyn SceneAdapter,
        subject: &Subject,
    ) -> Result<(), RemediationError> {
        let node = subject_node(subject)?;
        let name = to_naming_convention(node);
        if name.is_empty() {
            return Err(RemediationError::Unfixable(format!(
                "{node} has no usable name"
            )));
        }
        scene.rename(node, &name)?;
        Ok(())
    }
}

/// Transforms sharing their name with another node
pub struct UniqueNames {
    info: RuleInfo,
}

impl UniqueNames {
    pub fn new() -> Self {
        Self {
            info: RuleInfo::new(
                "scene/unique-names",
                "Unique Names",
                "{count} transform(s) don't have a unique name",
            )
            .with_category(CATEGORY)
            .selectable()
            .with_documentation(
                "Every transform must be addressable by its short name. Fixing \
                 appends the first free `_001` style suffix.",
            ),
        }
    }
}

impl Default for UniqueNames {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for UniqueNames {
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
        let mut counts: HashMap<String, usize> = HashMap::new();
        for node in scene.list(&NodeFilter::any(), Scope::All)? {
            *counts.entry(root_name(&node).to_string()).or_default() += 1;
        }

        let mut transforms = local_nodes(scene, &NodeFilter::of_type("transform"), scope)?;
        transforms.sort_by_key(|node| std::cmp::Reverse(depth(node)));
        Ok(nodes_where(transforms, move |node| {
            Ok(counts.get(root_name(node)).copied().unwrap_or(0) > 1)
        }))
    }
}

impl Remedy for UniqueNames {
    fn remediate(
        &self,
        scene: &mut dyn SceneAdapter,
        subject: &Subject,
    ) -> Result<(), RemediationError> {
        let node = subject_node(subject)?;
        let root = root_name(node);

        let name = (1..1000)
            .map(|i| format!("{root}_{i:03}"))
            .find(|candidate| !scene.exists(candidate))
            .ok_or_else(|| {
                RemediationError::Unfixable(format!("no free suffix left for {root}"))
            })?;

        scene.rename(node, &name)?;
        Ok(())
    }
}

/// Nodes of a type the host could not load
pub struct UnknownNodes {
    info: RuleInfo,
}

impl UnknownNodes {
    pub fn new() -> Self {
        Self {
            info: RuleInfo::new("scene/unknown-nodes", "Unknown Nodes", "{count} unknown node(s)")
                .with_category(CATEGORY)
                .selectable()
                .with_documentation(
                    "Unknown nodes come from plugins that are not loaded. Fixing \
                     unlocks and deletes them.",
                ),
        }
    }
}

impl Default for UnknownNodes {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for UnknownNodes {
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
            &NodeFilter::of_type("unknown"),
            scope,
        )?))
    }
}

impl Remedy for UnknownNodes {
    fn remediate(
        &self,
        scene: &mut dyn SceneAdapter,
        subject: &Subject,
    ) -> Result<(), RemediationError> {
        let node = subject_node(subject)?;
        if scene.is_locked(node)? {
            scene.set_locked(node, false)?;
        }
        scene.delete(node)?;
        Ok(())
    }
}

/// Intermediate shapes nothing reads from or writes to
pub struct NotConnectedIntermediateShapes {
    info: RuleInfo,
}

impl NotConnectedIntermediateShapes {
    pub fn new() -> Self {
        Self {
            info: RuleInfo::new(
                "scene/not-connected-intermediate-shapes",
                "Not Connected Intermediate Shapes",
                "{count} intermediate shape(s) are not connected",
            )
            .with_category(CATEGORY)
            .selectable(),
        }
    }
}

impl Default for NotConnectedIntermediateShapes {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for NotConnectedIntermediateShapes {
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
        let shapes = local_nodes(scene, &NodeFilter::of_type("shape").intermediate(true), scope)?;
        Ok(nodes_where(shapes, move |shape| {
            Ok(scene.connections(shape, Direction::Both)?.is_empty())
        }))
    }
}

impl Remedy for NotConnectedIntermediateShapes {
    fn remediate(
        &self,
        scene: &mut dyn SceneAdapter,
        subject: &Subject,
    ) -> Result<(), RemediationError> {
        delete_subject(scene, subject)
    }
}

pub struct NotConnectedGroupIds {
    info: RuleInfo,
}

impl NotConnectedGroupIds {
    pub fn new() -> Self {
        Self {
            info: RuleInfo::new(
                "scene/not-connected-group-ids",
                "Not Connected Group Ids",
                "{count} group id(s) are not connected",
            )
            .with_category(CATEGORY)
            .selectable(),
        }
    }
}

impl Default for NotConnectedGroupIds {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for NotConnectedGroupIds {
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
        let group_ids = local_nodes(scene, &NodeFilter::of_type("groupId"), scope)?;
        Ok(nodes_where(group_ids, move |node| {
            Ok(scene.connections(node, Direction::Both)?.is_empty())
        }))
    }
}

impl Remedy for NotConnectedGroupIds {
    fn remediate(
        &self,
        scene: &mut dyn SceneAdapter,
        subject: &Subject,
    ) -> Result<(), RemediationError> {
        delete_subject(scene, subject)
    }
}

/// Transforms with no children and no connections beyond layer membership
pub struct EmptyTransforms {
    info: RuleInfo,
}

impl EmptyTransforms {
    pub fn new() -> Self {
        Self {
            info: RuleInfo::new(
                "scene/empty-transforms",
                "Empty Transforms",
                "{count} transform(s) are empty",
            )
            .with_category(CATEGORY)
            .selectable()
            .with_documentation(
                "A transform is empty when it has no children left once empty \
                 children are discounted, and is connected to nothing but a display \
                 or render layer. Fixing deletes it.",
            ),
        }
    }
}

impl Default for EmptyTransforms {
    fn default() -> Self {
        Self::new()
    }
}

fn is_empty_transform(
    scene: &dyn SceneAdapter,
    transform: &str,
    empty: &[String],
) -> Result<bool, SceneError> {
    let has_children = scene
        .children(transform)?
        .iter()
        .any(|child| !empty.contains(child));
    if has_children || scene.node_type(transform)? != "transform" {
        return Ok(false);
    }

    let connections = scene.connections(transform, Direction::Both)?;
    match connections.as_slice() {
        [] => Ok(true),
        [connection] => {
            let other = if connection.source_node() == transform {
                connection.destination_node()
            } else {
                connection.source_node()
            };
            let other_type = scene.node_type(other)?;
            Ok(other_type == "displayLayer" || other_type == "renderLayer")
        }
        _ => Ok(false),
    }
}

impl Rule for EmptyTransforms {
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
        let mut transforms = local_nodes(scene, &NodeFilter::of_type("transform"), scope)?;
        // Children sort after their parents, reversed they come first
        transforms.sort();
        transforms.reverse();

        let mut empty: Vec<String> = Vec::new();
        Ok(nodes_where(transforms, move |transform| {
            let is_empty = is_empty_transform(scene, transform, &empty)?;
            if is_empty {
                empty.push(transform.to_string());
            }
            Ok(is_empty)
        }))
    }
}

impl Remedy for EmptyTransforms {
    fn remediate(
        &self,
        scene: &mut dyn SceneAdapter,
        subject: &Subject,
    ) -> Result<(), RemediationError> {
        delete_subject(scene, subject)
    }
}

/// Display layers without members
pub struct EmptyDisplayLayers {
    info: RuleInfo,
}

impl EmptyDisplayLayers {
    pub fn new() -> Self {
        Self {
            info: RuleInfo::new(
                "scene/empty-display-layers",
                "Empty Display Layers",
                "{count} display layer(s) are empty",
            )
            .with_category(CATEGORY)
            .selectable(),
        }
    }
}

impl Default for EmptyDisplayLayers {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for EmptyDisplayLayers {
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
        let layers = local_nodes(scene, &NodeFilter::of_type("displayLayer"), scope)?;
        Ok(nodes_where(layers, move |layer| {
            if layer.ends_with("defaultLayer") {
                return Ok(false);
            }
            Ok(scene.connections(layer, Direction::Outgoing)?.is_empty())
        }))
    }
}

impl Remedy for EmptyDisplayLayers {
    fn remediate(
        &self,
        scene: &mut dyn SceneAdapter,
        subject: &Subject,
    ) -> Result<(), RemediationError> {
        delete_subject(scene, subject)
    }
}

/// Nodes carrying a namespace that does not come from a reference
pub struct NonReferencedNamespaces {
    info: RuleInfo,
}

impl NonReferencedNamespaces {
    pub fn new() -> Self {
        Self {
            info: RuleInfo::new(
                "scene/non-referenced-namespaces",
                "Non Referenced Namespaces",
                "{count} node(s) have a non-referenced namespace",
            )
            .with_category(CATEGORY)
            .with_documentation(
                "Namespaces should only come from referenced files. Fixing strips \
                 the namespace from the node name.",
            ),
        }
    }
}

impl Default for NonReferencedNamespaces {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for NonReferencedNamespaces {
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
        let mut nodes = local_nodes(scene, &NodeFilter::any(), scope)?;
        nodes.sort_by_key(|node| std::cmp::Reverse(depth(node)));
        Ok(nodes_where(nodes, |node| Ok(namespace(node).is_some())))
    }
}

impl Remedy for NonReferencedNamespaces {
    fn remediate(
        &self,
        scene: &mut dyn SceneAdapter,
        subject: &Subject,
    ) -> Result<(), RemediationError> {
        let node = subject_node(subject)?;
        scene.rename(node, base_name(node))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::categories::test_support::{find_and_fix, found, nodes};
    use crate::scene::{AttrValue, MemoryScene, NodeSpec};
    use pretty_assertions::assert_eq;

    fn scene_with(specs: Vec<NodeSpec>) -> MemoryScene {
        let mut scene = MemoryScene::new();
        for spec in specs {
            scene.add_spec(spec).unwrap();
        }
        scene
    }

    #[test]
    fn test_default_names() {
        let scene = scene_with(vec![
            NodeSpec::new("pCube1", "transform"),
            NodeSpec::new("group3", "transform"),
            NodeSpec::new("body_geo", "transform"),
            NodeSpec::new("pCubeShape1", "mesh").with_parent("pCube1"),
        ]);

        let subjects = found(DefaultNames::new(&[]), &scene);
        assert_eq!(nodes(&subjects), vec!["|pCube1", "|group3"]);
    }

    #[test]
    fn test_default_names_extra_prefixes() {
        let scene = scene_with(vec![
            NodeSpec::new("tmp_geo", "transform"),
            NodeSpec::new("body_geo", "transform"),
        ]);

        let subjects = found(DefaultNames::new(&["tmp".to_string()]), &scene);
        assert_eq!(nodes(&subjects), vec!["|tmp_geo"]);
    }

    #[test]
    fn test_naming_convention_renames_deepest_first() {
        let mut scene = scene_with(vec![
            NodeSpec::new("leftArm", "transform"),
            NodeSpec::new("handCtrl", "transform").with_parent("leftArm"),
            NodeSpec::new("spine_01", "joint"),
        ]);

        let subjects = found(NamingConvention::new(&["transform".into()]), &scene);
        assert_eq!(nodes(&subjects), vec!["|leftArm|handCtrl", "|leftArm"]);

        let check = find_and_fix(NamingConvention::new(&["transform".into()]), &mut scene);
        assert!(check.errors().is_empty());
        assert!(scene.exists("|left_arm|hand_ctrl"));
        assert!(scene.exists("|spine_01"));
    }

    #[test]
    fn test_unique_names_renamed_with_suffix() {
        let mut scene = scene_with(vec![
            NodeSpec::new("a", "transform"),
            NodeSpec::new("b", "transform"),
            NodeSpec::new("ctrl", "transform").with_parent("a"),
            NodeSpec::new("ctrl", "transform").with_parent("b"),
            NodeSpec::new("ctrl_001", "transform"),
        ]);

        let subjects = found(UniqueNames::new(), &scene);
        assert_eq!(nodes(&subjects), vec!["|a|ctrl", "|b|ctrl"]);

        find_and_fix(UniqueNames::new(), &mut scene);
        assert!(scene.exists("|a|ctrl_002"));
        assert!(scene.exists("|b|ctrl_003"));
    }

    #[test]
    fn test_unknown_nodes_unlocked_and_deleted() {
        let mut scene = scene_with(vec![
            NodeSpec::new("mysteryNode", "unknown").locked(),
            NodeSpec::new("pCube1", "transform"),
        ]);

        let check = find_and_fix(UnknownNodes::new(), &mut scene);
        assert!(check.errors().is_empty());
        assert!(!scene.exists("mysteryNode"));
        assert!(scene.exists("pCube1"));
    }

    #[test]
    fn test_not_connected_intermediate_shapes() {
        let mut scene = scene_with(vec![
            NodeSpec::new("body", "transform"),
            NodeSpec::new("bodyShape", "mesh").with_parent("body"),
            NodeSpec::new("bodyShapeOrig", "mesh").with_parent("body").intermediate(),
            NodeSpec::new("bodyShapeOrig1", "mesh").with_parent("body").intermediate(),
        ]);
        scene
            .connect("bodyShapeOrig.worldMesh", "bodyShape.inMesh")
            .unwrap();

        let subjects = found(NotConnectedIntermediateShapes::new(), &scene);
        assert_eq!(nodes(&subjects), vec!["|body|bodyShapeOrig1"]);

        find_and_fix(NotConnectedIntermediateShapes::new(), &mut scene);
        assert!(!scene.exists("bodyShapeOrig1"));
        assert!(scene.exists("bodyShapeOrig"));
    }

    #[test]
    fn test_not_connected_group_ids() {
        let mut scene = scene_with(vec![
            NodeSpec::new("groupId1", "groupId"),
            NodeSpec::new("groupId2", "groupId"),
            NodeSpec::new("set1", "objectSet"),
        ]);
        scene.connect("groupId2.groupId", "set1.groupNodes").unwrap();

        let subjects = found(NotConnectedGroupIds::new(), &scene);
        assert_eq!(nodes(&subjects), vec!["|groupId1"]);
    }

    #[test]
    fn test_empty_transforms_discount_empty_children() {
        let mut scene = scene_with(vec![
            NodeSpec::new("grp", "transform"),
            NodeSpec::new("inner", "transform").with_parent("grp"),
            NodeSpec::new("layered", "transform"),
            NodeSpec::new("layer1", "displayLayer"),
            NodeSpec::new("body", "transform"),
            NodeSpec::new("bodyShape", "mesh").with_parent("body"),
            NodeSpec::new("bone", "joint"),
        ]);
        scene
            .connect("layer1.drawInfo", "layered.drawOverride")
            .unwrap();

        let subjects = found(EmptyTransforms::new(), &scene);
        assert_eq!(nodes(&subjects), vec!["|layered", "|grp|inner", "|grp"]);

        let check = find_and_fix(EmptyTransforms::new(), &mut scene);
        assert!(check.errors().is_empty());
        assert!(!scene.exists("grp"));
        assert!(scene.exists("body"));
        assert!(scene.exists("bone"));
    }

    #[test]
    fn test_empty_transforms_keep_connected() {
        let mut scene = scene_with(vec![
            NodeSpec::new("ctrl", "transform"),
            NodeSpec::new("driven", "transform"),
        ]);
        scene.connect("ctrl.translateX", "driven.translateX").unwrap();

        assert!(found(EmptyTransforms::new(), &scene).is_empty());
    }

    #[test]
    fn test_empty_display_layers() {
        let mut scene = scene_with(vec![
            NodeSpec::new("defaultLayer", "displayLayer"),
            NodeSpec::new("props", "displayLayer"),
            NodeSpec::new("chars", "displayLayer"),
            NodeSpec::new("hero", "transform"),
        ]);
        scene.connect("chars.drawInfo", "hero.drawOverride").unwrap();

        let check = find_and_fix(EmptyDisplayLayers::new(), &mut scene);
        assert!(check.errors().is_empty());
        assert!(!scene.exists("props"));
        assert!(scene.exists("chars"));
        assert!(scene.exists("defaultLayer"));
    }

    #[test]
    fn test_non_referenced_namespaces_stripped() {
        let mut scene = scene_with(vec![
            NodeSpec::new("rig:root", "transform"),
            NodeSpec::new("rig:hip", "joint").with_parent("rig:root"),
            NodeSpec::new("anim:root", "transform").referenced(),
            NodeSpec::new("plain", "transform")
                .with_attribute("visibility", AttrValue::Bool(true)),
        ]);

        let subjects = found(NonReferencedNamespaces::new(), &scene);
        assert_eq!(nodes(&subjects), vec!["|rig:root|rig:hip", "|rig:root"]);

        find_and_fix(NonReferencedNamespaces::new(), &mut scene);
        assert!(scene.exists("|root|hip"));
        assert!(scene.exists("anim:root"));
    }
}
