//! Built-in rule categories
//!
//! Each submodule holds the rule bodies of one category. [`builtin_rules`] is
//! the registration table: its order is the execution and presentation order.

pub mod animation;
pub mod geometry;
pub mod modelling;
pub mod render_layers;
pub mod render_stats;
pub mod rigging;
pub mod scene;
pub mod shaders;
pub mod skinning;
pub mod textures;
pub mod uv;

use super::check::{Detection, Rule};
use super::subject::Subject;
use crate::config::Config;
use crate::error::{RemediationError, SceneError};
use crate::scene::{remove_referenced, AttrValue, NodeFilter, SceneAdapter, Scope};

/// Every built-in rule, in registration order
pub fn builtin_rules(config: &Config) -> Vec<Box<dyn Rule>> {
    let mut rules: Vec<Box<dyn Rule>> = Vec::new();

    rules.extend(scene::rules(config));
    rules.extend(animation::rules());
    rules.extend(modelling::rules());
    rules.extend(geometry::rules());
    rules.extend(uv::rules());
    rules.extend(rigging::rules());
    rules.extend(skinning::rules());
    rules.extend(shaders::rules());
    rules.extend(textures::rules(config));
    rules.extend(render_layers::rules());
    // Render stats come last, they only make sense once shapes are settled
    rules.extend(render_stats::rules());

    rules
}

/// Scoped listing without referenced content
pub(crate) fn local_nodes(
    scene: &dyn SceneAdapter,
    filter: &NodeFilter,
    scope: Scope,
) -> Result<Vec<String>, SceneError> {
    let nodes = scene.list(filter, scope)?;
    Ok(remove_referenced(scene, nodes).collect())
}

/// Lazily report the nodes for which `keep` holds
pub(crate) fn nodes_where<'a, F>(nodes: Vec<String>, mut keep: F) -> Detection<'a>
where
    F: FnMut(&str) -> Result<bool, SceneError> + 'a,
{
    Box::new(
        nodes
            .into_iter()
            .filter_map(move |node| match keep(&node) {
                Ok(true) => Some(Ok(Subject::node(node))),
                Ok(false) => None,
                Err(e) => Some(Err(e)),
            }),
    )
}

/// Report every node of the list
pub(crate) fn all_nodes<'a>(nodes: Vec<String>) -> Detection<'a> {
    Box::new(nodes.into_iter().map(|node| Ok(Subject::node(node))))
}

/// Read a plug, `None` when the node does not carry the attribute
pub(crate) fn read_attribute(
    scene: &dyn SceneAdapter,
    plug: &str,
) -> Result<Option<AttrValue>, SceneError> {
    match scene.get_attribute(plug) {
        Ok(value) => Ok(Some(value)),
        Err(SceneError::MissingAttribute { .. }) => Ok(None),
        Err(e) => Err(e),
    }
}

/// The node a single-node subject points at
pub(crate) fn subject_node(subject: &Subject) -> Result<&str, RemediationError> {
    match subject {
        Subject::Node(node) => Ok(node),
        other => Err(RemediationError::Unfixable(format!(
            "expected a node, got {other}"
        ))),
    }
}

pub(crate) fn delete_subject(
    scene: &mut dyn SceneAdapter,
    subject: &Subject,
) -> Result<(), RemediationError> {
    scene.delete(subject_node(subject)?)?;
    Ok(())
}
