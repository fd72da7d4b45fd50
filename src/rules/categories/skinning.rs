//! Skinning rules
//!
//! A skin cluster is read through its plugs:
//!
//! - `matrix[i]` is fed by the `worldMatrix` of influence `i`
//! - `outputGeometry` drives the deformed shape
//! - `weightList[v].weights[i]` holds the weight of influence `i` on vertex `v`
//! - `maxInfluences`, `maintainMaxInfluences` and `normalizeWeights` are
//!   settings on the cluster itself
//!
//! Influences carry their weight lock in `liw`.

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::BTreeMap;

use super::{local_nodes, nodes_where, read_attribute, subject_node};
use crate::error::{RemediationError, SceneError};
use crate::rules::check::{Detection, Remedy, Rule, RuleInfo};
use crate::rules::results::Severity;
use crate::rules::subject::Subject;
use crate::scene::{
    plug, split_plug, AttrValue, Connection, Direction, NodeFilter, SceneAdapter, Scope,
};

const CATEGORY: &str = "Skinning";

lazy_static! {
    static ref MATRIX: Regex = Regex::new(r"^matrix\[(\d+)\]$").unwrap();
    static ref WEIGHT: Regex = Regex::new(r"^weightList\[(\d+)\]\.weights\[(\d+)\]$").unwrap();
}

pub fn rules() -> Vec<Box<dyn Rule>> {
    vec![
        Box::new(UnusedInfluences::new()),
        Box::new(MaximumInfluences::new()),
    ]
}

/// Vertex → influence → weight
type Weights = BTreeMap<usize, BTreeMap<usize, f64>>;

/// Influence index → the connection feeding it
fn influences(
    scene: &dyn SceneAdapter,
    skin: &str,
) -> Result<BTreeMap<usize, Connection>, SceneError> {
    let mut influences = BTreeMap::new();
    for connection in scene.connections(&plug(skin, "matrix"), Direction::Incoming)? {
        let index = MATRIX
            .captures(split_plug(&connection.destination).1)
            .and_then(|c| c[1].parse::<usize>().ok());
        if let Some(index) = index {
            influences.insert(index, connection);
        }
    }
    Ok(influences)
}

fn weights(scene: &dyn SceneAdapter, skin: &str) -> Result<Weights, SceneError> {
    let mut weights = Weights::new();
    for attribute in scene.attributes(skin)? {
        let Some(captures) = WEIGHT.captures(&attribute) else {
            continue;
        };
        let (Ok(vertex), Ok(influence)) =
            (captures[1].parse::<usize>(), captures[2].parse::<usize>())
        else {
            continue;
        };
        let value = scene.get_attribute(&plug(skin, &attribute))?;
        weights
            .entry(vertex)
            .or_default()
            .insert(influence, value.as_f64().unwrap_or(0.0));
    }
    Ok(weights)
}

fn has_geometry(scene: &dyn SceneAdapter, skin: &str) -> Result<bool, SceneError> {
    Ok(!scene
        .connections(&plug(skin, "outputGeometry"), Direction::Outgoing)?
        .is_empty())
}

/// Influences without a non-zero weight on any vertex
fn unused_influences(
    scene: &dyn SceneAdapter,
    skin: &str,
) -> Result<Vec<Connection>, SceneError> {
    let weights = weights(scene, skin)?;
    Ok(influences(scene, skin)?
        .into_iter()
        .filter(|(index, _)| {
            !weights
                .values()
                .any(|vertex| vertex.get(index).is_some_and(|w| *w != 0.0))
        })
        .map(|(_, connection)| connection)
        .collect())
}

/// Skin clusters carrying influences that weigh nothing
pub struct UnusedInfluences {
    info: RuleInfo,
}

impl UnusedInfluences {
    pub fn new() -> Self {
        Self {
            info: RuleInfo::new(
                "skinning/unused-influences",
                "Unused Influences",
                "{count} skin cluster(s) contain unused influences",
            )
            .with_severity(Severity::Warning)
            .with_category(CATEGORY)
            .selectable()
            .with_documentation(
                "Skin clusters driving geometry with influences that carry no weight. \
                 Fixing removes those influences from the cluster.",
            ),
        }
    }
}

impl Default for UnusedInfluences {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for UnusedInfluences {
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
        let skins = local_nodes(scene, &NodeFilter::of_type("skinCluster"), scope)?;
        Ok(nodes_where(skins, move |skin| {
            Ok(has_geometry(scene, skin)? && !unused_influences(scene, skin)?.is_empty())
        }))
    }
}

impl Remedy for UnusedInfluences {
    fn remediate(
        &self,
        scene: &mut dyn SceneAdapter,
        subject: &Subject,
    ) -> Result<(), RemediationError> {
        let skin = subject_node(subject)?;
        for connection in unused_influences(scene, skin)? {
            scene.disconnect(&connection.source, &connection.destination)?;
        }
        Ok(())
    }
}

/// Skin clusters with vertices over their influence budget
pub struct MaximumInfluences {
    info: RuleInfo,
}

impl MaximumInfluences {
    pub fn new() -> Self {
        Self {
            info: RuleInfo::new(
                "skinning/maximum-influences",
                "Maximum Influences",
                "{count} skin cluster(s) exceed the maximum influences",
            )
            .with_category(CATEGORY)
            .selectable()
            .with_documentation(
                "Skin clusters maintaining a maximum number of influences with vertices \
                 weighted to more influences than that. Fixing zeroes the lowest \
                 weights and, when the cluster normalizes interactively, rescales the \
                 remaining unlocked weights.",
            ),
        }
    }
}

impl Default for MaximumInfluences {
    fn default() -> Self {
        Self::new()
    }
}

/// The influence budget, `None` when the cluster does not maintain one
fn max_influences(scene: &dyn SceneAdapter, skin: &str) -> Result<Option<usize>, SceneError> {
    let maintain = read_attribute(scene, &plug(skin, "maintainMaxInfluences"))?
        .and_then(|v| v.as_bool())
        .unwrap_or(false);
    if !maintain {
        return Ok(None);
    }
    Ok(read_attribute(scene, &plug(skin, "maxInfluences"))?
        .and_then(|v| v.as_f64())
        .map(|max| max.max(0.0) as usize))
}

fn normalizes(scene: &dyn SceneAdapter, skin: &str) -> Result<bool, SceneError> {
    Ok(match read_attribute(scene, &plug(skin, "normalizeWeights"))? {
        Some(AttrValue::Bool(normalize)) => normalize,
        Some(value) => value.as_f64() == Some(1.0),
        None => false,
    })
}

fn non_zero(vertex: &BTreeMap<usize, f64>) -> usize {
    vertex.values().filter(|w| **w != 0.0).count()
}

/// New weights for one vertex: the `max` heaviest influences survive.
/// Only the influences whose weight changes are returned.
fn prune(
    vertex: &BTreeMap<usize, f64>,
    max: usize,
    normalize: bool,
    locked: &dyn Fn(usize) -> bool,
) -> BTreeMap<usize, f64> {
    let mut ordered: Vec<(usize, f64)> = vertex.iter().map(|(i, w)| (*i, *w)).collect();
    ordered.sort_by(|a, b| b.1.total_cmp(&a.1));
    let (keep, remove) = ordered.split_at(max.min(ordered.len()));

    let mut changed: BTreeMap<usize, f64> = remove
        .iter()
        .filter(|(_, w)| *w != 0.0)
        .map(|(i, _)| (*i, 0.0))
        .collect();

    if normalize {
        let unlocked: Vec<(usize, f64)> =
            keep.iter().copied().filter(|(i, _)| !locked(*i)).collect();
        let scaled = if unlocked.is_empty() { keep.to_vec() } else { unlocked };
        let fixed: f64 = keep
            .iter()
            .filter(|(i, _)| !scaled.iter().any(|(s, _)| s == i))
            .map(|(_, w)| w)
            .sum();
        let total: f64 = scaled.iter().map(|(_, w)| w).sum();

        if total > 0.0 && fixed < 1.0 {
            let multiplier = (1.0 - fixed) / total;
            for (index, weight) in scaled {
                let value = weight * multiplier;
                if value != weight {
                    changed.insert(index, value);
                }
            }
        }
    }

    changed
}

impl Rule for MaximumInfluences {
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
        let skins = local_nodes(scene, &NodeFilter::of_type("skinCluster"), scope)?;
        Ok(nodes_where(skins, move |skin| {
            let Some(max) = max_influences(scene, skin)? else {
                return Ok(false);
            };
            Ok(weights(scene, skin)?
                .values()
                .any(|vertex| non_zero(vertex) > max))
        }))
    }
}

impl Remedy for MaximumInfluences {
    fn remediate(
        &self,
        scene: &mut dyn SceneAdapter,
        subject: &Subject,
    ) -> Result<(), RemediationError> {
        let skin = subject_node(subject)?;
        let Some(max) = max_influences(scene, skin)? else {
            return Ok(());
        };
        let normalize = normalizes(scene, skin)?;

        let mut locks = BTreeMap::new();
        for (index, connection) in influences(scene, skin)? {
            let lock = read_attribute(scene, &plug(connection.source_node(), "liw"))?
                .and_then(|v| v.as_bool())
                .unwrap_or(false);
            locks.insert(index, lock);
        }
        let locked = |index: usize| locks.get(&index).copied().unwrap_or(false);

        for (vertex, values) in weights(scene, skin)? {
            if non_zero(&values) <= max {
                continue;
            }
            for (influence, value) in prune(&values, max, normalize, &locked) {
                let attribute = format!("weightList[{vertex}].weights[{influence}]");
                scene.set_attribute(&plug(skin, &attribute), AttrValue::Float(value))?;
            }
        }
        Ok(())
    }
}
