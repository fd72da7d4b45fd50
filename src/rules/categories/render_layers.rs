//! Render layer rules
//!
//! A render layer override is stored as an adjustment slot on the layer:
//! the overridden scene plug feeds `layer.adjustments[i].plug` and the
//! override value leaves from `layer.adjustments[i].value`.

use super::local_nodes;
use crate::error::{RemediationError, SceneError};
use crate::rules::check::{Detection, Remedy, Rule, RuleInfo};
use crate::rules::subject::Subject;
use crate::scene::{plug, Direction, NodeFilter, SceneAdapter, Scope};

/// Layer every scene has, carrying no overrides
pub const DEFAULT_RENDER_LAYER: &str = "defaultRenderLayer";

pub fn rules() -> Vec<Box<dyn Rule>> {
    vec![Box::new(DuplicateAdjustments::new())]
}

/// The same scene plug overridden twice on one layer.
///
/// Subjects are composites of `[scene plug, layer slot plug]` for every slot
/// after the first one holding a given scene plug.
pub struct DuplicateAdjustments {
    info: RuleInfo,
}

impl DuplicateAdjustments {
    pub fn new() -> Self {
        Self {
            info: RuleInfo::new(
                "render-layers/duplicate-adjustments",
                "Duplicate Adjustments",
                "{count} duplicate renderlayer adjustment(s)",
            )
            .with_category("Render Layers")
            .with_documentation(
                "Fixing disconnects the duplicate slot and the value it drives, \
                 the first override is kept.",
            ),
        }
    }
}

impl Default for DuplicateAdjustments {
    fn default() -> Self {
        Self::new()
    }
}

fn duplicates(scene: &dyn SceneAdapter, layer: &str) -> Result<Vec<Subject>, SceneError> {
    let mut seen: Vec<String> = Vec::new();
    let mut subjects = Vec::new();

    for connection in scene.connections(&plug(layer, "adjustments"), Direction::Incoming)? {
        if seen.contains(&connection.source) {
            subjects.push(Subject::composite([connection.source, connection.destination]));
        } else {
            seen.push(connection.source);
        }
    }
    Ok(subjects)
}

impl Rule for DuplicateAdjustments {
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
        let layers = local_nodes(scene, &NodeFilter::of_type("renderLayer"), scope)?;
        let mut subjects = Vec::new();
        for layer in layers.iter().filter(|l| !l.contains(DEFAULT_RENDER_LAYER)) {
            subjects.extend(duplicates(scene, layer)?);
        }
        Ok(Box::new(subjects.into_iter().map(Ok)))
    }
}

impl Remedy for DuplicateAdjustments {
    fn remediate(
        &self,
        scene: &mut dyn SceneAdapter,
        subject: &Subject,
    ) -> Result<(), RemediationError> {
        let (source, slot) = match subject {
            Subject::Composite(ids) if ids.len() == 2 => (&ids[0], &ids[1]),
            other => {
                return Err(RemediationError::Unfixable(format!(
                    "expected a [scene plug, slot plug] pair, got {other}"
                )))
            }
        };

        scene.disconnect(source, slot)?;

        if let Some(value) = slot.strip_suffix(".plug").map(|s| format!("{s}.value")) {
            if scene.exists(&value) {
                for connection in scene.connections(&value, Direction::Outgoing)? {
                    scene.disconnect(&connection.source, &connection.destination)?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::categories::test_support::{find_and_fix, found};
    use crate::scene::MemoryScene;
    use pretty_assertions::assert_eq;

    fn layered_scene() -> MemoryScene {
        let mut scene = MemoryScene::new();
        scene.add_node(DEFAULT_RENDER_LAYER, "renderLayer", None).unwrap();
        scene.add_node("beauty", "renderLayer", None).unwrap();
        scene.add_node("lamp", "transform", None).unwrap();
        scene.add_node("override", "transform", None).unwrap();

        for (i, attribute) in ["visibility", "visibility", "castsShadows"].iter().enumerate() {
            scene
                .connect(
                    &format!("lamp.{attribute}"),
                    &format!("beauty.adjustments[{i}].plug"),
                )
                .unwrap();
            scene
                .connect(
                    &format!("beauty.adjustments[{i}].value"),
                    &format!("override.input{i}"),
                )
                .unwrap();
        }
        scene
    }

    #[test]
    fn test_later_duplicate_slot_reported() {
        let scene = layered_scene();
        let subjects = found(DuplicateAdjustments::new(), &scene);
        assert_eq!(
            subjects,
            vec![Subject::composite([
                "|lamp.visibility",
                "|beauty.adjustments[1].plug"
            ])]
        );
    }

    #[test]
    fn test_fix_disconnects_slot_and_value() {
        let mut scene = layered_scene();
        let check = find_and_fix(DuplicateAdjustments::new(), &mut scene);
        assert!(check.errors().is_empty());

        assert!(scene
            .connections("beauty.adjustments[1]", Direction::Both)
            .unwrap()
            .is_empty());
        assert_eq!(
            scene
                .connections("beauty.adjustments[0]", Direction::Both)
                .unwrap()
                .len(),
            2
        );
        assert!(found(DuplicateAdjustments::new(), &scene).is_empty());
    }
}
