//! Texture rules

use std::path::{Path, PathBuf};

use super::{local_nodes, nodes_where, read_attribute, subject_node};
use crate::config::Config;
use crate::error::{RemediationError, SceneError};
use crate::rules::check::{Detection, Remedy, Rule, RuleInfo};
use crate::rules::subject::Subject;
use crate::scene::{plug, AttrValue, NodeFilter, SceneAdapter, Scope};

pub fn rules(config: &Config) -> Vec<Box<dyn Rule>> {
    vec![Box::new(NonExistingTextures::new(config.textures.root.clone()))]
}

/// File nodes pointing at a texture that is not on disk
pub struct NonExistingTextures {
    info: RuleInfo,
    root: Option<PathBuf>,
}

impl NonExistingTextures {
    /// Relative texture paths resolve against `root`, or the working directory
    pub fn new(root: Option<PathBuf>) -> Self {
        Self {
            info: RuleInfo::new(
                "textures/non-existing-textures",
                "Non Existing Textures",
                "{count} file(s) contain a link to a not existing texture",
            )
            .with_category("Textures")
            .selectable()
            .with_documentation(
                "File nodes whose `fileTextureName` does not exist. Fixing turns on \
                 `disableFileLoad` so the broken link stops being evaluated.",
            ),
            root,
        }
    }

    fn resolve(&self, texture: &str) -> PathBuf {
        let path = Path::new(texture);
        match &self.root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        }
    }

    fn is_missing(&self, scene: &dyn SceneAdapter, node: &str) -> Result<bool, SceneError> {
        let disabled = read_attribute(scene, &plug(node, "disableFileLoad"))?
            .and_then(|v| v.as_bool())
            .unwrap_or(false);
        if disabled {
            return Ok(false);
        }

        let texture = read_attribute(scene, &plug(node, "fileTextureName"))?;
        let texture = texture.as_ref().and_then(AttrValue::as_str).unwrap_or("");
        Ok(texture.is_empty() || !self.resolve(texture).exists())
    }
}

impl Rule for NonExistingTextures {
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
        let files = local_nodes(scene, &NodeFilter::of_type("file"), scope)?;
        Ok(nodes_where(files, move |node| self.is_missing(scene, node)))
    }
}

impl Remedy for NonExistingTextures {
    fn remediate(
        &self,
        scene: &mut dyn SceneAdapter,
        subject: &Subject,
    ) -> Result<(), RemediationError> {
        let node = subject_node(subject)?;
        scene.set_attribute(&plug(node, "disableFileLoad"), AttrValue::Bool(true))?;
        Ok(())
    }
}
