//! # Scene Adapter
//!
//! The boundary between the rule engine and the host scene graph.
//!
//! Rules never talk to a concrete scene. They query and mutate it through the
//! [`SceneAdapter`] trait, which exposes node listing scoped by type and by the
//! current selection, attribute access, connection queries, a handful of
//! structural mutations, the referenced-content filter and undo chunks.
//!
//! - [`memory::MemoryScene`] - In-memory graph loaded from JSON or YAML documents
//! - [`UndoChunk`] - Drop guard grouping mutations into one undo step

pub mod memory;

use serde::{Deserialize, Serialize};
use std::ops::{Deref, DerefMut};

use crate::error::SceneError;

pub use memory::{MemoryScene, NodeSpec, SceneDocument, SceneFormat};

/// Which nodes a listing considers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Scope {
    /// Every node in the scene
    #[default]
    All,
    /// Only the currently selected nodes
    SelectionOnly,
}

/// Direction of a connection query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Connections feeding into the target
    Incoming,
    /// Connections leaving the target
    Outgoing,
    /// Both directions
    Both,
}

/// A directed connection between two plugs
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Connection {
    /// Source plug (`node.attribute`)
    pub source: String,
    /// Destination plug (`node.attribute`)
    pub destination: String,
}

impl Connection {
    /// Node path of the source plug
    pub fn source_node(&self) -> &str {
        split_plug(&self.source).0
    }

    /// Node path of the destination plug
    pub fn destination_node(&self) -> &str {
        split_plug(&self.destination).0
    }
}

/// Typed attribute value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl AttrValue {
    /// Name of the value kind, used in error messages
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::String(_) => "string",
        }
    }

    /// Interpret the value as a boolean. Numbers are true when non-zero.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            Self::Int(i) => Some(*i != 0),
            Self::Float(f) => Some(*f != 0.0),
            Self::String(_) => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }
}

/// Node listing filter
///
/// An empty type list matches every node type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeFilter {
    /// Node types (exact or inherited) to include
    pub types: Vec<String>,
    /// Restrict to intermediate (`Some(true)`) or non-intermediate (`Some(false)`) nodes
    pub intermediate: Option<bool>,
}

impl NodeFilter {
    /// Match every node
    pub fn any() -> Self {
        Self::default()
    }

    /// Match nodes of a single type
    pub fn of_type(node_type: impl Into<String>) -> Self {
        Self {
            types: vec![node_type.into()],
            intermediate: None,
        }
    }

    /// Match nodes of any of the given types
    pub fn of_types<I, S>(types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            types: types.into_iter().map(Into::into).collect(),
            intermediate: None,
        }
    }

    /// Restrict on the intermediate flag
    pub fn intermediate(mut self, intermediate: bool) -> Self {
        self.intermediate = Some(intermediate);
        self
    }
}

/// Query and mutation surface of a host scene graph.
///
/// Node identifiers are full paths (`|group1|pCube1`) or unambiguous short
/// names. Plugs are `node.attribute`.
pub trait SceneAdapter {
    /// List node paths matching a filter, in scene order (or selection order
    /// for [`Scope::SelectionOnly`])
    fn list(&self, filter: &NodeFilter, scope: Scope) -> Result<Vec<String>, SceneError>;

    /// Whether a node or plug identifier resolves
    fn exists(&self, identifier: &str) -> bool;

    /// Type name of a node
    fn node_type(&self, node: &str) -> Result<String, SceneError>;

    /// Whether the node's type is, or inherits from, `node_type`
    fn is_type(&self, node: &str, node_type: &str) -> Result<bool, SceneError>;

    /// Full paths of the direct children of a node
    fn children(&self, node: &str) -> Result<Vec<String>, SceneError>;

    /// Attribute names stored on a node, sorted
    fn attributes(&self, node: &str) -> Result<Vec<String>, SceneError>;

    /// Read a plug value
    fn get_attribute(&self, plug: &str) -> Result<AttrValue, SceneError>;

    /// Write a plug value
    fn set_attribute(&mut self, plug: &str, value: AttrValue) -> Result<(), SceneError>;

    /// Connections touching a node or a plug
    fn connections(&self, target: &str, direction: Direction)
        -> Result<Vec<Connection>, SceneError>;

    /// Connect two plugs
    fn connect(&mut self, source: &str, destination: &str) -> Result<(), SceneError>;

    /// Remove a connection between two plugs
    fn disconnect(&mut self, source: &str, destination: &str) -> Result<(), SceneError>;

    /// Delete a node and its descendants
    fn delete(&mut self, node: &str) -> Result<(), SceneError>;

    /// Rename a node, returning its new full path
    fn rename(&mut self, node: &str, new_name: &str) -> Result<String, SceneError>;

    /// Whether a node originates from read-only referenced content
    fn is_referenced(&self, node: &str) -> bool;

    fn is_locked(&self, node: &str) -> Result<bool, SceneError>;

    fn set_locked(&mut self, node: &str, locked: bool) -> Result<(), SceneError>;

    /// Current selection as full node paths
    fn selection(&self) -> Vec<String>;

    /// Replace the selection
    fn select(&mut self, items: &[String]) -> Result<(), SceneError>;

    /// Start grouping mutations into one undo step. Chunks nest.
    fn open_undo_chunk(&mut self, label: &str);

    /// Close the innermost chunk
    fn close_undo_chunk(&mut self);
}

/// Keeps an undo chunk open for its lifetime.
///
/// The chunk is closed when the guard drops, on every exit path. Mutations go
/// through the guard via `Deref`.
pub struct UndoChunk<'a, S: SceneAdapter + ?Sized> {
    scene: &'a mut S,
}

impl<'a, S: SceneAdapter + ?Sized> UndoChunk<'a, S> {
    /// Open a chunk on `scene`
    pub fn open(scene: &'a mut S, label: &str) -> Self {
        scene.open_undo_chunk(label);
        Self { scene }
    }
}

impl<S: SceneAdapter + ?Sized> Deref for UndoChunk<'_, S> {
    type Target = S;

    fn deref(&self) -> &S {
        self.scene
    }
}

impl<S: SceneAdapter + ?Sized> DerefMut for UndoChunk<'_, S> {
    fn deref_mut(&mut self) -> &mut S {
        self.scene
    }
}

impl<S: SceneAdapter + ?Sized> Drop for UndoChunk<'_, S> {
    fn drop(&mut self) {
        self.scene.close_undo_chunk();
    }
}

/// Drop nodes that come from referenced content
pub fn remove_referenced<'a>(
    scene: &'a dyn SceneAdapter,
    nodes: Vec<String>,
) -> impl Iterator<Item = String> + 'a {
    nodes.into_iter().filter(move |node| !scene.is_referenced(node))
}

/// Split a plug into its node and attribute parts.
///
/// Identifiers without a `.` are returned whole with an empty attribute.
pub fn split_plug(plug: &str) -> (&str, &str) {
    match plug.split_once('.') {
        Some((node, attribute)) => (node, attribute),
        None => (plug, ""),
    }
}

/// Build a plug identifier
pub fn plug(node: &str, attribute: &str) -> String {
    format!("{node}.{attribute}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_plug() {
        assert_eq!(split_plug("|grp|mesh.visibility"), ("|grp|mesh", "visibility"));
        assert_eq!(
            split_plug("mesh.uvSet[1].uvSetName"),
            ("mesh", "uvSet[1].uvSetName")
        );
        assert_eq!(split_plug("|grp|mesh"), ("|grp|mesh", ""));
    }

    #[test]
    fn test_attr_value_as_bool() {
        assert_eq!(AttrValue::Bool(true).as_bool(), Some(true));
        assert_eq!(AttrValue::Int(0).as_bool(), Some(false));
        assert_eq!(AttrValue::Float(0.5).as_bool(), Some(true));
        assert_eq!(AttrValue::String("on".into()).as_bool(), None);
    }

    #[test]
    fn test_attr_value_untagged_parsing() {
        let values: Vec<AttrValue> = serde_json::from_str(r#"[true, 3, 1.5, "a.png"]"#).unwrap();
        assert_eq!(
            values,
            vec![
                AttrValue::Bool(true),
                AttrValue::Int(3),
                AttrValue::Float(1.5),
                AttrValue::String("a.png".into()),
            ]
        );
    }

    #[test]
    fn test_undo_chunk_closes_on_drop() {
        let mut scene = MemoryScene::new();
        scene.add_node("pCube1", "transform", None).unwrap();
        {
            let mut chunk = UndoChunk::open(&mut scene, "test");
            chunk.rename("pCube1", "box").unwrap();
            chunk.set_locked("box", true).unwrap();
            assert_eq!(chunk.undo_depth(), 0);
        }
        assert_eq!(scene.undo_depth(), 1);
        scene.undo();
        assert!(scene.exists("pCube1"));
        assert!(!scene.is_locked("pCube1").unwrap());
    }
}
