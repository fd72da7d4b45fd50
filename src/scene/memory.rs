//! In-memory scene graph
//!
//! [`MemoryScene`] implements [`SceneAdapter`] over an arena of nodes, a list of
//! plug-to-plug links and a selection. Scenes are loaded from and saved to JSON
//! or YAML documents:
//!
//! ```yaml
//! nodes:
//!   - { name: group1, type: transform }
//!   - { name: pCube1, type: transform, parent: "|group1" }
//!   - name: pCubeShape1
//!     type: mesh
//!     parent: "|group1|pCube1"
//!     attributes: { primaryVisibility: false }
//! connections:
//!   - { source: "|pCubeShape1.instObjGroups", destination: "initialShadingGroup.dagSetMembers" }
//! selection: ["|group1|pCube1"]
//! ```
//!
//! Undo is snapshot based: the state before a chunk opens is kept and restored
//! by [`MemoryScene::undo`]. Mutations made outside a chunk form their own step.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;
use tracing::{debug, trace};

use super::{split_plug, AttrValue, Connection, Direction, NodeFilter, SceneAdapter, Scope};
use crate::error::SceneError;

type NodeKey = usize;

/// Serialized form of a scene
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SceneDocument {
    /// Nodes, parents listed before their children
    #[serde(default)]
    pub nodes: Vec<NodeSpec>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub connections: Vec<Connection>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub selection: Vec<String>,
}

/// Serialized form of a node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSpec {
    /// Short name
    pub name: String,

    /// Node type
    #[serde(rename = "type")]
    pub node_type: String,

    /// Parent path or unique parent name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,

    /// Base types this node also counts as (`animCurveTL` inherits `animCurve`)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inherits: Vec<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, AttrValue>,

    /// Comes from a read-only reference
    #[serde(default, skip_serializing_if = "is_false")]
    pub referenced: bool,

    #[serde(default, skip_serializing_if = "is_false")]
    pub locked: bool,

    #[serde(default, skip_serializing_if = "is_false")]
    pub intermediate: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl NodeSpec {
    /// Create a spec with no parent and no attributes
    pub fn new(name: impl Into<String>, node_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            node_type: node_type.into(),
            parent: None,
            inherits: Vec::new(),
            attributes: BTreeMap::new(),
            referenced: false,
            locked: false,
            intermediate: false,
        }
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: AttrValue) -> Self {
        self.attributes.insert(name.into(), value);
        self
    }

    pub fn inheriting(mut self, base: impl Into<String>) -> Self {
        self.inherits.push(base.into());
        self
    }

    pub fn referenced(mut self) -> Self {
        self.referenced = true;
        self
    }

    pub fn locked(mut self) -> Self {
        self.locked = true;
        self
    }

    pub fn intermediate(mut self) -> Self {
        self.intermediate = true;
        self
    }
}

/// On-disk encoding of a scene document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneFormat {
    Json,
    Yaml,
}

impl SceneFormat {
    /// Pick the format from a file extension, defaulting to JSON
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Self::Yaml,
            _ => Self::Json,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Node {
    name: String,
    node_type: String,
    inherits: Vec<String>,
    parent: Option<NodeKey>,
    attributes: BTreeMap<String, AttrValue>,
    referenced: bool,
    locked: bool,
    intermediate: bool,
}

/// Base types implied by well-known node types
fn implied_bases(node_type: &str) -> &'static [&'static str] {
    match node_type {
        "mesh" | "nurbsCurve" | "nurbsSurface" | "locator" | "camera" => &["shape"],
        "joint" => &["transform"],
        t if t.starts_with("animCurve") => &["animCurve"],
        _ => &[],
    }
}

impl Node {
    fn is_type(&self, node_type: &str) -> bool {
        self.node_type == node_type
            || self.inherits.iter().any(|t| t == node_type)
            || implied_bases(&self.node_type).contains(&node_type)
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Link {
    source: (NodeKey, String),
    destination: (NodeKey, String),
}

#[derive(Debug, Clone, Default, PartialEq)]
struct State {
    nodes: Vec<Option<Node>>,
    links: Vec<Link>,
    selection: Vec<NodeKey>,
}

/// Whether a link end attribute belongs to the queried attribute
fn plug_matches(attribute: &str, query: &str) -> bool {
    query.is_empty()
        || attribute == query
        || attribute
            .strip_prefix(query)
            .is_some_and(|rest| rest.starts_with('[') || rest.starts_with('.'))
}

fn validate_name(name: &str) -> Result<(), SceneError> {
    if name.is_empty() || name.contains('|') || name.contains('.') || name.contains(' ') {
        return Err(SceneError::InvalidName(name.to_string()));
    }
    Ok(())
}

impl State {
    fn live(&self) -> impl Iterator<Item = (NodeKey, &Node)> {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(key, node)| node.as_ref().map(|n| (key, n)))
    }

    fn get(&self, key: NodeKey) -> Option<&Node> {
        self.nodes.get(key).and_then(Option::as_ref)
    }

    fn full_path(&self, key: NodeKey) -> String {
        let mut names = Vec::new();
        let mut cursor = self.get(key);
        while let Some(node) = cursor {
            names.push(node.name.as_str());
            cursor = node.parent.and_then(|p| self.get(p));
        }
        names.reverse();
        format!("|{}", names.join("|"))
    }

    fn resolve(&self, identifier: &str) -> Result<NodeKey, SceneError> {
        let identifier = identifier.trim();
        if identifier.is_empty() {
            return Err(SceneError::NotFound(identifier.to_string()));
        }

        let matches: Vec<NodeKey> = if identifier.starts_with('|') {
            self.live()
                .filter(|(key, _)| self.full_path(*key) == identifier)
                .map(|(key, _)| key)
                .collect()
        } else if identifier.contains('|') {
            let suffix = format!("|{identifier}");
            self.live()
                .filter(|(key, _)| self.full_path(*key).ends_with(&suffix))
                .map(|(key, _)| key)
                .collect()
        } else {
            self.live()
                .filter(|(_, node)| node.name == identifier)
                .map(|(key, _)| key)
                .collect()
        };

        match matches.as_slice() {
            [] => Err(SceneError::NotFound(identifier.to_string())),
            [key] => Ok(*key),
            _ => Err(SceneError::Ambiguous(identifier.to_string())),
        }
    }

    fn node(&self, identifier: &str) -> Result<(NodeKey, &Node), SceneError> {
        let key = self.resolve(identifier)?;
        self.get(key)
            .map(|node| (key, node))
            .ok_or_else(|| SceneError::NotFound(identifier.to_string()))
    }

    fn node_mut(&mut self, identifier: &str) -> Result<(NodeKey, &mut Node), SceneError> {
        let key = self.resolve(identifier)?;
        self.nodes
            .get_mut(key)
            .and_then(Option::as_mut)
            .map(|node| (key, node))
            .ok_or_else(|| SceneError::NotFound(identifier.to_string()))
    }

    fn descendants(&self, root: NodeKey) -> Vec<NodeKey> {
        let mut found = vec![root];
        let mut index = 0;
        while index < found.len() {
            let parent = found[index];
            found.extend(
                self.live()
                    .filter(|(_, node)| node.parent == Some(parent))
                    .map(|(key, _)| key),
            );
            index += 1;
        }
        found
    }

    fn has_sibling_named(&self, parent: Option<NodeKey>, name: &str, except: NodeKey) -> bool {
        self.live()
            .any(|(key, node)| key != except && node.parent == parent && node.name == name)
    }

    fn plug_path(&self, end: &(NodeKey, String)) -> String {
        format!("{}.{}", self.full_path(end.0), end.1)
    }

    fn link_end(&self, plug: &str) -> Result<(NodeKey, String), SceneError> {
        let (node, attribute) = split_plug(plug);
        let key = self.resolve(node)?;
        if attribute.is_empty() {
            return Err(SceneError::MissingAttribute {
                node: self.full_path(key),
                attribute: String::new(),
            });
        }
        Ok((key, attribute.to_string()))
    }

    fn insert(&mut self, spec: NodeSpec) -> Result<NodeKey, SceneError> {
        validate_name(&spec.name)?;
        let parent = match spec.parent.as_deref() {
            Some(parent) => Some(self.resolve(parent)?),
            None => None,
        };
        if self.has_sibling_named(parent, &spec.name, usize::MAX) {
            return Err(SceneError::NameClash(spec.name));
        }

        self.nodes.push(Some(Node {
            name: spec.name,
            node_type: spec.node_type,
            inherits: spec.inherits,
            parent,
            attributes: spec.attributes,
            referenced: spec.referenced,
            locked: spec.locked,
            intermediate: spec.intermediate,
        }));
        Ok(self.nodes.len() - 1)
    }
}

/// Scene graph held entirely in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryScene {
    state: State,
    undo_stack: Vec<(String, State)>,
    chunk: Option<(String, State)>,
    depth: usize,
}

impl MemoryScene {
    /// Create an empty scene
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a scene from a document
    pub fn from_document(document: SceneDocument) -> Result<Self, SceneError> {
        let mut state = State::default();

        for spec in document.nodes {
            state.insert(spec)?;
        }

        for connection in document.connections {
            let source = state.link_end(&connection.source)?;
            let destination = state.link_end(&connection.destination)?;
            state.links.push(Link {
                source,
                destination,
            });
        }

        for item in &document.selection {
            let key = state.resolve(split_plug(item).0)?;
            if !state.selection.contains(&key) {
                state.selection.push(key);
            }
        }

        Ok(Self {
            state,
            ..Default::default()
        })
    }

    /// Serialize the current state
    pub fn to_document(&self) -> SceneDocument {
        let state = &self.state;
        let nodes = state
            .live()
            .map(|(_, node)| NodeSpec {
                name: node.name.clone(),
                node_type: node.node_type.clone(),
                parent: node.parent.map(|p| state.full_path(p)),
                inherits: node.inherits.clone(),
                attributes: node.attributes.clone(),
                referenced: node.referenced,
                locked: node.locked,
                intermediate: node.intermediate,
            })
            .collect();

        let connections = state
            .links
            .iter()
            .map(|link| Connection {
                source: state.plug_path(&link.source),
                destination: state.plug_path(&link.destination),
            })
            .collect();

        SceneDocument {
            nodes,
            connections,
            selection: self.selection(),
        }
    }

    /// Parse a scene from text
    pub fn parse(content: &str, format: SceneFormat, origin: &str) -> Result<Self, SceneError> {
        let document: SceneDocument = match format {
            SceneFormat::Json => serde_json::from_str(content).map_err(|e| SceneError::Parse {
                path: origin.to_string(),
                message: e.to_string(),
            })?,
            SceneFormat::Yaml => serde_yaml::from_str(content).map_err(|e| SceneError::Parse {
                path: origin.to_string(),
                message: e.to_string(),
            })?,
        };
        Self::from_document(document)
    }

    /// Load a scene file (`.json`, `.yaml` or `.yml`)
    pub fn load(path: &Path) -> Result<Self, SceneError> {
        let content = fs::read_to_string(path).map_err(|e| SceneError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        let scene = Self::parse(&content, SceneFormat::from_path(path), &path.display().to_string())?;
        debug!(path = %path.display(), nodes = scene.node_count(), "Scene loaded");
        Ok(scene)
    }

    /// Write the scene to a file, format chosen by extension
    pub fn save(&self, path: &Path) -> Result<(), SceneError> {
        let document = self.to_document();
        let parse_error = |message: String| SceneError::Parse {
            path: path.display().to_string(),
            message,
        };
        let content = match SceneFormat::from_path(path) {
            SceneFormat::Json => {
                serde_json::to_string_pretty(&document).map_err(|e| parse_error(e.to_string()))?
            }
            SceneFormat::Yaml => {
                serde_yaml::to_string(&document).map_err(|e| parse_error(e.to_string()))?
            }
        };
        fs::write(path, content).map_err(|e| SceneError::Io {
            path: path.display().to_string(),
            source: e,
        })
    }

    /// Add a node while building a scene. Not recorded for undo.
    pub fn add_node(
        &mut self,
        name: &str,
        node_type: &str,
        parent: Option<&str>,
    ) -> Result<String, SceneError> {
        let mut spec = NodeSpec::new(name, node_type);
        spec.parent = parent.map(str::to_string);
        self.add_spec(spec)
    }

    /// Add a fully described node while building a scene. Not recorded for undo.
    pub fn add_spec(&mut self, spec: NodeSpec) -> Result<String, SceneError> {
        let key = self.state.insert(spec)?;
        Ok(self.state.full_path(key))
    }

    /// Number of live nodes
    pub fn node_count(&self) -> usize {
        self.state.live().count()
    }

    /// Number of recorded undo steps
    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    /// Revert the last undo step, returning its label.
    ///
    /// Does nothing while a chunk is open.
    pub fn undo(&mut self) -> Option<String> {
        if self.depth > 0 {
            return None;
        }
        let (label, state) = self.undo_stack.pop()?;
        self.state = state;
        debug!(label = %label, "Undo");
        Some(label)
    }

    fn mutate<T>(
        &mut self,
        label: &str,
        f: impl FnOnce(&mut State) -> Result<T, SceneError>,
    ) -> Result<T, SceneError> {
        if self.depth > 0 {
            return f(&mut self.state);
        }

        let before = self.state.clone();
        let result = f(&mut self.state)?;
        if before != self.state {
            self.undo_stack.push((label.to_string(), before));
        }
        Ok(result)
    }
}

impl SceneAdapter for MemoryScene {
    fn list(&self, filter: &NodeFilter, scope: Scope) -> Result<Vec<String>, SceneError> {
        let state = &self.state;
        let matches = |node: &Node| {
            (filter.types.is_empty() || filter.types.iter().any(|t| node.is_type(t)))
                && filter.intermediate.map_or(true, |i| node.intermediate == i)
        };

        let nodes = match scope {
            Scope::All => state
                .live()
                .filter(|&(_, node)| matches(node))
                .map(|(key, _)| state.full_path(key))
                .collect(),
            Scope::SelectionOnly => state
                .selection
                .iter()
                .filter(|key| state.get(**key).is_some_and(matches))
                .map(|key| state.full_path(*key))
                .collect(),
        };
        Ok(nodes)
    }

    fn exists(&self, identifier: &str) -> bool {
        let (node, attribute) = split_plug(identifier);
        match self.state.resolve(node) {
            Ok(key) => {
                if attribute.is_empty() {
                    return true;
                }
                let has_attribute = self
                    .state
                    .get(key)
                    .is_some_and(|n| n.attributes.keys().any(|a| plug_matches(a, attribute)));
                has_attribute
                    || self.state.links.iter().any(|link| {
                        [&link.source, &link.destination]
                            .iter()
                            .any(|end| end.0 == key && plug_matches(&end.1, attribute))
                    })
            }
            Err(SceneError::Ambiguous(_)) => attribute.is_empty(),
            Err(_) => false,
        }
    }

    fn node_type(&self, node: &str) -> Result<String, SceneError> {
        Ok(self.state.node(node)?.1.node_type.clone())
    }

    fn is_type(&self, node: &str, node_type: &str) -> Result<bool, SceneError> {
        Ok(self.state.node(node)?.1.is_type(node_type))
    }

    fn children(&self, node: &str) -> Result<Vec<String>, SceneError> {
        let key = self.state.resolve(node)?;
        Ok(self
            .state
            .live()
            .filter(|(_, child)| child.parent == Some(key))
            .map(|(child, _)| self.state.full_path(child))
            .collect())
    }

    fn attributes(&self, node: &str) -> Result<Vec<String>, SceneError> {
        Ok(self.state.node(node)?.1.attributes.keys().cloned().collect())
    }

    fn get_attribute(&self, plug: &str) -> Result<AttrValue, SceneError> {
        let (node, attribute) = split_plug(plug);
        let (key, found) = self.state.node(node)?;
        found
            .attributes
            .get(attribute)
            .cloned()
            .ok_or_else(|| SceneError::MissingAttribute {
                node: self.state.full_path(key),
                attribute: attribute.to_string(),
            })
    }

    fn set_attribute(&mut self, plug: &str, value: AttrValue) -> Result<(), SceneError> {
        let (node, attribute) = split_plug(plug);
        let plug = plug.to_string();
        self.mutate("setAttr", |state| {
            let (key, found) = state.node(node)?;
            let path = state.full_path(key);
            if found.referenced {
                return Err(SceneError::Referenced(path));
            }
            let current = found
                .attributes
                .get(attribute)
                .ok_or_else(|| SceneError::MissingAttribute {
                    node: path,
                    attribute: attribute.to_string(),
                })?;
            if (current.as_str().is_some()) != (value.as_str().is_some()) {
                return Err(SceneError::TypeMismatch {
                    plug,
                    expected: current.kind(),
                    found: value.kind(),
                });
            }

            let (_, found) = state.node_mut(node)?;
            found.attributes.insert(attribute.to_string(), value);
            Ok(())
        })
    }

    fn connections(
        &self,
        target: &str,
        direction: Direction,
    ) -> Result<Vec<Connection>, SceneError> {
        let (node, attribute) = split_plug(target);
        let key = self.state.resolve(node)?;
        let touches = |end: &(NodeKey, String)| end.0 == key && plug_matches(&end.1, attribute);

        Ok(self
            .state
            .links
            .iter()
            .filter(|link| match direction {
                Direction::Incoming => touches(&link.destination),
                Direction::Outgoing => touches(&link.source),
                Direction::Both => touches(&link.source) || touches(&link.destination),
            })
            .map(|link| Connection {
                source: self.state.plug_path(&link.source),
                destination: self.state.plug_path(&link.destination),
            })
            .collect())
    }

    fn connect(&mut self, source: &str, destination: &str) -> Result<(), SceneError> {
        self.mutate("connectAttr", |state| {
            let link = Link {
                source: state.link_end(source)?,
                destination: state.link_end(destination)?,
            };
            let refuse = |reason: &str| SceneError::Connection {
                source_plug: source.to_string(),
                destination: destination.to_string(),
                reason: reason.to_string(),
            };
            if state.links.contains(&link) {
                return Err(refuse("already connected"));
            }
            if state.links.iter().any(|l| l.destination == link.destination) {
                return Err(refuse("destination already has an incoming connection"));
            }
            state.links.push(link);
            Ok(())
        })
    }

    fn disconnect(&mut self, source: &str, destination: &str) -> Result<(), SceneError> {
        self.mutate("disconnectAttr", |state| {
            let link = Link {
                source: state.link_end(source)?,
                destination: state.link_end(destination)?,
            };
            let index = state
                .links
                .iter()
                .position(|l| *l == link)
                .ok_or_else(|| SceneError::Connection {
                    source_plug: source.to_string(),
                    destination: destination.to_string(),
                    reason: "not connected".to_string(),
                })?;
            state.links.remove(index);
            Ok(())
        })
    }

    fn delete(&mut self, node: &str) -> Result<(), SceneError> {
        self.mutate("delete", |state| {
            let (key, found) = state.node(node)?;
            if found.referenced {
                return Err(SceneError::Referenced(state.full_path(key)));
            }

            let doomed = state.descendants(key);
            if let Some(locked) = doomed
                .iter()
                .find(|k| state.get(**k).is_some_and(|n| n.locked))
            {
                return Err(SceneError::Locked(state.full_path(*locked)));
            }

            let doomed: HashSet<NodeKey> = doomed.into_iter().collect();
            for key in &doomed {
                state.nodes[*key] = None;
            }
            state
                .links
                .retain(|l| !doomed.contains(&l.source.0) && !doomed.contains(&l.destination.0));
            state.selection.retain(|k| !doomed.contains(k));
            trace!(node, removed = doomed.len(), "Deleted");
            Ok(())
        })
    }

    fn rename(&mut self, node: &str, new_name: &str) -> Result<String, SceneError> {
        validate_name(new_name)?;
        self.mutate("rename", |state| {
            let (key, found) = state.node(node)?;
            let path = state.full_path(key);
            if found.referenced {
                return Err(SceneError::Referenced(path));
            }
            if found.locked {
                return Err(SceneError::Locked(path));
            }
            if state.has_sibling_named(found.parent, new_name, key) {
                return Err(SceneError::NameClash(new_name.to_string()));
            }

            if let Some(found) = state.nodes.get_mut(key).and_then(Option::as_mut) {
                found.name = new_name.to_string();
            }
            Ok(state.full_path(key))
        })
    }

    fn is_referenced(&self, node: &str) -> bool {
        self.state
            .node(split_plug(node).0)
            .is_ok_and(|(_, found)| found.referenced)
    }

    fn is_locked(&self, node: &str) -> Result<bool, SceneError> {
        Ok(self.state.node(node)?.1.locked)
    }

    fn set_locked(&mut self, node: &str, locked: bool) -> Result<(), SceneError> {
        self.mutate("lockNode", |state| {
            let (_, found) = state.node_mut(node)?;
            found.locked = locked;
            Ok(())
        })
    }

    fn selection(&self) -> Vec<String> {
        self.state
            .selection
            .iter()
            .map(|key| self.state.full_path(*key))
            .collect()
    }

    fn select(&mut self, items: &[String]) -> Result<(), SceneError> {
        let mut selection = Vec::with_capacity(items.len());
        for item in items {
            let key = self.state.resolve(split_plug(item).0)?;
            if !selection.contains(&key) {
                selection.push(key);
            }
        }
        self.state.selection = selection;
        Ok(())
    }

    fn open_undo_chunk(&mut self, label: &str) {
        if self.depth == 0 {
            self.chunk = Some((label.to_string(), self.state.clone()));
        }
        self.depth += 1;
    }

    fn close_undo_chunk(&mut self) {
        if self.depth == 0 {
            return;
        }
        self.depth -= 1;
        if self.depth == 0 {
            if let Some((label, before)) = self.chunk.take() {
                if before != self.state {
                    self.undo_stack.push((label, before));
                }
            }
        }
    }
}
