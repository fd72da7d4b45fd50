//! Offending subjects and the ordered, de-duplicated list a check keeps them in

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use crate::scene::split_plug;

/// Identifies one offending element of the scene.
///
/// Equality is by value, so the same node found twice is the same subject.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum Subject {
    /// A node path
    Node(String),
    /// A plug (`node.attribute`)
    Attribute(String),
    /// Several identifiers a remediation needs together, in order
    Composite(Vec<String>),
}

impl Subject {
    pub fn node(path: impl Into<String>) -> Self {
        Self::Node(path.into())
    }

    pub fn attribute(plug: impl Into<String>) -> Self {
        Self::Attribute(plug.into())
    }

    pub fn composite<I, S>(identifiers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Composite(identifiers.into_iter().map(Into::into).collect())
    }

    /// The single identifier of a node or attribute subject
    pub fn primary(&self) -> Option<&str> {
        match self {
            Self::Node(id) | Self::Attribute(id) => Some(id),
            Self::Composite(_) => None,
        }
    }

    /// Every identifier, flattened in order
    pub fn identifiers(&self) -> Vec<&str> {
        match self {
            Self::Node(id) | Self::Attribute(id) => vec![id.as_str()],
            Self::Composite(ids) => ids.iter().map(String::as_str).collect(),
        }
    }

    /// Node paths the subject touches, without attribute parts
    pub fn nodes(&self) -> Vec<&str> {
        self.identifiers()
            .into_iter()
            .map(|id| split_plug(id).0)
            .collect()
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Node(id) | Self::Attribute(id) => write!(f, "{id}"),
            Self::Composite(ids) => write!(f, "[{}]", ids.join(", ")),
        }
    }
}

/// Insertion-ordered set of subjects
#[derive(Debug, Clone, Default)]
pub struct ErrorList {
    items: Vec<Subject>,
    seen: HashSet<Subject>,
}

impl ErrorList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a subject. Returns `false` and keeps the list unchanged when an
    /// equal subject is already present.
    pub fn push(&mut self, subject: Subject) -> bool {
        if self.seen.contains(&subject) {
            return false;
        }
        self.seen.insert(subject.clone());
        self.items.push(subject);
        true
    }

    pub fn remove(&mut self, subject: &Subject) -> bool {
        if !self.seen.remove(subject) {
            return false;
        }
        self.items.retain(|s| s != subject);
        true
    }

    pub fn contains(&self, subject: &Subject) -> bool {
        self.seen.contains(subject)
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.seen.clear();
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Subject> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[Subject] {
        &self.items
    }

    /// Owned copy, used to iterate while the list is being edited
    pub fn snapshot(&self) -> Vec<Subject> {
        self.items.clone()
    }

    /// Every identifier of every subject, flattened in order
    pub fn flatten(&self) -> Vec<String> {
        self.items
            .iter()
            .flat_map(|s| s.identifiers().into_iter().map(str::to_string))
            .collect()
    }
}

impl<'a> IntoIterator for &'a ErrorList {
    type Item = &'a Subject;
    type IntoIter = std::slice::Iter<'a, Subject>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_keeps_first_occurrence() {
        let mut list = ErrorList::new();
        assert!(list.push(Subject::node("a")));
        assert!(list.push(Subject::node("b")));
        assert!(!list.push(Subject::node("a")));
        assert!(list.push(Subject::attribute("a")));

        assert_eq!(
            list.as_slice(),
            &[
                Subject::node("a"),
                Subject::node("b"),
                Subject::attribute("a")
            ]
        );
    }

    #[test]
    fn test_remove_then_push_appends() {
        let mut list = ErrorList::new();
        list.push(Subject::node("a"));
        list.push(Subject::node("b"));
        assert!(list.remove(&Subject::node("a")));
        assert!(!list.remove(&Subject::node("a")));
        list.push(Subject::node("a"));
        assert_eq!(list.as_slice(), &[Subject::node("b"), Subject::node("a")]);
    }

    #[test]
    fn test_flatten_composites() {
        let mut list = ErrorList::new();
        list.push(Subject::node("|a"));
        list.push(Subject::composite(["|l.out[0]", "|b.visibility"]));
        assert_eq!(list.flatten(), vec!["|a", "|l.out[0]", "|b.visibility"]);
    }

    #[test]
    fn test_subject_nodes_strip_attributes() {
        let subject = Subject::composite(["|l.out[0]", "|b.visibility"]);
        assert_eq!(subject.nodes(), vec!["|l", "|b"]);
        assert_eq!(subject.primary(), None);
        assert_eq!(Subject::attribute("|b.v").primary(), Some("|b.v"));
    }

    #[test]
    fn test_subject_serialization() {
        let json = serde_json::to_value(Subject::node("|a")).unwrap();
        assert_eq!(json["kind"], "node");
        assert_eq!(json["id"], "|a");
    }
}
