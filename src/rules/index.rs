//! Category and collection indices
//!
//! [`CategoryIndex`] groups the registry's checks by category label and
//! [`CollectionIndex`] maps a workflow collection to an ordered category list.
//! Resolving a collection against the category index yields the
//! [`ResolvedView`] the engine and renderers work from.
//!
//! Both indices only hold [`RuleId`]s and names. The checks themselves stay in
//! the registry.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::check::RuleId;
use super::registry::RuleRegistry;
use crate::config::{Config, Preset};

/// Category label → ordered rule ids
#[derive(Debug, Clone, Default)]
pub struct CategoryIndex {
    groups: Vec<(String, Vec<RuleId>)>,
}

impl CategoryIndex {
    /// Group the registry's checks by category.
    ///
    /// Categories are ordered by first appearance in registry order. A check
    /// declaring several categories is listed in each of them.
    pub fn categorize(registry: &RuleRegistry) -> Self {
        let mut index = Self::default();
        for check in registry.iter() {
            for category in check.categories() {
                index.insert(category, check.ordinal());
            }
        }
        index
    }

    fn insert(&mut self, category: &str, id: RuleId) {
        match self.groups.iter_mut().find(|(name, _)| name == category) {
            Some((_, ids)) => {
                if !ids.contains(&id) {
                    ids.push(id);
                }
            }
            None => self.groups.push((category.to_string(), vec![id])),
        }
    }

    pub fn get(&self, category: &str) -> Option<&[RuleId]> {
        self.groups
            .iter()
            .find(|(name, _)| name == category)
            .map(|(_, ids)| ids.as_slice())
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[RuleId])> {
        self.groups
            .iter()
            .map(|(name, ids)| (name.as_str(), ids.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// A named, ordered list of categories
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collection {
    pub name: String,
    pub categories: Vec<String>,
}

impl Collection {
    pub fn new<I, S>(name: impl Into<String>, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            categories: categories.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<Preset> for Collection {
    fn from(preset: Preset) -> Self {
        Self::new(preset.name(), preset.categories().iter().copied())
    }
}

/// Ordered set of collections
#[derive(Debug, Clone, Default)]
pub struct CollectionIndex {
    collections: Vec<Collection>,
}

impl CollectionIndex {
    pub fn new(collections: Vec<Collection>) -> Self {
        Self { collections }
    }

    /// The animation, modelling, rigging and look-dev collections
    pub fn builtin() -> Self {
        Self::new(Preset::all().into_iter().map(Collection::from).collect())
    }

    /// Built-in collections with the configured ones applied on top. A
    /// configured collection replaces a built-in one of the same name.
    pub fn from_config(config: &Config) -> Self {
        let mut index = Self::builtin();
        for collection in &config.collections {
            index.upsert(collection.clone());
        }
        index
    }

    /// Replace the collection of the same name or append it
    pub fn upsert(&mut self, collection: Collection) {
        match self
            .collections
            .iter_mut()
            .find(|c| c.name == collection.name)
        {
            Some(existing) => *existing = collection,
            None => self.collections.push(collection),
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.collections.iter().map(|c| c.name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Collection> {
        self.collections.iter()
    }

    /// Look a collection up by name or by a built-in alias (`lookdev`, `rig`)
    pub fn get(&self, name: &str) -> Option<&Collection> {
        let find = |wanted: &str| self.collections.iter().find(|c| c.name == wanted);
        find(name).or_else(|| Preset::from_name(name).and_then(|p| find(p.name())))
    }

    /// Resolve a collection to its ordered category → rules view.
    ///
    /// Declared categories without rules are skipped and categories the
    /// collection does not declare are excluded. An unknown name, or a
    /// collection declaring no category, falls back to every category of the
    /// index, in index order.
    pub fn resolve(&self, name: &str, categories: &CategoryIndex) -> ResolvedView {
        let Some(collection) = self.get(name).filter(|c| !c.categories.is_empty()) else {
            debug!(collection = name, "Unknown or empty collection, using every category");
            return ResolvedView {
                collection: name.to_string(),
                known: false,
                groups: categories
                    .iter()
                    .map(|(category, ids)| (category.to_string(), ids.to_vec()))
                    .collect(),
            };
        };

        let groups = collection
            .categories
            .iter()
            .filter_map(|category| {
                categories
                    .get(category)
                    .filter(|ids| !ids.is_empty())
                    .map(|ids| (category.clone(), ids.to_vec()))
            })
            .collect();

        ResolvedView {
            collection: collection.name.clone(),
            known: true,
            groups,
        }
    }
}

/// Ordered category → rules view of one collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedView {
    collection: String,
    known: bool,
    groups: Vec<(String, Vec<RuleId>)>,
}

impl ResolvedView {
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Whether the view came from the all-categories fallback
    pub fn is_fallback(&self) -> bool {
        !self.known
    }

    pub fn groups(&self) -> impl Iterator<Item = (&str, &[RuleId])> {
        self.groups
            .iter()
            .map(|(name, ids)| (name.as_str(), ids.as_slice()))
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|(name, _)| name.as_str())
    }

    /// Execution order: every rule of the view once, first occurrence wins
    pub fn rule_ids(&self) -> Vec<RuleId> {
        let mut ids: Vec<RuleId> = Vec::new();
        for id in self.groups.iter().flat_map(|(_, ids)| ids) {
            if !ids.contains(id) {
                ids.push(*id);
            }
        }
        ids
    }

    /// Keep only the `only` categories, or drop the `skip` ones.
    /// `only` wins when both are given.
    pub fn retain_categories(&mut self, only: Option<&[String]>, skip: Option<&[String]>) {
        let matches = |list: &[String], category: &str| {
            list.iter().any(|c| c.eq_ignore_ascii_case(category))
        };

        if let Some(only) = only {
            self.groups.retain(|(name, _)| matches(only, name));
        } else if let Some(skip) = skip {
            self.groups.retain(|(name, _)| !matches(skip, name));
        }
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}
