//! The pattern graph: an arena trie plus category bookkeeping.
//!
//! A [`Graph`] owns its nodes and the categories hanging from them. It offers
//! exactly four kinds of operation:
//!
//! - `insert`: idempotent upsert keyed by [`CategoryKey`];
//! - `contains` / `find_node`: literal path walks, wildcards treated as plain
//!   path segments (identity lookups, *not* matching);
//! - `match_tokens` / `match_with_metrics`: priority-ordered matching (see
//!   `matcher.rs`);
//! - `categories` / `retire`: enumeration and lifecycle exclusion.
//!
//! ## Invariants
//!
//! - `index` maps every key ever inserted to its slot; slots are never removed.
//! - A slot's `leaf` node has `slot == Some(that slot)`; a node owns at most
//!   one slot because distinct keys produce distinct paths.
//! - A retired slot stays in the arena but is invisible to matching,
//!   `contains`, `find_node` and `categories`. Re-inserting its key revives it.
//! - Sequence numbers are assigned by the graph (`next_number`) when a category
//!   arrives without one; numbers carried in from elsewhere are kept.

use super::matcher::{Matcher, Query};
use super::metrics::MatchMetrics;
use super::node::{Arena, Node, NodeId, NodeRef};
use crate::api::{Match, MatchDetails};
use crate::config::MatchingConfig;
use crate::{Category, CategoryKey};
use std::collections::HashMap;

pub(crate) type SlotId = usize;

#[derive(Debug, Clone)]
pub(crate) struct Slot {
    pub(crate) category: Category,
    pub(crate) leaf: NodeId,
    pub(crate) retired: bool,
}

/// A trie of categories for one lifecycle role.
#[derive(Debug, Clone)]
pub struct Graph {
    name: String,
    arena: Arena,
    slots: Vec<Slot>,
    index: HashMap<CategoryKey, SlotId>,
    next_number: u64,
    config: MatchingConfig,
}

impl Default for Graph {
    fn default() -> Self {
        Graph::new("graph")
    }
}

impl Graph {
    /// Create an empty graph with default matching limits.
    ///
    /// `name` only labels log events.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_config(name, MatchingConfig::default())
    }

    pub fn with_config(name: impl Into<String>, config: MatchingConfig) -> Self {
        Graph {
            name: name.into(),
            arena: Arena::new(),
            slots: Vec::new(),
            index: HashMap::new(),
            next_number: 1,
            config,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &MatchingConfig {
        &self.config
    }

    /// Number of live categories.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| !s.retired).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of nodes in the arena, root included.
    pub fn node_count(&self) -> usize {
        self.arena.len()
    }

    pub fn root(&self) -> NodeRef<'_> {
        NodeRef::new(self, NodeId::ROOT)
    }

    /// Insert `category`, or update the existing category with the same key.
    ///
    /// An update replaces template and source only; the leaf node, sequence
    /// number and usage counter are kept. Returns the leaf node.
    pub fn insert(&mut self, mut category: Category) -> NodeId {
        let key = category.key();

        if let Some(&slot_id) = self.index.get(&key) {
            let slot = &mut self.slots[slot_id];
            slot.category.overwrite_from(&category);
            if slot.retired {
                slot.retired = false;
                tracing::debug!(graph = %self.name, category = %key, "revived retired category");
            } else {
                tracing::debug!(graph = %self.name, category = %key, "updated existing category");
            }
            return slot.leaf;
        }

        if category.number() == 0 {
            category.set_number(self.next_number);
        }
        self.next_number = self.next_number.max(category.number() + 1);

        let leaf = if category.is_shortcut() {
            self.extend_path(category.pattern_tokens())
        } else {
            self.extend_path(category.path())
        };

        let slot_id = self.slots.len();
        let node = self.arena.get_mut(leaf);
        node.slot = Some(slot_id);
        node.shortcut = category.is_shortcut();

        tracing::debug!(graph = %self.name, category = %key, number = category.number(), "inserted category");
        self.slots.push(Slot { category, leaf, retired: false });
        self.index.insert(key, slot_id);
        leaf
    }

    fn extend_path<'p>(&mut self, path: impl IntoIterator<Item = &'p str>) -> NodeId {
        path.into_iter().fold(NodeId::ROOT, |id, token| self.arena.child_or_insert(id, token))
    }

    /// True iff a live leaf exists for `category`'s key.
    pub fn contains(&self, category: &Category) -> bool {
        self.find_node(category).is_some()
    }

    /// Walk `category`'s own path literally and return its live leaf.
    pub fn find_node(&self, category: &Category) -> Option<NodeRef<'_>> {
        let id = if category.is_shortcut() {
            self.arena.walk(category.pattern_tokens())?
        } else {
            self.arena.walk(category.path())?
        };

        let node = self.arena.get(id);
        if node.shortcut != category.is_shortcut() {
            return None;
        }
        self.live_category(node).map(|_| NodeRef::new(self, id))
    }

    /// Live category for `key`, via the identity index.
    pub fn get(&self, key: &CategoryKey) -> Option<&Category> {
        let slot = &self.slots[*self.index.get(key)?];
        (!slot.retired).then_some(&slot.category)
    }

    /// Exclude the category with `key` from matching and enumeration.
    ///
    /// Returns a copy of the retired category, or `None` if no live category
    /// had that key.
    pub fn retire(&mut self, key: &CategoryKey) -> Option<Category> {
        let slot = &mut self.slots[*self.index.get(key)?];
        if slot.retired {
            return None;
        }
        slot.retired = true;
        tracing::debug!(graph = %self.name, category = %key, "retired category");
        Some(slot.category.clone())
    }

    /// Live categories in insertion order.
    pub fn categories(&self) -> impl Iterator<Item = &Category> {
        self.slots.iter().filter(|s| !s.retired).map(|s| &s.category)
    }

    /// Live categories sorted by sequence number.
    pub fn sorted_categories(&self) -> Vec<&Category> {
        let mut categories: Vec<&Category> = self.categories().collect();
        categories.sort_by(|a, b| a.cmp_by_number(b));
        categories
    }

    /// Match a conversational turn and record one activation on the result.
    ///
    /// Empty `that`/`topic` stand for the configured default context token.
    /// "No match" is `None`; callers wanting total coverage insert a `*`
    /// catch-all.
    pub fn match_tokens<S: AsRef<str>>(&self, input: &[S], that: &[S], topic: &[S]) -> Option<Match<'_>> {
        self.match_with_metrics(input, that, topic).result
    }

    /// [`match_tokens`](Self::match_tokens) plus the matcher's counters.
    pub fn match_with_metrics<S: AsRef<str>>(&self, input: &[S], that: &[S], topic: &[S]) -> MatchDetails<'_> {
        let query = Query::new(input, that, topic, &self.config.default_context);
        let (result, metrics) = self.resolve(&query);

        match &result {
            Some(m) => {
                let count = m.category.increment_activations();
                tracing::trace!(graph = %self.name, path = %query.path(), matched = %m.category, activations = count, "match");
            }
            None => tracing::trace!(graph = %self.name, path = %query.path(), "no match"),
        }

        MatchDetails { path: query.path(), result, metrics }
    }

    /// Run the matcher without touching usage counters.
    pub(crate) fn resolve(&self, query: &Query) -> (Option<Match<'_>>, MatchMetrics) {
        let outcome = Matcher::new(self, query, self.config.step_budget).run();
        let result = outcome.leaf.and_then(|leaf| {
            let category = self.live_category(self.arena.get(leaf))?;
            Some(Match { category, node: leaf, captures: outcome.captures })
        });
        (result, outcome.metrics)
    }

    pub(crate) fn arena(&self) -> &Arena {
        &self.arena
    }

    pub(crate) fn live_category(&self, node: &Node) -> Option<&Category> {
        let slot = &self.slots[node.slot?];
        (!slot.retired).then_some(&slot.category)
    }

    pub(crate) fn live_leaf(&self, id: NodeId) -> bool {
        self.live_category(self.arena.get(id)).is_some()
    }

    /// Live slots with their leaf nodes, in insertion order.
    pub(crate) fn leaves(&self) -> impl Iterator<Item = (NodeId, &Category)> {
        self.slots.iter().filter(|s| !s.retired).map(|s| (s.leaf, &s.category))
    }
}
