//! Trie nodes and the arena that owns them.
//!
//! Every node lives in one `Vec` owned by its [`Graph`]; children are referred
//! to by [`NodeId`] index. The structure is a strict tree rooted at
//! [`NodeId::ROOT`], so no reference counting is needed.
//!
//! ## Node layout
//!
//! ```text
//! Node
//!  ├─ literals: BTreeMap<token, NodeId>   (also holds <THAT>/<TOPIC>)
//!  ├─ single:   Option<NodeId>            (`_` child)
//!  ├─ multi:    Option<NodeId>            (`*` child)
//!  ├─ slot:     Option<SlotId>            (leaf payload)
//!  └─ shortcut: bool                      (implicit `<THAT> * <TOPIC> *`)
//! ```
//!
//! Literal children are kept in a `BTreeMap` so that every traversal (shadow
//! checking, mining, enumeration) visits them in the same order.

use super::graph::{Graph, SlotId};
use crate::{Category, STAR, UNDERSCORE, Wildcard};
use std::collections::BTreeMap;

/// Index of a node inside its graph's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub const ROOT: NodeId = NodeId(0);

    pub(crate) fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Default, Clone)]
pub(crate) struct Node {
    pub(crate) literals: BTreeMap<String, NodeId>,
    pub(crate) single: Option<NodeId>,
    pub(crate) multi: Option<NodeId>,
    pub(crate) slot: Option<SlotId>,
    pub(crate) shortcut: bool,
}

impl Node {
    /// Child reached by `token`, treating wildcard symbols as path segments.
    pub(crate) fn child(&self, token: &str) -> Option<NodeId> {
        match Wildcard::of(token) {
            Some(Wildcard::Single) => self.single,
            Some(Wildcard::Multi) => self.multi,
            None => self.literals.get(token).copied(),
        }
    }

    /// Number of distinct children (literals plus wildcard branches).
    pub(crate) fn fan_out(&self) -> usize {
        self.literals.len() + usize::from(self.single.is_some()) + usize::from(self.multi.is_some())
    }

    /// Children in priority order: literals (sorted), then `_`, then `*`.
    pub(crate) fn children(&self) -> impl Iterator<Item = (&str, NodeId)> {
        self.literals
            .iter()
            .map(|(token, id)| (token.as_str(), *id))
            .chain(self.single.map(|id| (UNDERSCORE, id)))
            .chain(self.multi.map(|id| (STAR, id)))
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Arena {
    nodes: Vec<Node>,
}

impl Arena {
    pub(crate) fn new() -> Self {
        Arena { nodes: vec![Node::default()] }
    }

    pub(crate) fn get(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Return the child of `parent` for `token`, creating it if absent.
    pub(crate) fn child_or_insert(&mut self, parent: NodeId, token: &str) -> NodeId {
        if let Some(id) = self.get(parent).child(token) {
            return id;
        }

        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::default());

        let node = self.get_mut(parent);
        match Wildcard::of(token) {
            Some(Wildcard::Single) => node.single = Some(id),
            Some(Wildcard::Multi) => node.multi = Some(id),
            None => {
                node.literals.insert(token.to_string(), id);
            }
        }
        id
    }

    /// Follow `path` literally (wildcards as segments) without creating nodes.
    pub(crate) fn walk<'p>(&self, path: impl IntoIterator<Item = &'p str>) -> Option<NodeId> {
        path.into_iter().try_fold(NodeId::ROOT, |id, token| self.get(id).child(token))
    }
}

/// Read-only handle to a node of a [`Graph`].
#[derive(Debug, Clone, Copy)]
pub struct NodeRef<'g> {
    graph: &'g Graph,
    id: NodeId,
}

impl<'g> NodeRef<'g> {
    pub(crate) fn new(graph: &'g Graph, id: NodeId) -> Self {
        NodeRef { graph, id }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    /// The live category held by this node, if it is a leaf.
    pub fn category(&self) -> Option<&'g Category> {
        self.graph.live_category(self.node())
    }

    pub fn is_leaf(&self) -> bool {
        self.category().is_some()
    }

    /// Whether this leaf stands for an elided `<THAT> * <TOPIC> *` suffix.
    pub fn is_shortcut(&self) -> bool {
        self.node().shortcut
    }

    pub fn fan_out(&self) -> usize {
        self.node().fan_out()
    }

    pub fn child(&self, token: &str) -> Option<NodeRef<'g>> {
        self.node().child(token).map(|id| NodeRef::new(self.graph, id))
    }

    fn node(&self) -> &'g Node {
        self.graph.arena().get(self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn child_or_insert_reuses_existing_branches() {
        let mut arena = Arena::new();
        let hello = arena.child_or_insert(NodeId::ROOT, "HELLO");
        let star = arena.child_or_insert(hello, "*");
        let under = arena.child_or_insert(hello, "_");
        assert_eq!(arena.child_or_insert(NodeId::ROOT, "HELLO"), hello);
        assert_eq!(arena.child_or_insert(hello, "*"), star);
        assert_eq!(arena.len(), 4);

        let node = arena.get(hello);
        assert_eq!(node.multi, Some(star));
        assert_eq!(node.single, Some(under));
        assert!(node.literals.is_empty());
        assert_eq!(node.fan_out(), 2);
    }

    #[test]
    fn children_come_in_priority_order() {
        let mut arena = Arena::new();
        arena.child_or_insert(NodeId::ROOT, "*");
        arena.child_or_insert(NodeId::ROOT, "ZED");
        arena.child_or_insert(NodeId::ROOT, "_");
        arena.child_or_insert(NodeId::ROOT, "ALPHA");

        let order: Vec<&str> = arena.get(NodeId::ROOT).children().map(|(t, _)| t).collect();
        assert_eq!(order, vec!["ALPHA", "ZED", "_", "*"]);
    }

    #[test]
    fn walk_follows_wildcards_literally() {
        let mut arena = Arena::new();
        let a = arena.child_or_insert(NodeId::ROOT, "A");
        let star = arena.child_or_insert(a, "*");
        assert_eq!(arena.walk(["A", "*"]), Some(star));
        assert_eq!(arena.walk(["A", "B"]), None);
        assert_eq!(arena.walk(std::iter::empty()), Some(NodeId::ROOT));
    }
}
