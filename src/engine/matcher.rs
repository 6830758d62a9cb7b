//! Recursive-descent matcher.
//!
//! This module is the operational core of the engine: given a [`Query`] (the
//! concatenated `input <THAT> that <TOPIC> topic` path) it walks the arena from
//! the root and returns the first leaf reachable under a fixed priority order.
//!
//! ## Priority
//!
//! At every node, for the current token:
//!
//! ```text
//! 1. literal child == token           consume 1
//! 2. `_` child                        consume 1
//! 3. `*` child                        consume 1, 2, ... up to the segment end
//!                                     (shortest first)
//! ```
//!
//! Each option is explored to exhaustion before the next one is tried, so a
//! literal branch always dominates wildcard branches at the same node. The
//! order never depends on insertion history: the shadow checker relies on the
//! same query always resolving to the same leaf.
//!
//! Wildcards never consume separators; a `*` stops at the end of its segment.
//!
//! ## Shortcut leaves
//!
//! A leaf flagged `shortcut` stands for `... <THAT> * <TOPIC> *`. When the
//! current token is `<THAT>`, the materialized `<THAT>` branch is explored first
//! and the shortcut leaf is accepted only if that branch fails. That is exactly
//! where a materialized `* <TOPIC> *` suffix would sit in the priority order.
//!
//! ## Cost bounding
//!
//! Whether `(node, position)` can reach a leaf does not depend on how the
//! matcher got there, so failures are memoized for the duration of one call.
//! A step budget on top of that turns pathological inputs into "no match".

use super::graph::Graph;
use super::metrics::MatchMetrics;
use super::node::NodeId;
use crate::api::Capture;
use crate::{Segment, THAT_SEPARATOR, TOPIC_SEPARATOR, Wildcard, is_separator};
use std::collections::HashSet;
use std::ops::Range;
use std::time::Instant;

#[derive(Debug, Clone, Copy)]
struct Position {
    /// `None` for separators.
    segment: Option<Segment>,
    /// Token index within the segment.
    offset: usize,
    /// Path index one past the last token of this segment.
    segment_end: usize,
}

/// A match request flattened into a single path.
///
/// ```text
/// input ["HI","THERE"], that [], topic ["CHAT"]
///
/// tokens:    HI  THERE  <THAT>  UNKNOWN  <TOPIC>  CHAT
/// segment:   In  In     -       That     -        Topic
/// ```
///
/// Empty context segments are filled with the configured default token so a
/// `*` in that/topic always has something to bind.
#[derive(Debug, Clone)]
pub(crate) struct Query {
    tokens: Vec<String>,
    positions: Vec<Position>,
    that: Range<usize>,
    topic: Range<usize>,
}

impl Query {
    pub(crate) fn new<S: AsRef<str>>(input: &[S], that: &[S], topic: &[S], default_context: &str) -> Self {
        let mut query = Query { tokens: Vec::new(), positions: Vec::new(), that: 0..0, topic: 0..0 };
        query.push_segment(Segment::Input, clean(input), None);
        query.push_separator(THAT_SEPARATOR);
        query.that = query.push_segment(Segment::That, clean(that), Some(default_context));
        query.push_separator(TOPIC_SEPARATOR);
        query.topic = query.push_segment(Segment::Topic, clean(topic), Some(default_context));
        query
    }

    fn push_segment(&mut self, segment: Segment, tokens: Vec<&str>, fallback: Option<&str>) -> Range<usize> {
        let tokens = if tokens.is_empty() { fallback.into_iter().collect() } else { tokens };
        let start = self.tokens.len();
        let end = start + tokens.len();
        for (offset, token) in tokens.into_iter().enumerate() {
            self.tokens.push(token.to_string());
            self.positions.push(Position { segment: Some(segment), offset, segment_end: end });
        }
        start..end
    }

    fn push_separator(&mut self, separator: &str) {
        let at = self.tokens.len();
        self.tokens.push(separator.to_string());
        self.positions.push(Position { segment: None, offset: 0, segment_end: at + 1 });
    }

    pub(crate) fn len(&self) -> usize {
        self.tokens.len()
    }

    /// The flattened path, separators included.
    pub(crate) fn path(&self) -> String {
        self.tokens.join(" ")
    }

    fn capture(&self, span: Range<usize>, wildcard: Wildcard) -> Option<Capture> {
        let first = self.positions.get(span.start)?;
        let segment = first.segment?;
        Some(Capture {
            segment,
            wildcard,
            start: first.offset,
            end: first.offset + span.len(),
            text: self.tokens[span].join(" "),
        })
    }
}

/// Split on whitespace and drop anything that would collide with a separator.
fn clean<S: AsRef<str>>(tokens: &[S]) -> Vec<&str> {
    tokens.iter().flat_map(|t| t.as_ref().split_whitespace()).filter(|t| !is_separator(t)).collect()
}

/// Outcome of one matcher run. `leaf` is `None` for "no match".
#[derive(Debug)]
pub(crate) struct Outcome {
    pub(crate) leaf: Option<NodeId>,
    pub(crate) captures: Vec<Capture>,
    pub(crate) metrics: MatchMetrics,
}

pub(crate) struct Matcher<'g, 'q> {
    graph: &'g Graph,
    query: &'q Query,
    budget: usize,
    /// Captures along the branch currently being explored.
    captures: Vec<Capture>,
    /// `(node, position)` pairs known not to reach a leaf.
    failed: HashSet<(NodeId, usize)>,
    metrics: MatchMetrics,
}

impl<'g, 'q> Matcher<'g, 'q> {
    pub(crate) fn new(graph: &'g Graph, query: &'q Query, budget: usize) -> Self {
        Matcher {
            graph,
            query,
            budget,
            captures: Vec::new(),
            failed: HashSet::new(),
            metrics: MatchMetrics::default(),
        }
    }

    pub(crate) fn run(mut self) -> Outcome {
        let start = Instant::now();
        let leaf = self.descend(NodeId::ROOT, 0);
        self.metrics.total = start.elapsed();

        if self.metrics.budget_exhausted {
            tracing::warn!(
                graph = self.graph.name(),
                path = %self.query.path(),
                steps = self.metrics.steps,
                "match step budget exhausted; treating as no match"
            );
        }

        let captures = if leaf.is_some() { self.captures } else { Vec::new() };
        Outcome { leaf, captures, metrics: self.metrics }
    }

    /// Try to reach a leaf from `node` with the path suffix starting at `pos`.
    fn descend(&mut self, node: NodeId, pos: usize) -> Option<NodeId> {
        if self.metrics.budget_exhausted {
            return None;
        }
        self.metrics.steps += 1;
        if self.metrics.steps > self.budget {
            self.metrics.budget_exhausted = true;
            return None;
        }
        if self.failed.contains(&(node, pos)) {
            self.metrics.memo_hits += 1;
            return None;
        }

        let found = if pos == self.query.len() {
            self.graph.live_leaf(node).then_some(node)
        } else if self.query.positions[pos].segment.is_none() {
            self.descend_separator(node, pos)
        } else {
            self.descend_token(node, pos)
        };

        if found.is_none() && !self.metrics.budget_exhausted {
            self.failed.insert((node, pos));
            self.metrics.backtracks += 1;
        }
        found
    }

    fn descend_separator(&mut self, node: NodeId, pos: usize) -> Option<NodeId> {
        let (graph, query) = (self.graph, self.query);
        let current = graph.arena().get(node);
        let separator = query.tokens[pos].as_str();

        if let Some(&child) = current.literals.get(separator) {
            if let Some(found) = self.descend(child, pos + 1) {
                return Some(found);
            }
        }

        if separator == THAT_SEPARATOR && current.shortcut && graph.live_leaf(node) {
            let that = query.capture(query.that.clone(), Wildcard::Multi);
            let topic = query.capture(query.topic.clone(), Wildcard::Multi);
            self.captures.extend(that.into_iter().chain(topic));
            return Some(node);
        }

        None
    }

    fn descend_token(&mut self, node: NodeId, pos: usize) -> Option<NodeId> {
        let (graph, query) = (self.graph, self.query);
        let current = graph.arena().get(node);
        let token = query.tokens[pos].as_str();

        // 1. literal
        if let Some(&child) = current.literals.get(token) {
            if let Some(found) = self.descend(child, pos + 1) {
                return Some(found);
            }
        }

        // 2. single-token wildcard
        if let Some(child) = current.single {
            if let Some(found) = self.descend_wildcard(child, pos..pos + 1, Wildcard::Single) {
                return Some(found);
            }
        }

        // 3. multi-token wildcard, shortest consumption first
        if let Some(child) = current.multi {
            let segment_end = query.positions[pos].segment_end;
            for end in pos + 1..=segment_end {
                if let Some(found) = self.descend_wildcard(child, pos..end, Wildcard::Multi) {
                    return Some(found);
                }
                if self.metrics.budget_exhausted {
                    break;
                }
            }
        }

        None
    }

    fn descend_wildcard(&mut self, child: NodeId, span: Range<usize>, wildcard: Wildcard) -> Option<NodeId> {
        let next = span.end;
        let capture = self.query.capture(span, wildcard)?;
        self.captures.push(capture);
        let found = self.descend(child, next);
        if found.is_none() {
            self.captures.pop();
        }
        found
    }
}
