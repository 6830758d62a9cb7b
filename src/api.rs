use crate::engine::{MatchMetrics, NodeId};
use crate::{Category, Segment, Wildcard};

/// One wildcard binding produced by a match.
///
/// `start`/`end` are token indices into the matched segment (end exclusive).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capture {
    /// Segment the wildcard sits in.
    pub segment: Segment,
    /// Which wildcard captured the span.
    pub wildcard: Wildcard,
    /// Start token index within the segment.
    pub start: usize,
    /// End token index within the segment (exclusive).
    pub end: usize,
    /// Captured tokens joined by single spaces.
    pub text: String,
}

/// A successful match: the resolved category, the leaf it hangs from, and
/// the wildcard captures in path order.
#[derive(Debug, Clone)]
pub struct Match<'g> {
    pub category: &'g Category,
    pub node: NodeId,
    pub captures: Vec<Capture>,
}

impl<'g> Match<'g> {
    /// Captured texts of one segment, in order.
    ///
    /// ```
    /// use patterngraph::{Graph, Segment, category};
    ///
    /// let mut graph = Graph::new("brain");
    /// graph.insert(category!(pattern: "MY NAME IS *", template: "Hi"));
    /// let m = graph.match_tokens(&["MY", "NAME", "IS", "ADA", "LOVELACE"], &[], &[]).unwrap();
    /// assert_eq!(m.stars(Segment::Input), vec!["ADA LOVELACE"]);
    /// ```
    pub fn stars(&self, segment: Segment) -> Vec<&str> {
        self.captures.iter().filter(|c| c.segment == segment).map(|c| c.text.as_str()).collect()
    }

    /// The `index`-th (1-based) capture of `segment`.
    pub fn star(&self, segment: Segment, index: usize) -> Option<&str> {
        index.checked_sub(1).and_then(|i| self.stars(segment).get(i).copied())
    }

    pub fn template(&self) -> &'g str {
        self.category.template()
    }
}

/// Result of [`Graph::match_with_metrics`](crate::Graph::match_with_metrics).
#[derive(Debug, Clone)]
pub struct MatchDetails<'g> {
    /// The query path that was matched, separators included.
    pub path: String,
    pub result: Option<Match<'g>>,
    pub metrics: MatchMetrics,
}
