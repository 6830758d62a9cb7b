//! Pattern graph and matching engine.
//!
//! Categories go into a [`Graph`], a token trie stored as an arena of nodes.
//! Tokenized input is resolved against it by a backtracking matcher. The
//! pieces live in `src/engine/` and are re-exported here.
//!
//! ## How the parts work together
//!
//! ```text
//! categories ──┐
//!              │  Graph::insert                 (graph.rs)
//!              └──────────────┬──────────────
//!                             │  walk/extend the arena (node.rs)
//!                             v
//!                     Arena<Node>  (root = NodeId::ROOT)
//!                             │
//! text ── Tokenizer::tokenize ┤  (tokenize.rs; sets/maps from vocab.rs)
//!                             │
//!                             v
//!           Graph::match_tokens ── Query ── Matcher::run (matcher.rs)
//!                               - literal, then `_`, then `*`
//!                               - `*` shortest consumption first
//!                               - memoize failed (node, position)
//!                               - step budget
//!                             │
//!                             v
//!                  Option<Match>  + MatchMetrics (metrics.rs)
//! ```
//!
//! ## Responsibilities by module
//!
//! - `node.rs`: the arena, node layout and the read-only [`NodeRef`] handle.
//! - `graph.rs`: category bookkeeping (identity index, sequence numbers,
//!   retirement) and the insert / contains / find_node operations.
//! - `matcher.rs`: the recursive-descent matcher and the [`Query`] path it
//!   walks.
//! - `tokenize.rs`: turns raw text into match tokens using substitution
//!   vocabularies.
//! - `metrics.rs`: per-call counters for profiling and budget tuning.
//!
//! ## Debugging
//!
//! The engine emits `tracing` events: `debug` for inserts and retirements,
//! `trace` for match outcomes, `warn` when a step budget is exhausted.

#[path = "engine/graph.rs"]
mod graph;
#[path = "engine/matcher.rs"]
mod matcher;
#[path = "engine/metrics.rs"]
mod metrics;
#[path = "engine/node.rs"]
mod node;
#[path = "engine/tokenize.rs"]
mod tokenize;

#[cfg(test)]
#[path = "engine/tests.rs"]
mod tests;

pub use graph::Graph;
pub(crate) use matcher::Query;
pub use metrics::MatchMetrics;
pub use node::{NodeId, NodeRef};
pub use tokenize::Tokenizer;
