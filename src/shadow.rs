//! Shadow detection.
//!
//! A category is *shadowed* when the input it was written for can no longer
//! reach it: some other category wins under the matcher's priority order. The
//! checker replays every live category against its own graph, with each
//! wildcard replaced by a filler token, and reports the ones that resolve
//! elsewhere.
//!
//! ```text
//! WHAT IS *        ── query ──▶  WHAT IS XXX <THAT> XXX <TOPIC> XXX
//!                                       │
//!                        matcher ───────┘
//!                                       ▼
//!                      leaf of WHAT IS _   ≠ own leaf   → shadowed
//! ```
//!
//! The check is read-only: usage counters are not touched.

use crate::config::ShadowConfig;
use crate::engine::{Graph, Query};
use crate::{Category, CategoryKey, Wildcard};
use std::time::{Duration, Instant};

/// One unreachable category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shadowed {
    pub category: CategoryKey,
    /// The synthesized query path that was matched.
    pub query: String,
    /// What the query resolved to instead, `None` if nothing matched.
    pub matched: Option<CategoryKey>,
}

#[derive(Debug, Clone, Default)]
pub struct ShadowReport {
    pub checked: usize,
    pub shadowed: Vec<Shadowed>,
    pub elapsed: Duration,
}

impl ShadowReport {
    pub fn is_clean(&self) -> bool {
        self.shadowed.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ShadowChecker {
    config: ShadowConfig,
}

impl ShadowChecker {
    pub fn new(config: ShadowConfig) -> Self {
        ShadowChecker { config }
    }

    pub fn filler(&self) -> &str {
        &self.config.filler
    }

    pub fn check(&self, graph: &Graph) -> ShadowReport {
        let start = Instant::now();
        let mut report = ShadowReport::default();

        for (leaf, category) in graph.leaves() {
            report.checked += 1;

            let query = self.query_for(graph, category);
            let (result, _) = graph.resolve(&query);
            if result.as_ref().is_some_and(|m| m.node == leaf) {
                continue;
            }

            let matched = result.map(|m| m.category.key());
            match &matched {
                Some(other) => tracing::warn!(
                    graph = graph.name(),
                    category = %category.key(),
                    shadowed_by = %other,
                    "category is shadowed"
                ),
                None => tracing::warn!(
                    graph = graph.name(),
                    category = %category.key(),
                    "category does not match its own input"
                ),
            }
            report.shadowed.push(Shadowed { category: category.key(), query: query.path(), matched });
        }

        report.elapsed = start.elapsed();
        tracing::debug!(
            graph = graph.name(),
            checked = report.checked,
            shadowed = report.shadowed.len(),
            elapsed_ms = report.elapsed.as_millis() as u64,
            "shadow check finished"
        );
        report
    }

    fn query_for(&self, graph: &Graph, category: &Category) -> Query {
        let fill = |token: &str| -> String {
            if Wildcard::of(token).is_some() { self.config.filler.clone() } else { token.to_string() }
        };
        let input: Vec<String> = category.pattern_tokens().map(fill).collect();
        let that: Vec<String> = category.that_tokens().map(fill).collect();
        let topic: Vec<String> = category.topic_tokens().map(fill).collect();
        Query::new(&input, &that, &topic, &graph.config().default_context)
    }
}
