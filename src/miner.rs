//! Usage-driven pattern suggestion.
//!
//! Raw utterances are recorded into a *sample* graph (one shortcut category
//! per distinct utterance, repeats bump its usage counter). Mining then walks
//! the sample trie and proposes:
//!
//! - a literal category for every leaf seen more than `activation_threshold`
//!   times;
//! - a `prefix *` category for every node with more than `fanout_threshold`
//!   children, i.e. a prefix that many different utterances continue.
//!
//! ```text
//! sample trie                      proposals (fanout_threshold = 2)
//!
//! (root)
//!  └─ WHAT ─ IS ─┬─ LOVE           WHAT IS *
//!                ├─ LIFE
//!                └─ TIME
//! ```
//!
//! Candidates already present in any filter graph are dropped.

use crate::config::MinerConfig;
use crate::engine::{Graph, NodeId};
use crate::error::ValidationError;
use crate::{CasePolicy, Category, CategoryKey, STAR, THAT_SEPARATOR, TOPIC_SEPARATOR, is_separator};
use std::collections::HashSet;
use std::time::{Duration, Instant};

/// Provenance given to recorded samples and mined candidates.
pub const MINED_SOURCE: &str = "unknown.aiml";

/// A proposed category and how much sample traffic supports it.
#[derive(Debug, Clone)]
pub struct Suggestion {
    pub category: Category,
    pub observed: u64,
}

#[derive(Debug, Clone, Default)]
pub struct MiningReport {
    /// Leaves over the activation threshold.
    pub leaf_patterns: usize,
    /// Nodes over the fan-out threshold.
    pub star_patterns: usize,
    /// Candidates dropped because a filter graph already has them.
    pub filtered: usize,
    pub suggestions: Vec<Suggestion>,
    pub elapsed: Duration,
}

/// Samples and candidates are normalized with `case`, which must be the case
/// policy the filter graphs were built with or `contains` never matches.
#[derive(Debug, Clone, Default)]
pub struct PatternMiner {
    config: MinerConfig,
    case: CasePolicy,
}

impl PatternMiner {
    pub fn new(config: MinerConfig) -> Self {
        PatternMiner { config, case: CasePolicy::default() }
    }

    pub fn with_case(mut self, case: CasePolicy) -> Self {
        self.case = case;
        self
    }

    /// Record one normalized utterance into `sample`, returning how many
    /// times it has now been seen.
    pub fn record_sample<S: AsRef<str>>(&self, sample: &mut Graph, tokens: &[S]) -> Result<u64, ValidationError> {
        let text = tokens.iter().map(AsRef::as_ref).collect::<Vec<_>>().join(" ");
        let category = Category::new_with(&text, STAR, STAR, "", MINED_SOURCE, self.case)?;
        let key = category.key();
        sample.insert(category);
        Ok(sample.get(&key).map_or(0, Category::increment_activations))
    }

    /// Walk `sample` and collect candidates absent from every graph in
    /// `filters`.
    pub fn mine(&self, sample: &Graph, filters: &[&Graph]) -> MiningReport {
        let start = Instant::now();
        let mut walk = Walk { miner: self, sample, filters, seen: HashSet::new(), report: MiningReport::default() };

        if sample.is_empty() {
            tracing::warn!(graph = sample.name(), "sample graph is empty, nothing to mine");
        } else {
            walk.visit(NodeId::ROOT, &mut Vec::new());
        }

        let mut report = walk.report;
        report.elapsed = start.elapsed();
        tracing::info!(
            leaf_patterns = report.leaf_patterns,
            star_patterns = report.star_patterns,
            filtered = report.filtered,
            suggestions = report.suggestions.len(),
            elapsed_ms = report.elapsed.as_millis() as u64,
            "pattern mining finished"
        );
        report
    }
}

struct Walk<'a> {
    miner: &'a PatternMiner,
    sample: &'a Graph,
    filters: &'a [&'a Graph],
    seen: HashSet<CategoryKey>,
    report: MiningReport,
}

impl<'a> Walk<'a> {
    /// Propose candidates for the subtree at `id`; returns its total usage.
    fn visit(&mut self, id: NodeId, path: &mut Vec<&'a str>) -> u64 {
        let sample = self.sample;
        let node = sample.arena().get(id);
        let mut observed = 0;

        if let Some(category) = sample.live_category(node) {
            observed = category.activations();
            if observed > self.miner.config.activation_threshold {
                self.report.leaf_patterns += 1;
                let mut text = path.join(" ");
                if node.shortcut {
                    text = format!("{text} {THAT_SEPARATOR} {STAR} {TOPIC_SEPARATOR} {STAR}");
                }
                self.propose(&text, observed, None);
            }
        }

        let star_at = (node.fan_out() > self.miner.config.fanout_threshold && !path.iter().any(|t| is_separator(t)))
            .then_some(self.report.suggestions.len());

        for (token, child) in node.children() {
            path.push(token);
            observed += self.visit(child, path);
            path.pop();
        }

        if let Some(at) = star_at {
            self.report.star_patterns += 1;
            let text = path.iter().copied().chain([STAR]).collect::<Vec<_>>().join(" ");
            self.propose(&text, observed, Some(at));
        }

        observed
    }

    fn propose(&mut self, path: &str, observed: u64, at: Option<usize>) {
        let category = match Category::from_path_with(path, "", MINED_SOURCE, self.miner.case) {
            Ok(category) => category,
            Err(err) => {
                tracing::debug!(path = path, error = %err, "skipping invalid candidate");
                return;
            }
        };

        let key = category.key();
        if self.filters.iter().any(|graph| graph.contains(&category)) {
            self.report.filtered += 1;
            return;
        }
        if !self.seen.insert(key) {
            return;
        }

        let suggestion = Suggestion { category, observed };
        match at {
            Some(at) => self.report.suggestions.insert(at, suggestion),
            None => self.report.suggestions.push(suggestion),
        }
    }
}
