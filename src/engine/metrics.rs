//! Match metrics.
//!
//! Counters collected by one matcher run. They are cheap (plain integers plus
//! one `Instant`) and always collected; [`Graph::match_with_metrics`] is the
//! only entry point that hands them to callers.
//!
//! The intended usage is profiling wildcard-heavy rule sets and tuning
//! `matching.step_budget`: a run that reports `budget_exhausted` returned
//! "no match" without finishing its search.
//!
//! [`Graph::match_with_metrics`]: crate::Graph::match_with_metrics

use std::time::Duration;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MatchMetrics {
    /// Elapsed time for the whole match call.
    pub total: Duration,
    /// Node visits, counted against the step budget.
    pub steps: usize,
    /// Visits short-circuited by the failed-(node, position) memo.
    pub memo_hits: usize,
    /// Branches abandoned after failing to reach a leaf.
    pub backtracks: usize,
    /// Whether the step budget ran out before the search finished.
    pub budget_exhausted: bool,
}
