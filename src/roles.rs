//! Role orchestration.
//!
//! A [`Brain`] keeps one [`Graph`] per lifecycle role and moves categories
//! between them. Every role graph is the same type; a move is an insert into
//! the destination plus a retire in the source.
//!
//! ```text
//!   source id contains        goes to
//!   ──────────────────        ──────────────────────────────
//!   "deleted"                 Deleted
//!   "unfinished"              Unfinished (unless already Active)
//!   "learnf"                  Active + Learned + Suggestion
//!   anything else             Active + Suggestion
//!
//!   raw utterances ──▶ Sample ──mine──▶ Suggestion (minus Active/Deleted/Unfinished)
//! ```

use crate::api::Match;
use crate::config::EngineConfig;
use crate::engine::{Graph, Tokenizer};
use crate::error::Result;
use crate::loader::{LoadPolicy, read_records, write_records};
use crate::miner::{MiningReport, PatternMiner, Suggestion};
use crate::shadow::{ShadowChecker, ShadowReport};
use crate::vocab::Vocabulary;
use crate::{Category, CategoryKey, STAR};
use chrono::NaiveDateTime;
use std::fmt;
use std::io::{BufRead, Write};

const DELETED_SOURCE: &str = "deleted";
const UNFINISHED_SOURCE: &str = "unfinished";
const LEARNF_SOURCE: &str = "learnf";
const BUILD_SOURCE: &str = "update.aiml";
const BUILD_PATTERN: &str = "BUILD";
const HUMAN_PREFIX: &str = "Human: ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Active,
    Deleted,
    Unfinished,
    Learned,
    Suggestion,
    Sample,
}

impl Role {
    pub const ALL: [Role; 6] =
        [Role::Active, Role::Deleted, Role::Unfinished, Role::Learned, Role::Suggestion, Role::Sample];

    pub fn name(self) -> &'static str {
        match self {
            Role::Active => "active",
            Role::Deleted => "deleted",
            Role::Unfinished => "unfinished",
            Role::Learned => "learned",
            Role::Suggestion => "suggestion",
            Role::Sample => "sample",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

bitflags::bitflags! {
    /// A set of roles a category was routed to.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct RoleSet: u8 {
        const ACTIVE     = 1 << 0;
        const DELETED    = 1 << 1;
        const UNFINISHED = 1 << 2;
        const LEARNED    = 1 << 3;
        const SUGGESTION = 1 << 4;
        const SAMPLE     = 1 << 5;
    }
}

impl From<Role> for RoleSet {
    fn from(role: Role) -> Self {
        RoleSet::from_bits_truncate(1 << role.index())
    }
}

impl RoleSet {
    /// Member roles in declaration order.
    pub fn roles(self) -> impl Iterator<Item = Role> {
        Role::ALL.into_iter().filter(move |role| self.contains(RoleSet::from(*role)))
    }

    /// Where categories read from `source` belong.
    pub fn for_source(source: &str) -> RoleSet {
        if source.contains(DELETED_SOURCE) {
            RoleSet::DELETED
        } else if source.contains(UNFINISHED_SOURCE) {
            RoleSet::UNFINISHED
        } else if source.contains(LEARNF_SOURCE) {
            RoleSet::ACTIVE | RoleSet::LEARNED | RoleSet::SUGGESTION
        } else {
            RoleSet::ACTIVE | RoleSet::SUGGESTION
        }
    }
}

/// Live category counts per role.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoleSummary {
    pub active: usize,
    pub deleted: usize,
    pub unfinished: usize,
    pub learned: usize,
    pub suggestion: usize,
    pub sample: usize,
    /// Length of the mined suggestion list.
    pub suggestions: usize,
}

impl fmt::Display for RoleSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} active, {} deleted, {} unfinished, {} learned, {} suggestion, {} sample, {} mined",
            self.active, self.deleted, self.unfinished, self.learned, self.suggestion, self.sample, self.suggestions
        )
    }
}

/// The role graphs of one bot plus the tools that run over them.
#[derive(Debug)]
pub struct Brain {
    name: String,
    config: EngineConfig,
    vocabulary: Vocabulary,
    graphs: Vec<Graph>,
    suggestions: Vec<Suggestion>,
}

impl Brain {
    pub fn new(name: impl Into<String>, config: EngineConfig) -> Self {
        let name = name.into();
        let graphs = Role::ALL
            .iter()
            .map(|role| Graph::with_config(format!("{name}/{role}"), config.matching.clone()))
            .collect();
        Brain { name, config, vocabulary: Vocabulary::with_builtins(), graphs, suggestions: Vec::new() }
    }

    pub fn with_vocabulary(mut self, vocabulary: Vocabulary) -> Self {
        self.vocabulary = vocabulary;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn vocabulary_mut(&mut self) -> &mut Vocabulary {
        &mut self.vocabulary
    }

    pub fn graph(&self, role: Role) -> &Graph {
        &self.graphs[role.index()]
    }

    pub fn graph_mut(&mut self, role: Role) -> &mut Graph {
        &mut self.graphs[role.index()]
    }

    pub fn tokenizer(&self) -> Tokenizer<'_> {
        Tokenizer::new(&self.vocabulary, &self.config.tokenizer)
    }

    fn miner(&self) -> PatternMiner {
        PatternMiner::new(self.config.miner.clone()).with_case(self.config.tokenizer.case)
    }

    /// Mined suggestions accumulated by [`find_patterns`](Self::find_patterns).
    pub fn suggestions(&self) -> &[Suggestion] {
        &self.suggestions
    }

    fn insert_into(&mut self, roles: RoleSet, category: Category) {
        for role in roles.roles() {
            self.graph_mut(role).insert(category.clone());
        }
    }

    /// Route a batch of categories by the id of the source they came from.
    pub fn add_categories(&mut self, source: &str, categories: impl IntoIterator<Item = Category>) -> RoleSet {
        let roles = RoleSet::for_source(source);
        let mut added = 0usize;

        for category in categories {
            if roles == RoleSet::UNFINISHED && self.graph(Role::Active).contains(&category) {
                tracing::info!(category = %category.key(), "unfinished category already active, skipping");
                continue;
            }
            self.insert_into(roles, category);
            added += 1;
        }

        tracing::debug!(source, roles = ?roles, added, "added categories");
        roles
    }

    /// Add a category learned at runtime.
    pub fn learn(&mut self, category: Category) {
        tracing::debug!(category = %category.key(), "learned category");
        self.insert_into(RoleSet::ACTIVE | RoleSet::LEARNED | RoleSet::SUGGESTION, category);
    }

    /// Move the category with `key` from one role graph to another.
    ///
    /// Returns `false` when `from` has no live category with that key.
    pub fn move_category(&mut self, key: &CategoryKey, from: Role, to: Role) -> bool {
        let Some(category) = self.graph_mut(from).retire(key) else {
            return false;
        };
        tracing::debug!(category = %key, %from, %to, "moved category");
        self.graph_mut(to).insert(category);
        true
    }

    /// Retire unfinished categories that have since been completed in the
    /// active graph. Returns how many were retired.
    pub fn update_unfinished(&mut self) -> usize {
        let finished: Vec<CategoryKey> = self
            .graph(Role::Unfinished)
            .categories()
            .filter(|category| self.graph(Role::Active).contains(category))
            .map(Category::key)
            .collect();

        let unfinished = self.graph_mut(Role::Unfinished);
        for key in &finished {
            unfinished.retire(key);
        }
        if !finished.is_empty() {
            tracing::debug!(retired = finished.len(), "updated unfinished categories");
        }
        finished.len()
    }

    /// Tokenize one turn and match it against the active graph.
    pub fn respond(&self, input: &str, that: &str, topic: &str) -> Option<Match<'_>> {
        let tokenizer = self.tokenizer();
        let input = tokenizer.tokenize(input);
        let that = tokenizer.tokenize(that);
        let topic = tokenizer.tokenize(topic);
        self.graph(Role::Active).match_tokens(&input, &that, &topic)
    }

    /// Record a raw utterance into the sample graph.
    ///
    /// Returns how many times it has been seen, or `None` if it could not be
    /// recorded.
    pub fn record_sample(&mut self, text: &str) -> Option<u64> {
        let tokens = self.tokenizer().tokenize(text);
        let miner = self.miner();
        match miner.record_sample(self.graph_mut(Role::Sample), &tokens) {
            Ok(count) => Some(count),
            Err(err) => {
                tracing::warn!(text, error = %err, "cannot record sample");
                None
            }
        }
    }

    /// Mine the sample graph. New suggestions go into the suggestion graph and
    /// the suggestion list.
    pub fn find_patterns(&mut self) -> MiningReport {
        let miner = self.miner();
        let filters = [self.graph(Role::Active), self.graph(Role::Deleted), self.graph(Role::Unfinished)];
        let report = miner.mine(self.graph(Role::Sample), &filters);

        for suggestion in &report.suggestions {
            if self.graph(Role::Suggestion).contains(&suggestion.category) {
                continue;
            }
            self.graph_mut(Role::Suggestion).insert(suggestion.category.clone());
            self.suggestions.push(suggestion.clone());
        }
        report
    }

    /// Match sample lines against the suggestion graph, bumping usage on
    /// whatever they hit. Returns how many lines matched.
    pub fn classify_inputs<'l>(&self, lines: impl IntoIterator<Item = &'l str>) -> usize {
        let tokenizer = self.tokenizer();
        let suggestion = self.graph(Role::Suggestion);
        let mut matched = 0;

        for line in lines {
            let line = line.strip_prefix(HUMAN_PREFIX).unwrap_or(line);
            let input = tokenizer.tokenize(line);
            if suggestion.match_tokens::<String>(&input, &[], &[]).is_some() {
                matched += 1;
            } else {
                tracing::debug!(line, "input matched no suggestion");
            }
        }
        matched
    }

    /// Look for unreachable categories in the active graph.
    pub fn shadow_check(&self) -> ShadowReport {
        ShadowChecker::new(self.config.shadow.clone()).check(self.graph(Role::Active))
    }

    /// Record when this brain was built as a `BUILD` category.
    pub fn stamp_build(&mut self, now: NaiveDateTime) {
        let stamp = now.format("%a %b %d %H:%M:%S %Y").to_string();
        match Category::new(BUILD_PATTERN, STAR, STAR, stamp, BUILD_SOURCE) {
            Ok(category) => {
                self.graph_mut(Role::Active).insert(category);
            }
            Err(err) => tracing::warn!(error = %err, "cannot stamp build"),
        }
    }

    /// [`stamp_build`](Self::stamp_build) with the local clock.
    pub fn stamp_build_now(&mut self) {
        self.stamp_build(chrono::Local::now().naive_local());
    }

    /// Load interchange records straight into one role graph.
    pub fn load_role(&mut self, role: Role, reader: impl BufRead, policy: LoadPolicy) -> Result<usize> {
        let report = read_records(reader, policy)?;
        let loaded = report.categories.len();
        let graph = self.graph_mut(role);
        for category in report.categories {
            graph.insert(category);
        }
        tracing::debug!(%role, loaded, skipped = report.skipped.len(), "loaded role");
        Ok(loaded)
    }

    /// Load interchange records and route them as coming from `source`.
    pub fn load_source(&mut self, source: &str, reader: impl BufRead, policy: LoadPolicy) -> Result<RoleSet> {
        let report = read_records(reader, policy)?;
        Ok(self.add_categories(source, report.categories))
    }

    /// Write one role graph as interchange records, ordered by sequence number.
    pub fn write_role(&self, role: Role, writer: impl Write) -> Result<usize> {
        write_records(writer, self.graph(role).categories())
    }

    pub fn summary(&self) -> RoleSummary {
        let summary = RoleSummary {
            active: self.graph(Role::Active).len(),
            deleted: self.graph(Role::Deleted).len(),
            unfinished: self.graph(Role::Unfinished).len(),
            learned: self.graph(Role::Learned).len(),
            suggestion: self.graph(Role::Suggestion).len(),
            sample: self.graph(Role::Sample).len(),
            suggestions: self.suggestions.len(),
        };
        tracing::info!(brain = %self.name, %summary, "role summary");
        summary
    }
}

impl Default for Brain {
    fn default() -> Self {
        Brain::new("brain", EngineConfig::default())
    }
}
