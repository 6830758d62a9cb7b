extern crate self as patterngraph;

#[macro_use]
mod macros;
mod api;
mod category;
mod config;
mod engine;
mod error;
mod loader;
mod miner;
mod roles;
mod shadow;
mod vocab;

pub use api::{Capture, Match, MatchDetails};
pub use category::{CasePolicy, Category, CategoryKey};
pub use config::{EngineConfig, MatchingConfig, MinerConfig, ShadowConfig, TokenizerConfig};
pub use engine::{Graph, MatchMetrics, NodeId, NodeRef, Tokenizer};
pub use error::{Error, RecordError, Result, ValidationError};
pub use loader::{LoadPolicy, LoadReport, read_records, write_records};
pub use miner::{MiningReport, PatternMiner, Suggestion};
pub use roles::{Brain, Role, RoleSet, RoleSummary};
pub use shadow::{ShadowChecker, ShadowReport, Shadowed};
pub use vocab::{NaturalNumberSet, PredecessorMap, SubstitutionMap, SuccessorMap, TokenSet, Vocabulary};

// --- Reserved path tokens ---------------------------------------------------

/// Multi-token wildcard: consumes one or more tokens of its segment.
pub const STAR: &str = "*";

/// Single-token wildcard: consumes exactly one token.
pub const UNDERSCORE: &str = "_";

/// Separator between the input segment and the that-context segment.
pub const THAT_SEPARATOR: &str = "<THAT>";

/// Separator between the that-context segment and the topic segment.
pub const TOPIC_SEPARATOR: &str = "<TOPIC>";

// --- Path vocabulary --------------------------------------------------------

/// One of the three context dimensions a path is made of.
///
/// ```text
/// HELLO THERE <THAT> HI <TOPIC> *
/// └── Input ┘        └That┘     └Topic
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Segment {
    Input,
    That,
    Topic,
}

/// The two wildcard kinds a pattern token can be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Wildcard {
    /// `_`
    Single,
    /// `*`
    Multi,
}

impl Wildcard {
    /// Classify a normalized token; `None` for literals.
    pub fn of(token: &str) -> Option<Wildcard> {
        match token {
            STAR => Some(Wildcard::Multi),
            UNDERSCORE => Some(Wildcard::Single),
            _ => None,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Wildcard::Single => UNDERSCORE,
            Wildcard::Multi => STAR,
        }
    }
}

/// True for the two segment separators, which user tokens may never be.
pub(crate) fn is_separator(token: &str) -> bool {
    token == THAT_SEPARATOR || token == TOPIC_SEPARATOR
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcard_classification() {
        assert_eq!(Wildcard::of("*"), Some(Wildcard::Multi));
        assert_eq!(Wildcard::of("_"), Some(Wildcard::Single));
        assert_eq!(Wildcard::of("HELLO"), None);
        assert_eq!(Wildcard::Multi.symbol(), "*");
        assert!(is_separator("<THAT>"));
        assert!(!is_separator("THAT"));
    }
}
