//! Engine configuration.
//!
//! Every field has a default, so an empty or missing file is a valid
//! configuration. A typical file:
//!
//! ```toml
//! [matching]
//! step_budget = 100000
//! default_context = "UNKNOWN"
//!
//! [shadow]
//! filler = "XXX"
//!
//! [miner]
//! activation_threshold = 4
//! fanout_threshold = 4
//!
//! [tokenizer]
//! case = "upper"
//! substitutions = ["normal"]
//! drop_set = "punctuation"
//! ```

use crate::category::CasePolicy;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub matching: MatchingConfig,
    #[serde(default)]
    pub shadow: ShadowConfig,
    #[serde(default)]
    pub miner: MinerConfig,
    #[serde(default)]
    pub tokenizer: TokenizerConfig,
}

/// Matcher limits and context defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchingConfig {
    /// Maximum node visits per match call; exceeding it yields "no match".
    #[serde(default = "default_step_budget")]
    pub step_budget: usize,

    /// Token used in place of an empty that/topic context at match time.
    #[serde(default = "default_context")]
    pub default_context: String,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self { step_budget: default_step_budget(), default_context: default_context() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShadowConfig {
    /// Token substituted for every wildcard when a category queries itself.
    #[serde(default = "default_filler")]
    pub filler: String,
}

impl Default for ShadowConfig {
    fn default() -> Self {
        Self { filler: default_filler() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinerConfig {
    /// A sample leaf seen more than this many times becomes a candidate.
    #[serde(default = "default_threshold")]
    pub activation_threshold: u64,

    /// A node with more than this many children becomes a `prefix *` candidate.
    #[serde(default = "default_fanout")]
    pub fanout_threshold: usize,
}

impl Default for MinerConfig {
    fn default() -> Self {
        Self { activation_threshold: default_threshold(), fanout_threshold: default_fanout() }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenizerConfig {
    #[serde(default)]
    pub case: CasePolicy,

    /// Names of substitution maps applied to each token, in order.
    #[serde(default)]
    pub substitutions: Vec<String>,

    /// Name of a set whose members are dropped from the token stream.
    #[serde(default)]
    pub drop_set: Option<String>,
}

fn default_step_budget() -> usize {
    100_000
}

fn default_context() -> String {
    "UNKNOWN".to_string()
}

fn default_filler() -> String {
    "XXX".to_string()
}

fn default_threshold() -> u64 {
    4
}

fn default_fanout() -> usize {
    4
}

impl EngineConfig {
    /// Load configuration from `path`, falling back to defaults when the file
    /// does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::warn!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| Error::ConfigParse { path: path.to_path_buf(), message: e.to_string() })
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_config_uses_defaults() {
        let config = EngineConfig::from_toml_str("").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.matching.step_budget, 100_000);
        assert_eq!(config.matching.default_context, "UNKNOWN");
        assert_eq!(config.shadow.filler, "XXX");
        assert_eq!(config.miner.activation_threshold, 4);
        assert_eq!(config.miner.fanout_threshold, 4);
        assert_eq!(config.tokenizer.case, CasePolicy::Upper);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = EngineConfig::from_toml_str(
            r#"
            [miner]
            fanout_threshold = 10

            [tokenizer]
            case = "lower"
            substitutions = ["normal", "person"]
            "#,
        )
        .unwrap();
        assert_eq!(config.miner.fanout_threshold, 10);
        assert_eq!(config.miner.activation_threshold, 4);
        assert_eq!(config.tokenizer.case, CasePolicy::Lower);
        assert_eq!(config.tokenizer.substitutions, vec!["normal", "person"]);
        assert_eq!(config.tokenizer.drop_set, None);
    }

    #[test]
    fn load_reads_file_and_tolerates_missing_one() {
        let dir = tempfile::tempdir().unwrap();
        let missing = EngineConfig::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(missing, EngineConfig::default());

        let path = dir.path().join("engine.toml");
        let mut file = fs::File::create(&path).unwrap();
        writeln!(file, "[shadow]\nfiller = \"QQQ\"").unwrap();
        let loaded = EngineConfig::load(&path).unwrap();
        assert_eq!(loaded.shadow.filler, "QQQ");
    }

    #[test]
    fn malformed_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        fs::write(&path, "[matching\nstep_budget = ").unwrap();
        match EngineConfig::load(&path) {
            Err(Error::ConfigParse { path: reported, .. }) => assert_eq!(reported, path),
            other => panic!("expected ConfigParse, got {other:?}"),
        }
    }
}
