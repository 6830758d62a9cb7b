//! Input tokenization.
//!
//! Turns raw text into the token stream handed to [`Graph::match_tokens`]:
//!
//! ```text
//! "  don't   STOP 41 " ── normalize (case, whitespace)
//!                     ── split
//!                     ── drop tokens in the drop set
//!                     ── substitution maps, in configured order
//!                     ──▶ ["DO", "NOT", "STOP", "41"]   (with a "normal" map)
//! ```
//!
//! A substitution may expand one token into several; later maps see the
//! expanded tokens. Separator lookalikes are never emitted.
//!
//! [`Graph::match_tokens`]: crate::Graph::match_tokens

use crate::category::normalize;
use crate::config::TokenizerConfig;
use crate::vocab::{SubstitutionMap, TokenSet, Vocabulary};
use crate::{CasePolicy, is_separator};

pub struct Tokenizer<'v> {
    case: CasePolicy,
    drop: Option<&'v dyn TokenSet>,
    substitutions: Vec<&'v dyn SubstitutionMap>,
}

impl<'v> Tokenizer<'v> {
    /// Resolve the configured vocabulary names against `vocabulary`.
    ///
    /// Unknown names are logged and skipped.
    pub fn new(vocabulary: &'v Vocabulary, config: &TokenizerConfig) -> Self {
        let drop = config.drop_set.as_deref().and_then(|name| {
            let set = vocabulary.set(name);
            if set.is_none() {
                tracing::warn!(set = name, "drop set not found in vocabulary");
            }
            set
        });

        let substitutions = config
            .substitutions
            .iter()
            .filter_map(|name| {
                let map = vocabulary.map(name);
                if map.is_none() {
                    tracing::warn!(map = %name, "substitution map not found in vocabulary");
                }
                map
            })
            .collect();

        Tokenizer { case: config.case, drop, substitutions }
    }

    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let normalized = normalize(text, self.case);
        let mut tokens: Vec<String> = normalized
            .split(' ')
            .filter(|t| !t.is_empty())
            .filter(|t| !self.drop.is_some_and(|set| set.contains(t)))
            .map(str::to_string)
            .collect();

        for map in &self.substitutions {
            tokens = tokens
                .into_iter()
                .flat_map(|token| match map.lookup(&token) {
                    Some(replacement) => normalize(&replacement, self.case)
                        .split(' ')
                        .filter(|t| !t.is_empty())
                        .map(str::to_string)
                        .collect::<Vec<_>>(),
                    None => vec![token],
                })
                .collect();
        }

        tokens.retain(|t| !is_separator(t));
        tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{HashMap, HashSet};

    fn vocabulary() -> Vocabulary {
        let mut vocabulary = Vocabulary::with_builtins();
        let mut normal = HashMap::new();
        normal.insert("DON'T".to_string(), "do not".to_string());
        normal.insert("U".to_string(), "YOU".to_string());
        vocabulary.add_map("normal", normal);

        let punctuation: HashSet<String> = ["?", "!", "."].into_iter().map(String::from).collect();
        vocabulary.add_set("punctuation", punctuation);
        vocabulary
    }

    #[test]
    fn normalizes_and_splits() {
        let vocabulary = vocabulary();
        let tokenizer = Tokenizer::new(&vocabulary, &TokenizerConfig::default());
        assert_eq!(tokenizer.tokenize("  hello   there "), vec!["HELLO", "THERE"]);
        assert!(tokenizer.tokenize("   ").is_empty());
    }

    #[test]
    fn substitutions_expand_in_order() {
        let vocabulary = vocabulary();
        let config = TokenizerConfig {
            substitutions: vec!["normal".to_string(), "successor".to_string()],
            drop_set: Some("punctuation".to_string()),
            ..TokenizerConfig::default()
        };
        let tokenizer = Tokenizer::new(&vocabulary, &config);
        assert_eq!(tokenizer.tokenize("don't stop 41 !"), vec!["DO", "NOT", "STOP", "42"]);
    }

    #[test]
    fn unknown_vocabulary_names_are_skipped() {
        let vocabulary = vocabulary();
        let config = TokenizerConfig {
            substitutions: vec!["missing".to_string()],
            drop_set: Some("missing".to_string()),
            ..TokenizerConfig::default()
        };
        let tokenizer = Tokenizer::new(&vocabulary, &config);
        assert_eq!(tokenizer.tokenize("u ?"), vec!["U", "?"]);
    }

    #[test]
    fn separators_are_never_emitted() {
        let vocabulary = vocabulary();
        let tokenizer = Tokenizer::new(&vocabulary, &TokenizerConfig::default());
        assert_eq!(tokenizer.tokenize("a <that> b <TOPIC> c"), vec!["A", "B", "C"]);
    }

    #[test]
    fn preserve_case_keeps_text() {
        let vocabulary = vocabulary();
        let config = TokenizerConfig { case: CasePolicy::Preserve, ..TokenizerConfig::default() };
        let tokenizer = Tokenizer::new(&vocabulary, &config);
        assert_eq!(tokenizer.tokenize("Hello World"), vec!["Hello", "World"]);
    }
}
