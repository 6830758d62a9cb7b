//! Named token sets and substitution maps.
//!
//! The tokenizer looks vocabularies up by name (see `[tokenizer]` in the
//! configuration). Both kinds are trait objects so computed vocabularies
//! (natural numbers, successor/predecessor) sit next to plain tables.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

/// Membership test over normalized tokens.
pub trait TokenSet: Send + Sync {
    fn contains(&self, token: &str) -> bool;
}

/// Token-to-text substitution. The replacement may contain several tokens.
pub trait SubstitutionMap: Send + Sync {
    fn lookup(&self, token: &str) -> Option<String>;
}

impl TokenSet for HashSet<String> {
    fn contains(&self, token: &str) -> bool {
        HashSet::contains(self, token)
    }
}

impl SubstitutionMap for HashMap<String, String> {
    fn lookup(&self, token: &str) -> Option<String> {
        self.get(token).cloned()
    }
}

/// Decimal natural numbers, `0` included.
#[derive(Debug, Clone, Copy, Default)]
pub struct NaturalNumberSet;

impl TokenSet for NaturalNumberSet {
    fn contains(&self, token: &str) -> bool {
        !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit())
    }
}

fn parse_natural(token: &str) -> Option<u64> {
    if NaturalNumberSet.contains(token) { token.parse().ok() } else { None }
}

/// `n` → `n + 1`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SuccessorMap;

impl SubstitutionMap for SuccessorMap {
    fn lookup(&self, token: &str) -> Option<String> {
        parse_natural(token)?.checked_add(1).map(|n| n.to_string())
    }
}

/// `n` → `n - 1`, undefined for `0`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PredecessorMap;

impl SubstitutionMap for PredecessorMap {
    fn lookup(&self, token: &str) -> Option<String> {
        parse_natural(token)?.checked_sub(1).map(|n| n.to_string())
    }
}

/// Registry of named sets and maps.
#[derive(Clone, Default)]
pub struct Vocabulary {
    sets: HashMap<String, Arc<dyn TokenSet>>,
    maps: HashMap<String, Arc<dyn SubstitutionMap>>,
}

impl Vocabulary {
    pub fn new() -> Self {
        Self::default()
    }

    /// A vocabulary pre-loaded with `number`, `successor` and `predecessor`.
    pub fn with_builtins() -> Self {
        let mut vocabulary = Self::new();
        vocabulary.add_set("number", NaturalNumberSet);
        vocabulary.add_map("successor", SuccessorMap);
        vocabulary.add_map("predecessor", PredecessorMap);
        vocabulary
    }

    /// Register `set` under `name`, replacing any previous set of that name.
    pub fn add_set(&mut self, name: impl Into<String>, set: impl TokenSet + 'static) {
        self.sets.insert(name.into(), Arc::new(set));
    }

    pub fn add_map(&mut self, name: impl Into<String>, map: impl SubstitutionMap + 'static) {
        self.maps.insert(name.into(), Arc::new(map));
    }

    pub fn set(&self, name: &str) -> Option<&dyn TokenSet> {
        self.sets.get(name).map(|s| s.as_ref())
    }

    pub fn map(&self, name: &str) -> Option<&dyn SubstitutionMap> {
        self.maps.get(name).map(|m| m.as_ref())
    }
}

impl fmt::Debug for Vocabulary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut sets: Vec<&str> = self.sets.keys().map(String::as_str).collect();
        let mut maps: Vec<&str> = self.maps.keys().map(String::as_str).collect();
        sets.sort_unstable();
        maps.sort_unstable();
        f.debug_struct("Vocabulary").field("sets", &sets).field("maps", &maps).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_number_vocabulary() {
        let vocabulary = Vocabulary::with_builtins();
        let number = vocabulary.set("number").unwrap();
        assert!(number.contains("0"));
        assert!(number.contains("42"));
        assert!(!number.contains("-1"));
        assert!(!number.contains("FOUR"));
        assert!(!number.contains(""));

        let successor = vocabulary.map("successor").unwrap();
        let predecessor = vocabulary.map("predecessor").unwrap();
        assert_eq!(successor.lookup("41").as_deref(), Some("42"));
        assert_eq!(predecessor.lookup("42").as_deref(), Some("41"));
        assert_eq!(predecessor.lookup("0"), None);
        assert_eq!(successor.lookup("HELLO"), None);
        assert_eq!(successor.lookup(&u64::MAX.to_string()), None);
    }

    #[test]
    fn tables_register_by_name() {
        let mut vocabulary = Vocabulary::new();
        let colors: HashSet<String> = ["RED", "BLUE"].into_iter().map(String::from).collect();
        let mut normal = HashMap::new();
        normal.insert("DONT".to_string(), "DO NOT".to_string());

        vocabulary.add_set("color", colors);
        vocabulary.add_map("normal", normal);

        assert!(vocabulary.set("color").unwrap().contains("RED"));
        assert!(vocabulary.set("number").is_none());
        assert_eq!(vocabulary.map("normal").unwrap().lookup("DONT").as_deref(), Some("DO NOT"));
        assert_eq!(format!("{vocabulary:?}"), r#"Vocabulary { sets: ["color"], maps: ["normal"] }"#);
    }
}
