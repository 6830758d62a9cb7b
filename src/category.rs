//! Categories: the rules stored in a [`Graph`](crate::Graph).
//!
//! A category is a `(pattern, that, topic)` triple plus an opaque template and
//! provenance. The triple is normalized once, at construction, so every other
//! part of the engine can treat tokens as plain whitespace-separated strings.
//!
//! ```text
//! "  hello   *  " ──normalize──▶ "HELLO *"
//!                                  │
//! path():  HELLO * <THAT> * <TOPIC> *
//! ```
//!
//! ## Interchange record
//!
//! One category per line, six comma-separated fields:
//!
//! ```text
//! number,pattern,that,topic,template,source
//! ```
//!
//! Every text field is escaped so the record stays on one line and the field
//! separator never appears inside a field (`#` → `#Hash`, `,` → `#Comma`,
//! newline → `#Newline`, carriage return → `#CR`).

use crate::error::{RecordError, ValidationError};
use crate::{STAR, THAT_SEPARATOR, TOPIC_SEPARATOR, is_separator};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

const INTERCHANGE_FIELDS: usize = 6;

/// Case folding applied while normalizing pattern text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CasePolicy {
    #[default]
    Upper,
    Lower,
    Preserve,
}

impl CasePolicy {
    pub fn apply(self, text: &str) -> String {
        match self {
            CasePolicy::Upper => text.to_uppercase(),
            CasePolicy::Lower => text.to_lowercase(),
            CasePolicy::Preserve => text.to_string(),
        }
    }
}

/// Trim, collapse internal whitespace to single spaces, then fold case.
pub(crate) fn normalize(text: &str, case: CasePolicy) -> String {
    let collapsed = regex!(r"\s+").replace_all(text.trim(), " ");
    case.apply(&collapsed)
}

/// Identity of a category inside one graph: the normalized triple.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CategoryKey {
    pub pattern: String,
    pub that: String,
    pub topic: String,
}

impl fmt::Display for CategoryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} {} {}", self.pattern, THAT_SEPARATOR, self.that, TOPIC_SEPARATOR, self.topic)
    }
}

/// One rule: the pattern/that/topic triple, its template and provenance.
///
/// The usage counter is atomic so that concurrent readers matching against the
/// same graph can record activations through a shared reference.
#[derive(Debug)]
pub struct Category {
    number: u64,
    pattern: String,
    that: String,
    topic: String,
    template: String,
    source: String,
    activations: AtomicU64,
}

impl Clone for Category {
    fn clone(&self) -> Self {
        Category {
            number: self.number,
            pattern: self.pattern.clone(),
            that: self.that.clone(),
            topic: self.topic.clone(),
            template: self.template.clone(),
            source: self.source.clone(),
            activations: AtomicU64::new(self.activations()),
        }
    }
}

impl Category {
    /// Build a category, normalizing text with [`CasePolicy::Upper`].
    ///
    /// Empty `that`/`topic` become the universal wildcard.
    pub fn new(
        pattern: &str,
        that: &str,
        topic: &str,
        template: impl Into<String>,
        source: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        Self::new_with(pattern, that, topic, template, source, CasePolicy::Upper)
    }

    /// Build a category with an explicit case policy.
    pub fn new_with(
        pattern: &str,
        that: &str,
        topic: &str,
        template: impl Into<String>,
        source: impl Into<String>,
        case: CasePolicy,
    ) -> Result<Self, ValidationError> {
        let pattern = normalize(pattern, case);
        if pattern.is_empty() {
            return Err(ValidationError::EmptyPattern);
        }
        let that = or_universal(normalize(that, case));
        let topic = or_universal(normalize(topic, case));

        validate_field("pattern", &pattern)?;
        validate_field("that", &that)?;
        validate_field("topic", &topic)?;

        Ok(Category {
            number: 0,
            pattern,
            that,
            topic,
            template: template.into(),
            source: source.into(),
            activations: AtomicU64::new(0),
        })
    }

    /// Build a category from a combined path `PATTERN <THAT> THAT <TOPIC> TOPIC`.
    ///
    /// A path without separators is a bare pattern (that/topic universal).
    pub fn from_path(
        path: &str,
        template: impl Into<String>,
        source: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        Self::from_path_with(path, template, source, CasePolicy::Upper)
    }

    /// [`from_path`](Self::from_path) with an explicit case policy.
    ///
    /// Separators are recognized case-insensitively whatever the policy.
    pub fn from_path_with(
        path: &str,
        template: impl Into<String>,
        source: impl Into<String>,
        case: CasePolicy,
    ) -> Result<Self, ValidationError> {
        let normalized = normalize(path, case);
        let tokens: Vec<&str> = normalized.split(' ').collect();
        let that_at = tokens.iter().position(|t| t.eq_ignore_ascii_case(THAT_SEPARATOR));
        let topic_at = tokens.iter().position(|t| t.eq_ignore_ascii_case(TOPIC_SEPARATOR));

        match (that_at, topic_at) {
            (None, None) => Self::new_with(&normalized, STAR, STAR, template, source, case),
            (Some(that_at), Some(topic_at)) if that_at < topic_at => Self::new_with(
                &tokens[..that_at].join(" "),
                &tokens[that_at + 1..topic_at].join(" "),
                &tokens[topic_at + 1..].join(" "),
                template,
                source,
                case,
            ),
            (_, None) => Err(ValidationError::MissingSeparator { separator: TOPIC_SEPARATOR, path: normalized }),
            _ => Err(ValidationError::MissingSeparator { separator: THAT_SEPARATOR, path: normalized }),
        }
    }

    /// Return this category carrying sequence number `number`.
    pub fn with_number(mut self, number: u64) -> Self {
        self.number = number;
        self
    }

    pub(crate) fn set_number(&mut self, number: u64) {
        self.number = number;
    }

    /// Sequence number; `0` means "not yet assigned by a graph".
    pub fn number(&self) -> u64 {
        self.number
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn that(&self) -> &str {
        &self.that
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Replace template and provenance, keeping identity and usage.
    pub(crate) fn overwrite_from(&mut self, other: &Category) {
        self.template = other.template.clone();
        self.source = other.source.clone();
    }

    pub fn key(&self) -> CategoryKey {
        CategoryKey { pattern: self.pattern.clone(), that: self.that.clone(), topic: self.topic.clone() }
    }

    pub fn pattern_tokens(&self) -> impl Iterator<Item = &str> {
        self.pattern.split(' ')
    }

    pub fn that_tokens(&self) -> impl Iterator<Item = &str> {
        self.that.split(' ')
    }

    pub fn topic_tokens(&self) -> impl Iterator<Item = &str> {
        self.topic.split(' ')
    }

    /// Whether both context dimensions are the universal wildcard, so the
    /// graph can elide the `<THAT> * <TOPIC> *` suffix.
    pub fn is_shortcut(&self) -> bool {
        self.that == STAR && self.topic == STAR
    }

    /// The full insertion path, separators included.
    pub fn path(&self) -> Vec<&str> {
        self.pattern_tokens()
            .chain(std::iter::once(THAT_SEPARATOR))
            .chain(self.that_tokens())
            .chain(std::iter::once(TOPIC_SEPARATOR))
            .chain(self.topic_tokens())
            .collect()
    }

    /// Number of times this category was returned by a match.
    pub fn activations(&self) -> u64 {
        self.activations.load(AtomicOrdering::Relaxed)
    }

    /// Record one activation and return the new count.
    pub fn increment_activations(&self) -> u64 {
        self.activations.fetch_add(1, AtomicOrdering::Relaxed) + 1
    }

    /// Deterministic output order: by sequence number only.
    pub fn cmp_by_number(&self, other: &Category) -> Ordering {
        self.number.cmp(&other.number)
    }

    /// Encode as a single interchange line (no trailing newline).
    pub fn to_interchange(&self) -> String {
        format!(
            "{},{},{},{},{},{}",
            self.number,
            escape_field(&self.pattern),
            escape_field(&self.that),
            escape_field(&self.topic),
            escape_field(&self.template),
            escape_field(&self.source),
        )
    }

    /// Decode one interchange line.
    ///
    /// Pattern text is taken as already normalized: whitespace is collapsed
    /// but case is preserved, and validation is re-applied.
    pub fn from_interchange(line: &str) -> Result<Self, RecordError> {
        let line = line.trim_end_matches(['\r', '\n']);
        let fields: Vec<&str> = line.split(',').collect();
        if fields.len() != INTERCHANGE_FIELDS {
            return Err(RecordError::new(format!(
                "expected {} fields, found {}",
                INTERCHANGE_FIELDS,
                fields.len()
            )));
        }

        let number = fields[0]
            .trim()
            .parse::<u64>()
            .map_err(|_| RecordError::new(format!("invalid sequence number '{}'", fields[0])))?;

        let category = Category::new_with(
            &unescape_field(fields[1]),
            &unescape_field(fields[2]),
            &unescape_field(fields[3]),
            unescape_field(fields[4]),
            unescape_field(fields[5]),
            CasePolicy::Preserve,
        )
        .map_err(|err| RecordError::new(err.to_string()))?;

        Ok(category.with_number(number))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} {} {}", self.pattern, THAT_SEPARATOR, self.that, TOPIC_SEPARATOR, self.topic)
    }
}

fn or_universal(text: String) -> String {
    if text.is_empty() { STAR.to_string() } else { text }
}

fn validate_field(field: &'static str, text: &str) -> Result<(), ValidationError> {
    for token in text.split(' ') {
        if is_separator(&token.to_uppercase()) {
            return Err(ValidationError::ReservedToken { field, token: token.to_string() });
        }
        let glued = token.len() > 1 && (token.starts_with(['*', '_']) || token.ends_with(['*', '_']));
        if glued {
            return Err(ValidationError::UnterminatedWildcard { field, token: token.to_string() });
        }
    }
    Ok(())
}

fn escape_field(text: &str) -> String {
    text.replace('#', "#Hash").replace(',', "#Comma").replace('\n', "#Newline").replace('\r', "#CR")
}

fn unescape_field(text: &str) -> String {
    regex!(r"#(Hash|Comma|Newline|CR)")
        .replace_all(text, |caps: &regex::Captures| match &caps[1] {
            "Hash" => "#",
            "Comma" => ",",
            "Newline" => "\n",
            _ => "\r",
        })
        .into_owned()
}
