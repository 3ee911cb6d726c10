//! # Ingredient Normalizer Module
//!
//! Canonicalizes free-text ingredient names so they can be compared.
//!
//! ## Rules
//!
//! - Lower-case everything
//! - Drop every character that is not a letter, digit or whitespace
//! - Remove preparation qualifiers ("chopped", "fresh", "ground", ...) as whole words
//! - Collapse whitespace runs and trim
//!
//! ```rust
//! use pantry_recipes::ingredient_normalizer::normalize;
//!
//! assert_eq!(normalize("  Freshly-Chopped  GARLIC! ").as_str(), "freshlychopped garlic");
//! assert_eq!(normalize("Fresh, chopped basil").as_str(), "basil");
//! ```

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Preparation qualifiers removed before comparison
pub const QUALIFIER_STOPLIST: &[&str] = &[
    "chopped", "diced", "sliced", "minced", "grated", "fresh", "dried", "ground", "powdered",
];

lazy_static! {
    static ref NON_WORD_CHARS: Regex =
        Regex::new(r"[^\p{L}\p{N}\s]").expect("Punctuation pattern should be valid");
    static ref WHITESPACE_RUNS: Regex =
        Regex::new(r"\s+").expect("Whitespace pattern should be valid");
    static ref QUALIFIERS: Regex = Regex::new(&format!(
        r"(?i)\b(?:{})\b",
        QUALIFIER_STOPLIST.join("|")
    ))
    .expect("Qualifier pattern should be valid");
}

/// A normalized ingredient name
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IngredientToken(String);

impl IngredientToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Two tokens are related when one contains the other
    pub fn is_related(&self, other: &IngredientToken) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }
        self.0.contains(other.as_str()) || other.0.contains(self.as_str())
    }
}

impl fmt::Display for IngredientToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Normalize a raw ingredient name into a comparison token
pub fn normalize(raw: &str) -> IngredientToken {
    let lowered = raw.to_lowercase();
    let stripped = NON_WORD_CHARS.replace_all(&lowered, "");
    let collapsed = WHITESPACE_RUNS.replace_all(&stripped, " ");
    let unqualified = QUALIFIERS.replace_all(&collapsed, "");
    // Removing a qualifier can leave a double space behind
    let token = WHITESPACE_RUNS.replace_all(&unqualified, " ");
    IngredientToken(token.trim().to_string())
}

/// Split a comma-delimited ingredient string into trimmed, non-empty names
pub fn split_ingredient_input(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|piece| !piece.is_empty())
        .map(str::to_string)
        .collect()
}

/// A set of non-empty ingredient tokens with deterministic (sorted) iteration
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct IngredientSet {
    tokens: BTreeSet<IngredientToken>,
}

impl IngredientSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from raw names, dropping names that normalize to nothing
    pub fn from_raw<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let tokens = names
            .into_iter()
            .map(|name| normalize(name.as_ref()))
            .filter(|token| !token.is_empty())
            .collect();
        Self { tokens }
    }

    pub fn insert(&mut self, token: IngredientToken) -> bool {
        if token.is_empty() {
            return false;
        }
        self.tokens.insert(token)
    }

    pub fn contains(&self, token: &IngredientToken) -> bool {
        self.tokens.contains(token)
    }

    /// First token (in set order) related to `token`, if any
    pub fn first_related(&self, token: &IngredientToken) -> Option<&IngredientToken> {
        self.tokens.iter().find(|candidate| candidate.is_related(token))
    }

    pub fn iter(&self) -> impl Iterator<Item = &IngredientToken> {
        self.tokens.iter()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Number of tokens shared with another set
    pub fn overlap(&self, other: &IngredientSet) -> usize {
        self.tokens.intersection(&other.tokens).count()
    }

    /// Sorted tokens joined by commas, used as a lookup key
    pub fn key(&self) -> String {
        self.tokens
            .iter()
            .map(IngredientToken::as_str)
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl FromIterator<IngredientToken> for IngredientSet {
    fn from_iter<T: IntoIterator<Item = IngredientToken>>(iter: T) -> Self {
        let mut set = IngredientSet::new();
        for token in iter {
            set.insert(token);
        }
        set
    }
}
