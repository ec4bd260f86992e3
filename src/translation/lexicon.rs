/*!
 * Fixed per-language answers for short tokens.
 *
 * A backend asked to translate a lone "yes" or "no" has no context and often
 * returns something odd. The lexicon answers these directly. Languages with
 * no entry fall through to the backend.
 */

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::language_utils::language_code;

/// One configured lexicon entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LexiconEntry {
    /// Language code or display identifier (`"de"`, `"German (de)"`)
    pub language: String,
    /// Source token, matched case-insensitively after trimming
    pub token: String,
    /// Output emitted for the token
    pub translation: String,
}

impl LexiconEntry {
    pub fn new(language: impl Into<String>, token: impl Into<String>, translation: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            token: token.into(),
            translation: translation.into(),
        }
    }
}

/// Built-in yes/no answers
const DEFAULT_ENTRIES: [(&str, &str, &str); 12] = [
    ("de", "yes", "Ja"),
    ("de", "no", "Nein"),
    ("fr", "yes", "Oui"),
    ("fr", "no", "Non"),
    ("es", "yes", "Sí"),
    ("es", "no", "No"),
    ("it", "yes", "Sì"),
    ("it", "no", "No"),
    ("nl", "yes", "Ja"),
    ("nl", "no", "Nee"),
    ("pt", "yes", "Sim"),
    ("pt", "no", "Não"),
];

/// Mapping of `(language code, normalized token)` to a fixed output
#[derive(Debug, Clone, Default)]
pub struct ExactMatchLexicon {
    entries: HashMap<(String, String), String>,
}

impl ExactMatchLexicon {
    /// Empty lexicon; every lookup falls through
    pub fn empty() -> Self {
        Self::default()
    }

    /// Lexicon seeded with the built-in yes/no entries
    pub fn with_defaults() -> Self {
        let mut lexicon = Self::empty();
        for (language, token, translation) in DEFAULT_ENTRIES {
            lexicon.insert(language, token, translation);
        }
        lexicon
    }

    /// Add or replace an entry
    pub fn insert(&mut self, language: &str, token: &str, translation: impl Into<String>) {
        self.entries.insert(
            (language_code(language), normalize_token(token)),
            translation.into(),
        );
    }

    /// Add configured entries on top of the current ones
    pub fn extend<'a>(&mut self, entries: impl IntoIterator<Item = &'a LexiconEntry>) {
        for entry in entries {
            self.insert(&entry.language, &entry.token, entry.translation.clone());
        }
    }

    /// Fixed output for a cleaned value in a language, if any
    pub fn lookup(&self, language: &str, text: &str) -> Option<&str> {
        self.entries
            .get(&(language_code(language), normalize_token(text)))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn normalize_token(token: &str) -> String {
    token.trim().to_lowercase()
}
