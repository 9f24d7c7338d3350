use crate::error::{Result, SearchError};
use crate::tokenizer::{is_valid_word, split_words};
use std::collections::BTreeSet;

/// Terms excluded from indexing and querying.
///
/// Fixed once constructed. The empty string is always treated as a stop word.
#[derive(Debug, Clone, Default)]
pub struct StopWords {
    words: BTreeSet<String>,
}

impl StopWords {
    /// Build from candidate words. Empty candidates are skipped; any candidate
    /// containing control characters fails the whole construction.
    pub fn new<I, S>(candidates: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut words = BTreeSet::new();
        for candidate in candidates {
            let candidate = candidate.as_ref();
            if candidate.is_empty() {
                continue;
            }
            if !is_valid_word(candidate) {
                tracing::warn!(word = ?candidate, "rejected stop word");
                return Err(SearchError::MalformedStopWord(candidate.to_string()));
            }
            words.insert(candidate.to_string());
        }
        Ok(Self { words })
    }

    /// Build from a space-separated list, e.g. `"in the and"`.
    pub fn from_text(text: &str) -> Result<Self> {
        Self::new(split_words(text))
    }

    pub fn contains(&self, word: &str) -> bool {
        word.is_empty() || self.words.contains(word)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Stop words in lexicographic order.
    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.words.iter().map(String::as_str)
    }
}
