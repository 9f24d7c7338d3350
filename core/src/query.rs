use crate::error::{Result, SearchError};
use crate::stop_words::StopWords;
use crate::tokenizer::{is_valid_word, split_words};

/// Parsed query: terms that must contribute and terms that exclude a document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pub plus_words: Vec<String>,
    pub minus_words: Vec<String>,
}

impl Query {
    pub fn is_empty(&self) -> bool {
        self.plus_words.is_empty() && self.minus_words.is_empty()
    }
}

struct QueryWord<'a> {
    data: &'a str,
    is_minus: bool,
}

/// Turns raw query text into a [`Query`] using the server's stop words.
pub struct QueryParser<'a> {
    stop_words: &'a StopWords,
}

impl<'a> QueryParser<'a> {
    pub fn new(stop_words: &'a StopWords) -> Self {
        Self { stop_words }
    }

    /// Parse with plus and minus terms sorted and deduplicated.
    pub fn parse(&self, raw_query: &str) -> Result<Query> {
        let mut query = self.parse_unsorted(raw_query)?;
        for words in [&mut query.plus_words, &mut query.minus_words] {
            words.sort_unstable();
            words.dedup();
        }
        Ok(query)
    }

    /// Parse keeping terms in query order, duplicates included.
    pub fn parse_unsorted(&self, raw_query: &str) -> Result<Query> {
        let mut query = Query::default();
        for token in split_words(raw_query) {
            let word = parse_query_word(token)?;
            if self.stop_words.contains(word.data) {
                continue;
            }
            if word.is_minus {
                query.minus_words.push(word.data.to_string());
            } else {
                query.plus_words.push(word.data.to_string());
            }
        }
        Ok(query)
    }
}

fn parse_query_word(token: &str) -> Result<QueryWord<'_>> {
    if token == "-" || token.starts_with("--") || token.ends_with('-') || !is_valid_word(token) {
        tracing::warn!(token = ?token, "rejected query term");
        return Err(SearchError::MalformedQueryTerm(token.to_string()));
    }
    Ok(match token.strip_prefix('-') {
        Some(data) => QueryWord { data, is_minus: true },
        None => QueryWord { data: token, is_minus: false },
    })
}
