use crate::error::{Result, SearchError};
use crate::{CONCURRENT_MAP_BUCKET_COUNT, MAX_RESULT_DOCUMENT_COUNT, RELEVANCE_EPSILON};
use serde::Deserialize;

/// Construction-time options for a [`SearchServer`](crate::SearchServer).
///
/// ```json
/// { "stopWords": ["in", "the"], "maxResultCount": 5 }
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchConfig {
    /// Terms excluded from indexing and querying
    pub stop_words: Vec<String>,
    pub max_result_count: usize,
    /// Relevances closer than this are ranked by rating
    pub relevance_epsilon: f64,
    /// Buckets of the scratch map used by parallel ranking
    pub bucket_count: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            stop_words: Vec::new(),
            max_result_count: MAX_RESULT_DOCUMENT_COUNT,
            relevance_epsilon: RELEVANCE_EPSILON,
            bucket_count: CONCURRENT_MAP_BUCKET_COUNT,
        }
    }
}

impl SearchConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: SearchConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_stop_words<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.stop_words = words.into_iter().map(Into::into).collect();
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.bucket_count == 0 {
            return Err(SearchError::InvalidConfig("bucketCount must be positive".into()));
        }
        if self.relevance_epsilon.is_nan() || self.relevance_epsilon < 0.0 {
            return Err(SearchError::InvalidConfig("relevanceEpsilon must be non-negative".into()));
        }
        Ok(())
    }
}
