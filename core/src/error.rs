use crate::DocId;
use thiserror::Error;

/// Errors raised by indexing, query parsing and ranking.
#[derive(Debug, Error)]
pub enum SearchError {
    /// Document id is negative or already indexed
    #[error("invalid document id {0}: negative or already present")]
    InvalidDocumentId(DocId),

    /// Document text contains control characters
    #[error("document {0} contains control characters")]
    InvalidDocumentText(DocId),

    #[error("stop word {0:?} contains control characters")]
    MalformedStopWord(String),

    /// Query token is `-`, starts with `--`, ends with `-` or has control characters
    #[error("malformed query term {0:?}")]
    MalformedQueryTerm(String),

    #[error("unknown document id {0}")]
    UnknownDocumentId(DocId),

    /// IDF requested for a term without postings
    #[error("term {0:?} has no postings")]
    UnknownTerm(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to parse configuration: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SearchError>;
