//! In-memory full-text search with TF-IDF ranking.
//!
//! Documents are indexed into an inverted index with normalized term
//! frequencies. Queries support plus and minus words, status filtering and
//! arbitrary predicates, and can be ranked sequentially or on the rayon pool.
//!
//! ```
//! use docsearch_core::{DocumentStatus, SearchServer};
//!
//! let mut server = SearchServer::new("in the").unwrap();
//! server.add_document(42, "cat in the city", DocumentStatus::Actual, &[1, 2, 3]).unwrap();
//! let found = server.find_top_documents("cat").unwrap();
//! assert_eq!(found[0].id, 42);
//! ```

pub mod concurrent_map;
pub mod config;
pub mod document;
pub mod duplicates;
pub mod error;
pub mod index;
pub mod process_queries;
pub mod profile;
pub mod query;
pub mod server;
pub mod stop_words;
pub mod tokenizer;

pub use concurrent_map::ConcurrentMap;
pub use config::SearchConfig;
pub use document::{Document, DocumentStatus};
pub use duplicates::{find_duplicates, remove_duplicates};
pub use error::{Result, SearchError};
pub use index::InvertedIndex;
pub use process_queries::{process_queries, process_queries_joined};
pub use query::{Query, QueryParser};
pub use server::{DocumentPredicate, SearchServer};
pub use stop_words::StopWords;

pub type DocId = i32;

/// Results returned by a single top-documents query.
pub const MAX_RESULT_DOCUMENT_COUNT: usize = 5;
/// Relevances closer than this are considered equal when ranking.
pub const RELEVANCE_EPSILON: f64 = 1e-6;
pub const CONCURRENT_MAP_BUCKET_COUNT: usize = 16;

/// How a ranking, matching or removal call spreads its work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionPolicy {
    #[default]
    Sequential,
    /// Fan work out over the rayon global pool
    Parallel,
}
