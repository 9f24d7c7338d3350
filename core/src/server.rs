use crate::concurrent_map::ConcurrentMap;
use crate::config::SearchConfig;
use crate::document::{Document, DocumentStatus};
use crate::error::{Result, SearchError};
use crate::index::{Ids, InvertedIndex, WordFreqs};
use crate::query::{Query, QueryParser};
use crate::stop_words::StopWords;
use crate::{DocId, ExecutionPolicy};
use rayon::prelude::*;
use std::collections::BTreeMap;

/// Filter applied to every candidate before it is scored.
pub type DocumentPredicate<'a> = &'a (dyn Fn(DocId, DocumentStatus, i32) -> bool + Sync);

/// TF-IDF search over an [`InvertedIndex`].
///
/// Mutation takes `&mut self` and reads take `&self`, so callers sharing a
/// server across threads get single-writer/multiple-reader for free. Parallel
/// work happens only inside a single ranking, matching or removal call.
#[derive(Debug)]
pub struct SearchServer {
    index: InvertedIndex,
    stop_words: StopWords,
    max_result_count: usize,
    relevance_epsilon: f64,
    bucket_count: usize,
}

impl SearchServer {
    /// Server with stop words given as a space-separated string.
    pub fn new(stop_words: &str) -> Result<Self> {
        Ok(Self::with_parts(StopWords::from_text(stop_words)?, &SearchConfig::default()))
    }

    pub fn with_stop_words<I, S>(stop_words: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Ok(Self::with_parts(StopWords::new(stop_words)?, &SearchConfig::default()))
    }

    pub fn from_config(config: &SearchConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::with_parts(StopWords::new(&config.stop_words)?, config))
    }

    fn with_parts(stop_words: StopWords, config: &SearchConfig) -> Self {
        Self {
            index: InvertedIndex::new(),
            stop_words,
            max_result_count: config.max_result_count,
            relevance_epsilon: config.relevance_epsilon,
            bucket_count: config.bucket_count,
        }
    }

    pub fn add_document(
        &mut self,
        id: DocId,
        text: &str,
        status: DocumentStatus,
        ratings: &[i32],
    ) -> Result<()> {
        self.index.insert(id, text, status, ratings, &self.stop_words)
    }

    pub fn remove_document(&mut self, id: DocId) -> Result<()> {
        self.remove_document_with(ExecutionPolicy::Sequential, id)
    }

    pub fn remove_document_with(&mut self, policy: ExecutionPolicy, id: DocId) -> Result<()> {
        match policy {
            ExecutionPolicy::Sequential => self.index.remove(id),
            ExecutionPolicy::Parallel => self.index.remove_parallel(id),
        }
    }

    pub fn document_count(&self) -> usize {
        self.index.document_count()
    }

    /// Id of the `index`-th live document in insertion order.
    pub fn document_id(&self, index: usize) -> Option<DocId> {
        self.index.document_id(index)
    }

    pub fn ids(&self) -> Ids<'_> {
        self.index.ids()
    }

    pub fn word_frequencies(&self, id: DocId) -> &WordFreqs {
        self.index.word_frequencies(id)
    }

    pub fn stop_words(&self) -> &StopWords {
        &self.stop_words
    }

    pub fn index(&self) -> &InvertedIndex {
        &self.index
    }

    pub fn parse_query(&self, raw_query: &str) -> Result<Query> {
        QueryParser::new(&self.stop_words).parse(raw_query)
    }

    /// Top documents with status [`DocumentStatus::Actual`].
    pub fn find_top_documents(&self, raw_query: &str) -> Result<Vec<Document>> {
        self.find_top_documents_by_status(raw_query, DocumentStatus::Actual)
    }

    pub fn find_top_documents_by_status(
        &self,
        raw_query: &str,
        status: DocumentStatus,
    ) -> Result<Vec<Document>> {
        self.find_top_documents_by(raw_query, &|_, document_status, _| document_status == status)
    }

    pub fn find_top_documents_by(
        &self,
        raw_query: &str,
        predicate: DocumentPredicate<'_>,
    ) -> Result<Vec<Document>> {
        self.find_top_documents_with(ExecutionPolicy::Sequential, raw_query, predicate)
    }

    /// Rank documents matching `raw_query` and keep the best
    /// `max_result_count`.
    ///
    /// Order is relevance descending; relevances within `relevance_epsilon`
    /// are ordered by rating descending, then by ascending id. Documents with a
    /// posting for any minus word are excluded regardless of `predicate`.
    pub fn find_top_documents_with(
        &self,
        policy: ExecutionPolicy,
        raw_query: &str,
        predicate: DocumentPredicate<'_>,
    ) -> Result<Vec<Document>> {
        let query = self.parse_query(raw_query)?;
        let relevance = match policy {
            ExecutionPolicy::Sequential => self.accumulate_relevance(&query, predicate)?,
            ExecutionPolicy::Parallel => self.accumulate_relevance_parallel(&query, predicate)?,
        };
        let hits = relevance.len();
        let documents = self.rank(relevance);
        tracing::debug!(query = raw_query, ?policy, hits, returned = documents.len(), "ranked documents");
        Ok(documents)
    }

    fn accumulate_relevance(
        &self,
        query: &Query,
        predicate: DocumentPredicate<'_>,
    ) -> Result<BTreeMap<DocId, f64>> {
        let mut document_to_relevance = BTreeMap::new();
        for plus in &query.plus_words {
            let Some(postings) = self.index.postings(plus) else { continue };
            let idf = self.index.inverse_document_freq(plus)?;
            for (&id, &term_freq) in postings {
                if self.passes(id, predicate) {
                    *document_to_relevance.entry(id).or_insert(0.0) += term_freq * idf;
                }
            }
        }
        for minus in &query.minus_words {
            let Some(postings) = self.index.postings(minus) else { continue };
            for id in postings.keys() {
                document_to_relevance.remove(id);
            }
        }
        Ok(document_to_relevance)
    }

    fn accumulate_relevance_parallel(
        &self,
        query: &Query,
        predicate: DocumentPredicate<'_>,
    ) -> Result<BTreeMap<DocId, f64>> {
        let document_to_relevance: ConcurrentMap<DocId, f64> = ConcurrentMap::new(self.bucket_count);
        query.plus_words.par_iter().try_for_each(|plus| -> Result<()> {
            let Some(postings) = self.index.postings(plus) else { return Ok(()) };
            let idf = self.index.inverse_document_freq(plus)?;
            for (&id, &term_freq) in postings {
                if self.passes(id, predicate) {
                    *document_to_relevance.access(id) += term_freq * idf;
                }
            }
            Ok(())
        })?;
        query.minus_words.par_iter().for_each(|minus| {
            if let Some(postings) = self.index.postings(minus) {
                for &id in postings.keys() {
                    document_to_relevance.erase(id);
                }
            }
        });
        Ok(document_to_relevance.snapshot_merged())
    }

    fn passes(&self, id: DocId, predicate: DocumentPredicate<'_>) -> bool {
        self.index
            .document(id)
            .is_some_and(|data| predicate(id, data.status, data.rating))
    }

    fn rank(&self, document_to_relevance: BTreeMap<DocId, f64>) -> Vec<Document> {
        let mut documents: Vec<Document> = document_to_relevance
            .into_iter()
            .map(|(id, relevance)| {
                let rating = self.index.document(id).map_or(0, |data| data.rating);
                Document::new(id, relevance, rating)
            })
            .collect();
        order_by_relevance(&mut documents, self.relevance_epsilon);
        documents.truncate(self.max_result_count);
        documents
    }

    pub fn match_document(&self, raw_query: &str, id: DocId) -> Result<(Vec<String>, DocumentStatus)> {
        self.match_document_with(ExecutionPolicy::Sequential, raw_query, id)
    }

    /// Plus words of `raw_query` found in document `id`, or nothing if any
    /// minus word is found there.
    pub fn match_document_with(
        &self,
        policy: ExecutionPolicy,
        raw_query: &str,
        id: DocId,
    ) -> Result<(Vec<String>, DocumentStatus)> {
        let parser = QueryParser::new(&self.stop_words);
        let query = match policy {
            ExecutionPolicy::Sequential => parser.parse(raw_query)?,
            ExecutionPolicy::Parallel => parser.parse_unsorted(raw_query)?,
        };
        let status = self
            .index
            .document(id)
            .map(|data| data.status)
            .ok_or(SearchError::UnknownDocumentId(id))?;

        let in_document = |word: &String| {
            self.index.postings(word).is_some_and(|postings| postings.contains_key(&id))
        };
        let matched_words = match policy {
            ExecutionPolicy::Sequential => {
                if query.minus_words.iter().any(in_document) {
                    Vec::new()
                } else {
                    query.plus_words.into_iter().filter(|word| in_document(word)).collect()
                }
            }
            ExecutionPolicy::Parallel => {
                if query.minus_words.par_iter().any(in_document) {
                    Vec::new()
                } else {
                    let mut words: Vec<String> = query
                        .plus_words
                        .into_par_iter()
                        .filter(|word| in_document(word))
                        .collect();
                    words.sort_unstable();
                    words.dedup();
                    words
                }
            }
        };
        Ok((matched_words, status))
    }
}

/// Relevance descending, then rating descending among documents within
/// `epsilon` of the highest relevance in their run.
///
/// Comparing neighbours with an epsilon directly is not transitive, so the
/// runs are cut after an exact sort. Both sorts are stable; candidates arrive
/// in ascending id order.
fn order_by_relevance(documents: &mut [Document], epsilon: f64) {
    documents.sort_by(|lhs, rhs| rhs.relevance.total_cmp(&lhs.relevance));
    let mut start = 0;
    while start < documents.len() {
        let leader = documents[start].relevance;
        let run = 1 + documents[start + 1..]
            .iter()
            .take_while(|document| leader - document.relevance < epsilon)
            .count();
        documents[start..start + run].sort_by(|lhs, rhs| rhs.rating.cmp(&lhs.rating));
        start += run;
    }
}

impl<'a> IntoIterator for &'a SearchServer {
    type Item = DocId;
    type IntoIter = Ids<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.ids()
    }
}
