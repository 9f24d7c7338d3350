use crate::document::{average_rating, DocumentData, DocumentStatus};
use crate::error::{Result, SearchError};
use crate::stop_words::StopWords;
use crate::tokenizer::{is_valid_word, split_words};
use crate::DocId;
use rayon::prelude::*;
use std::collections::{btree_map, BTreeMap};
use std::sync::Arc;

/// term -> (doc -> normalized frequency)
pub type Postings = BTreeMap<DocId, f64>;
/// doc -> (term -> normalized frequency)
pub type WordFreqs = BTreeMap<Arc<str>, f64>;
/// Ascending live document ids
pub type Ids<'a> = std::iter::Copied<btree_map::Keys<'a, DocId, DocumentData>>;

static EMPTY_WORD_FREQS: WordFreqs = BTreeMap::new();

/// Inverted index with a mirrored forward view.
///
/// `word_to_document_freqs` and `document_to_word_freqs` always hold the same
/// `(term, doc, freq)` triples, and a term is present only while at least one
/// document uses it. Term strings are shared between the two maps.
#[derive(Debug, Default)]
pub struct InvertedIndex {
    word_to_document_freqs: BTreeMap<Arc<str>, Postings>,
    document_to_word_freqs: BTreeMap<DocId, WordFreqs>,
    documents: BTreeMap<DocId, DocumentData>,
    /// sequence number -> doc, ascending in insertion order
    insertion_order: BTreeMap<u64, DocId>,
    insertion_sequence: BTreeMap<DocId, u64>,
    next_sequence: u64,
}

impl InvertedIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index a document. Nothing is modified if validation fails.
    pub fn insert(
        &mut self,
        id: DocId,
        text: &str,
        status: DocumentStatus,
        ratings: &[i32],
        stop_words: &StopWords,
    ) -> Result<()> {
        if id < 0 || self.documents.contains_key(&id) {
            tracing::warn!(doc_id = id, "rejected document id");
            return Err(SearchError::InvalidDocumentId(id));
        }
        if !is_valid_word(text) {
            tracing::warn!(doc_id = id, "rejected document text");
            return Err(SearchError::InvalidDocumentText(id));
        }

        let words: Vec<&str> = split_words(text).filter(|w| !stop_words.contains(w)).collect();
        let mut counts: BTreeMap<&str, f64> = BTreeMap::new();
        if !words.is_empty() {
            let inv_word_count = 1.0 / words.len() as f64;
            for &word in &words {
                *counts.entry(word).or_insert(0.0) += inv_word_count;
            }
        }

        let mut word_freqs = WordFreqs::new();
        for (word, freq) in counts {
            let term = self.intern(word);
            self.word_to_document_freqs
                .entry(Arc::clone(&term))
                .or_default()
                .insert(id, freq);
            word_freqs.insert(term, freq);
        }

        tracing::debug!(doc_id = id, words = words.len(), terms = word_freqs.len(), "indexed document");
        self.document_to_word_freqs.insert(id, word_freqs);
        self.documents.insert(
            id,
            DocumentData { rating: average_rating(ratings), status, text: text.to_string() },
        );
        self.insertion_order.insert(self.next_sequence, id);
        self.insertion_sequence.insert(id, self.next_sequence);
        self.next_sequence += 1;
        Ok(())
    }

    fn intern(&self, word: &str) -> Arc<str> {
        match self.word_to_document_freqs.get_key_value(word) {
            Some((term, _)) => Arc::clone(term),
            None => Arc::from(word),
        }
    }

    /// Remove a document from all maps.
    pub fn remove(&mut self, id: DocId) -> Result<()> {
        let word_freqs = self.take_document(id)?;
        for term in word_freqs.keys() {
            if let Some(postings) = self.word_to_document_freqs.get_mut(&**term) {
                postings.remove(&id);
                if postings.is_empty() {
                    self.word_to_document_freqs.remove(&**term);
                }
            }
        }
        tracing::debug!(doc_id = id, terms = word_freqs.len(), "removed document");
        Ok(())
    }

    /// Same effect as [`remove`](Self::remove), erasing the document from each
    /// of its terms' postings on the rayon pool.
    pub fn remove_parallel(&mut self, id: DocId) -> Result<()> {
        let word_freqs = self.take_document(id)?;
        // Detach only the document's own terms; each worker then owns one
        // posting list outright.
        let mut detached: Vec<(Arc<str>, Postings)> = word_freqs
            .keys()
            .filter_map(|term| self.word_to_document_freqs.remove_entry(&**term))
            .collect();
        detached.par_iter_mut().for_each(|(_, postings)| {
            postings.remove(&id);
        });
        self.word_to_document_freqs
            .extend(detached.into_iter().filter(|(_, postings)| !postings.is_empty()));
        tracing::debug!(doc_id = id, terms = word_freqs.len(), "removed document in parallel");
        Ok(())
    }

    /// Drop metadata and the reverse entry, returning the document's terms.
    fn take_document(&mut self, id: DocId) -> Result<WordFreqs> {
        if self.documents.remove(&id).is_none() {
            return Err(SearchError::UnknownDocumentId(id));
        }
        if let Some(sequence) = self.insertion_sequence.remove(&id) {
            self.insertion_order.remove(&sequence);
        }
        Ok(self.document_to_word_freqs.remove(&id).unwrap_or_default())
    }

    /// Term frequencies of one document; empty for unknown ids.
    pub fn word_frequencies(&self, id: DocId) -> &WordFreqs {
        self.document_to_word_freqs.get(&id).unwrap_or(&EMPTY_WORD_FREQS)
    }

    /// Live document ids in ascending order.
    pub fn ids(&self) -> Ids<'_> {
        self.documents.keys().copied()
    }

    /// Id of the `index`-th live document in insertion order.
    pub fn document_id(&self, index: usize) -> Option<DocId> {
        self.insertion_order.values().nth(index).copied()
    }

    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    pub fn contains(&self, id: DocId) -> bool {
        self.documents.contains_key(&id)
    }

    pub fn document(&self, id: DocId) -> Option<&DocumentData> {
        self.documents.get(&id)
    }

    pub fn postings(&self, term: &str) -> Option<&Postings> {
        self.word_to_document_freqs.get(term)
    }

    /// All terms with their postings, in lexicographic order.
    pub fn terms(&self) -> impl Iterator<Item = (&str, &Postings)> + '_ {
        self.word_to_document_freqs.iter().map(|(term, postings)| (&**term, postings))
    }

    /// `ln(document_count / document_frequency)`.
    pub fn inverse_document_freq(&self, term: &str) -> Result<f64> {
        let postings = self
            .postings(term)
            .filter(|postings| !postings.is_empty())
            .ok_or_else(|| SearchError::UnknownTerm(term.to_string()))?;
        Ok((self.document_count() as f64 / postings.len() as f64).ln())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stop_words() -> StopWords {
        StopWords::from_text("in the").unwrap()
    }

    fn sample() -> InvertedIndex {
        let stop = stop_words();
        let mut index = InvertedIndex::new();
        index.insert(1, "cat in the city", DocumentStatus::Actual, &[1, 2, 3], &stop).unwrap();
        index.insert(2, "dog dog city", DocumentStatus::Banned, &[5], &stop).unwrap();
        index.insert(0, "white cat", DocumentStatus::Actual, &[], &stop).unwrap();
        index
    }

    #[test]
    fn frequencies_are_normalized_without_stop_words() {
        let index = sample();
        let freqs = index.word_frequencies(1);
        assert_eq!(freqs.len(), 2);
        assert!((freqs["cat"] - 0.5).abs() < 1e-12);
        assert!((freqs["city"] - 0.5).abs() < 1e-12);

        let dog = index.word_frequencies(2);
        assert!((dog["dog"] - 2.0 / 3.0).abs() < 1e-12);
        assert!((dog.values().sum::<f64>() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn forward_and_reverse_maps_agree() {
        let index = sample();
        for (term, postings) in index.terms() {
            for (&doc, &freq) in postings {
                assert_eq!(index.word_frequencies(doc)[term], freq);
            }
        }
        for id in index.ids() {
            for (term, &freq) in index.word_frequencies(id) {
                assert_eq!(index.postings(term).unwrap()[&id], freq);
            }
        }
    }

    #[test]
    fn stores_metadata() {
        let index = sample();
        let doc = index.document(1).unwrap();
        assert_eq!(doc.rating, 2);
        assert_eq!(doc.status, DocumentStatus::Actual);
        assert_eq!(doc.text, "cat in the city");
        assert_eq!(index.document(0).unwrap().rating, 0);
    }

    #[test]
    fn ids_are_ascending_and_insertion_order_is_kept() {
        let index = sample();
        assert_eq!(index.ids().collect::<Vec<_>>(), vec![0, 1, 2]);
        assert_eq!(index.ids().count(), 3);
        assert_eq!(index.document_id(0), Some(1));
        assert_eq!(index.document_id(2), Some(0));
        assert_eq!(index.document_id(3), None);
    }

    #[test]
    fn rejects_bad_ids_without_mutation() {
        let stop = stop_words();
        let mut index = sample();
        let err = index.insert(-1, "fox", DocumentStatus::Actual, &[], &stop).unwrap_err();
        assert!(matches!(err, SearchError::InvalidDocumentId(-1)));
        let err = index.insert(2, "fox", DocumentStatus::Actual, &[], &stop).unwrap_err();
        assert!(matches!(err, SearchError::InvalidDocumentId(2)));
        assert!(index.postings("fox").is_none());
        assert_eq!(index.document_count(), 3);
    }

    #[test]
    fn rejects_control_characters_without_mutation() {
        let stop = stop_words();
        let mut index = sample();
        let err = index.insert(7, "bad fo\x12x", DocumentStatus::Actual, &[], &stop).unwrap_err();
        assert!(matches!(err, SearchError::InvalidDocumentText(7)));
        assert!(!index.contains(7));
        assert!(index.postings("bad").is_none());
    }

    #[test]
    fn stop_word_only_document_is_live_without_terms() {
        let stop = stop_words();
        let mut index = InvertedIndex::new();
        index.insert(3, "in the", DocumentStatus::Actual, &[4], &stop).unwrap();
        assert!(index.contains(3));
        assert!(index.word_frequencies(3).is_empty());
        assert_eq!(index.terms().count(), 0);
    }

    #[test]
    fn idf_uses_live_document_count() {
        let index = sample();
        let idf = index.inverse_document_freq("cat").unwrap();
        assert!((idf - (3.0f64 / 2.0).ln()).abs() < 1e-12);
        assert!(matches!(index.inverse_document_freq("bird"), Err(SearchError::UnknownTerm(_))));
    }

    #[test]
    fn remove_clears_every_map() {
        let mut index = sample();
        index.remove(2).unwrap();
        assert!(index.word_frequencies(2).is_empty());
        assert!(index.postings("dog").is_none());
        assert_eq!(index.postings("city").unwrap().len(), 1);
        assert_eq!(index.ids().collect::<Vec<_>>(), vec![0, 1]);
        assert_eq!(index.document_id(1), Some(0));
    }

    #[test]
    fn parallel_remove_matches_sequential() {
        let mut sequential = sample();
        let mut parallel = sample();
        sequential.remove(1).unwrap();
        parallel.remove_parallel(1).unwrap();

        let seq_terms: Vec<_> = sequential.terms().map(|(t, p)| (t.to_string(), p.clone())).collect();
        let par_terms: Vec<_> = parallel.terms().map(|(t, p)| (t.to_string(), p.clone())).collect();
        assert_eq!(seq_terms, par_terms);
        assert_eq!(sequential.ids().collect::<Vec<_>>(), parallel.ids().collect::<Vec<_>>());
        assert!(parallel.postings("cat").unwrap().contains_key(&0));
    }

    #[test]
    fn parallel_remove_keeps_terms_shared() {
        let stop = stop_words();
        let mut index = sample();
        index.insert(5, "city cat owl", DocumentStatus::Actual, &[], &stop).unwrap();
        index.remove_parallel(5).unwrap();

        assert!(index.postings("owl").is_none());
        assert_eq!(index.postings("cat").unwrap().keys().copied().collect::<Vec<_>>(), vec![0, 1]);
        assert_eq!(index.postings("dog").unwrap().len(), 1);
        let (forward, _) = index.terms().find(|(term, _)| *term == "city").unwrap();
        let (reverse, _) = index.word_frequencies(2).get_key_value("city").unwrap();
        assert_eq!(forward.as_ptr(), reverse.as_ptr());
    }

    #[test]
    fn insertion_order_survives_interleaved_removals() {
        let stop = stop_words();
        let mut index = sample();
        index.insert(9, "owl", DocumentStatus::Actual, &[], &stop).unwrap();
        index.remove(2).unwrap();
        index.remove_parallel(1).unwrap();
        index.insert(1, "fox", DocumentStatus::Actual, &[], &stop).unwrap();
        let order: Vec<DocId> = (0..index.document_count()).filter_map(|i| index.document_id(i)).collect();
        assert_eq!(order, vec![0, 9, 1]);
        assert_eq!(index.document_id(3), None);
    }

    #[test]
    fn removing_unknown_id_fails() {
        let mut index = sample();
        assert!(matches!(index.remove(9), Err(SearchError::UnknownDocumentId(9))));
        assert!(matches!(index.remove_parallel(9), Err(SearchError::UnknownDocumentId(9))));
        assert_eq!(index.document_count(), 3);
    }

    #[test]
    fn removed_id_can_be_reused() {
        let stop = stop_words();
        let mut index = sample();
        index.remove(1).unwrap();
        index.insert(1, "black dog", DocumentStatus::Actual, &[], &stop).unwrap();
        assert!(index.word_frequencies(1).contains_key("black"));
        assert!(!index.word_frequencies(1).contains_key("cat"));
    }
}
