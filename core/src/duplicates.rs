use crate::error::Result;
use crate::profile::LogDuration;
use crate::server::SearchServer;
use crate::DocId;
use std::collections::{BTreeSet, HashSet};

/// Ids of documents whose set of distinct terms already appeared in a
/// lower-numbered document. Term frequencies are ignored.
pub fn find_duplicates(server: &SearchServer) -> Vec<DocId> {
    let mut seen: HashSet<BTreeSet<&str>> = HashSet::new();
    let mut duplicates = Vec::new();
    for id in server {
        let words: BTreeSet<&str> = server.word_frequencies(id).keys().map(|term| &**term).collect();
        if !seen.insert(words) {
            duplicates.push(id);
        }
    }
    duplicates
}

/// Remove every duplicate found by [`find_duplicates`], returning the removed ids.
pub fn remove_duplicates(server: &mut SearchServer) -> Result<Vec<DocId>> {
    let _timer = LogDuration::new("remove_duplicates");
    let duplicates = find_duplicates(server);
    for &id in &duplicates {
        tracing::info!(doc_id = id, "found duplicate document id");
        server.remove_document(id)?;
    }
    Ok(duplicates)
}
