use crate::document::Document;
use crate::error::Result;
use crate::profile::LogDuration;
use crate::server::SearchServer;
use rayon::prelude::*;

/// Run independent queries in parallel; results follow the order of `queries`.
///
/// Each query is ranked with the default status filter. The first failing
/// query's error is returned.
pub fn process_queries<S>(server: &SearchServer, queries: &[S]) -> Result<Vec<Vec<Document>>>
where
    S: AsRef<str> + Sync,
{
    let _timer = LogDuration::new("process_queries");
    let results = queries
        .par_iter()
        .map(|query| server.find_top_documents(query.as_ref()))
        .collect::<Result<Vec<_>>>()?;
    tracing::debug!(queries = queries.len(), "processed queries");
    Ok(results)
}

/// Results of all queries concatenated in query order, not re-ranked.
pub fn process_queries_joined<S>(server: &SearchServer, queries: &[S]) -> Result<Vec<Document>>
where
    S: AsRef<str> + Sync,
{
    Ok(process_queries(server, queries)?.into_iter().flatten().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DocumentStatus, SearchError};

    fn server() -> SearchServer {
        let mut server = SearchServer::new("and with").unwrap();
        let texts = [
            "funny pet and nasty rat",
            "funny pet with curly hair",
            "funny pet and not very nasty rat",
            "pet with rat and rat and rat",
            "nasty rat with curly hair",
        ];
        for (id, text) in (1..).zip(texts) {
            server.add_document(id, text, DocumentStatus::Actual, &[1, 2]).unwrap();
        }
        server
    }

    #[test]
    fn keeps_query_order() {
        let server = server();
        let queries = ["nasty rat -not", "not very funny nasty pet", "curly hair"];
        let results = process_queries(&server, &queries).unwrap();
        assert_eq!(results.len(), 3);
        for (query, found) in queries.iter().zip(&results) {
            assert_eq!(found, &server.find_top_documents(query).unwrap());
        }
        assert_eq!(results[0].len(), 3);
        assert_eq!(results[1].len(), 5);
        assert_eq!(results[2].len(), 2);
    }

    #[test]
    fn joined_concatenates_without_reranking() {
        let server = server();
        let queries = vec!["curly hair".to_string(), "nasty rat -not".to_string()];
        let per_query = process_queries(&server, &queries).unwrap();
        let joined = process_queries_joined(&server, &queries).unwrap();
        let expected: Vec<Document> = per_query.into_iter().flatten().collect();
        assert_eq!(joined, expected);
        assert_eq!(joined.len(), 5);
    }

    #[test]
    fn empty_batch() {
        let server = server();
        let queries: [&str; 0] = [];
        assert!(process_queries(&server, &queries).unwrap().is_empty());
        assert!(process_queries_joined(&server, &queries).unwrap().is_empty());
    }

    #[test]
    fn propagates_query_errors() {
        let server = server();
        let err = process_queries(&server, &["curly", "rat --pet"]).unwrap_err();
        assert!(matches!(err, SearchError::MalformedQueryTerm(_)));
    }
}
