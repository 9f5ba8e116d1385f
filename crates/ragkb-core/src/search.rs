//! Brute-force similarity ranking shared by every store backend.
//!
//! Search is a full scan: the query is compared with every stored
//! embedding, O(corpus × dimensions) per query. No index structure sits in
//! front of it, so backends only have to stream their documents into
//! [`rank_documents`].
//!
//! # Ordering
//!
//! 1. Cosine similarity, descending.
//! 2. Document id, ascending, to break ties deterministically.
//!
//! A `limit` of zero or less returns every document; a limit larger than
//! the corpus returns what is available.

use std::cmp::Ordering;

use crate::embedding::cosine_similarity;
use crate::models::{Document, SearchResult};

/// Score `docs` against `query` and return the top `limit` results.
pub fn rank_documents<I>(query: &[f32], docs: I, limit: i64) -> Vec<SearchResult>
where
    I: IntoIterator<Item = Document>,
{
    let mut results: Vec<SearchResult> = docs
        .into_iter()
        .map(|document| {
            let similarity = cosine_similarity(query, &document.embedding);
            SearchResult {
                document,
                similarity,
            }
        })
        .collect();

    results.sort_by(compare_results);

    if limit > 0 {
        results.truncate(limit as usize);
    }
    results
}

/// Similarity descending, then id ascending.
pub fn compare_results(a: &SearchResult, b: &SearchResult) -> Ordering {
    b.similarity
        .total_cmp(&a.similarity)
        .then_with(|| a.document.id.cmp(&b.document.id))
}
