use crate::error::{EngineError, Result};
use crate::{DocId, Document, Index};
use serde::Serialize;
use std::collections::HashMap;

/// One ranked result, serialized flat next to the document it points at.
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit<'a> {
    #[serde(flatten)]
    pub document: &'a Document,
    pub score: f32,
}

/// Rank every document matching at least one query term and return the
/// `[min_index, max_index)` window of that ranking.
pub fn search<'a>(index: &'a Index, query: &str, min_index: usize, max_index: usize) -> Result<Vec<SearchHit<'a>>> {
    if min_index > max_index {
        return Err(EngineError::InvalidRange { min: min_index, max: max_index });
    }
    let ranked = rank(index, query);
    let total_hits = ranked.len();
    let hits: Vec<SearchHit<'a>> = ranked
        .into_iter()
        .skip(min_index)
        .take(max_index - min_index)
        .map(|(doc_id, score)| SearchHit { document: &index.docs[doc_id as usize], score })
        .collect();
    tracing::debug!(query, total_hits, returned = hits.len(), min_index, max_index, "search");
    Ok(hits)
}

/// Number of documents `query` matches, without building a page.
pub fn count_matches(index: &Index, query: &str) -> usize {
    score(index, query).len()
}

/// `ln(N / df)`, floored so terms found in every document still contribute.
pub fn idf(index: &Index, doc_freq: usize) -> f32 {
    let n = index.docs.len().max(1) as f32;
    let df = doc_freq.max(1) as f32;
    (n / df).ln().max(index.config.scoring.idf_floor)
}

fn score(index: &Index, query: &str) -> HashMap<DocId, f32> {
    let mut scores: HashMap<DocId, f32> = HashMap::new();
    for term in index.tokenizer.query_terms(query) {
        let postings = index.postings(&term);
        if postings.is_empty() {
            continue;
        }
        let term_idf = idf(index, postings.len());
        for p in postings {
            *scores.entry(p.doc_id).or_insert(0.0) += p.weighted_freq * term_idf;
        }
    }
    scores
}

/// Score descending, then entity type precedence, then document id.
fn rank(index: &Index, query: &str) -> Vec<(DocId, f32)> {
    let mut ranked: Vec<(DocId, f32)> = score(index, query).into_iter().collect();
    ranked.sort_by(|a, b| {
        let (da, db) = (&index.docs[a.0 as usize], &index.docs[b.0 as usize]);
        b.1.total_cmp(&a.1)
            .then_with(|| da.entity_type.cmp(&db.entity_type))
            .then_with(|| da.id.cmp(&db.id))
    });
    ranked
}
