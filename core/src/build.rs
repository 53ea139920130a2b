use crate::config::EngineConfig;
use crate::dumps::LoadedDumps;
use crate::error::{EngineError, Result};
use crate::normalize::normalize;
use crate::tokenizer::Tokenizer;
use crate::{BuildStats, DocId, Document, Index, Posting};
use std::collections::HashMap;

/// Build an index from already-normalized documents. Never fails; an empty
/// input gives an empty index.
pub fn build(documents: Vec<Document>, config: &EngineConfig) -> Index {
    assemble(documents, 0, config)
}

/// Normalize whatever dumps loaded and index them. Fails only when no dump
/// loaded at all.
pub fn build_from_dumps(dumps: &LoadedDumps, config: &EngineConfig) -> Result<Index> {
    if dumps.loaded_count() == 0 {
        return Err(EngineError::Unavailable("no input dumps could be loaded".into()));
    }
    let normalized = normalize(dumps);
    Ok(assemble(normalized.documents, normalized.skipped.len(), config))
}

fn assemble(documents: Vec<Document>, mut skipped: usize, config: &EngineConfig) -> Index {
    let tokenizer = Tokenizer::new(config.stemming);
    let mut docs: Vec<Document> = Vec::with_capacity(documents.len());
    let mut ids: HashMap<String, DocId> = HashMap::with_capacity(documents.len());
    let mut postings: HashMap<String, Vec<Posting>> = HashMap::new();

    for doc in documents {
        if doc.fields.iter().all(|(_, text)| text.trim().is_empty()) {
            tracing::debug!(id = %doc.id, "document without text dropped");
            skipped += 1;
            continue;
        }
        if ids.contains_key(&doc.id) {
            tracing::debug!(id = %doc.id, "duplicate document id dropped");
            skipped += 1;
            continue;
        }
        let doc_id = docs.len() as DocId;

        // term -> (raw tf, weighted tf) across all fields of this document
        let mut term_freqs: HashMap<String, (u32, f32)> = HashMap::new();
        for (field, text) in &doc.fields {
            let weight = config.scoring.weight(field);
            for (term, tf) in tokenizer.term_frequencies(text) {
                let entry = term_freqs.entry(term).or_insert((0, 0.0));
                entry.0 += tf;
                entry.1 += tf as f32 * weight;
            }
        }

        for (term, (term_freq, weighted_freq)) in term_freqs {
            postings.entry(term).or_default().push(Posting { doc_id, term_freq, weighted_freq });
        }
        ids.insert(doc.id.clone(), doc_id);
        docs.push(doc);
    }

    let stats = BuildStats { num_docs: docs.len(), num_terms: postings.len(), skipped };
    tracing::info!(num_docs = stats.num_docs, num_terms = stats.num_terms, skipped, "index built");

    Index { docs, ids, postings, config: config.clone(), tokenizer, stats }
}
