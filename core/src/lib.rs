pub mod build;
pub mod config;
pub mod dumps;
pub mod error;
pub mod lifecycle;
pub mod normalize;
pub mod query;
pub mod tokenizer;

use serde::Serialize;
use std::collections::HashMap;

pub use build::{build, build_from_dumps};
pub use config::{EngineConfig, FieldWeights, ScoringConfig};
pub use error::{EngineError, Result};
pub use lifecycle::{IndexManager, IndexStatus};
pub use query::{count_matches, search, SearchHit};

/// Dense position of a document inside `Index::docs`.
pub type DocId = u32;

/// Kind of record a document came from. Declaration order is the ranking
/// tie-break precedence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    Course,
    Section,
    Employee,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: String,
    pub entity_type: EntityType,
    /// (field name, text) in the order the normalizer produced them.
    #[serde(skip)]
    pub fields: Vec<(String, String)>,
    /// Owning course id for sections; display and grouping only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    pub payload: serde_json::Value,
}

impl Document {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Posting {
    pub doc_id: DocId,
    /// Raw occurrences of the term across all fields of the document.
    pub term_freq: u32,
    /// Sum over fields of `tf * field_weight`.
    pub weighted_freq: f32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildStats {
    pub num_docs: usize,
    pub num_terms: usize,
    pub skipped: usize,
}

/// Immutable search index. Only `build` constructs one.
#[derive(Debug)]
pub struct Index {
    pub(crate) docs: Vec<Document>,
    pub(crate) ids: HashMap<String, DocId>,
    pub(crate) postings: HashMap<String, Vec<Posting>>,
    pub(crate) config: EngineConfig,
    pub(crate) tokenizer: tokenizer::Tokenizer,
    pub(crate) stats: BuildStats,
}

impl Index {
    pub fn num_docs(&self) -> usize { self.docs.len() }

    pub fn is_empty(&self) -> bool { self.docs.is_empty() }

    pub fn stats(&self) -> BuildStats { self.stats }

    pub fn config(&self) -> &EngineConfig { &self.config }

    pub fn document(&self, id: &str) -> Option<&Document> {
        self.ids.get(id).map(|&d| &self.docs[d as usize])
    }

    pub fn postings(&self, term: &str) -> &[Posting] {
        self.postings.get(term).map(Vec::as_slice).unwrap_or(&[])
    }
}
