use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("invalid result window: minIndex {min} > maxIndex {max}")]
    InvalidRange { min: usize, max: usize },

    #[error("search index unavailable: {0}")]
    Unavailable(String),
}

/// A single dump record that could not be normalized. Never fatal.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MalformedInput {
    #[error("{source_name} entry {key} is not an object")]
    NotAnObject { source_name: &'static str, key: String },

    #[error("{source_name} entry {key} is missing required field `{field}`")]
    MissingField { source_name: &'static str, key: String, field: &'static str },

    #[error("{source_name} entry {key} has no searchable text")]
    NoText { source_name: &'static str, key: String },

    #[error("duplicate document id {0}")]
    DuplicateId(String),
}

/// Failure to read one input file (dump or config).
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("file {0} not found")]
    Missing(PathBuf),

    #[error("failed to read {path}: {source}")]
    Io { path: PathBuf, source: std::io::Error },

    #[error("failed to parse {path}: {source}")]
    Parse { path: PathBuf, source: serde_json::Error },
}

pub type Result<T> = std::result::Result<T, EngineError>;
