//! Error taxonomy shared by the tree store, graph mirror and ingester.
//! Variants map to stable snake_case codes; `is_retryable` decides which
//! failures an ingest worker may attempt again.

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Which kind of entry occupies a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Collection,
    Resource,
}

impl Display for EntryKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            EntryKind::Collection => f.write_str("collection"),
            EntryKind::Resource => f.write_str("resource"),
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no such parent collection: {0}")]
    NoSuchParent(String),
    #[error("{kind} already exists at {path}")]
    NameConflict { kind: EntryKind, path: String },
    #[error("not found: {0}")]
    NotFound(String),
    #[error("transient store failure: {0}")]
    Transient(String),
    #[error("include pattern '{0}' matched no directory")]
    FilterNotFound(String),
    #[error("invalid job: {0}")]
    InvalidJob(String),
    #[error("invalid path: {0}")]
    InvalidPath(String),
    #[error("graph mirror failure: {0}")]
    Graph(String),
    #[error("corrupt record at {key}: {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl StoreError {
    pub fn conflict(kind: EntryKind, path: impl Into<String>) -> Self {
        StoreError::NameConflict { kind, path: path.into() }
    }

    pub fn transient(msg: impl Into<String>) -> Self {
        StoreError::Transient(msg.into())
    }

    pub fn code_str(&self) -> &'static str {
        match self {
            StoreError::NoSuchParent(_) => "no_such_parent",
            StoreError::NameConflict { .. } => "name_conflict",
            StoreError::NotFound(_) => "not_found",
            StoreError::Transient(_) => "transient_store_error",
            StoreError::FilterNotFound(_) => "filter_not_found",
            StoreError::InvalidJob(_) => "invalid_job",
            StoreError::InvalidPath(_) => "invalid_path",
            StoreError::Graph(_) => "graph_error",
            StoreError::Corrupt { .. } => "corrupt_record",
            StoreError::Io(_) => "io_error",
        }
    }

    /// Store hiccups and I/O are worth another attempt; structural and
    /// programming errors fail the same way every time.
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::Transient(_) | StoreError::Io(_) | StoreError::Graph(_))
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::NameConflict { .. })
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod error_tests;
