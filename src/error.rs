use thiserror::Error;
use uuid::Uuid;

use crate::core::{book::BookId, item::RowWarning, validation::ValidationErrors};

/// Result type used across the crate.
pub type Result<T> = std::result::Result<T, EditorError>;

#[derive(Error, Debug)]
/// Editor error
///
/// Every variant is local to the action that raised it: the session stays
/// usable and keeps its previous state.
pub enum EditorError {
    /// The uploaded bytes are not CSV-shaped.
    #[error("invalid file type: {0}")]
    InvalidFileType(String),

    /// Required headers are absent from the header row.
    #[error("missing required headers: {}", .missing.join(", "))]
    HeaderMismatch { missing: Vec<String> },

    /// A single row could not be decoded. Imports record it and carry on.
    #[error("{0}")]
    ParseRow(RowWarning),

    /// An edit was rejected before reaching the store.
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),

    /// Export was requested while the store holds no record.
    #[error("no records to export")]
    EmptyExport,

    /// An edit or delete named an id that is not in the store.
    #[error("no record with id {0}")]
    UnknownRecord(BookId),

    /// A load is already pending; a second one is rejected.
    #[error("an import is already in progress")]
    ImportInProgress,

    /// A finished import job was cancelled before it was applied.
    #[error("import {0} was cancelled")]
    ImportCancelled(Uuid),

    /// A page size other than 25, 50, 100 or 250 was requested.
    #[error("unsupported page size: {0}")]
    InvalidPageSize(usize),

    /// The underlying source failed while reading CSV.
    #[error("ItemReader from: {0}")]
    ItemReader(String),

    /// The destination failed while writing CSV.
    #[error("ItemWriter from: {0}")]
    ItemWriter(String),
}
