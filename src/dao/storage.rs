//! Storage error types shared by every backend.

use std::{error::Error, fmt};

use thiserror::Error;

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Uniqueness rule violated by an insert. The store is the single
/// serialization point for these rules, so a conflict reported here is the
/// authoritative signal, not a pre-check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictKind {
    /// `(room_id, name)` already exists in `participants`.
    DuplicateName,
    /// `(room_id, voter_id)` already exists in `votes`.
    DuplicateVote,
}

impl fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConflictKind::DuplicateName => f.write_str("duplicate participant name"),
            ConflictKind::DuplicateVote => f.write_str("duplicate vote"),
        }
    }
}

/// Error raised by storage backends regardless of the underlying database.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Backend could not be reached or the query failed.
    #[error("storage unavailable: {message}")]
    Unavailable {
        /// Human-readable description of the failed operation.
        message: String,
        /// Underlying backend failure.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// A unique constraint rejected the write.
    #[error("unique constraint violated: {0}")]
    Conflict(ConflictKind),
}

impl StorageError {
    /// Construct an unavailable error from any backend failure.
    pub fn unavailable(message: String, source: impl Error + Send + Sync + 'static) -> Self {
        StorageError::Unavailable {
            message,
            source: Box::new(source),
        }
    }
}
