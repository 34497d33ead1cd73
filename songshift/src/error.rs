//! Error types for songshift
//!
//! Component contracts return these explicitly; the transfer orchestrator
//! converts per-playlist failures into report statuses. Session construction
//! fails with [`crate::auth::AuthError`] and configuration with
//! [`songshift_common::Error`]; both abort a run before any transfer starts.

use crate::types::CatalogError;
use thiserror::Error;

/// Transfer pipeline error
#[derive(Debug, Error)]
pub enum TransferError {
    /// Source listing unreachable or unauthorized
    #[error("Source read failed: {0}")]
    Read(#[source] CatalogError),

    /// Destination playlist could not be created
    #[error("Destination playlist creation failed: {0}")]
    Create(#[source] CatalogError),
}

/// Result type for transfer operations
pub type TransferResult<T> = Result<T, TransferError>;
