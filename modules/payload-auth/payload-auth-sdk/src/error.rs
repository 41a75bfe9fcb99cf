//! Error types for the adapter and the store contract.

use thiserror::Error;

/// Errors raised by a [`crate::DocumentStore`] implementation.
#[derive(Error, Debug)]
pub enum StoreError {
    /// A point operation addressed a document that does not exist.
    #[error("document '{id}' not found in collection '{collection}'")]
    NotFound { collection: String, id: String },

    /// The store rejected the data (schema or constraint violation).
    #[error("validation failed for collection '{collection}': {message}")]
    Validation { collection: String, message: String },

    /// The store could not be reached or is not initialized.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl StoreError {
    #[must_use]
    pub fn not_found(collection: impl Into<String>, id: impl ToString) -> Self {
        Self::NotFound {
            collection: collection.into(),
            id: id.to_string(),
        }
    }

    #[must_use]
    pub fn validation(collection: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            collection: collection.into(),
            message: message.into(),
        }
    }

    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Errors surfaced to the auth framework.
///
/// Store failures are carried through unchanged so callers can inspect them.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum AdapterError {
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AdapterError {
    /// Returns the underlying store error.
    #[must_use]
    pub const fn store_error(&self) -> &StoreError {
        match self {
            Self::Store(e) => e,
        }
    }
}
