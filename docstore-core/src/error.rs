//! Error types and result types for document store operations.
//!
//! Every fallible operation in the workspace returns [`DocumentStoreResult<T>`].
//! Note that a missing document is not an error: update, push and delete report
//! absence through their boolean return value.

use bson::error::Error as BsonError;
use serde_json::Error as SerdeJsonError;
use std::convert::Infallible;
use thiserror::Error;

/// Represents all possible errors that can occur when interacting with a document store.
#[derive(Error, Debug)]
pub enum DocumentStoreError {
    /// The persistence medium is unreachable or rejected the operation.
    ///
    /// This is not recoverable at this layer and is always surfaced to the caller.
    #[error("Storage error: {0}")]
    Storage(String),
    /// Serialization/deserialization error when converting between document formats (BSON, JSON).
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// The document, patch or pushed value is not acceptable, e.g. it writes a reserved field.
    #[error("Invalid document: {0}")]
    InvalidDocument(String),
    /// The collection name cannot be used.
    #[error("Invalid collection name: {0:?}")]
    InvalidCollection(String),
    /// The requested collection does not exist in the store.
    #[error("Collection not found: {0}")]
    CollectionNotFound(String),
    /// The store could not be configured or connected from the given settings.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// A specialized `Result` type for document store operations.
pub type DocumentStoreResult<T> = Result<T, DocumentStoreError>;

impl From<BsonError> for DocumentStoreError {
    fn from(err: BsonError) -> Self {
        DocumentStoreError::Serialization(err.to_string())
    }
}

impl From<SerdeJsonError> for DocumentStoreError {
    fn from(err: SerdeJsonError) -> Self {
        DocumentStoreError::Serialization(err.to_string())
    }
}

impl From<Infallible> for DocumentStoreError {
    fn from(never: Infallible) -> Self {
        match never {}
    }
}
