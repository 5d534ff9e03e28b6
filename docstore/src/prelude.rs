//! Convenient re-exports of commonly used types from docstore.
//!
//! ```ignore
//! use docstore::prelude::*;
//! ```

pub use docstore_core::{
    backend::{StoreBackend, StoreBackendBuilder},
    collection::{Collection, TypedCollection},
    document::{Document, DocumentExt, RawDocument, StoredDocument},
    error::{DocumentStoreError, DocumentStoreResult},
    filter::{Condition, Filter, FilterVisitor},
    id::DocumentId,
    store::{DocumentStore, DynDocumentStore},
};
