//! Main docstore crate providing a unified interface for document storage.
//!
//! This crate is the primary entry point for users of docstore. It re-exports the
//! core types from the sub-crates and provides access to the storage backends.
//!
//! Documents are schema-less field maps grouped into named collections. Every
//! document gets a generated identifier and an insertion timestamp, and the four
//! core operations work on them through an explicitly passed [`store::DocumentStore`]:
//!
//! - `create_document` - insert fields, returning the new identifier
//! - `get_documents` - every document whose fields equal all filter conditions
//! - `update_document` - merge fields into a document; `false` if it does not exist
//! - `delete_document` - remove a document; `false` if it does not exist
//!
//! # Quick Start
//!
//! ```ignore
//! use docstore::{prelude::*, memory::InMemoryStore};
//! use bson::doc;
//!
//! #[tokio::main]
//! async fn main() -> DocumentStoreResult<()> {
//!     let store = DocumentStore::new(InMemoryStore::builder().build().await?);
//!
//!     let id = store.create_document("users", doc! { "name": "A" }).await?;
//!     store.update_document("users", &id, doc! { "name": "B" }).await?;
//!
//!     let users = store.get_documents("users", doc! { "name": "B" }).await?;
//!     assert_eq!(users[0].id, id);
//!
//!     store.shutdown().await
//! }
//! ```
//!
//! # Typed Collections
//!
//! Types implementing [`document::Document`] get a typed view that
//! (de)serializes through serde:
//!
//! ```ignore
//! use docstore::{prelude::*, memory::InMemoryStore};
//! use serde::{Serialize, Deserialize};
//!
//! #[derive(Debug, Clone, Serialize, Deserialize)]
//! pub struct Notification {
//!     pub user_id: String,
//!     pub title: String,
//!     pub is_read: bool,
//! }
//!
//! impl Document for Notification {
//!     fn collection_name() -> &'static str { "notifications" }
//! }
//!
//! # async fn run() -> DocumentStoreResult<()> {
//! let store = DocumentStore::new(InMemoryStore::new());
//! let notifications = store.typed_collection::<Notification>();
//!
//! let id = notifications
//!     .create(&Notification { user_id: "u1".into(), title: "Hi".into(), is_read: false })
//!     .await?;
//! notifications.update(&id, bson::doc! { "is_read": true }).await?;
//!
//! let unread = notifications.get(bson::doc! { "is_read": false }).await?;
//! assert!(unread.is_empty());
//! # Ok(()) }
//! ```
//!
//! # Dynamic Dispatch
//!
//! When the backend is chosen at runtime, convert a typed store with
//! `into_dyn`, or build one from a [`config::StoreConfig`]:
//!
//! ```ignore
//! use docstore::{config::StoreConfig, prelude::*};
//!
//! # async fn run() -> DocumentStoreResult<()> {
//! let store: DynDocumentStore = StoreConfig::new("memory://", "app").connect().await?;
//! store.create_document("events", bson::doc! { "kind": "boot" }).await?;
//! store.shutdown().await
//! # }
//! ```
//!
//! # Backends
//!
//! - [`memory`] - In-memory storage for development and testing
//! - `mongodb` - Persistent MongoDB backend (requires the `mongodb` feature)

pub mod config;
pub mod prelude;

pub use docstore_core::{backend, collection, document, error, filter, id, store};

// Re-export BSON types for convenience
pub use bson;

/// In-memory storage backend implementations.
pub mod memory {
    pub use docstore_memory::{InMemoryStore, InMemoryStoreBuilder};
}

/// MongoDB storage backend implementations.
///
/// This module is only available when the `mongodb` feature is enabled.
#[cfg(feature = "mongodb")]
pub mod mongodb {
    pub use docstore_mongodb::{MongoDbStore, MongoDbStoreBuilder};
}
