//! In-memory document storage backend for docstore.
//!
//! This crate provides a thread-safe, in-memory implementation of the `StoreBackend` trait.
//! It uses async-aware read-write locks for concurrent access and is suited to development,
//! testing, and small single-process deployments.
//!
//! # Features
//!
//! - **Thread-safe access** - Concurrent reads and writes using an async-aware RwLock
//! - **Insertion order** - Results come back in the order documents were created
//! - **Value equality** - Numbers compare by value across integer and float types
//!
//! # Quick Start
//!
//! ```ignore
//! use docstore::{prelude::*, memory::InMemoryStore};
//! use bson::doc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let backend = InMemoryStore::builder().build().await?;
//!     let store = DocumentStore::new(backend);
//!
//!     let id = store.create_document("users", doc! { "name": "Alice" }).await?;
//!     let users = store.get_documents("users", doc! { "name": "Alice" }).await?;
//!     assert_eq!(users[0].id, id);
//!
//!     Ok(())
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as docstore_memory;

mod evaluator;
pub mod store;

pub use store::{InMemoryStore, InMemoryStoreBuilder};

/// Tracing target for in-memory backend operations.
pub const TRACING_TARGET_MEMORY: &str = "docstore::memory";
