//! A generic, collection-oriented document store access layer.
//!
//! This crate is the core of the docstore project and provides:
//!
//! - **Documents** ([`document`]) - Schema-less field maps, stored documents and typed document traits
//! - **Identifiers** ([`id`]) - Opaque, URL-safe document identifiers
//! - **Filters** ([`filter`]) - Exact-match filters and the visitor backends use to evaluate them
//! - **Store backend abstraction** ([`backend`]) - Traits for implementing persistence media
//! - **Document store** ([`store`]) - The handle exposing create/get/update/delete
//! - **Collections** ([`collection`]) - Name-bound untyped and typed views
//! - **Error handling** ([`error`]) - Error and result types
//!
//! # Example
//!
//! ```ignore
//! use docstore::{prelude::*, memory::InMemoryStore};
//! use bson::doc;
//!
//! let store = DocumentStore::new(InMemoryStore::new());
//!
//! let id = store.create_document("users", doc! { "name": "A" }).await?;
//! assert!(store.update_document("users", &id, doc! { "name": "B" }).await?);
//! assert!(store.delete_document("users", &id).await?);
//! assert!(!store.delete_document("users", &id).await?);
//! ```

#[allow(unused_extern_crates)]
extern crate self as docstore_core;

pub mod backend;
pub mod collection;
pub mod document;
pub mod error;
pub mod filter;
pub mod id;
pub mod store;

/// Tracing target for store-level operations.
pub const TRACING_TARGET_STORE: &str = "docstore::store";
