//! MongoDB backend implementation for docstore.
//!
//! This crate provides a MongoDB-based implementation of the `StoreBackend` trait,
//! persisting documents in a MongoDB database and evaluating filters with its query engine.
//!
//! To use this backend, include the `mongodb` feature in your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! docstore = { version = "x.y.z", features = ["mongodb"] }
//! ```
//!
//! # Features
//!
//! - **Persistent storage** - Data is persisted to MongoDB Atlas or self-hosted MongoDB
//! - **Native filtering** - Equality filters run as MongoDB `$eq` queries
//! - **Safe field names** - Keys containing `.`, `$` or `\0` are escaped and restored transparently
//!
//! # Example
//!
//! ```ignore
//! use docstore::{backend::StoreBackendBuilder, mongodb::MongoDbStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = MongoDbStore::builder("mongodb://localhost:27017", "my_database")
//!         .build()
//!         .await?;
//!
//!     Ok(())
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as docstore_mongodb;

mod query;
mod sanitizer;
pub mod store;

pub use store::{MongoDbStore, MongoDbStoreBuilder};

/// Tracing target for MongoDB backend operations.
pub const TRACING_TARGET_MONGODB: &str = "docstore::mongodb";
