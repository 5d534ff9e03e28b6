//! Storage backend abstraction for the document store.
//!
//! This module defines the traits that abstract over persistence media, allowing
//! the [`DocumentStore`](crate::store::DocumentStore) handle to work with an
//! in-process map, a MongoDB deployment, or anything else that can hold
//! schema-less documents.
//!
//! # Traits
//!
//! - [`StoreBackend`]: The core trait for storage backends
//! - [`DynStoreBackend`]: A trait for dynamic dispatch over backend implementations
//! - [`StoreBackendBuilder`]: Factory trait for creating backend instances
//!
//! Every operation targets at most one document, so backends need no locking
//! beyond what keeps a single read/modify/write atomic.

use async_trait::async_trait;
use bson::Bson;
use std::{any::Any, fmt::Debug};

use crate::{document::RawDocument, error::DocumentStoreResult, filter::Filter, id::DocumentId};

/// Abstract interface for document storage backends.
///
/// The store layer validates input (collection names, reserved fields) before
/// calling into a backend, so implementations can assume well-formed arguments.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`. The concurrency model is left to the
/// implementer but a single call must behave atomically with respect to the
/// document it touches.
///
/// # Error Handling
///
/// Failures of the persistence medium are reported as
/// [`DocumentStoreError::Storage`](crate::error::DocumentStoreError::Storage).
/// A missing document is never an error; the boolean-returning operations
/// return `false` instead.
#[async_trait]
pub trait StoreBackend: Send + Sync + Debug {
    /// Inserts a new document into a collection, creating the collection if needed.
    async fn insert_document(&self, collection: &str, document: RawDocument) -> DocumentStoreResult<()>;

    /// Returns every document in `collection` matching `filter`, in insertion order.
    ///
    /// A collection that does not exist yields an empty vector.
    async fn find_documents(&self, collection: &str, filter: &Filter) -> DocumentStoreResult<Vec<RawDocument>>;

    /// Counts the documents in `collection` matching `filter`.
    async fn count_documents(&self, collection: &str, filter: &Filter) -> DocumentStoreResult<u64>;

    /// Merges `patch` into the top-level fields of the document with the given id.
    ///
    /// Returns `false` if no such document exists.
    async fn update_document(
        &self,
        collection: &str,
        id: &DocumentId,
        patch: bson::Document,
    ) -> DocumentStoreResult<bool>;

    /// Appends `value` to the array held in `field` of the document with the given id.
    ///
    /// Returns `false` if no such document exists.
    async fn push_to_field(
        &self,
        collection: &str,
        id: &DocumentId,
        field: &str,
        value: Bson,
    ) -> DocumentStoreResult<bool>;

    /// Removes the document with the given id.
    ///
    /// Returns `true` if a document existed and was removed.
    async fn delete_document(&self, collection: &str, id: &DocumentId) -> DocumentStoreResult<bool>;

    /// Lists the names of all collections in the store.
    async fn list_collections(&self) -> DocumentStoreResult<Vec<String>>;

    /// Drops (deletes) a collection and all its documents.
    ///
    /// # Warning
    ///
    /// This operation is irreversible.
    async fn drop_collection(&self, name: &str) -> DocumentStoreResult<()>;

    /// Cleanly shuts down the backend, releasing all resources.
    ///
    /// The default implementation is a no-op. Backends holding connections
    /// should override it.
    async fn shutdown(self) -> DocumentStoreResult<()>
    where
        Self: Sized,
    {
        Ok(())
    }
}

#[async_trait]
impl<B> StoreBackend for &B
where
    B: StoreBackend,
{
    async fn insert_document(&self, collection: &str, document: RawDocument) -> DocumentStoreResult<()> {
        (*self).insert_document(collection, document).await
    }

    async fn find_documents(&self, collection: &str, filter: &Filter) -> DocumentStoreResult<Vec<RawDocument>> {
        (*self).find_documents(collection, filter).await
    }

    async fn count_documents(&self, collection: &str, filter: &Filter) -> DocumentStoreResult<u64> {
        (*self).count_documents(collection, filter).await
    }

    async fn update_document(
        &self,
        collection: &str,
        id: &DocumentId,
        patch: bson::Document,
    ) -> DocumentStoreResult<bool> {
        (*self).update_document(collection, id, patch).await
    }

    async fn push_to_field(
        &self,
        collection: &str,
        id: &DocumentId,
        field: &str,
        value: Bson,
    ) -> DocumentStoreResult<bool> {
        (*self).push_to_field(collection, id, field, value).await
    }

    async fn delete_document(&self, collection: &str, id: &DocumentId) -> DocumentStoreResult<bool> {
        (*self).delete_document(collection, id).await
    }

    async fn list_collections(&self) -> DocumentStoreResult<Vec<String>> {
        (*self).list_collections().await
    }

    async fn drop_collection(&self, name: &str) -> DocumentStoreResult<()> {
        (*self).drop_collection(name).await
    }
}

/// Object-safe mirror of [`StoreBackend`], implemented for every backend.
///
/// Used when the backend is chosen at runtime, e.g. from configuration.
#[async_trait]
pub trait DynStoreBackend: Send + Sync + Debug {
    async fn insert_document(&self, collection: &str, document: RawDocument) -> DocumentStoreResult<()>;
    async fn find_documents(&self, collection: &str, filter: &Filter) -> DocumentStoreResult<Vec<RawDocument>>;
    async fn count_documents(&self, collection: &str, filter: &Filter) -> DocumentStoreResult<u64>;
    async fn update_document(
        &self,
        collection: &str,
        id: &DocumentId,
        patch: bson::Document,
    ) -> DocumentStoreResult<bool>;
    async fn push_to_field(
        &self,
        collection: &str,
        id: &DocumentId,
        field: &str,
        value: Bson,
    ) -> DocumentStoreResult<bool>;
    async fn delete_document(&self, collection: &str, id: &DocumentId) -> DocumentStoreResult<bool>;
    async fn list_collections(&self) -> DocumentStoreResult<Vec<String>>;
    async fn drop_collection(&self, name: &str) -> DocumentStoreResult<()>;
    async fn shutdown_boxed(self: Box<Self>) -> DocumentStoreResult<()>;

    fn as_any(&self) -> &dyn Any;
    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

#[async_trait]
impl<B: StoreBackend + 'static> DynStoreBackend for B {
    async fn insert_document(&self, collection: &str, document: RawDocument) -> DocumentStoreResult<()> {
        StoreBackend::insert_document(self, collection, document).await
    }

    async fn find_documents(&self, collection: &str, filter: &Filter) -> DocumentStoreResult<Vec<RawDocument>> {
        StoreBackend::find_documents(self, collection, filter).await
    }

    async fn count_documents(&self, collection: &str, filter: &Filter) -> DocumentStoreResult<u64> {
        StoreBackend::count_documents(self, collection, filter).await
    }

    async fn update_document(
        &self,
        collection: &str,
        id: &DocumentId,
        patch: bson::Document,
    ) -> DocumentStoreResult<bool> {
        StoreBackend::update_document(self, collection, id, patch).await
    }

    async fn push_to_field(
        &self,
        collection: &str,
        id: &DocumentId,
        field: &str,
        value: Bson,
    ) -> DocumentStoreResult<bool> {
        StoreBackend::push_to_field(self, collection, id, field, value).await
    }

    async fn delete_document(&self, collection: &str, id: &DocumentId) -> DocumentStoreResult<bool> {
        StoreBackend::delete_document(self, collection, id).await
    }

    async fn list_collections(&self) -> DocumentStoreResult<Vec<String>> {
        StoreBackend::list_collections(self).await
    }

    async fn drop_collection(&self, name: &str) -> DocumentStoreResult<()> {
        StoreBackend::drop_collection(self, name).await
    }

    async fn shutdown_boxed(self: Box<Self>) -> DocumentStoreResult<()> {
        StoreBackend::shutdown(*self).await
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

/// A boxed backend is itself a backend, so a
/// [`DynDocumentStore`](crate::store::DynDocumentStore) shares the typed store's API.
#[async_trait]
impl StoreBackend for Box<dyn DynStoreBackend> {
    async fn insert_document(&self, collection: &str, document: RawDocument) -> DocumentStoreResult<()> {
        DynStoreBackend::insert_document(&**self, collection, document).await
    }

    async fn find_documents(&self, collection: &str, filter: &Filter) -> DocumentStoreResult<Vec<RawDocument>> {
        DynStoreBackend::find_documents(&**self, collection, filter).await
    }

    async fn count_documents(&self, collection: &str, filter: &Filter) -> DocumentStoreResult<u64> {
        DynStoreBackend::count_documents(&**self, collection, filter).await
    }

    async fn update_document(
        &self,
        collection: &str,
        id: &DocumentId,
        patch: bson::Document,
    ) -> DocumentStoreResult<bool> {
        DynStoreBackend::update_document(&**self, collection, id, patch).await
    }

    async fn push_to_field(
        &self,
        collection: &str,
        id: &DocumentId,
        field: &str,
        value: Bson,
    ) -> DocumentStoreResult<bool> {
        DynStoreBackend::push_to_field(&**self, collection, id, field, value).await
    }

    async fn delete_document(&self, collection: &str, id: &DocumentId) -> DocumentStoreResult<bool> {
        DynStoreBackend::delete_document(&**self, collection, id).await
    }

    async fn list_collections(&self) -> DocumentStoreResult<Vec<String>> {
        DynStoreBackend::list_collections(&**self).await
    }

    async fn drop_collection(&self, name: &str) -> DocumentStoreResult<()> {
        DynStoreBackend::drop_collection(&**self, name).await
    }

    async fn shutdown(self) -> DocumentStoreResult<()> {
        DynStoreBackend::shutdown_boxed(self).await
    }
}

/// Factory for backends that need asynchronous setup, such as opening a connection.
#[async_trait]
pub trait StoreBackendBuilder {
    type Backend: StoreBackend;

    async fn build(self) -> DocumentStoreResult<Self::Backend>;
}
