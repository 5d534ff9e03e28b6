//! The document store handle.
//!
//! [`DocumentStore`] is the explicitly passed handle through which callers
//! create, read, update and delete documents. It owns one backend connection,
//! validates input, and forwards each call to the backend as a single
//! request.
//!
//! - [`DocumentStore<B>`] - Handle bound to a concrete backend type
//! - [`DynDocumentStore`] - Handle over a backend chosen at runtime
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
//! store.update_document("users", &id, doc! { "name": "B" }).await?;
//!
//! let users = store.get_documents("users", Filter::new()).await?;
//! assert_eq!(users[0].get("name"), Some(&bson::Bson::from("B")));
//! ```

use bson::Bson;
use serde_json::Value;

use crate::{
    TRACING_TARGET_STORE,
    backend::{DynStoreBackend, StoreBackend},
    collection::{Collection, TypedCollection},
    document::{Document, RawDocument, ensure_unreserved, fields_from_json, is_reserved_field},
    error::{DocumentStoreError, DocumentStoreResult},
    filter::Filter,
    id::DocumentId,
};

/// A document store bound to a specific backend implementation.
///
/// The handle is created once per process (or per test) and passed to
/// whatever needs storage. All operations are independent single-document
/// calls; nothing is batched or reordered.
///
/// # Type Parameters
///
/// * `B` - The backend implementation type
#[derive(Debug)]
pub struct DocumentStore<B: StoreBackend> {
    backend: B,
}

/// A document store whose backend is selected at runtime.
pub type DynDocumentStore = DocumentStore<Box<dyn DynStoreBackend>>;

impl<B: StoreBackend> DocumentStore<B> {
    /// Creates a new document store with the given backend.
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Returns the backend this store forwards to.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Gets a view of the collection with the given name.
    ///
    /// Collections are created implicitly by the first insert, so this never fails.
    pub fn collection<'a>(&'a self, name: &str) -> Collection<'a, B> {
        Collection::new(name.to_string(), self)
    }

    /// Gets a typed view of the collection named by `D::collection_name()`.
    pub fn typed_collection<'a, D: Document>(&'a self) -> TypedCollection<'a, B, D> {
        TypedCollection::new(D::collection_name().to_string(), self)
    }

    /// Inserts `data` as a new document and returns its generated identifier.
    ///
    /// # Arguments
    ///
    /// * `collection` - Name of the target collection, created if absent
    /// * `data` - The document fields; may not contain `id` or `created_at`
    ///
    /// # Errors
    ///
    /// - [`DocumentStoreError::InvalidCollection`] for an empty collection name
    /// - [`DocumentStoreError::InvalidDocument`] if `data` writes a reserved field
    /// - [`DocumentStoreError::Storage`] if the persistence medium fails
    pub async fn create_document(
        &self,
        collection: &str,
        data: bson::Document,
    ) -> DocumentStoreResult<DocumentId> {
        validate_collection(collection)?;
        ensure_unreserved(&data).inspect_err(|err| {
            tracing::warn!(target: TRACING_TARGET_STORE, collection, %err, "Rejected document");
        })?;

        let document = RawDocument::create(data);
        let id = document.id.clone();

        self.backend
            .insert_document(collection, document)
            .await
            .inspect_err(log_failure(collection, "insert"))?;

        tracing::debug!(target: TRACING_TARGET_STORE, collection, id = %id, "Created document");

        Ok(id)
    }

    /// Inserts a JSON object as a new document and returns its generated identifier.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::InvalidDocument`] if `data` is not a JSON object,
    /// otherwise behaves like [`create_document`](Self::create_document).
    pub async fn create_json(&self, collection: &str, data: &Value) -> DocumentStoreResult<DocumentId> {
        self.create_document(collection, fields_from_json(data)?)
            .await
    }

    /// Returns every document in `collection` whose fields equal all conditions in `filter`.
    ///
    /// An empty filter returns the whole collection. Nothing matching, including
    /// a collection that was never created, yields an empty vector.
    ///
    /// # Arguments
    ///
    /// * `collection` - Name of the collection to read
    /// * `filter` - A [`Filter`] or a [`bson::Document`] of `field: value` pairs
    pub async fn get_documents(
        &self,
        collection: &str,
        filter: impl Into<Filter>,
    ) -> DocumentStoreResult<Vec<RawDocument>> {
        validate_collection(collection)?;
        let filter = filter.into();

        let documents = self.backend
            .find_documents(collection, &filter)
            .await
            .inspect_err(log_failure(collection, "find"))?;

        tracing::debug!(
            target: TRACING_TARGET_STORE,
            collection,
            conditions = filter.len(),
            matched = documents.len(),
            "Fetched documents"
        );

        Ok(documents)
    }

    /// Returns the first document matching `filter`, if any.
    pub async fn find_document(
        &self,
        collection: &str,
        filter: impl Into<Filter>,
    ) -> DocumentStoreResult<Option<RawDocument>> {
        Ok(self
            .get_documents(collection, filter)
            .await?
            .into_iter()
            .next())
    }

    /// Counts the documents matching `filter`.
    pub async fn count_documents(
        &self,
        collection: &str,
        filter: impl Into<Filter>,
    ) -> DocumentStoreResult<u64> {
        validate_collection(collection)?;

        self.backend
            .count_documents(collection, &filter.into())
            .await
            .inspect_err(log_failure(collection, "count"))
    }

    /// Merges `patch` into the document with the given id.
    ///
    /// Only the top-level fields named in `patch` change. An empty patch
    /// leaves the document untouched and reports whether it exists.
    ///
    /// # Returns
    ///
    /// `true` if the document was found and updated, `false` if it does not exist.
    ///
    /// # Errors
    ///
    /// - [`DocumentStoreError::InvalidDocument`] if `patch` writes a reserved field
    /// - [`DocumentStoreError::Storage`] if the persistence medium fails
    pub async fn update_document(
        &self,
        collection: &str,
        id: &DocumentId,
        patch: bson::Document,
    ) -> DocumentStoreResult<bool> {
        validate_collection(collection)?;
        ensure_unreserved(&patch).inspect_err(|err| {
            tracing::warn!(target: TRACING_TARGET_STORE, collection, id = %id, %err, "Rejected patch");
        })?;

        let updated = if patch.is_empty() {
            self.backend
                .count_documents(collection, &Filter::by_id(id))
                .await
                .inspect_err(log_failure(collection, "update"))?
                > 0
        } else {
            self.backend
                .update_document(collection, id, patch)
                .await
                .inspect_err(log_failure(collection, "update"))?
        };

        tracing::debug!(target: TRACING_TARGET_STORE, collection, id = %id, updated, "Updated document");

        Ok(updated)
    }

    /// Appends `value` to the array field `field` of the document with the given id.
    ///
    /// A missing field becomes a one-element array.
    ///
    /// # Returns
    ///
    /// `true` if the document was found and updated, `false` if it does not exist.
    pub async fn push_to_field(
        &self,
        collection: &str,
        id: &DocumentId,
        field: &str,
        value: impl Into<Bson>,
    ) -> DocumentStoreResult<bool> {
        validate_collection(collection)?;

        if field.is_empty() || is_reserved_field(field) {
            return Err(DocumentStoreError::InvalidDocument(format!(
                "cannot push to field {field:?}"
            )));
        }

        let updated = self.backend
            .push_to_field(collection, id, field, value.into())
            .await
            .inspect_err(log_failure(collection, "push"))?;

        tracing::debug!(target: TRACING_TARGET_STORE, collection, id = %id, field, updated, "Pushed to field");

        Ok(updated)
    }

    /// Permanently removes the document with the given id.
    ///
    /// # Returns
    ///
    /// `true` if a document existed and was removed, `false` otherwise.
    pub async fn delete_document(&self, collection: &str, id: &DocumentId) -> DocumentStoreResult<bool> {
        validate_collection(collection)?;

        let deleted = self.backend
            .delete_document(collection, id)
            .await
            .inspect_err(log_failure(collection, "delete"))?;

        tracing::debug!(target: TRACING_TARGET_STORE, collection, id = %id, deleted, "Deleted document");

        Ok(deleted)
    }

    /// Lists all collections in the store.
    pub async fn list_collections(&self) -> DocumentStoreResult<Vec<String>> {
        self.backend.list_collections().await
    }

    /// Drops (deletes) a collection with the given name, including all of its documents.
    pub async fn drop_collection(&self, name: &str) -> DocumentStoreResult<()> {
        validate_collection(name)?;
        self.backend.drop_collection(name).await?;

        tracing::debug!(target: TRACING_TARGET_STORE, collection = name, "Dropped collection");

        Ok(())
    }

    /// Shuts down the store and releases backend resources.
    pub async fn shutdown(self) -> DocumentStoreResult<()> {
        self.backend.shutdown().await?;

        tracing::debug!(target: TRACING_TARGET_STORE, "Store shut down");

        Ok(())
    }
}

impl<B: StoreBackend + 'static> DocumentStore<B> {
    /// Erases the backend type, for code that selects backends at runtime.
    pub fn into_dyn(self) -> DynDocumentStore {
        let backend: Box<dyn DynStoreBackend> = Box::new(self.backend);
        DocumentStore::new(backend)
    }
}

impl DynDocumentStore {
    /// Returns the backend as `B` if that is the concrete type behind this store.
    pub fn downcast_backend<B: StoreBackend + 'static>(&self) -> Option<&B> {
        DynStoreBackend::as_any(&*self.backend).downcast_ref::<B>()
    }

    /// Recovers a statically typed store if the backend is a `B`.
    pub fn into_static<B: StoreBackend + 'static>(self) -> Option<DocumentStore<B>> {
        DynStoreBackend::into_any(self.backend)
            .downcast::<B>()
            .ok()
            .map(|backend| DocumentStore::new(*backend))
    }
}

fn log_failure<'a>(collection: &'a str, operation: &'static str) -> impl FnOnce(&DocumentStoreError) + 'a {
    move |err| {
        tracing::error!(target: TRACING_TARGET_STORE, collection, operation, %err, "Backend call failed");
    }
}

fn validate_collection(name: &str) -> DocumentStoreResult<()> {
    if name.is_empty() {
        tracing::warn!(target: TRACING_TARGET_STORE, "Rejected empty collection name");
        return Err(DocumentStoreError::InvalidCollection(name.to_string()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bson::doc;

    /// Backend that fails every call, standing in for an unreachable medium.
    #[derive(Debug)]
    struct Unreachable;

    fn unreachable() -> DocumentStoreError {
        DocumentStoreError::Storage("connection refused".to_string())
    }

    #[async_trait]
    impl StoreBackend for Unreachable {
        async fn insert_document(&self, _: &str, _: RawDocument) -> DocumentStoreResult<()> {
            Err(unreachable())
        }

        async fn find_documents(&self, _: &str, _: &Filter) -> DocumentStoreResult<Vec<RawDocument>> {
            Err(unreachable())
        }

        async fn count_documents(&self, _: &str, _: &Filter) -> DocumentStoreResult<u64> {
            Err(unreachable())
        }

        async fn update_document(&self, _: &str, _: &DocumentId, _: bson::Document) -> DocumentStoreResult<bool> {
            Err(unreachable())
        }

        async fn push_to_field(&self, _: &str, _: &DocumentId, _: &str, _: Bson) -> DocumentStoreResult<bool> {
            Err(unreachable())
        }

        async fn delete_document(&self, _: &str, _: &DocumentId) -> DocumentStoreResult<bool> {
            Err(unreachable())
        }

        async fn list_collections(&self) -> DocumentStoreResult<Vec<String>> {
            Err(unreachable())
        }

        async fn drop_collection(&self, _: &str) -> DocumentStoreResult<()> {
            Err(unreachable())
        }
    }

    #[tokio::test]
    async fn storage_errors_surface_to_caller() {
        let store = DocumentStore::new(Unreachable);
        let id = DocumentId::from("u1");

        assert!(matches!(
            store.create_document("users", doc! { "name": "A" }).await,
            Err(DocumentStoreError::Storage(_))
        ));
        assert!(matches!(
            store.get_documents("users", Filter::new()).await,
            Err(DocumentStoreError::Storage(_))
        ));
        assert!(matches!(
            store.update_document("users", &id, doc! { "name": "B" }).await,
            Err(DocumentStoreError::Storage(_))
        ));
        assert!(matches!(
            store.update_document("users", &id, doc! {}).await,
            Err(DocumentStoreError::Storage(_))
        ));
        assert!(matches!(
            store.delete_document("users", &id).await,
            Err(DocumentStoreError::Storage(_))
        ));
    }

    #[tokio::test]
    async fn input_is_validated_before_reaching_backend() {
        let store = DocumentStore::new(Unreachable);
        let id = DocumentId::from("u1");

        assert!(matches!(
            store.create_document("", doc! {}).await,
            Err(DocumentStoreError::InvalidCollection(_))
        ));
        assert!(matches!(
            store.create_document("users", doc! { "id": "forged" }).await,
            Err(DocumentStoreError::InvalidDocument(_))
        ));
        assert!(matches!(
            store.update_document("users", &id, doc! { "created_at": 0 }).await,
            Err(DocumentStoreError::InvalidDocument(_))
        ));
        assert!(matches!(
            store.push_to_field("users", &id, "id", "x").await,
            Err(DocumentStoreError::InvalidDocument(_))
        ));
    }

    #[test]
    fn dyn_store_downcasts_to_concrete_backend() {
        let store = DocumentStore::new(Unreachable).into_dyn();

        assert!(store.downcast_backend::<Unreachable>().is_some());

        let store = store.into_static::<Unreachable>().unwrap();
        let _: &Unreachable = store.backend();
    }
}
