//! Collection views for document store operations.
//!
//! A collection view binds a collection name to a [`DocumentStore`] so callers
//! do not have to repeat the name on every call.
//!
//! - [`Collection`] - Untyped view working with BSON field maps
//! - [`TypedCollection`] - View that (de)serializes a [`Document`] type
//!
//! # Example
//!
//! ```ignore
//! use docstore::document::Document;
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
//! # async fn example(store: &docstore::store::DocumentStore<impl docstore::backend::StoreBackend>) -> docstore::error::DocumentStoreResult<()> {
//! let notifications = store.typed_collection::<Notification>();
//! let id = notifications
//!     .create(&Notification { user_id: "u1".into(), title: "Welcome".into(), is_read: false })
//!     .await?;
//! notifications.update(&id, bson::doc! { "is_read": true }).await?;
//! # Ok(()) }
//! ```

use bson::Bson;
use serde_json::Value;
use std::marker::PhantomData;

use crate::{
    backend::StoreBackend,
    document::{Document, DocumentExt, RawDocument, StoredDocument},
    error::DocumentStoreResult,
    filter::Filter,
    id::DocumentId,
    store::DocumentStore,
};

/// An untyped view of a named collection.
///
/// # Type Parameters
///
/// * `'a` - Lifetime of the store reference
/// * `B` - The storage backend type
#[derive(Debug)]
pub struct Collection<'a, B: StoreBackend> {
    name: String,
    store: &'a DocumentStore<B>,
}

impl<'a, B: StoreBackend> Collection<'a, B> {
    pub(crate) fn new(name: String, store: &'a DocumentStore<B>) -> Self {
        Self { name, store }
    }

    /// Returns the name of this collection.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Inserts a new document and returns its generated identifier.
    pub async fn create(&self, data: bson::Document) -> DocumentStoreResult<DocumentId> {
        self.store.create_document(&self.name, data).await
    }

    /// Inserts a JSON object as a new document and returns its generated identifier.
    pub async fn create_json(&self, data: &Value) -> DocumentStoreResult<DocumentId> {
        self.store.create_json(&self.name, data).await
    }

    /// Returns all documents matching `filter`.
    pub async fn get(&self, filter: impl Into<Filter>) -> DocumentStoreResult<Vec<RawDocument>> {
        self.store.get_documents(&self.name, filter).await
    }

    /// Returns the first document matching `filter`, if any.
    pub async fn find_one(&self, filter: impl Into<Filter>) -> DocumentStoreResult<Option<RawDocument>> {
        self.store.find_document(&self.name, filter).await
    }

    /// Returns the document with the given identifier, if it exists.
    pub async fn get_by_id(&self, id: &DocumentId) -> DocumentStoreResult<Option<RawDocument>> {
        self.store.find_document(&self.name, Filter::by_id(id)).await
    }

    /// Counts the documents matching `filter`.
    pub async fn count(&self, filter: impl Into<Filter>) -> DocumentStoreResult<u64> {
        self.store.count_documents(&self.name, filter).await
    }

    /// Merges `patch` into the document with the given id; `false` if it does not exist.
    pub async fn update(&self, id: &DocumentId, patch: bson::Document) -> DocumentStoreResult<bool> {
        self.store.update_document(&self.name, id, patch).await
    }

    /// Appends `value` to the array in `field`; `false` if the document does not exist.
    pub async fn push(
        &self,
        id: &DocumentId,
        field: &str,
        value: impl Into<Bson>,
    ) -> DocumentStoreResult<bool> {
        self.store.push_to_field(&self.name, id, field, value).await
    }

    /// Removes the document with the given id; `false` if it did not exist.
    pub async fn delete(&self, id: &DocumentId) -> DocumentStoreResult<bool> {
        self.store.delete_document(&self.name, id).await
    }

    /// Drops the whole collection.
    pub async fn drop_collection(self) -> DocumentStoreResult<()> {
        self.store.drop_collection(&self.name).await
    }
}

/// A view of a collection whose documents deserialize into `D`.
///
/// Writes serialize `D` into a field map; reads decode the stored fields
/// back into `D`, failing with a serialization error if a stored document
/// does not have the expected shape.
#[derive(Debug)]
pub struct TypedCollection<'a, B: StoreBackend, D: Document> {
    name: String,
    store: &'a DocumentStore<B>,
    _marker: PhantomData<D>,
}

impl<'a, B: StoreBackend, D: Document> TypedCollection<'a, B, D> {
    pub(crate) fn new(name: String, store: &'a DocumentStore<B>) -> Self {
        Self { name, store, _marker: PhantomData }
    }

    /// Returns the name of this collection.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Converts this typed collection to a different document type.
    ///
    /// This allows reading the same collection through another shape, e.g. a
    /// projection with fewer fields.
    pub fn with_type<T: Document>(&self) -> TypedCollection<'a, B, T> {
        TypedCollection::new(self.name.clone(), self.store)
    }

    /// Returns the untyped view of the same collection.
    pub fn untyped(&self) -> Collection<'a, B> {
        Collection::new(self.name.clone(), self.store)
    }

    /// Serializes and inserts `document`, returning its generated identifier.
    ///
    /// # Errors
    ///
    /// Returns a [`DocumentStoreError`](crate::error::DocumentStoreError) if serialization or insertion fails.
    pub async fn create(&self, document: &D) -> DocumentStoreResult<DocumentId> {
        self.store
            .create_document(&self.name, document.to_fields()?)
            .await
    }

    /// Returns all documents matching `filter`, decoded into `D`.
    ///
    /// # Errors
    ///
    /// Returns a [`DocumentStoreError`](crate::error::DocumentStoreError) if retrieval or deserialization fails.
    pub async fn get(&self, filter: impl Into<Filter>) -> DocumentStoreResult<Vec<StoredDocument<D>>> {
        self.store
            .get_documents(&self.name, filter)
            .await?
            .into_iter()
            .map(RawDocument::decode::<D>)
            .collect()
    }

    /// Returns the first document matching `filter`, decoded into `D`.
    pub async fn find_one(&self, filter: impl Into<Filter>) -> DocumentStoreResult<Option<StoredDocument<D>>> {
        self.store
            .find_document(&self.name, filter)
            .await?
            .map(RawDocument::decode::<D>)
            .transpose()
    }

    /// Returns the document with the given identifier, decoded into `D`.
    pub async fn get_by_id(&self, id: &DocumentId) -> DocumentStoreResult<Option<StoredDocument<D>>> {
        self.find_one(Filter::by_id(id)).await
    }

    /// Counts the documents matching `filter`.
    pub async fn count(&self, filter: impl Into<Filter>) -> DocumentStoreResult<u64> {
        self.store.count_documents(&self.name, filter).await
    }

    /// Merges `patch` into the document with the given id; `false` if it does not exist.
    pub async fn update(&self, id: &DocumentId, patch: bson::Document) -> DocumentStoreResult<bool> {
        self.store.update_document(&self.name, id, patch).await
    }

    /// Appends `value` to the array in `field`; `false` if the document does not exist.
    pub async fn push(
        &self,
        id: &DocumentId,
        field: &str,
        value: impl Into<Bson>,
    ) -> DocumentStoreResult<bool> {
        self.store.push_to_field(&self.name, id, field, value).await
    }

    /// Removes the document with the given id; `false` if it did not exist.
    pub async fn delete(&self, id: &DocumentId) -> DocumentStoreResult<bool> {
        self.store.delete_document(&self.name, id).await
    }
}
