//! In-memory storage implementation for document stores.
//!
//! Documents live in per-collection insertion-ordered maps behind an
//! async-aware read-write lock.

use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use async_trait::async_trait;
use bson::Bson;
use indexmap::IndexMap;
use mea::rwlock::RwLock;

use docstore_core::{
    backend::{StoreBackend, StoreBackendBuilder},
    document::RawDocument,
    error::{DocumentStoreError, DocumentStoreResult},
    filter::Filter,
    id::DocumentId,
};

use crate::{TRACING_TARGET_MEMORY, evaluator::DocumentEvaluator};

type CollectionMap = IndexMap<DocumentId, RawDocument>;
type StoreMap = HashMap<String, CollectionMap>;

/// Thread-safe in-memory document storage backend.
///
/// # Thread Safety
///
/// `InMemoryStore` is cloneable and uses an `Arc`-wrapped internal state, allowing
/// it to be safely shared across async tasks. Multiple clones of the same instance
/// share the same underlying data, and shutting one down closes all of them.
///
/// # Performance
///
/// Filters scan every document in a collection (no indexing). Deletes shift the
/// remaining entries to keep insertion order.
///
/// # Example
///
/// ```ignore
/// use docstore_memory::InMemoryStore;
/// use docstore_core::{backend::StoreBackend, document::RawDocument, filter::Filter};
/// use bson::doc;
///
/// let store = InMemoryStore::new();
/// store.insert_document("users", RawDocument::create(doc! { "name": "Alice" })).await?;
///
/// let docs = store.find_documents("users", &Filter::eq("name", "Alice")).await?;
/// assert_eq!(docs.len(), 1);
/// ```
#[derive(Default, Clone, Debug)]
pub struct InMemoryStore {
    /// collection_name -> (document_id -> document)
    store: Arc<RwLock<StoreMap>>,
    closed: Arc<AtomicBool>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory document store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder for constructing an `InMemoryStore`.
    pub fn builder() -> InMemoryStoreBuilder {
        InMemoryStoreBuilder::default()
    }

    fn ensure_open(&self) -> DocumentStoreResult<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(DocumentStoreError::Storage("in-memory store has been shut down".to_string()));
        }

        Ok(())
    }
}

#[async_trait]
impl StoreBackend for InMemoryStore {
    async fn insert_document(&self, collection: &str, document: RawDocument) -> DocumentStoreResult<()> {
        self.ensure_open()?;

        let mut store = self.store.write().await;
        let collection_map = store
            .entry(collection.to_string())
            .or_default();

        if collection_map.contains_key(&document.id) {
            return Err(DocumentStoreError::Storage(format!(
                "duplicate identifier {} in collection {collection:?}",
                document.id
            )));
        }

        tracing::trace!(target: TRACING_TARGET_MEMORY, collection, id = %document.id, "Inserting document");
        collection_map.insert(document.id.clone(), document);

        Ok(())
    }

    async fn find_documents(&self, collection: &str, filter: &Filter) -> DocumentStoreResult<Vec<RawDocument>> {
        self.ensure_open()?;

        let store = self.store.read().await;
        let collection_map = match store.get(collection) {
            Some(col) => col,
            None => return Ok(vec![]),
        };

        Ok(DocumentEvaluator::filter_documents(collection_map.values(), filter))
    }

    async fn count_documents(&self, collection: &str, filter: &Filter) -> DocumentStoreResult<u64> {
        self.ensure_open()?;

        let store = self.store.read().await;
        let collection_map = match store.get(collection) {
            Some(col) => col,
            None => return Ok(0),
        };

        let count = collection_map
            .values()
            .filter(|doc| DocumentEvaluator::matches(doc, filter))
            .count();

        Ok(count as u64)
    }

    async fn update_document(
        &self,
        collection: &str,
        id: &DocumentId,
        patch: bson::Document,
    ) -> DocumentStoreResult<bool> {
        self.ensure_open()?;

        let mut store = self.store.write().await;
        let Some(document) = store
            .get_mut(collection)
            .and_then(|col| col.get_mut(id))
        else {
            return Ok(false);
        };

        document.apply_patch(patch);

        Ok(true)
    }

    async fn push_to_field(
        &self,
        collection: &str,
        id: &DocumentId,
        field: &str,
        value: Bson,
    ) -> DocumentStoreResult<bool> {
        self.ensure_open()?;

        let mut store = self.store.write().await;
        let Some(document) = store
            .get_mut(collection)
            .and_then(|col| col.get_mut(id))
        else {
            return Ok(false);
        };

        document.push(field, value)?;

        Ok(true)
    }

    async fn delete_document(&self, collection: &str, id: &DocumentId) -> DocumentStoreResult<bool> {
        self.ensure_open()?;

        let mut store = self.store.write().await;
        let removed = store
            .get_mut(collection)
            .and_then(|col| col.shift_remove(id))
            .is_some();

        Ok(removed)
    }

    async fn list_collections(&self) -> DocumentStoreResult<Vec<String>> {
        self.ensure_open()?;

        let mut names = self.store
            .read()
            .await
            .keys()
            .cloned()
            .collect::<Vec<_>>();
        names.sort();

        Ok(names)
    }

    async fn drop_collection(&self, name: &str) -> DocumentStoreResult<()> {
        self.ensure_open()?;

        let mut store = self.store.write().await;

        if store.remove(name).is_none() {
            return Err(DocumentStoreError::CollectionNotFound(name.to_string()));
        }

        Ok(())
    }

    async fn shutdown(self) -> DocumentStoreResult<()> {
        if !self.closed.swap(true, Ordering::AcqRel) {
            tracing::debug!(target: TRACING_TARGET_MEMORY, "In-memory store shut down");
        }

        Ok(())
    }
}

/// Builder for constructing [`InMemoryStore`] instances.
///
/// ```ignore
/// use docstore_memory::InMemoryStore;
/// use docstore_core::backend::StoreBackendBuilder;
///
/// let store = InMemoryStore::builder().build().await?;
/// ```
#[derive(Debug, Default)]
pub struct InMemoryStoreBuilder;

#[async_trait]
impl StoreBackendBuilder for InMemoryStoreBuilder {
    type Backend = InMemoryStore;

    async fn build(self) -> DocumentStoreResult<Self::Backend> {
        Ok(InMemoryStore::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    async fn seeded(store: &InMemoryStore, names: &[&str]) -> Vec<DocumentId> {
        let mut ids = Vec::new();

        for name in names {
            let document = RawDocument::create(doc! { "name": *name });
            ids.push(document.id.clone());
            store.insert_document("users", document).await.unwrap();
        }

        ids
    }

    #[tokio::test]
    async fn missing_collection_reads_as_empty() {
        let store = InMemoryStore::new();

        assert!(store.find_documents("nothing", &Filter::new()).await.unwrap().is_empty());
        assert_eq!(store.count_documents("nothing", &Filter::new()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn results_keep_insertion_order_after_delete() {
        let store = InMemoryStore::new();
        let ids = seeded(&store, &["a", "b", "c", "d"]).await;

        assert!(store.delete_document("users", &ids[1]).await.unwrap());

        let names = store
            .find_documents("users", &Filter::new())
            .await
            .unwrap()
            .into_iter()
            .map(|doc| doc.get("name").cloned().unwrap())
            .collect::<Vec<_>>();

        assert_eq!(names, vec![Bson::from("a"), Bson::from("c"), Bson::from("d")]);
    }

    #[tokio::test]
    async fn update_merges_fields() {
        let store = InMemoryStore::new();
        let ids = seeded(&store, &["a"]).await;

        assert!(store.update_document("users", &ids[0], doc! { "age": 3 }).await.unwrap());

        let found = store.find_documents("users", &Filter::by_id(&ids[0])).await.unwrap();
        assert_eq!(found[0].data, doc! { "name": "a", "age": 3 });
    }

    #[tokio::test]
    async fn unknown_ids_report_false() {
        let store = InMemoryStore::new();
        seeded(&store, &["a"]).await;
        let unknown = DocumentId::generate();

        assert!(!store.update_document("users", &unknown, doc! { "x": 1 }).await.unwrap());
        assert!(!store.push_to_field("users", &unknown, "tags", Bson::from("x")).await.unwrap());
        assert!(!store.delete_document("users", &unknown).await.unwrap());
        assert!(!store.delete_document("elsewhere", &unknown).await.unwrap());
    }

    #[tokio::test]
    async fn push_creates_and_extends_arrays() {
        let store = InMemoryStore::new();
        let ids = seeded(&store, &["a"]).await;

        assert!(store.push_to_field("users", &ids[0], "tags", Bson::from("x")).await.unwrap());
        assert!(store.push_to_field("users", &ids[0], "tags", Bson::from("y")).await.unwrap());

        let found = store.find_documents("users", &Filter::new()).await.unwrap();
        assert_eq!(found[0].get("tags"), Some(&Bson::from(vec!["x", "y"])));

        let err = store
            .push_to_field("users", &ids[0], "name", Bson::from("z"))
            .await
            .unwrap_err();
        assert!(matches!(err, DocumentStoreError::InvalidDocument(_)));
    }

    #[tokio::test]
    async fn collections_are_listed_and_dropped() {
        let store = InMemoryStore::new();
        seeded(&store, &["a"]).await;
        store
            .insert_document("accounts", RawDocument::create(doc! {}))
            .await
            .unwrap();

        assert_eq!(store.list_collections().await.unwrap(), vec!["accounts", "users"]);

        store.drop_collection("users").await.unwrap();
        assert_eq!(store.list_collections().await.unwrap(), vec!["accounts"]);

        let err = store.drop_collection("users").await.unwrap_err();
        assert!(matches!(err, DocumentStoreError::CollectionNotFound(_)));
    }

    #[tokio::test]
    async fn clones_share_state_and_shutdown() {
        let store = InMemoryStore::builder().build().await.unwrap();
        let clone = store.clone();
        seeded(&store, &["a"]).await;

        assert_eq!(clone.count_documents("users", &Filter::new()).await.unwrap(), 1);

        store.shutdown().await.unwrap();

        let err = clone.find_documents("users", &Filter::new()).await.unwrap_err();
        assert!(matches!(err, DocumentStoreError::Storage(_)));
    }
}
