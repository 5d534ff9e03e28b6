//! MongoDB storage implementation for document stores.

use async_trait::async_trait;
use bson::{Bson, DateTime as BsonDateTime, Document, doc};
use futures::TryStreamExt;
use mongodb::{
    Client, Collection as MongoCollection, Database,
    options::{ClientOptions, FindOptions},
};

use docstore_core::{
    backend::{StoreBackend, StoreBackendBuilder},
    document::{CREATED_AT_FIELD, ID_FIELD, RawDocument},
    error::{DocumentStoreError, DocumentStoreResult},
    filter::{Filter, FilterVisitor},
    id::DocumentId,
};

use crate::{
    TRACING_TARGET_MONGODB,
    query::{MongoFilterTranslator, PRIMARY_KEY},
    sanitizer::KeySanitizer,
};

/// Document storage backed by a MongoDB database.
///
/// Each document is stored with its identifier in `_id`, its insertion time
/// in `created_at` and its fields alongside, with keys escaped by the
/// sanitizer so that dotted or `$`-prefixed keys round-trip.
#[derive(Debug)]
pub struct MongoDbStore {
    client: Client,
    database: String,
}

impl MongoDbStore {
    pub fn new(client: Client, database: String) -> Self {
        Self { client, database }
    }

    pub fn builder(dsn: &str, database: &str) -> MongoDbStoreBuilder {
        MongoDbStoreBuilder::new(dsn, database)
    }

    fn database(&self) -> Database {
        self.client.database(&self.database)
    }

    fn get_collection(&self, collection_name: &str) -> MongoCollection<Document> {
        self.database()
            .collection(&KeySanitizer::sanitize_key(collection_name))
    }

    fn prepare_document(document: &RawDocument) -> Document {
        let mut prepared = doc! {
            PRIMARY_KEY: document.id.as_str(),
            CREATED_AT_FIELD: BsonDateTime::from_chrono(document.created_at),
        };

        for (key, value) in KeySanitizer::sanitize_document(&document.data) {
            prepared.insert(key, value);
        }

        prepared
    }

    fn restore_document(document: Document) -> DocumentStoreResult<RawDocument> {
        let mut flattened = Document::new();

        for (key, value) in document {
            match key.as_str() {
                PRIMARY_KEY => {
                    flattened.insert(ID_FIELD, value);
                }
                CREATED_AT_FIELD => {
                    flattened.insert(CREATED_AT_FIELD, value);
                }
                _ => {
                    flattened.insert(KeySanitizer::restore_key(&key), KeySanitizer::restore_value(&value));
                }
            }
        }

        RawDocument::from_flattened(flattened)
    }

    fn id_filter(id: &DocumentId) -> Document {
        doc! { PRIMARY_KEY: id.as_str() }
    }
}

#[async_trait]
impl StoreBackend for MongoDbStore {
    async fn insert_document(&self, collection: &str, document: RawDocument) -> DocumentStoreResult<()> {
        self.get_collection(collection)
            .insert_one(Self::prepare_document(&document))
            .await
            .map_err(|e| DocumentStoreError::Storage(e.to_string()))?;

        tracing::trace!(target: TRACING_TARGET_MONGODB, collection, id = %document.id, "Inserted document");

        Ok(())
    }

    async fn find_documents(&self, collection: &str, filter: &Filter) -> DocumentStoreResult<Vec<RawDocument>> {
        let query = MongoFilterTranslator.visit_filter(filter)?;
        tracing::trace!(target: TRACING_TARGET_MONGODB, collection, ?query, "Finding documents");

        let mut options = FindOptions::default();
        options.sort = Some(doc! { CREATED_AT_FIELD: 1, PRIMARY_KEY: 1 });

        self.get_collection(collection)
            .find(query)
            .with_options(options)
            .await
            .map_err(|e| DocumentStoreError::Storage(e.to_string()))?
            .try_collect::<Vec<Document>>()
            .await
            .map_err(|e| DocumentStoreError::Storage(e.to_string()))?
            .into_iter()
            .map(Self::restore_document)
            .collect()
    }

    async fn count_documents(&self, collection: &str, filter: &Filter) -> DocumentStoreResult<u64> {
        self.get_collection(collection)
            .count_documents(MongoFilterTranslator.visit_filter(filter)?)
            .await
            .map_err(|e| DocumentStoreError::Storage(e.to_string()))
    }

    async fn update_document(
        &self,
        collection: &str,
        id: &DocumentId,
        patch: bson::Document,
    ) -> DocumentStoreResult<bool> {
        let result = self.get_collection(collection)
            .update_one(
                Self::id_filter(id),
                doc! { "$set": KeySanitizer::sanitize_document(&patch) },
            )
            .await
            .map_err(|e| DocumentStoreError::Storage(e.to_string()))?;

        Ok(result.matched_count > 0)
    }

    async fn push_to_field(
        &self,
        collection: &str,
        id: &DocumentId,
        field: &str,
        value: Bson,
    ) -> DocumentStoreResult<bool> {
        let key = KeySanitizer::sanitize_key(field);

        let result = self.get_collection(collection)
            .update_one(
                Self::id_filter(id),
                doc! { "$push": { key: KeySanitizer::sanitize_value(&value) } },
            )
            .await
            .map_err(|e| DocumentStoreError::Storage(e.to_string()))?;

        Ok(result.matched_count > 0)
    }

    async fn delete_document(&self, collection: &str, id: &DocumentId) -> DocumentStoreResult<bool> {
        let result = self.get_collection(collection)
            .delete_one(Self::id_filter(id))
            .await
            .map_err(|e| DocumentStoreError::Storage(e.to_string()))?;

        Ok(result.deleted_count > 0)
    }

    async fn list_collections(&self) -> DocumentStoreResult<Vec<String>> {
        let mut names = self.database()
            .list_collection_names()
            .await
            .map_err(|e| DocumentStoreError::Storage(e.to_string()))?
            .into_iter()
            .map(|name| KeySanitizer::restore_key(&name))
            .collect::<Vec<_>>();
        names.sort();

        Ok(names)
    }

    async fn drop_collection(&self, name: &str) -> DocumentStoreResult<()> {
        if !self.list_collections().await?.iter().any(|existing| existing == name) {
            return Err(DocumentStoreError::CollectionNotFound(name.to_string()));
        }

        self.get_collection(name)
            .drop()
            .await
            .map_err(|e| DocumentStoreError::Storage(e.to_string()))?;

        Ok(())
    }

    async fn shutdown(self) -> DocumentStoreResult<()> {
        self.client.shutdown().await;
        tracing::debug!(target: TRACING_TARGET_MONGODB, database = %self.database, "MongoDB client shut down");

        Ok(())
    }
}

/// Builder that connects to a deployment and verifies it answers a ping.
#[derive(Debug)]
pub struct MongoDbStoreBuilder {
    dsn: String,
    database: String,
}

impl MongoDbStoreBuilder {
    pub fn new(dsn: &str, database: &str) -> Self {
        Self {
            dsn: dsn.to_string(),
            database: database.to_string(),
        }
    }
}

#[async_trait]
impl StoreBackendBuilder for MongoDbStoreBuilder {
    type Backend = MongoDbStore;

    async fn build(self) -> DocumentStoreResult<Self::Backend> {
        if self.database.is_empty() {
            return Err(DocumentStoreError::Configuration("database name must not be empty".to_string()));
        }

        let options = ClientOptions::parse(&self.dsn)
            .await
            .map_err(|e| DocumentStoreError::Configuration(e.to_string()))?;
        let client = Client::with_options(options)
            .map_err(|e| DocumentStoreError::Configuration(e.to_string()))?;

        client
            .database(&self.database)
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| DocumentStoreError::Storage(e.to_string()))?;

        tracing::debug!(target: TRACING_TARGET_MONGODB, database = %self.database, "Connected to MongoDB");

        Ok(MongoDbStore::new(client, self.database))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn stored_shape_round_trips() {
        let document = RawDocument {
            id: DocumentId::generate(),
            created_at: Utc.timestamp_millis_opt(1_700_000_000_123).unwrap(),
            data: doc! { "name": "A", "a.b": { "$c": 1 }, "_id": "mine" },
        };

        let prepared = MongoDbStore::prepare_document(&document);

        assert_eq!(prepared.get_str("_id").unwrap(), document.id.as_str());
        assert!(prepared.get_datetime("created_at").is_ok());
        assert_eq!(prepared.get_str("%5Fid").unwrap(), "mine");
        assert!(prepared.contains_key("a%2Eb"));

        assert_eq!(MongoDbStore::restore_document(prepared).unwrap(), document);
    }

    #[test]
    fn restore_requires_identifier() {
        let err = MongoDbStore::restore_document(doc! { "name": "A" }).unwrap_err();

        assert!(matches!(err, DocumentStoreError::InvalidDocument(_)));
    }

    #[tokio::test]
    async fn empty_database_is_rejected() {
        let err = MongoDbStore::builder("mongodb://localhost:27017", "")
            .build()
            .await
            .unwrap_err();

        assert!(matches!(err, DocumentStoreError::Configuration(_)));
    }

    #[tokio::test]
    async fn malformed_dsn_is_rejected() {
        let err = MongoDbStore::builder("not-a-url", "app")
            .build()
            .await
            .unwrap_err();

        assert!(matches!(err, DocumentStoreError::Configuration(_)));
    }
}
