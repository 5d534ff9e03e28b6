//! Connection configuration for selecting a backend at runtime.
//!
//! The scheme of [`StoreConfig::url`] picks the backend:
//!
//! - `memory://` - a fresh [`InMemoryStore`]
//! - `mongodb://` or `mongodb+srv://` - a MongoDB deployment (requires the `mongodb` feature)
//!
//! With the `config` feature enabled the struct derives [`clap::Args`], so it can
//! be flattened into a command line parser and read from the environment:
//!
//! ```ignore
//! #[derive(clap::Parser)]
//! struct Cli {
//!     #[command(flatten)]
//!     store: docstore::config::StoreConfig,
//! }
//! ```

#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};

use docstore_core::{
    backend::StoreBackendBuilder,
    error::{DocumentStoreError, DocumentStoreResult},
    store::{DocumentStore, DynDocumentStore},
};
use docstore_memory::InMemoryStore;

/// Tracing target for configuration and connection setup.
pub const TRACING_TARGET_CONFIG: &str = "docstore::config";

const MEMORY_SCHEME: &str = "memory";
const MONGODB_SCHEMES: [&str; 2] = ["mongodb", "mongodb+srv"];

/// Where documents are stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct StoreConfig {
    /// Connection URL; its scheme selects the backend.
    #[cfg_attr(
        feature = "config",
        arg(long = "store-url", env = "DOCSTORE_URL", default_value = "memory://")
    )]
    #[serde(default = "default_url")]
    pub url: String,

    /// Database name, used by backends that host several databases.
    #[cfg_attr(
        feature = "config",
        arg(long = "store-database", env = "DOCSTORE_DATABASE", default_value = "docstore")
    )]
    #[serde(default = "default_database")]
    pub database: String,
}

fn default_url() -> String {
    "memory://".to_string()
}

fn default_database() -> String {
    "docstore".to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            database: default_database(),
        }
    }
}

impl StoreConfig {
    /// Creates a configuration for the given connection URL and database.
    pub fn new(url: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            database: database.into(),
        }
    }

    /// Returns the scheme part of the URL.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::Configuration`] if the URL has no `scheme://` prefix.
    pub fn scheme(&self) -> DocumentStoreResult<&str> {
        self.url
            .split_once("://")
            .map(|(scheme, _)| scheme)
            .filter(|scheme| !scheme.is_empty())
            .ok_or_else(|| DocumentStoreError::Configuration(
                "store url must start with a scheme such as memory://".to_string()
            ))
    }

    /// Builds the backend the URL names and wraps it in a dynamically dispatched store.
    ///
    /// # Errors
    ///
    /// - [`DocumentStoreError::Configuration`] for an unknown scheme, or a MongoDB URL
    ///   when the `mongodb` feature is disabled
    /// - [`DocumentStoreError::Storage`] if the backend cannot be reached
    #[tracing::instrument(skip_all, fields(database = %self.database))]
    pub async fn connect(&self) -> DocumentStoreResult<DynDocumentStore> {
        let scheme = self.scheme()?;

        let store = if scheme == MEMORY_SCHEME {
            DocumentStore::new(InMemoryStore::builder().build().await?).into_dyn()
        } else if MONGODB_SCHEMES.contains(&scheme) {
            self.connect_mongodb().await?
        } else {
            tracing::warn!(target: TRACING_TARGET_CONFIG, scheme, "Unsupported store scheme");
            return Err(DocumentStoreError::Configuration(format!(
                "unsupported store scheme {scheme:?}"
            )));
        };

        tracing::info!(target: TRACING_TARGET_CONFIG, scheme, "Document store ready");

        Ok(store)
    }

    #[cfg(feature = "mongodb")]
    async fn connect_mongodb(&self) -> DocumentStoreResult<DynDocumentStore> {
        let backend = docstore_mongodb::MongoDbStore::builder(&self.url, &self.database)
            .build()
            .await
            .inspect_err(|err| {
                tracing::error!(target: TRACING_TARGET_CONFIG, %err, "Failed to connect to MongoDB");
            })?;

        Ok(DocumentStore::new(backend).into_dyn())
    }

    #[cfg(not(feature = "mongodb"))]
    async fn connect_mongodb(&self) -> DocumentStoreResult<DynDocumentStore> {
        Err(DocumentStoreError::Configuration(
            "MongoDB urls require the `mongodb` feature".to_string()
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_memory() {
        let config = StoreConfig::default();

        assert_eq!(config.scheme().unwrap(), "memory");
        assert_eq!(config.database, "docstore");
    }

    #[test]
    fn deserializes_with_defaults() {
        let config: StoreConfig = serde_json::from_str(r#"{ "database": "app" }"#).unwrap();

        assert_eq!(config, StoreConfig::new("memory://", "app"));
    }

    #[test]
    fn rejects_urls_without_scheme() {
        let err = StoreConfig::new("localhost:27017", "app").scheme().unwrap_err();

        assert!(matches!(err, DocumentStoreError::Configuration(_)));
    }

    #[tokio::test]
    async fn connects_to_memory() {
        let store = StoreConfig::default().connect().await.unwrap();

        assert!(store.downcast_backend::<InMemoryStore>().is_some());
        store.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn rejects_unknown_schemes() {
        let err = StoreConfig::new("redis://localhost", "app")
            .connect()
            .await
            .unwrap_err();

        assert!(matches!(err, DocumentStoreError::Configuration(_)));
    }

    #[cfg(not(feature = "mongodb"))]
    #[tokio::test]
    async fn mongodb_requires_feature() {
        let err = StoreConfig::new("mongodb://localhost:27017", "app")
            .connect()
            .await
            .unwrap_err();

        assert!(matches!(err, DocumentStoreError::Configuration(_)));
    }
}
