//! Core types and traits for document representation and serialization.
//!
//! Documents are schema-less: their fields are a [`bson::Document`], a
//! string-keyed map of the tagged value union [`Bson`]. The store wraps those
//! fields in a [`StoredDocument`] that carries the system-assigned identifier
//! and insertion timestamp.
//!
//! Domain types that want compile-time shape can implement [`Document`] and use
//! a [`TypedCollection`](crate::collection::TypedCollection); their stored form
//! is still a plain field map.

use bson::{Bson, DateTime as BsonDateTime, de::deserialize_from_document, ser::serialize_to_document};
use chrono::{DateTime, Utc};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Map, Value, from_value, to_value};

use crate::{
    error::{DocumentStoreError, DocumentStoreResult},
    id::DocumentId,
};

/// Field name under which the identifier appears in the flattened view and in filters.
pub const ID_FIELD: &str = "id";
/// Field name under which the insertion timestamp appears in the flattened view.
pub const CREATED_AT_FIELD: &str = "created_at";

const RESERVED_FIELDS: [&str; 2] = [ID_FIELD, CREATED_AT_FIELD];

/// Returns true if `field` is managed by the store and cannot be written by callers.
pub fn is_reserved_field(field: &str) -> bool {
    RESERVED_FIELDS.contains(&field)
}

/// Rejects field maps that try to write a reserved field.
pub fn ensure_unreserved(fields: &bson::Document) -> DocumentStoreResult<()> {
    match fields.keys().find(|key| is_reserved_field(key)) {
        Some(key) => Err(DocumentStoreError::InvalidDocument(format!(
            "field {key:?} is reserved"
        ))),
        None => Ok(()),
    }
}

/// Resolves a dotted path (`"profile.location"`) against a field map.
///
/// Each segment descends into a nested document. Returns `None` as soon as a
/// segment is missing or the current value is not a document.
pub fn lookup_path<'a>(fields: &'a bson::Document, path: &str) -> Option<&'a Bson> {
    let mut segments = path.split('.');
    let mut current = fields.get(segments.next()?)?;

    for segment in segments {
        current = current.as_document()?.get(segment)?;
    }

    Some(current)
}

/// A document as held by the store: identifier, insertion timestamp and fields.
///
/// `T` is the field payload. Untyped access uses [`RawDocument`]; typed
/// collections decode the payload into a [`Document`] implementor.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument<T = bson::Document> {
    pub id: DocumentId,
    pub created_at: DateTime<Utc>,
    pub data: T,
}

/// A stored document whose fields are an untyped [`bson::Document`].
pub type RawDocument = StoredDocument<bson::Document>;

impl<T> StoredDocument<T> {
    pub fn id(&self) -> &DocumentId {
        &self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn data(&self) -> &T {
        &self.data
    }

    pub fn into_data(self) -> T {
        self.data
    }
}

impl RawDocument {
    /// Wraps `data` in a new stored document with a freshly generated identifier.
    pub fn create(data: bson::Document) -> Self {
        Self {
            id: DocumentId::generate(),
            created_at: Utc::now(),
            data,
        }
    }

    /// Returns the value of a top-level field.
    pub fn get(&self, field: &str) -> Option<&Bson> {
        self.data.get(field)
    }

    /// Resolves a field path the way filters do, including the reserved fields.
    pub fn resolve(&self, path: &str) -> Option<Bson> {
        match path {
            ID_FIELD => Some(Bson::from(&self.id)),
            CREATED_AT_FIELD => Some(Bson::DateTime(BsonDateTime::from_chrono(self.created_at))),
            _ => lookup_path(&self.data, path).cloned(),
        }
    }

    /// Merges `patch` into the fields, replacing the top-level keys it names.
    pub fn apply_patch(&mut self, patch: bson::Document) {
        for (key, value) in patch {
            self.data.insert(key, value);
        }
    }

    /// Appends `value` to the array at `field`, creating the array if the field is absent.
    pub fn push(&mut self, field: &str, value: Bson) -> DocumentStoreResult<()> {
        match self.data.get_mut(field) {
            Some(Bson::Array(items)) => items.push(value),
            Some(other) => {
                return Err(DocumentStoreError::InvalidDocument(format!(
                    "field {field:?} holds {:?}, not an array",
                    other.element_type()
                )));
            }
            None => {
                self.data.insert(field, Bson::Array(vec![value]));
            }
        }

        Ok(())
    }

    /// Returns the flattened view `{"id", "created_at", ..fields}`.
    pub fn to_flattened(&self) -> bson::Document {
        let mut flattened = bson::Document::new();
        flattened.insert(ID_FIELD, Bson::from(&self.id));
        flattened.insert(
            CREATED_AT_FIELD,
            Bson::DateTime(BsonDateTime::from_chrono(self.created_at)),
        );
        for (key, value) in &self.data {
            flattened.insert(key.clone(), value.clone());
        }

        flattened
    }

    /// Rebuilds a stored document from its flattened view.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::InvalidDocument`] if the identifier or the
    /// timestamp is missing or has the wrong type.
    pub fn from_flattened(mut flattened: bson::Document) -> DocumentStoreResult<Self> {
        let id = match flattened.remove(ID_FIELD) {
            Some(Bson::String(id)) => DocumentId::from(id),
            other => {
                return Err(DocumentStoreError::InvalidDocument(format!(
                    "expected string identifier, found {other:?}"
                )));
            }
        };
        let created_at = match flattened.remove(CREATED_AT_FIELD) {
            Some(Bson::DateTime(created_at)) => created_at.to_chrono(),
            other => {
                return Err(DocumentStoreError::InvalidDocument(format!(
                    "expected creation timestamp for {id}, found {other:?}"
                )));
            }
        };

        Ok(Self { id, created_at, data: flattened })
    }

    /// Converts the flattened view to JSON, rendering the timestamp as RFC 3339.
    pub fn to_json(&self) -> DocumentStoreResult<Value> {
        let mut object = Map::new();
        object.insert(ID_FIELD.to_string(), Value::String(self.id.to_string()));
        object.insert(
            CREATED_AT_FIELD.to_string(),
            Value::String(self.created_at.to_rfc3339()),
        );

        if let Value::Object(fields) = to_value(&self.data)? {
            object.extend(fields);
        }

        Ok(Value::Object(object))
    }

    /// Decodes the fields into a typed document.
    pub fn decode<D: Document>(self) -> DocumentStoreResult<StoredDocument<D>> {
        Ok(StoredDocument {
            id: self.id,
            created_at: self.created_at,
            data: D::from_fields(self.data)?,
        })
    }
}

/// Trait for domain types that are stored as documents in a fixed collection.
///
/// The type describes only the caller-owned fields. The identifier and the
/// creation timestamp live in the surrounding [`StoredDocument`], so the type
/// must not serialize fields named `id` or `created_at`.
///
/// # Example
///
/// ```ignore
/// use docstore::document::Document;
/// use serde::{Serialize, Deserialize};
///
/// #[derive(Debug, Clone, Serialize, Deserialize)]
/// pub struct User {
///     pub name: String,
///     pub email: String,
///     pub status: String,
/// }
///
/// impl Document for User {
///     fn collection_name() -> &'static str {
///         "users"
///     }
/// }
/// ```
pub trait Document: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Returns the name of the collection this document belongs to.
    fn collection_name() -> &'static str;
}

/// Extension trait providing serialization/deserialization utilities for documents.
///
/// This trait is automatically implemented for all types that implement [`Document`].
pub trait DocumentExt: Document {
    /// Converts this document to a BSON field map for storage.
    fn to_fields(&self) -> DocumentStoreResult<bson::Document>;

    /// Creates a document from a BSON field map.
    fn from_fields(fields: bson::Document) -> DocumentStoreResult<Self>;

    /// Converts this document to a JSON value.
    fn to_json(&self) -> DocumentStoreResult<Value>;

    /// Creates a document from a JSON value.
    fn from_json(value: Value) -> DocumentStoreResult<Self>;
}

impl<D: Document> DocumentExt for D {
    fn to_fields(&self) -> DocumentStoreResult<bson::Document> {
        Ok(serialize_to_document(self)?)
    }

    fn from_fields(fields: bson::Document) -> DocumentStoreResult<Self> {
        Ok(deserialize_from_document(fields)?)
    }

    fn to_json(&self) -> DocumentStoreResult<Value> {
        Ok(to_value(self)?)
    }

    fn from_json(value: Value) -> DocumentStoreResult<Self> {
        Ok(from_value(value)?)
    }
}

/// Converts a JSON object into a BSON field map.
///
/// # Errors
///
/// Returns [`DocumentStoreError::InvalidDocument`] if `value` is not an object.
pub fn fields_from_json(value: &Value) -> DocumentStoreResult<bson::Document> {
    if !value.is_object() {
        return Err(DocumentStoreError::InvalidDocument(
            "expected a JSON object".to_string(),
        ));
    }

    Ok(serialize_to_document(value)?)
}
