//! Opaque document identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// System-assigned identifier of a stored document.
///
/// Identifiers are generated once, when a document is created, and are never
/// reused. The textual form is a hyphenated UUID v4, which is safe to embed in
/// URLs and log lines. Callers should treat the value as opaque.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    /// Generates a fresh, globally unique identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().hyphenated().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for DocumentId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<String> for DocumentId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for DocumentId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<&DocumentId> for DocumentId {
    fn from(value: &DocumentId) -> Self {
        value.clone()
    }
}

impl From<DocumentId> for bson::Bson {
    fn from(value: DocumentId) -> Self {
        bson::Bson::String(value.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn generated_ids_are_unique() {
        let ids: HashSet<_> = (0..1000).map(|_| DocumentId::generate()).collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn generated_ids_are_url_safe() {
        let id = DocumentId::generate();
        assert_eq!(id.as_str().len(), 36);
        assert!(
            id.as_str()
                .chars()
                .all(|c| c.is_ascii_hexdigit() || c == '-')
        );
    }

    #[test]
    fn converts_to_bson_string() {
        let id = DocumentId::from("u1");
        assert_eq!(bson::Bson::from(&id), bson::Bson::String("u1".into()));
        assert_eq!(bson::Bson::from(id.clone()), bson::Bson::String("u1".into()));
        assert_eq!(id.to_string(), "u1");
    }
}
