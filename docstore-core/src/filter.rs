//! Equality filters for selecting documents.
//!
//! A [`Filter`] is a conjunction of exact-equality conditions. Every condition
//! names a field path and the value that field must equal; an empty filter
//! matches every document in the collection.
//!
//! ```ignore
//! use docstore::filter::Filter;
//!
//! let filter = Filter::eq("status", "active")
//!     .and_eq("profile.location", "Oslo");
//!
//! // Or straight from a BSON mapping
//! let filter = Filter::from(bson::doc! { "email": "ada@example.com" });
//! ```
//!
//! # Field paths
//!
//! - Dotted names (`"settings.dark_mode"`) descend into nested mappings.
//! - `"id"` addresses the document identifier.
//! - Numbers compare by value regardless of their stored width.
//! - Equality against `null` also matches documents where the field is missing.
//!
//! Backends evaluate or translate filters through a [`FilterVisitor`].

use bson::Bson;

use crate::{document::ID_FIELD, error::DocumentStoreError, id::DocumentId};

/// A single `field == value` condition.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    /// Field path the condition applies to.
    pub field: String,
    /// Value the field must equal.
    pub value: Bson,
}

/// A conjunction of equality conditions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<Condition>,
}

impl Filter {
    /// Creates an empty filter, which matches every document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a filter with a single equality condition.
    pub fn eq(field: impl Into<String>, value: impl Into<Bson>) -> Self {
        Self::new().and_eq(field, value)
    }

    /// Creates a filter selecting the document with the given identifier.
    pub fn by_id(id: impl Into<DocumentId>) -> Self {
        let id: DocumentId = id.into();
        Self::eq(ID_FIELD, id)
    }

    /// Adds an equality condition; all conditions must hold for a match.
    pub fn and_eq(mut self, field: impl Into<String>, value: impl Into<Bson>) -> Self {
        self.conditions.push(Condition {
            field: field.into(),
            value: value.into(),
        });
        self
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.conditions.len()
    }
}

impl From<bson::Document> for Filter {
    fn from(mapping: bson::Document) -> Self {
        mapping.into_iter().collect()
    }
}

impl FromIterator<(String, Bson)> for Filter {
    fn from_iter<I: IntoIterator<Item = (String, Bson)>>(iter: I) -> Self {
        Self {
            conditions: iter
                .into_iter()
                .map(|(field, value)| Condition { field, value })
                .collect(),
        }
    }
}

/// Visitor over a filter, implemented by backends to evaluate or translate it.
pub trait FilterVisitor {
    type Output;
    type Error: Into<DocumentStoreError>;

    /// Combines all conditions of a filter. Called with an empty slice for the
    /// match-everything filter.
    fn visit_all(&mut self, conditions: &[Condition]) -> Result<Self::Output, Self::Error>;

    /// Handles a single `field == value` condition.
    fn visit_eq(&mut self, field: &str, value: &Bson) -> Result<Self::Output, Self::Error>;

    fn visit_filter(&mut self, filter: &Filter) -> Result<Self::Output, Self::Error> {
        self.visit_all(filter.conditions())
    }
}
