//! Filter evaluation for in-memory document matching.
//!
//! This module evaluates equality filters against stored documents, normalizing
//! values so that equality behaves the same way a document database would.

use bson::{Bson, datetime::DateTime};
use std::convert::Infallible;

use docstore_core::{
    document::{RawDocument, is_reserved_field, lookup_path},
    filter::{Condition, Filter, FilterVisitor},
};

use crate::TRACING_TARGET_MEMORY;

/// Bounds of the doubles that convert to `i64` without saturating.
const I64_LOWER: f64 = -9_223_372_036_854_775_808.0;
const I64_UPPER: f64 = 9_223_372_036_854_775_808.0;

/// Type-erased, comparable representation of BSON values.
///
/// `Int32` and `Int64` compare exactly as `i64`. An integer equals a `Double`
/// only when the double holds exactly that integer. Mappings compare field by
/// field in key order, like BSON documents do.
#[derive(Debug)]
pub(crate) enum Comparable<'a> {
    Null,
    Bool(bool),
    Int(i64),
    Double(f64),
    DateTime(DateTime),
    String(&'a str),
    Array(Vec<Comparable<'a>>),
    Map(Vec<(&'a str, Comparable<'a>)>),
    /// Anything else (binary, object ids, ...) compares structurally
    Other(&'a Bson),
}

impl<'a> From<&'a Bson> for Comparable<'a> {
    fn from(bson: &'a Bson) -> Self {
        match bson {
            Bson::Null => Comparable::Null,
            Bson::Boolean(value) => Comparable::Bool(*value),
            Bson::Int32(value) => Comparable::Int(i64::from(*value)),
            Bson::Int64(value) => Comparable::Int(*value),
            Bson::Double(value) => Comparable::Double(*value),
            Bson::DateTime(value) => Comparable::DateTime(*value),
            Bson::String(value) => Comparable::String(value),
            Bson::Array(arr) => Comparable::Array(
                arr
                    .iter()
                    .map(Comparable::from)
                    .collect::<Vec<_>>()
            ),
            Bson::Document(doc) => Comparable::Map(
                doc
                    .iter()
                    .map(|(k, v)| (k.as_str(), Comparable::from(v)))
                    .collect::<Vec<_>>()
            ),
            other => Comparable::Other(other),
        }
    }
}

fn int_equals_double(int: i64, double: f64) -> bool {
    double.fract() == 0.0
        && (I64_LOWER..I64_UPPER).contains(&double)
        && double as i64 == int
}

impl<'a> PartialEq for Comparable<'a> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Comparable::Null, Comparable::Null) => true,
            (Comparable::Bool(a), Comparable::Bool(b)) => a == b,
            (Comparable::Int(a), Comparable::Int(b)) => a == b,
            (Comparable::Double(a), Comparable::Double(b)) => a == b,
            (Comparable::Int(i), Comparable::Double(d))
            | (Comparable::Double(d), Comparable::Int(i)) => int_equals_double(*i, *d),
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a == b,
            (Comparable::String(a), Comparable::String(b)) => a == b,
            (Comparable::Array(a), Comparable::Array(b)) => a == b,
            (Comparable::Map(a), Comparable::Map(b)) => a == b,
            (Comparable::Other(a), Comparable::Other(b)) => a == b,
            _ => false,
        }
    }
}

/// Evaluates a [`Filter`] against a single stored document.
pub(crate) struct DocumentEvaluator<'a> {
    document: &'a RawDocument,
}

impl<'a> DocumentEvaluator<'a> {
    pub fn new(document: &'a RawDocument) -> Self {
        Self { document }
    }

    pub fn matches(document: &'a RawDocument, filter: &Filter) -> bool {
        match DocumentEvaluator::new(document).visit_filter(filter) {
            Ok(matched) => matched,
            Err(never) => match never {},
        }
    }

    pub fn filter_documents(
        documents: impl IntoIterator<Item = &'a RawDocument>,
        filter: &Filter,
    ) -> Vec<RawDocument> {
        let matched = documents
            .into_iter()
            .filter(|doc| DocumentEvaluator::matches(doc, filter))
            .cloned()
            .collect::<Vec<_>>();

        tracing::trace!(
            target: TRACING_TARGET_MEMORY,
            conditions = filter.len(),
            matched = matched.len(),
            "Evaluated filter"
        );

        matched
    }
}

impl<'a> FilterVisitor for DocumentEvaluator<'a> {
    type Output = bool;
    type Error = Infallible;

    fn visit_all(&mut self, conditions: &[Condition]) -> Result<Self::Output, Self::Error> {
        for condition in conditions {
            if !self.visit_eq(&condition.field, &condition.value)? {
                return Ok(false);
            }
        }

        Ok(true)
    }

    fn visit_eq(&mut self, field: &str, value: &Bson) -> Result<Self::Output, Self::Error> {
        if is_reserved_field(field) {
            return Ok(
                self.document
                    .resolve(field)
                    .is_some_and(|actual| Comparable::from(&actual) == Comparable::from(value))
            );
        }

        Ok(match lookup_path(&self.document.data, field) {
            Some(actual) => Comparable::from(actual) == Comparable::from(value),
            // A missing field only equals null
            None => matches!(value, Bson::Null),
        })
    }
}
