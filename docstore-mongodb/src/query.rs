//! Filter translation from docstore filters to MongoDB query syntax.

use bson::{Bson, Document, doc};

use docstore_core::{
    document::ID_FIELD,
    error::DocumentStoreError,
    filter::{Condition, FilterVisitor},
};

use crate::sanitizer::KeySanitizer;

/// Name of the MongoDB field that stores the document identifier.
pub(crate) const PRIMARY_KEY: &str = "_id";

/// Translates docstore filters into MongoDB query documents.
///
/// An empty filter becomes `{}` and several conditions an `$and`. Each condition
/// compares the whole field value: a scalar or mapping never matches an array
/// element, and an array only matches an identical array.
pub(crate) struct MongoFilterTranslator;

impl MongoFilterTranslator {
    fn field_path(field: &str) -> String {
        match field {
            ID_FIELD => PRIMARY_KEY.to_string(),
            _ => KeySanitizer::sanitize_path(field),
        }
    }
}

impl FilterVisitor for MongoFilterTranslator {
    type Output = Document;
    type Error = DocumentStoreError;

    fn visit_all(&mut self, conditions: &[Condition]) -> Result<Self::Output, Self::Error> {
        match conditions {
            [] => Ok(doc! {}),
            [single] => self.visit_eq(&single.field, &single.value),
            _ => Ok(doc! {
                "$and": conditions
                    .iter()
                    .map(|condition| self.visit_eq(&condition.field, &condition.value))
                    .collect::<Result<Vec<_>, _>>()?,
            }),
        }
    }

    fn visit_eq(&mut self, field: &str, value: &Bson) -> Result<Self::Output, Self::Error> {
        let path = Self::field_path(field);
        let value = KeySanitizer::sanitize_value(value);

        // `$eq` on an array field also matches its elements or nested arrays
        if matches!(value, Bson::Array(_)) {
            return Ok(doc! {
                "$expr": { "$eq": [format!("${path}"), { "$literal": value }] },
            });
        }

        Ok(doc! {
            path: { "$eq": value, "$not": { "$type": "array" } },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docstore_core::filter::Filter;

    #[test]
    fn empty_filter_matches_all() {
        assert_eq!(MongoFilterTranslator.visit_filter(&Filter::new()).unwrap(), doc! {});
    }

    #[test]
    fn single_condition_is_unwrapped() {
        let query = MongoFilterTranslator
            .visit_filter(&Filter::eq("status", "active"))
            .unwrap();

        assert_eq!(query, doc! { "status": { "$eq": "active", "$not": { "$type": "array" } } });
    }

    #[test]
    fn conditions_are_conjoined() {
        let query = MongoFilterTranslator
            .visit_filter(&Filter::eq("status", "active").and_eq("profile.location", "London"))
            .unwrap();

        assert_eq!(query, doc! {
            "$and": [
                { "status": { "$eq": "active", "$not": { "$type": "array" } } },
                { "profile.location": { "$eq": "London", "$not": { "$type": "array" } } },
            ]
        });
    }

    #[test]
    fn identifier_maps_to_primary_key() {
        let query = MongoFilterTranslator
            .visit_filter(&Filter::by_id("abc"))
            .unwrap();

        assert_eq!(query, doc! { "_id": { "$eq": "abc", "$not": { "$type": "array" } } });
    }

    #[test]
    fn paths_and_embedded_keys_are_sanitized() {
        let query = MongoFilterTranslator
            .visit_filter(&Filter::eq("a$b.c", doc! { "x.y": 1 }))
            .unwrap();

        assert_eq!(query, doc! {
            "a%24b.c": { "$eq": { "x%2Ey": 1 }, "$not": { "$type": "array" } }
        });
    }

    #[test]
    fn scalars_and_null_exclude_array_fields() {
        let query = MongoFilterTranslator
            .visit_filter(&Filter::eq("deleted_at", Bson::Null))
            .unwrap();

        assert_eq!(query, doc! { "deleted_at": { "$eq": null, "$not": { "$type": "array" } } });
    }

    #[test]
    fn arrays_compare_as_literals() {
        let query = MongoFilterTranslator
            .visit_filter(&Filter::eq("tags", vec!["math", "engines"]).and_eq("tags.x", Bson::Array(vec![])))
            .unwrap();

        assert_eq!(query, doc! {
            "$and": [
                { "$expr": { "$eq": ["$tags", { "$literal": ["math", "engines"] }] } },
                { "$expr": { "$eq": ["$tags.x", { "$literal": [] }] } },
            ]
        });
    }
}
