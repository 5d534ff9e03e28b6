//! Field name sanitization for MongoDB compatibility.
//!
//! MongoDB restricts field names (keys) from containing certain characters like
//! dots and dollar signs, which are part of its query syntax. Stored documents are
//! schema-less, so any key a caller writes is escaped on the way in and restored
//! on the way out. Values are stored untouched.

use bson::{Bson, Document};

/// Sanitizes and restores document keys to handle MongoDB field name restrictions.
///
/// MongoDB does not allow field names (document keys) to contain:
/// - Dots (`.`) - used for nested field access in queries
/// - Dollar signs (`$`) - used for operators in queries
/// - Null bytes (`\0`) - field name terminators
///
/// Each of these is written as `%` followed by two hex digits, and `%` itself is
/// escaped the same way, so every key maps to exactly one stored key. A user key
/// named `_id` is escaped as well, since `_id` holds the document identifier.
pub(crate) struct KeySanitizer;

impl KeySanitizer {
    const ESCAPE: char = '%';
    const RESERVED: [char; 4] = ['%', '.', '$', '\0'];

    const PRIMARY_KEY: &'static str = "_id";
    const ESCAPED_PRIMARY_KEY: &'static str = "%5Fid";

    /// Recursively sanitizes the keys of every embedded document in `value`.
    pub(crate) fn sanitize_value(value: &Bson) -> Bson {
        match value {
            Bson::Array(arr) => Bson::Array(
                arr
                    .iter()
                    .map(Self::sanitize_value)
                    .collect(),
            ),
            Bson::Document(doc) => Bson::Document(Self::sanitize_document(doc)),
            _ => value.clone(),
        }
    }

    pub(crate) fn sanitize_document(doc: &Document) -> Document {
        doc.iter()
            .map(|(k, v)| (Self::sanitize_key(k), Self::sanitize_value(v)))
            .collect()
    }

    /// Sanitizes a single key by escaping reserved characters.
    pub(crate) fn sanitize_key(input: &str) -> String {
        if input == Self::PRIMARY_KEY {
            return Self::ESCAPED_PRIMARY_KEY.to_string();
        }

        let mut sanitized = String::with_capacity(input.len());
        for c in input.chars() {
            if Self::RESERVED.contains(&c) {
                sanitized.push_str(&format!("{}{:02X}", Self::ESCAPE, c as u32));
            } else {
                sanitized.push(c);
            }
        }
        sanitized
    }

    /// Sanitizes each segment of a dotted field path, keeping the dots as separators.
    pub(crate) fn sanitize_path(path: &str) -> String {
        path.split('.')
            .map(Self::sanitize_key)
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Recursively restores the keys of every embedded document in `value`.
    ///
    /// This is the inverse of `sanitize_value`.
    pub(crate) fn restore_value(value: &Bson) -> Bson {
        match value {
            Bson::Array(arr) => Bson::Array(
                arr
                    .iter()
                    .map(Self::restore_value)
                    .collect(),
            ),
            Bson::Document(doc) => Bson::Document(Self::restore_document(doc)),
            _ => value.clone(),
        }
    }

    pub(crate) fn restore_document(doc: &Document) -> Document {
        doc.iter()
            .map(|(k, v)| (Self::restore_key(k), Self::restore_value(v)))
            .collect()
    }

    /// Restores a key by decoding its escapes.
    ///
    /// A `%` that does not start a known escape is kept as-is, so keys written
    /// by other clients come back unchanged.
    pub(crate) fn restore_key(input: &str) -> String {
        if input == Self::ESCAPED_PRIMARY_KEY {
            return Self::PRIMARY_KEY.to_string();
        }

        let mut restored = String::with_capacity(input.len());
        let mut rest = input;

        while let Some(pos) = rest.find(Self::ESCAPE) {
            restored.push_str(&rest[..pos]);
            let escaped = &rest[pos + Self::ESCAPE.len_utf8()..];

            match escaped
                .get(..2)
                .and_then(|hex| u8::from_str_radix(hex, 16).ok())
                .map(char::from)
                .filter(|c| Self::RESERVED.contains(c))
            {
                Some(c) => {
                    restored.push(c);
                    rest = &escaped[2..];
                }
                None => {
                    restored.push(Self::ESCAPE);
                    rest = escaped;
                }
            }
        }

        restored.push_str(rest);
        restored
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    #[test]
    fn escapes_reserved_characters_in_keys() {
        assert_eq!(KeySanitizer::sanitize_key("a.b"), "a%2Eb");
        assert_eq!(KeySanitizer::sanitize_key("$set"), "%24set");
        assert_eq!(KeySanitizer::sanitize_key("100%"), "100%25");
        assert_eq!(KeySanitizer::sanitize_key("_id"), "%5Fid");
        assert_eq!(KeySanitizer::sanitize_key("name"), "name");
    }

    #[test]
    fn leaves_values_alone() {
        let original = doc! {
            "price.usd": "$4.20",
            "nested": { "$weird": ["a.b", { "x.y": 1 }] },
        };

        let sanitized = KeySanitizer::sanitize_document(&original);

        assert_eq!(sanitized.get_str("price%2Eusd").unwrap(), "$4.20");
        assert_eq!(
            sanitized.get_document("nested").unwrap(),
            &doc! { "%24weird": ["a.b", { "x%2Ey": 1 }] }
        );
        assert_eq!(KeySanitizer::restore_document(&sanitized), original);
    }

    #[test]
    fn keys_resembling_escapes_round_trip() {
        let original = doc! {
            "x__dot__y": 1,
            "__id__": 2,
            "%5Fid": 3,
            "_id": 4,
            "a%2Eb": 5,
            "a.b": 6,
            "%": 7,
            "%zz": 8,
            "50%.off": 9,
        };

        let sanitized = KeySanitizer::sanitize_document(&original);

        assert_eq!(sanitized.len(), original.len());
        assert_eq!(KeySanitizer::restore_document(&sanitized), original);
    }

    #[test]
    fn foreign_percent_keys_are_kept() {
        assert_eq!(KeySanitizer::restore_key("50%"), "50%");
        assert_eq!(KeySanitizer::restore_key("%zz"), "%zz");
        assert_eq!(KeySanitizer::restore_key("%41"), "%41");
    }

    #[test]
    fn paths_keep_separators() {
        assert_eq!(KeySanitizer::sanitize_path("settings.dark_mode"), "settings.dark_mode");
        assert_eq!(KeySanitizer::sanitize_path("a$b.c"), "a%24b.c");
    }
}
