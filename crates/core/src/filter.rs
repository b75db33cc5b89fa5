//! Exact-match query filters.
//!
//! A [`Filter`] is a set of `field == value` constraints that must all hold
//! for a document to match. [`FilterBuilder`] turns raw query-string pairs
//! into a filter, parsing the identifier field into a [`DocumentId`] along
//! the way.

use serde_json::Value;

use crate::store::Document;
use crate::types::id::{DocumentId, ID_FIELD, IdError};

/// Alias accepted for the identifier field in query strings.
const ID_ALIAS: &str = "id";

/// Conjunction of exact-match constraints.
///
/// An empty filter matches every document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter(Document);

impl Filter {
    /// A filter that matches everything.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// A filter matching the single document with this identifier.
    #[must_use]
    pub fn by_id(id: DocumentId) -> Self {
        Self::all().eq(ID_FIELD, id.to_string())
    }

    /// Add (or replace) an equality constraint.
    #[must_use]
    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(field.into(), value.into());
        self
    }

    /// Number of constraints.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the filter has no constraints.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The constraint on `field`, if any.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// The constraints as a JSON object, e.g. for JSONB containment queries.
    #[must_use]
    pub const fn as_document(&self) -> &Document {
        &self.0
    }

    /// Returns `true` if every constraint equals the document's field.
    ///
    /// Comparison is strict JSON equality: the string `"250"` does not match
    /// the number `250`.
    #[must_use]
    pub fn matches(&self, document: &Document) -> bool {
        self.0
            .iter()
            .all(|(field, expected)| document.get(field) == Some(expected))
    }
}

/// Builds [`Filter`]s from query-string constraints.
#[derive(Debug, Clone, Copy, Default)]
pub struct FilterBuilder;

impl FilterBuilder {
    /// Build a filter from `(field, value)` pairs.
    ///
    /// - When a field repeats, the first occurrence wins.
    /// - `_id` (or its alias `id`) is parsed as a [`DocumentId`] and stored in
    ///   canonical form.
    /// - Everything else becomes a literal string equality constraint.
    ///
    /// # Errors
    ///
    /// Returns [`IdError`] if the identifier value cannot be parsed.
    ///
    /// # Example
    ///
    /// ```rust
    /// use tronics_core::FilterBuilder;
    ///
    /// let filter = FilterBuilder::from_pairs([("currency", "INR"), ("vendor", "google")]).unwrap();
    /// assert_eq!(filter.len(), 2);
    ///
    /// assert!(FilterBuilder::from_pairs([("_id", "nope")]).is_err());
    /// ```
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Filter, IdError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut filter = Document::new();

        for (key, value) in pairs {
            let key = match key.as_ref() {
                ID_ALIAS => ID_FIELD,
                other => other,
            };
            if filter.contains_key(key) {
                continue;
            }

            let value = if key == ID_FIELD {
                DocumentId::parse(value.as_ref())?.to_string()
            } else {
                value.as_ref().to_owned()
            };
            filter.insert(key.to_owned(), Value::String(value));
        }

        Ok(Filter(filter))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn test_empty_pairs_match_everything() {
        let filter = FilterBuilder::from_pairs(Vec::<(String, String)>::new()).unwrap();
        assert!(filter.is_empty());
        assert!(filter.matches(&doc(json!({"vendor": "google"}))));
    }

    #[test]
    fn test_plain_fields_are_literal_strings() {
        let filter = FilterBuilder::from_pairs([("currency", "INR"), ("price", "250")]).unwrap();
        assert_eq!(filter.get("currency"), Some(&json!("INR")));
        assert_eq!(filter.get("price"), Some(&json!("250")));

        // no coercion: a numeric price does not match the string constraint
        assert!(!filter.matches(&doc(json!({"currency": "INR", "price": 250}))));
        assert!(filter.matches(&doc(json!({"currency": "INR", "price": "250"}))));
    }

    #[test]
    fn test_first_occurrence_wins() {
        let filter = FilterBuilder::from_pairs([("vendor", "google"), ("vendor", "apple")]).unwrap();
        assert_eq!(filter.get("vendor"), Some(&json!("google")));
    }

    #[test]
    fn test_id_is_parsed_and_canonicalized() {
        let filter =
            FilterBuilder::from_pairs([("_id", "67E5504410B1426F9247BB680E5FE0C8")]).unwrap();
        assert_eq!(
            filter.get(ID_FIELD),
            Some(&json!("67e55044-10b1-426f-9247-bb680e5fe0c8"))
        );
    }

    #[test]
    fn test_id_alias() {
        let id = DocumentId::generate();
        let filter = FilterBuilder::from_pairs([("id", id.to_string())]).unwrap();
        assert_eq!(filter, Filter::by_id(id));
    }

    #[test]
    fn test_invalid_id_fails() {
        let result = FilterBuilder::from_pairs([("vendor", "google"), ("_id", "xyz")]);
        assert!(matches!(result, Err(IdError::Malformed(_))));
    }

    #[test]
    fn test_matches_requires_every_constraint() {
        let filter = Filter::all().eq("currency", "INR").eq("vendor", "google");
        assert!(filter.matches(&doc(json!({"currency": "INR", "vendor": "google", "price": 1}))));
        assert!(!filter.matches(&doc(json!({"currency": "INR", "vendor": "apple"}))));
        assert!(!filter.matches(&doc(json!({"currency": "INR"}))));
    }
}
