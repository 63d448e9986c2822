//! Composable record predicates
//!
//! A `Query` is evaluated against the JSON fields of a stored record. It has
//! no knowledge of the backend, so the same predicate works over any store
//! that can hand back records as JSON objects.
//!
//! ```text
//! let q = Query::contains("source", "Fisch").or(Query::contains("target", "fish"));
//! let hits = store.search("words", &q)?;
//! ```

use serde_json::{Map, Value};

/// A predicate over a record's fields
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    /// Field equals the value exactly
    Eq(String, Value),
    /// String field contains the needle (case-sensitive)
    Contains(String, String),
    /// List field holds at least one of the values
    AnyOf(String, Vec<Value>),
    /// All sub-queries match
    And(Vec<Query>),
    /// At least one sub-query matches
    Or(Vec<Query>),
}

impl Query {
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Query::Eq(field.into(), value.into())
    }

    pub fn contains(field: impl Into<String>, needle: impl Into<String>) -> Self {
        Query::Contains(field.into(), needle.into())
    }

    pub fn any_of<V: Into<Value>>(
        field: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        Query::AnyOf(field.into(), values.into_iter().map(Into::into).collect())
    }

    /// Combine with another query; nested `And`s are flattened
    pub fn and(self, other: Query) -> Self {
        match self {
            Query::And(mut parts) => {
                parts.push(other);
                Query::And(parts)
            }
            first => Query::And(vec![first, other]),
        }
    }

    /// Combine with another query; nested `Or`s are flattened
    pub fn or(self, other: Query) -> Self {
        match self {
            Query::Or(mut parts) => {
                parts.push(other);
                Query::Or(parts)
            }
            first => Query::Or(vec![first, other]),
        }
    }

    /// Evaluate the predicate against a record's fields
    ///
    /// A missing field never matches.
    pub fn matches(&self, fields: &Map<String, Value>) -> bool {
        match self {
            Query::Eq(field, expected) => fields.get(field) == Some(expected),
            Query::Contains(field, needle) => fields
                .get(field)
                .and_then(Value::as_str)
                .is_some_and(|s| s.contains(needle.as_str())),
            Query::AnyOf(field, wanted) => fields
                .get(field)
                .and_then(Value::as_array)
                .is_some_and(|items| items.iter().any(|item| wanted.contains(item))),
            Query::And(parts) => parts.iter().all(|q| q.matches(fields)),
            Query::Or(parts) => parts.iter().any(|q| q.matches(fields)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn test_eq() {
        let r = record(json!({"source": "Hund", "target": "dog"}));
        assert!(Query::eq("source", "Hund").matches(&r));
        assert!(!Query::eq("source", "hund").matches(&r));
        assert!(!Query::eq("gender", "neuter").matches(&r));
    }

    #[test]
    fn test_contains_is_case_sensitive() {
        let r = record(json!({"source": "Tintenfisch"}));
        assert!(Query::contains("source", "fisch").matches(&r));
        assert!(!Query::contains("source", "Fisch").matches(&r));
    }

    #[test]
    fn test_contains_ignores_non_strings() {
        let r = record(json!({"count": 12}));
        assert!(!Query::contains("count", "1").matches(&r));
    }

    #[test]
    fn test_any_of() {
        let r = record(json!({"categories": ["animals", "pets"]}));
        assert!(Query::any_of("categories", ["pets"]).matches(&r));
        assert!(Query::any_of("categories", ["food", "animals"]).matches(&r));
        assert!(!Query::any_of("categories", ["food"]).matches(&r));
        assert!(!Query::any_of("tags", ["pets"]).matches(&r));
    }

    #[test]
    fn test_and_or_composition() {
        let r = record(json!({"word_id": 1, "related_word_id": 2, "relation_type": "synonym"}));

        let exact = Query::eq("word_id", 1)
            .and(Query::eq("related_word_id", 2))
            .and(Query::eq("relation_type", "synonym"));
        assert_eq!(
            exact,
            Query::And(vec![
                Query::eq("word_id", 1),
                Query::eq("related_word_id", 2),
                Query::eq("relation_type", "synonym"),
            ])
        );
        assert!(exact.matches(&r));

        let either = Query::eq("word_id", 9).or(Query::eq("related_word_id", 2));
        assert!(either.matches(&r));
        assert!(!Query::eq("word_id", 9).or(Query::eq("word_id", 8)).matches(&r));
    }
}
