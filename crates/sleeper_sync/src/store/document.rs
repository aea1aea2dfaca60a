//! Documents, natural keys, and the field-merge rule.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use super::errors::{Result, StoreError};

/// A stored record: string field names mapped to JSON values.
pub type Document = Map<String, Value>;

/// The exact-match filter that identifies one document within a collection.
///
/// Field order is irrelevant; [`canonical`](Self::canonical) sorts by field
/// name, so `{a, b}` and `{b, a}` address the same document.
#[derive(Debug, Clone, PartialEq)]
pub struct NaturalKey {
    fields: Document,
}

impl NaturalKey {
    /// Build a key from explicit field values.
    pub fn new(fields: Document) -> Self {
        Self { fields }
    }

    /// Build a single-field key.
    pub fn single(field: &str, value: impl Into<Value>) -> Self {
        let mut fields = Document::new();
        fields.insert(field.to_string(), value.into());
        Self { fields }
    }

    /// Project `fields` out of `record`.
    ///
    /// Every listed field must be present. `null` is a legal key value.
    pub fn from_fields(collection: &str, record: &Document, fields: &[&str]) -> Result<Self> {
        let mut key = Document::new();
        for field in fields {
            let value = record
                .get(*field)
                .ok_or_else(|| StoreError::MissingKeyField {
                    collection: collection.to_string(),
                    field: (*field).to_string(),
                })?;
            key.insert((*field).to_string(), value.clone());
        }
        Ok(Self { fields: key })
    }

    pub fn fields(&self) -> &Document {
        &self.fields
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Canonical string form, stable regardless of field insertion order.
    pub fn canonical(&self) -> String {
        let sorted: BTreeMap<&String, &Value> = self.fields.iter().collect();
        // Serializing a map of strings to JSON values cannot fail.
        serde_json::to_string(&sorted).unwrap_or_default()
    }
}

impl std::fmt::Display for NaturalKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.canonical())
    }
}

/// Body for a document that does not exist yet: the key fields plus every
/// payload field. Key values win over payload values of the same name.
pub fn initial_body(key: &NaturalKey, set: &Document) -> Document {
    let mut body = key.fields().clone();
    merge_fields(&mut body, key, set);
    body
}

/// Overwrite `body` with the fields of `set`, leaving key fields untouched.
/// Fields absent from `set` are kept as they are.
pub fn merge_fields(body: &mut Document, key: &NaturalKey, set: &Document) {
    for (field, value) in set {
        if key.contains(field) {
            continue;
        }
        body.insert(field.clone(), value.clone());
    }
}

/// Restrict `document` to the listed fields.
pub fn project(document: Document, fields: &[&str]) -> Document {
    document
        .into_iter()
        .filter(|(name, _)| fields.contains(&name.as_str()))
        .collect()
}

/// Whether every field of `filter` is present in `document` with an equal value.
pub fn matches(document: &Document, filter: &Document) -> bool {
    filter
        .iter()
        .all(|(field, expected)| document.get(field) == Some(expected))
}

/// Interpret a JSON value as a document.
pub fn into_document(collection: &str, value: Value) -> Result<Document> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::invalid_document(
            collection,
            format!("expected a JSON object, found {}", kind(&other)),
        )),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        into_document("test", value).expect("object")
    }

    #[test]
    fn from_fields_projects_listed_fields() {
        let record = doc(json!({"league_id": "784", "owner_id": "12", "wins": 3}));
        let key = NaturalKey::from_fields("rosters", &record, &["league_id", "owner_id"])
            .expect("key should build");

        assert_eq!(key.fields().len(), 2);
        assert_eq!(key.canonical(), r#"{"league_id":"784","owner_id":"12"}"#);
    }

    #[test]
    fn from_fields_reports_missing_field() {
        let record = doc(json!({"league_id": "784"}));
        let err = NaturalKey::from_fields("rosters", &record, &["league_id", "owner_id"])
            .expect_err("owner_id is missing");

        match err {
            StoreError::MissingKeyField { collection, field } => {
                assert_eq!(collection, "rosters");
                assert_eq!(field, "owner_id");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn from_fields_accepts_null_values() {
        let record = doc(json!({"league_id": "784", "owner_id": null}));
        let key = NaturalKey::from_fields("rosters", &record, &["league_id", "owner_id"])
            .expect("null is a key value");
        assert_eq!(key.canonical(), r#"{"league_id":"784","owner_id":null}"#);
    }

    #[test]
    fn canonical_is_independent_of_field_order() {
        let a = NaturalKey::new(doc(json!({"season": "2024", "week": 5})));
        let mut reversed = Document::new();
        reversed.insert("week".to_string(), json!(5));
        reversed.insert("season".to_string(), json!("2024"));
        let b = NaturalKey::new(reversed);

        assert_eq!(a.canonical(), b.canonical());
        assert_eq!(a.to_string(), a.canonical());
    }

    #[test]
    fn merge_fields_overwrites_payload_but_not_key() {
        let key = NaturalKey::single("player_id", "4046");
        let mut body = doc(json!({"player_id": "4046", "team": "KC", "age": 28}));
        let set = doc(json!({"player_id": "9999", "team": "BUF"}));

        merge_fields(&mut body, &key, &set);

        assert_eq!(body["player_id"], "4046");
        assert_eq!(body["team"], "BUF");
        assert_eq!(body["age"], 28);
    }

    #[test]
    fn initial_body_prefers_key_values() {
        let key = NaturalKey::single("user_id", "12");
        let body = initial_body(&key, &doc(json!({"user_id": "13", "display_name": "x"})));
        assert_eq!(body, doc(json!({"user_id": "12", "display_name": "x"})));
    }

    #[test]
    fn project_keeps_only_requested_fields() {
        let projected = project(doc(json!({"a": 1, "b": 2, "c": 3})), &["a", "c", "z"]);
        assert_eq!(projected, doc(json!({"a": 1, "c": 3})));
    }

    #[test]
    fn matches_requires_equal_values_for_every_filter_field() {
        let document = doc(json!({"league_id": "1", "owner_id": "7"}));
        assert!(matches(&document, &doc(json!({"league_id": "1"}))));
        assert!(matches(&document, &Document::new()));
        assert!(!matches(&document, &doc(json!({"league_id": "2"}))));
        assert!(!matches(&document, &doc(json!({"missing": null}))));
    }

    #[test]
    fn into_document_rejects_non_objects() {
        let err = into_document("players", json!([1, 2])).expect_err("array");
        assert!(err.to_string().contains("an array"));
    }
}
