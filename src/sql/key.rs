//! Key codec: a key as named values <-> a key as a positional WHERE fragment.
//!
//! Single-column and composite keys take the same path; placeholder numbering always follows
//! `EntityConfig::key_columns`, never the iteration order of the input map.

use crate::config::{quoted, EntityConfig};
use crate::error::AppError;
use crate::sql::typecheck::check_value;
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Key values in `key_columns` order. Only produced by extraction, so it always holds exactly
/// the declared key columns.
#[derive(Clone, Debug, PartialEq)]
pub struct KeyValues {
    entries: Vec<(String, Value)>,
}

impl KeyValues {
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.entries.iter().find(|(c, _)| c == column).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(c, v)| (c.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `code=A1` / `customer=C1, site=S1`, for messages and logs.
    pub fn describe(&self) -> String {
        self.entries
            .iter()
            .map(|(c, v)| match v {
                Value::String(s) => format!("{}={}", c, s),
                other => format!("{}={}", c, other),
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.entries.into_iter().collect()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct WhereClause {
    pub clause: String,
    pub params: Vec<Value>,
}

/// `$n`, or `$n::type` when the column declares a cast.
pub(crate) fn placeholder(n: usize, cast: Option<&str>) -> String {
    match cast {
        Some(t) => format!("${}::{}", n, t),
        None => format!("${}", n),
    }
}

fn present(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        _ => true,
    }
}

/// Pick exactly the key columns out of `raw`; extra entries are dropped.
/// Absent, null or empty values are `MissingKey`; objects and arrays are not keys. A value
/// that does not fit the column's declared type is a validation error.
pub fn extract_key_values(config: &EntityConfig, raw: &Map<String, Value>) -> Result<KeyValues, AppError> {
    let mut entries = Vec::with_capacity(config.key_columns.len());
    let mut missing = Vec::new();
    for column in &config.key_columns {
        match raw.get(column) {
            Some(Value::Array(_)) | Some(Value::Object(_)) => {
                return Err(AppError::MissingKey(format!("{} must be a scalar value", column)));
            }
            Some(v) if present(v) => {
                check_value(config, column, v).map_err(AppError::Validation)?;
                entries.push((column.clone(), v.clone()));
            }
            _ => missing.push(column.as_str()),
        }
    }
    if !missing.is_empty() {
        return Err(AppError::MissingKey(format!(
            "{} requires {}",
            config.resource,
            missing.join(", ")
        )));
    }
    Ok(KeyValues { entries })
}

/// Route-parameter flavor of [`extract_key_values`]; values stay strings and are cast by the
/// column's declared type in SQL.
pub fn extract_path_key(config: &EntityConfig, params: &HashMap<String, String>) -> Result<KeyValues, AppError> {
    let raw: Map<String, Value> = params
        .iter()
        .map(|(k, v)| (k.clone(), Value::String(v.clone())))
        .collect();
    extract_key_values(config, &raw)
}

pub fn build_where_clause(config: &EntityConfig, key: &KeyValues) -> WhereClause {
    build_where_clause_from(config, key, 1)
}

/// Same as [`build_where_clause`] with placeholders numbered from `first`, for statements that
/// bind other parameters before the key.
pub fn build_where_clause_from(config: &EntityConfig, key: &KeyValues, first: usize) -> WhereClause {
    let mut parts = Vec::with_capacity(config.key_columns.len());
    let mut params = Vec::with_capacity(config.key_columns.len());
    for (i, column) in config.key_columns.iter().enumerate() {
        // A key extracted for another entity binds NULL and matches nothing.
        params.push(key.get(column).cloned().unwrap_or(Value::Null));
        parts.push(format!(
            "{} = {}",
            quoted(column),
            placeholder(first + i, config.cast_for(column))
        ));
    }
    WhereClause {
        clause: parts.join(" AND "),
        params,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn single() -> EntityConfig {
        EntityConfig::new("customer-sites", "customer_sites", ["code"])
    }

    fn composite() -> EntityConfig {
        EntityConfig::new("lines", "production_lines", ["site", "line_no", "shift"])
            .typed_column("line_no", "integer")
    }

    fn map(v: Value) -> Map<String, Value> {
        v.as_object().unwrap().clone()
    }

    #[test]
    fn single_key_round_trips() {
        let key = extract_key_values(&single(), &map(json!({"code": "A1"}))).unwrap();
        assert_eq!(key.len(), 1);
        assert_eq!(key.clone().into_map(), map(json!({"code": "A1"})));
        let w = build_where_clause(&single(), &key);
        assert_eq!(w.clause, "\"code\" = $1");
        assert_eq!(w.params, vec![json!("A1")]);
    }

    #[test]
    fn extras_are_dropped() {
        let key = extract_key_values(&single(), &map(json!({"code": "A1", "site": "S1", "page": 2}))).unwrap();
        assert_eq!(key.iter().map(|(c, _)| c).collect::<Vec<_>>(), vec!["code"]);
    }

    #[test]
    fn composite_order_follows_config_not_input() {
        // serde_json::Map is sorted by key, so the input order here is line_no, shift, site.
        let raw = map(json!({"shift": "B", "line_no": 7, "site": "S1"}));
        let key = extract_key_values(&composite(), &raw).unwrap();
        let w = build_where_clause(&composite(), &key);
        assert_eq!(w.clause, "\"site\" = $1 AND \"line_no\" = $2::integer AND \"shift\" = $3");
        assert_eq!(w.params, vec![json!("S1"), json!(7), json!("B")]);
    }

    #[test]
    fn placeholder_count_matches_key_arity() {
        let key = extract_key_values(&composite(), &map(json!({"site": "S", "line_no": 1, "shift": "A"}))).unwrap();
        let w = build_where_clause(&composite(), &key);
        assert_eq!(w.clause.matches('$').count(), 3);
        assert_eq!(w.params.len(), 3);
    }

    #[test]
    fn offset_numbering_for_update() {
        let key = extract_key_values(&composite(), &map(json!({"site": "S", "line_no": 1, "shift": "A"}))).unwrap();
        let w = build_where_clause_from(&composite(), &key, 4);
        assert_eq!(w.clause, "\"site\" = $4 AND \"line_no\" = $5::integer AND \"shift\" = $6");
    }

    #[test]
    fn missing_or_empty_is_missing_key() {
        for raw in [json!({}), json!({"code": ""}), json!({"code": "   "}), json!({"code": null})] {
            let err = extract_key_values(&single(), &map(raw)).unwrap_err();
            assert!(matches!(err, AppError::MissingKey(_)));
        }
    }

    #[test]
    fn missing_key_names_every_absent_column() {
        let err = extract_key_values(&composite(), &map(json!({"line_no": 3}))).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("site"));
        assert!(msg.contains("shift"));
        assert!(!msg.contains("line_no"));
    }

    #[test]
    fn non_scalar_key_is_rejected() {
        let err = extract_key_values(&single(), &map(json!({"code": ["A1"]}))).unwrap_err();
        assert!(matches!(err, AppError::MissingKey(_)));
    }

    #[test]
    fn zero_and_false_are_valid_keys() {
        let ints = EntityConfig::new("counters", "counters", ["id"]).typed_column("id", "integer");
        assert!(extract_key_values(&ints, &map(json!({"id": 0}))).is_ok());
        let flags = EntityConfig::new("flags", "flags", ["id"]).typed_column("id", "boolean");
        assert!(extract_key_values(&flags, &map(json!({"id": false}))).is_ok());
    }

    #[test]
    fn mistyped_key_is_a_validation_error() {
        let err = extract_key_values(&single(), &map(json!({"code": 5}))).unwrap_err();
        assert!(matches!(err, AppError::Validation(ref m) if m == "code must be a string"));
        let params: HashMap<String, String> = [
            ("site".to_string(), "S1".to_string()),
            ("line_no".to_string(), "abc".to_string()),
            ("shift".to_string(), "A".to_string()),
        ]
        .into();
        let err = extract_path_key(&composite(), &params).unwrap_err();
        assert!(matches!(err, AppError::Validation(ref m) if m.starts_with("line_no")));
    }

    #[test]
    fn path_params_become_string_values() {
        let params: HashMap<String, String> = [("code".to_string(), "A1".to_string())].into();
        let key = extract_path_key(&single(), &params).unwrap();
        assert_eq!(key.get("code"), Some(&json!("A1")));
        assert_eq!(key.describe(), "code=A1");
    }

    #[test]
    fn foreign_key_values_bind_null() {
        let other = extract_key_values(&single(), &map(json!({"code": "A1"}))).unwrap();
        let w = build_where_clause(&composite(), &other);
        assert_eq!(w.params, vec![Value::Null, Value::Null, Value::Null]);
    }
}
