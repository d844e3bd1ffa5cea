//! Input values checked against a column's declared type before they are bound.
//!
//! Untyped columns are text and take JSON strings only. Typed columns accept the JSON shape
//! that casts losslessly (`3` or `"3"` for `integer`, never `3.6`).

use crate::config::EntityConfig;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use serde_json::{Map, Value};

/// What a declared `pg_type` accepts from JSON input.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ValueClass {
    Text,
    Integer { min: i64, max: i64 },
    Numeric,
    Boolean,
    Uuid,
    Date,
    Timestamp,
    Time,
    Json,
    /// Enums, arrays and anything else: left to the database.
    Other,
}

impl ValueClass {
    pub fn of(pg_type: Option<&str>) -> Self {
        let Some(t) = pg_type else {
            return ValueClass::Text;
        };
        match t.trim().to_ascii_lowercase().as_str() {
            "text" | "varchar" | "character varying" | "char" | "character" | "bpchar" | "citext" | "name" => {
                ValueClass::Text
            }
            "smallint" | "int2" => ValueClass::Integer {
                min: i16::MIN as i64,
                max: i16::MAX as i64,
            },
            "integer" | "int" | "int4" => ValueClass::Integer {
                min: i32::MIN as i64,
                max: i32::MAX as i64,
            },
            "bigint" | "int8" => ValueClass::Integer {
                min: i64::MIN,
                max: i64::MAX,
            },
            "numeric" | "decimal" | "real" | "float4" | "double precision" | "float8" => ValueClass::Numeric,
            "boolean" | "bool" => ValueClass::Boolean,
            "uuid" => ValueClass::Uuid,
            "date" => ValueClass::Date,
            "timestamp" | "timestamptz" | "timestamp with time zone" | "timestamp without time zone" => {
                ValueClass::Timestamp
            }
            "time" | "time without time zone" => ValueClass::Time,
            "json" | "jsonb" => ValueClass::Json,
            _ => ValueClass::Other,
        }
    }

    fn accepts(self, v: &Value) -> bool {
        match (self, v) {
            (_, Value::Null) | (ValueClass::Json, _) | (ValueClass::Other, _) => true,
            (ValueClass::Text, v) => v.is_string(),
            (ValueClass::Integer { min, max }, Value::Number(n)) => {
                n.as_i64().is_some_and(|i| (min..=max).contains(&i))
            }
            (ValueClass::Integer { min, max }, Value::String(s)) => {
                s.trim().parse::<i64>().is_ok_and(|i| (min..=max).contains(&i))
            }
            (ValueClass::Numeric, Value::Number(_)) => true,
            (ValueClass::Numeric, Value::String(s)) => s.trim().parse::<f64>().is_ok(),
            (ValueClass::Boolean, Value::Bool(_)) => true,
            (ValueClass::Boolean, Value::String(s)) => {
                matches!(s.trim().to_ascii_lowercase().as_str(), "true" | "false")
            }
            (ValueClass::Uuid, Value::String(s)) => uuid::Uuid::parse_str(s.trim()).is_ok(),
            (ValueClass::Date, Value::String(s)) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").is_ok(),
            (ValueClass::Timestamp, Value::String(s)) => parses_timestamp(s.trim()),
            (ValueClass::Time, Value::String(s)) => {
                let s = s.trim();
                NaiveTime::parse_from_str(s, "%H:%M:%S%.f").is_ok() || NaiveTime::parse_from_str(s, "%H:%M").is_ok()
            }
            _ => false,
        }
    }

    fn expected(self) -> &'static str {
        match self {
            ValueClass::Text => "a string",
            ValueClass::Integer { .. } => "an integer in range",
            ValueClass::Numeric => "a number",
            ValueClass::Boolean => "a boolean",
            ValueClass::Uuid => "a UUID",
            ValueClass::Date => "a date (YYYY-MM-DD)",
            ValueClass::Timestamp => "an RFC 3339 timestamp",
            ValueClass::Time => "a time (HH:MM[:SS])",
            ValueClass::Json | ValueClass::Other => "a valid value",
        }
    }
}

fn parses_timestamp(s: &str) -> bool {
    DateTime::parse_from_rfc3339(s).is_ok()
        || NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f").is_ok()
        || NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f").is_ok()
}

/// Check one value bound to `column`. The error is a client-facing message.
pub fn check_value(config: &EntityConfig, column: &str, value: &Value) -> Result<(), String> {
    let class = ValueClass::of(config.cast_for(column));
    if class.accepts(value) {
        Ok(())
    } else {
        Err(format!("{} must be {}", column, class.expected()))
    }
}

/// Check every declared column present in a request body. Undeclared fields are not bound and
/// are skipped.
pub fn check_body(config: &EntityConfig, body: &Map<String, Value>) -> Result<(), String> {
    for c in &config.columns {
        if let Some(v) = body.get(&c.name) {
            check_value(config, &c.name, v)?;
        }
    }
    Ok(())
}
