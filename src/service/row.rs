//! Row mappers: the strategy each entity plugs into its `GenericModel`.

use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;
use serde_json::Value;
use sqlx::postgres::PgRow;
use sqlx::{Column, FromRow, Row};

/// Maps one returned row to the entity type.
pub type RowMapper<E> = fn(&PgRow) -> Result<E, sqlx::Error>;

/// Anything a generic model can hand back to a controller.
pub trait Entity: Serialize + Send + Sync + Unpin + 'static {}

impl<T> Entity for T where T: Serialize + Send + Sync + Unpin + 'static {}

/// Mapper for typed entities deriving `sqlx::FromRow`.
pub fn from_row<E>(row: &PgRow) -> Result<E, sqlx::Error>
where
    E: for<'r> FromRow<'r, PgRow>,
{
    E::from_row(row)
}

/// Mapper for entities declared only in configuration: every column becomes a JSON field.
pub fn json_row_mapper(row: &PgRow) -> Result<Value, sqlx::Error> {
    let mut map = serde_json::Map::new();
    for col in row.columns() {
        let name = col.name();
        map.insert(name.to_string(), cell_to_value(row, name));
    }
    Ok(Value::Object(map))
}

fn cell_to_value(row: &PgRow, name: &str) -> Value {
    if let Ok(Some(n)) = row.try_get::<Option<i16>, _>(name) {
        return Value::from(n);
    }
    if let Ok(Some(n)) = row.try_get::<Option<i32>, _>(name) {
        return Value::from(n);
    }
    if let Ok(Some(n)) = row.try_get::<Option<i64>, _>(name) {
        return Value::from(n);
    }
    if let Ok(Some(n)) = row.try_get::<Option<f32>, _>(name) {
        return serde_json::Number::from_f64(n as f64).map(Value::Number).unwrap_or(Value::Null);
    }
    if let Ok(Some(n)) = row.try_get::<Option<f64>, _>(name) {
        return serde_json::Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null);
    }
    if let Ok(Some(b)) = row.try_get::<Option<bool>, _>(name) {
        return Value::Bool(b);
    }
    if let Ok(Some(u)) = row.try_get::<Option<uuid::Uuid>, _>(name) {
        return Value::String(u.to_string());
    }
    if let Ok(Some(d)) = row.try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(name) {
        return Value::String(d.to_rfc3339());
    }
    if let Ok(Some(d)) = row.try_get::<Option<chrono::NaiveDateTime>, _>(name) {
        return Value::String(d.format("%Y-%m-%dT%H:%M:%S%.f").to_string());
    }
    if let Ok(Some(d)) = row.try_get::<Option<chrono::NaiveDate>, _>(name) {
        return Value::String(d.format("%Y-%m-%d").to_string());
    }
    if let Ok(Some(t)) = row.try_get::<Option<chrono::NaiveTime>, _>(name) {
        return Value::String(t.format("%H:%M:%S%.f").to_string());
    }
    if let Ok(Some(d)) = row.try_get::<Option<rust_decimal::Decimal>, _>(name) {
        return d
            .to_f64()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(d.to_string()));
    }
    if let Ok(Some(s)) = row.try_get::<Option<String>, _>(name) {
        return Value::String(s);
    }
    if let Ok(Some(j)) = row.try_get::<Option<Value>, _>(name) {
        return j;
    }
    if let Some(v) = array_to_value(row, name) {
        return v;
    }
    // Enum labels and other types whose wire form is UTF-8 text.
    match row.try_get_unchecked::<Option<String>, _>(name) {
        Ok(Some(s)) => Value::String(s),
        _ => Value::Null,
    }
}

fn array_to_value(row: &PgRow, name: &str) -> Option<Value> {
    if let Ok(Some(v)) = row.try_get::<Option<Vec<String>>, _>(name) {
        return Some(Value::from(v));
    }
    if let Ok(Some(v)) = row.try_get::<Option<Vec<i64>>, _>(name) {
        return Some(Value::from(v));
    }
    if let Ok(Some(v)) = row.try_get::<Option<Vec<i32>>, _>(name) {
        return Some(Value::from(v));
    }
    if let Ok(Some(v)) = row.try_get::<Option<Vec<bool>>, _>(name) {
        return Some(Value::from(v));
    }
    if let Ok(Some(v)) = row.try_get::<Option<Vec<f64>>, _>(name) {
        return Some(Value::from(v));
    }
    None
}
