//! Entity descriptors: what table backs a resource, how it is keyed, and which columns may be
//! filtered, sorted, searched and written. Declared in code or loaded from JSON.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Columns stamped by the server; never accepted from request bodies.
pub const CREATED_AT: &str = "created_at";
pub const UPDATED_AT: &str = "updated_at";
pub const CREATED_BY: &str = "created_by";
pub const UPDATED_BY: &str = "updated_by";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    /// Case-insensitive `asc` / `desc`; anything else is `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Some(SortDirection::Asc),
            "desc" => Some(SortDirection::Desc),
            _ => None,
        }
    }

    pub fn as_sql(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub column: String,
    #[serde(default)]
    pub direction: SortDirection,
}

/// A writable column. `pg_type` is appended as a cast to every placeholder bound to the column
/// (e.g. `$1::integer`); needed for any column that is not text-compatible.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "ColumnSpecRepr")]
pub struct ColumnSpec {
    pub name: String,
    pub pg_type: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ColumnSpecRepr {
    Name(String),
    Typed {
        name: String,
        #[serde(default)]
        pg_type: Option<String>,
    },
}

impl From<ColumnSpecRepr> for ColumnSpec {
    fn from(r: ColumnSpecRepr) -> Self {
        match r {
            ColumnSpecRepr::Name(name) => ColumnSpec { name, pg_type: None },
            ColumnSpecRepr::Typed { name, pg_type } => ColumnSpec { name, pg_type },
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationRule {
    #[serde(default)]
    pub required: Option<bool>,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub max_length: Option<u32>,
    #[serde(default)]
    pub min_length: Option<u32>,
    #[serde(default)]
    pub pattern: Option<String>,
    #[serde(default)]
    pub allowed: Option<Vec<serde_json::Value>>,
    #[serde(default)]
    pub minimum: Option<f64>,
    #[serde(default)]
    pub maximum: Option<f64>,
}

impl ValidationRule {
    pub fn required() -> Self {
        ValidationRule {
            required: Some(true),
            ..Default::default()
        }
    }

    pub fn max_length(mut self, n: u32) -> Self {
        self.max_length = Some(n);
        self
    }

    pub fn pattern(mut self, p: impl Into<String>) -> Self {
        self.pattern = Some(p.into());
        self
    }
}

/// Per-entity descriptor. Created once at startup and shared read-only behind an `Arc`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EntityConfig {
    /// URL path segment, e.g. `customer-sites`.
    pub resource: String,
    #[serde(default)]
    pub schema: Option<String>,
    pub table_name: String,
    /// Ordered; placeholder numbering follows this order.
    pub key_columns: Vec<String>,
    pub columns: Vec<ColumnSpec>,
    #[serde(default)]
    pub filterable_columns: BTreeSet<String>,
    #[serde(default)]
    pub sortable_columns: BTreeSet<String>,
    #[serde(default)]
    pub searchable_columns: Vec<String>,
    pub default_sort: SortSpec,
    /// Key is produced by the store (serial, default expression); create does not require it.
    #[serde(default)]
    pub generated_key: bool,
    #[serde(default = "default_true")]
    pub timestamps: bool,
    /// Stamp `created_by` / `updated_by` from the request context.
    #[serde(default)]
    pub audit_user: bool,
    #[serde(default)]
    pub validation: HashMap<String, ValidationRule>,
}

fn default_true() -> bool {
    true
}

impl EntityConfig {
    /// Start a descriptor; every key column is registered as a text column and the default sort
    /// is the first key column ascending.
    pub fn new<I, S>(resource: impl Into<String>, table_name: impl Into<String>, key_columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let key_columns: Vec<String> = key_columns.into_iter().map(Into::into).collect();
        let columns = key_columns
            .iter()
            .map(|k| ColumnSpec {
                name: k.clone(),
                pg_type: None,
            })
            .collect();
        let default_sort = SortSpec {
            column: key_columns.first().cloned().unwrap_or_default(),
            direction: SortDirection::Asc,
        };
        EntityConfig {
            resource: resource.into(),
            schema: None,
            table_name: table_name.into(),
            key_columns,
            columns,
            filterable_columns: BTreeSet::new(),
            sortable_columns: BTreeSet::new(),
            searchable_columns: Vec::new(),
            default_sort,
            generated_key: false,
            timestamps: true,
            audit_user: false,
            validation: HashMap::new(),
        }
    }

    pub fn in_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    pub fn column(self, name: impl Into<String>) -> Self {
        self.upsert_column(name.into(), None)
    }

    pub fn typed_column(self, name: impl Into<String>, pg_type: impl Into<String>) -> Self {
        self.upsert_column(name.into(), Some(pg_type.into()))
    }

    fn upsert_column(mut self, name: String, pg_type: Option<String>) -> Self {
        match self.columns.iter_mut().find(|c| c.name == name) {
            Some(c) => c.pg_type = pg_type,
            None => self.columns.push(ColumnSpec { name, pg_type }),
        }
        self
    }

    pub fn filterable<I: IntoIterator<Item = S>, S: Into<String>>(mut self, cols: I) -> Self {
        self.filterable_columns.extend(cols.into_iter().map(Into::into));
        self
    }

    pub fn sortable<I: IntoIterator<Item = S>, S: Into<String>>(mut self, cols: I) -> Self {
        self.sortable_columns.extend(cols.into_iter().map(Into::into));
        self
    }

    pub fn searchable<I: IntoIterator<Item = S>, S: Into<String>>(mut self, cols: I) -> Self {
        self.searchable_columns.extend(cols.into_iter().map(Into::into));
        self
    }

    pub fn default_sort(mut self, column: impl Into<String>, direction: SortDirection) -> Self {
        self.default_sort = SortSpec {
            column: column.into(),
            direction,
        };
        self
    }

    pub fn generated_key(mut self, generated: bool) -> Self {
        self.generated_key = generated;
        self
    }

    pub fn timestamps(mut self, enabled: bool) -> Self {
        self.timestamps = enabled;
        self
    }

    pub fn audit_user(mut self, enabled: bool) -> Self {
        self.audit_user = enabled;
        self
    }

    pub fn rule(mut self, column: impl Into<String>, rule: ValidationRule) -> Self {
        self.validation.insert(column.into(), rule);
        self
    }

    pub fn column_spec(&self, name: &str) -> Option<&ColumnSpec> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_spec(name).is_some()
    }

    pub fn cast_for(&self, name: &str) -> Option<&str> {
        self.column_spec(name).and_then(|c| c.pg_type.as_deref())
    }

    pub fn is_key(&self, name: &str) -> bool {
        self.key_columns.iter().any(|k| k == name)
    }

    /// Columns the server writes itself, given the timestamp and audit flags.
    pub fn managed_columns(&self) -> Vec<&'static str> {
        let mut out = Vec::new();
        if self.timestamps {
            out.extend([CREATED_AT, UPDATED_AT]);
        }
        if self.audit_user {
            out.extend([CREATED_BY, UPDATED_BY]);
        }
        out
    }

    /// Quoted, optionally schema-qualified table name.
    pub fn qualified_table(&self) -> String {
        match &self.schema {
            Some(schema) => format!("{}.{}", quoted(schema), quoted(&self.table_name)),
            None => quoted(&self.table_name),
        }
    }
}

/// Quote identifier for PostgreSQL (identifiers come from validated config only).
pub fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}
