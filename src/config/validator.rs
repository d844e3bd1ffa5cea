//! Entity config validation: key shape, column references and identifier safety.
//!
//! Identifiers end up interpolated into SQL, so everything that is not a bound value is
//! checked here once at startup.

use crate::config::EntityConfig;
use crate::error::ConfigError;
use regex::Regex;
use std::collections::HashSet;

const IDENTIFIER: &str = r"^[a-z_][a-z0-9_]*$";
const PG_TYPE: &str = r"^[a-z_][a-z0-9_]*(\.[a-z_][a-z0-9_]*)?( [a-z_][a-z0-9_]*)*(\[\])?$";
const RESOURCE: &str = r"^[a-z0-9][a-z0-9_-]*$";

fn invalid(config: &EntityConfig, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidEntity {
        resource: config.resource.clone(),
        reason: reason.into(),
    }
}

fn compile(pattern: &str) -> Result<Regex, ConfigError> {
    Regex::new(pattern).map_err(|e| ConfigError::Load(e.to_string()))
}

pub fn validate_entity(config: &EntityConfig) -> Result<(), ConfigError> {
    let ident = compile(IDENTIFIER)?;
    let pg_type = compile(PG_TYPE)?;

    if !compile(RESOURCE)?.is_match(&config.resource) {
        return Err(invalid(config, format!("invalid resource path '{}'", config.resource)));
    }
    if !ident.is_match(&config.table_name) {
        return Err(invalid(config, format!("invalid table name '{}'", config.table_name)));
    }
    if let Some(schema) = &config.schema {
        if !ident.is_match(schema) {
            return Err(invalid(config, format!("invalid schema name '{}'", schema)));
        }
    }

    let mut seen = HashSet::new();
    let managed = config.managed_columns();
    for c in &config.columns {
        if !ident.is_match(&c.name) {
            return Err(invalid(config, format!("invalid column name '{}'", c.name)));
        }
        if !seen.insert(c.name.as_str()) {
            return Err(invalid(config, format!("column '{}' declared twice", c.name)));
        }
        if managed.contains(&c.name.as_str()) {
            return Err(invalid(
                config,
                format!("column '{}' is managed by the server and cannot be declared writable", c.name),
            ));
        }
        if let Some(t) = &c.pg_type {
            if !pg_type.is_match(t) {
                return Err(invalid(config, format!("invalid type '{}' for column '{}'", t, c.name)));
            }
        }
    }

    if config.key_columns.is_empty() {
        return Err(invalid(config, "at least one key column required"));
    }
    let mut keys = HashSet::new();
    for k in &config.key_columns {
        if !keys.insert(k.as_str()) {
            return Err(invalid(config, format!("key column '{}' listed twice", k)));
        }
    }

    let must_exist = config
        .key_columns
        .iter()
        .map(|c| ("key_columns", c))
        .chain(config.filterable_columns.iter().map(|c| ("filterable_columns", c)))
        .chain(config.searchable_columns.iter().map(|c| ("searchable_columns", c)))
        .chain(config.validation.keys().map(|c| ("validation", c)));
    for (context, column) in must_exist {
        if !config.has_column(column) {
            return Err(ConfigError::UnknownColumn {
                resource: config.resource.clone(),
                column: column.clone(),
                context,
            });
        }
    }

    // Sorting may also use the server-managed timestamps.
    for column in config
        .sortable_columns
        .iter()
        .chain(std::iter::once(&config.default_sort.column))
    {
        if !config.has_column(column) && !managed.contains(&column.as_str()) {
            return Err(ConfigError::UnknownColumn {
                resource: config.resource.clone(),
                column: column.clone(),
                context: "sortable_columns",
            });
        }
    }

    for (column, rule) in &config.validation {
        if let Some(p) = &rule.pattern {
            if Regex::new(p).is_err() {
                return Err(invalid(config, format!("invalid pattern for '{}'", column)));
            }
        }
    }

    Ok(())
}

/// Validate every entity and reject duplicate resource paths.
pub fn validate_all(configs: &[EntityConfig]) -> Result<(), ConfigError> {
    let mut resources = HashSet::new();
    for config in configs {
        validate_entity(config)?;
        if !resources.insert(config.resource.as_str()) {
            return Err(ConfigError::DuplicateResource(config.resource.clone()));
        }
    }
    Ok(())
}
