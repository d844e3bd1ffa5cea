//! Request validation from declarative per-column rules.

use crate::config::ValidationRule;
use crate::error::{AppError, ConfigError};
use regex::Regex;
use serde_json::{Map, Value};
use std::collections::HashMap;

struct CompiledRule {
    column: String,
    rule: ValidationRule,
    pattern: Option<Regex>,
}

/// Rules of one entity with their patterns compiled once, when the controller is built.
pub struct RequestValidator {
    rules: Vec<CompiledRule>,
}

impl RequestValidator {
    pub fn new(rules: &HashMap<String, ValidationRule>) -> Result<Self, ConfigError> {
        let mut compiled = rules
            .iter()
            .map(|(column, rule)| -> Result<CompiledRule, ConfigError> {
                let pattern = rule
                    .pattern
                    .as_deref()
                    .map(Regex::new)
                    .transpose()
                    .map_err(|e| ConfigError::Load(format!("pattern for {}: {}", column, e)))?;
                Ok(CompiledRule {
                    column: column.clone(),
                    rule: rule.clone(),
                    pattern,
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;
        compiled.sort_by(|a, b| a.column.cmp(&b.column));
        Ok(RequestValidator { rules: compiled })
    }

    /// Validate a create body. Every required field must be present and non-null.
    pub fn validate(&self, body: &Map<String, Value>) -> Result<(), AppError> {
        for r in &self.rules {
            let val = body.get(&r.column);
            if r.rule.required == Some(true) && val.map_or(true, is_blank) {
                return Err(AppError::Validation(format!("{} is required", r.column)));
            }
            if let Some(v) = val {
                validate_field(r, v)?;
            }
        }
        Ok(())
    }

    /// Validate only the fields present (partial update). A required field may be omitted but
    /// not cleared.
    pub fn validate_partial(&self, body: &Map<String, Value>) -> Result<(), AppError> {
        for r in &self.rules {
            let Some(v) = body.get(&r.column) else { continue };
            if r.rule.required == Some(true) && is_blank(v) {
                return Err(AppError::Validation(format!("{} cannot be cleared", r.column)));
            }
            validate_field(r, v)?;
        }
        Ok(())
    }
}

fn is_blank(v: &Value) -> bool {
    match v {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

fn validate_field(compiled: &CompiledRule, v: &Value) -> Result<(), AppError> {
    let (col, rule) = (compiled.column.as_str(), &compiled.rule);
    if v.is_null() {
        return Ok(());
    }
    if let Some(format) = &rule.format {
        validate_format(col, v, format)?;
    }
    if let Some(s) = v.as_str() {
        let len = s.chars().count();
        if let Some(max) = rule.max_length {
            if len > max as usize {
                return Err(AppError::Validation(format!("{} must be at most {} characters", col, max)));
            }
        }
        if let Some(min) = rule.min_length {
            if len < min as usize {
                return Err(AppError::Validation(format!("{} must be at least {} characters", col, min)));
            }
        }
        if let Some(re) = &compiled.pattern {
            if !re.is_match(s) {
                return Err(AppError::Validation(format!("{} does not match required pattern", col)));
            }
        }
    }
    if let Some(allowed) = &rule.allowed {
        if !allowed.iter().any(|a| value_eq(v, a)) {
            return Err(AppError::Validation(format!(
                "{} must be one of: {:?}",
                col,
                allowed.iter().take(5).collect::<Vec<_>>()
            )));
        }
    }
    if let Some(n) = v.as_f64() {
        if let Some(min) = rule.minimum {
            if n < min {
                return Err(AppError::Validation(format!("{} must be at least {}", col, min)));
            }
        }
        if let Some(max) = rule.maximum {
            if n > max {
                return Err(AppError::Validation(format!("{} must be at most {}", col, max)));
            }
        }
    }
    Ok(())
}

fn value_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(n), Value::Number(m)) => n.as_f64() == m.as_f64(),
        _ => a == b,
    }
}

fn validate_format(col: &str, v: &Value, format: &str) -> Result<(), AppError> {
    let Some(s) = v.as_str() else { return Ok(()) };
    match format.to_lowercase().as_str() {
        "email" if !s.contains('@') || s.len() < 3 => {
            Err(AppError::Validation(format!("{} must be a valid email", col)))
        }
        "uuid" if uuid::Uuid::parse_str(s).is_err() => {
            Err(AppError::Validation(format!("{} must be a valid UUID", col)))
        }
        _ => Ok(()),
    }
}
