//! Builds parameterized SELECT, INSERT, UPDATE, DELETE for one entity.
//! Identifiers come from validated config only; every value is a positional parameter.

use crate::config::{quoted, EntityConfig, CREATED_AT, CREATED_BY, UPDATED_AT, UPDATED_BY};
use crate::context::RequestContext;
use crate::service::ListPlan;
use crate::sql::key::{build_where_clause, build_where_clause_from, placeholder, KeyValues};
use serde_json::{Map, Value};

#[derive(Clone, Debug, PartialEq)]
pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<Value>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf {
            sql: String::new(),
            params: Vec::new(),
        }
    }

    fn push_param(&mut self, v: Value) -> usize {
        self.params.push(v);
        self.params.len()
    }
}

/// Escape `%`, `_` and `\` so user search text matches literally inside ILIKE.
pub(crate) fn escape_like(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    for c in s.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// SELECT one row by key.
pub fn select_by_key(config: &EntityConfig, key: &KeyValues) -> QueryBuf {
    let w = build_where_clause(config, key);
    QueryBuf {
        sql: format!(
            "SELECT * FROM {} WHERE {} LIMIT 1",
            config.qualified_table(),
            w.clause
        ),
        params: w.params,
    }
}

/// Existence check without row materialization.
pub fn exists(config: &EntityConfig, key: &KeyValues) -> QueryBuf {
    let w = build_where_clause(config, key);
    QueryBuf {
        sql: format!("SELECT 1 FROM {} WHERE {} LIMIT 1", config.qualified_table(), w.clause),
        params: w.params,
    }
}

/// Shared filter/search predicate for the page and count queries. Returns "" or " WHERE ...".
fn list_predicate(config: &EntityConfig, plan: &ListPlan, q: &mut QueryBuf) -> String {
    let mut parts = Vec::new();
    for (column, value) in &plan.filters {
        let n = q.push_param(value.clone());
        parts.push(format!(
            "{} = {}",
            quoted(column),
            placeholder(n, config.cast_for(column))
        ));
    }
    if let Some(term) = &plan.search {
        if !config.searchable_columns.is_empty() {
            let n = q.push_param(Value::String(format!("%{}%", escape_like(term))));
            let ors = config
                .searchable_columns
                .iter()
                .map(|c| format!("CAST({} AS TEXT) ILIKE ${}", quoted(c), n))
                .collect::<Vec<_>>()
                .join(" OR ");
            parts.push(format!("({})", ors));
        }
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", parts.join(" AND "))
    }
}

/// One page of rows ordered by the plan's sort column, then by key for a stable order.
pub fn select_page(config: &EntityConfig, plan: &ListPlan) -> QueryBuf {
    let mut q = QueryBuf::new();
    let where_clause = list_predicate(config, plan, &mut q);
    let mut order = vec![format!("{} {}", quoted(&plan.sort_column), plan.sort_direction.as_sql())];
    order.extend(
        config
            .key_columns
            .iter()
            .filter(|k| **k != plan.sort_column)
            .map(|k| format!("{} ASC", quoted(k))),
    );
    q.sql = format!(
        "SELECT * FROM {}{} ORDER BY {} LIMIT {} OFFSET {}",
        config.qualified_table(),
        where_clause,
        order.join(", "),
        plan.limit,
        plan.offset()
    );
    q
}

/// COUNT(*) over the same predicate as [`select_page`].
pub fn count(config: &EntityConfig, plan: &ListPlan) -> QueryBuf {
    let mut q = QueryBuf::new();
    let where_clause = list_predicate(config, plan, &mut q);
    q.sql = format!("SELECT COUNT(*) FROM {}{}", config.qualified_table(), where_clause);
    q
}

/// INSERT the declared columns present in `body`, stamping timestamps and the acting user.
pub fn insert(config: &EntityConfig, body: &Map<String, Value>, ctx: &RequestContext) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut cols = Vec::new();
    let mut values = Vec::new();
    for c in &config.columns {
        let Some(v) = body.get(&c.name) else { continue };
        let n = q.push_param(v.clone());
        cols.push(quoted(&c.name));
        values.push(placeholder(n, c.pg_type.as_deref()));
    }
    if config.timestamps {
        for name in [CREATED_AT, UPDATED_AT] {
            cols.push(quoted(name));
            values.push("NOW()".to_string());
        }
    }
    if config.audit_user {
        if let Some(user) = ctx.user_id {
            for name in [CREATED_BY, UPDATED_BY] {
                let n = q.push_param(Value::from(user));
                cols.push(quoted(name));
                values.push(format!("${}", n));
            }
        }
    }
    let table = config.qualified_table();
    q.sql = if cols.is_empty() {
        format!("INSERT INTO {} DEFAULT VALUES RETURNING *", table)
    } else {
        format!(
            "INSERT INTO {} ({}) VALUES ({}) RETURNING *",
            table,
            cols.join(", "),
            values.join(", ")
        )
    };
    q
}

/// Non-key declared columns present in `body`, in declaration order.
pub fn updatable_columns<'a>(config: &'a EntityConfig, body: &Map<String, Value>) -> Vec<&'a str> {
    config
        .columns
        .iter()
        .filter(|c| !config.is_key(&c.name) && body.contains_key(&c.name))
        .map(|c| c.name.as_str())
        .collect()
}

/// UPDATE by key: SET only supplied non-key columns (`null` clears), then refresh `updated_at`
/// and `updated_by`. `None` when there is nothing to set.
pub fn update(
    config: &EntityConfig,
    key: &KeyValues,
    body: &Map<String, Value>,
    ctx: &RequestContext,
) -> Option<QueryBuf> {
    let columns = updatable_columns(config, body);
    if columns.is_empty() {
        return None;
    }
    let mut q = QueryBuf::new();
    let mut sets = Vec::with_capacity(columns.len() + 2);
    for name in columns {
        let v = body.get(name).cloned().unwrap_or(Value::Null);
        let n = q.push_param(v);
        sets.push(format!("{} = {}", quoted(name), placeholder(n, config.cast_for(name))));
    }
    if config.timestamps {
        sets.push(format!("{} = NOW()", quoted(UPDATED_AT)));
    }
    if config.audit_user {
        if let Some(user) = ctx.user_id {
            let n = q.push_param(Value::from(user));
            sets.push(format!("{} = ${}", quoted(UPDATED_BY), n));
        }
    }
    let w = build_where_clause_from(config, key, q.params.len() + 1);
    q.params.extend(w.params);
    q.sql = format!(
        "UPDATE {} SET {} WHERE {} RETURNING *",
        config.qualified_table(),
        sets.join(", "),
        w.clause
    );
    Some(q)
}

/// DELETE by key.
pub fn delete(config: &EntityConfig, key: &KeyValues) -> QueryBuf {
    let w = build_where_clause(config, key);
    QueryBuf {
        sql: format!("DELETE FROM {} WHERE {}", config.qualified_table(), w.clause),
        params: w.params,
    }
}
