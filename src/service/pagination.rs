//! List options, their resolution against an entity's whitelist, and page arithmetic.

use crate::config::{EntityConfig, SortDirection};
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 10;
pub const MAX_LIMIT: u32 = 200;

/// Raw list options as requested. Nothing here is trusted yet.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FindOptions {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub search: Option<String>,
    /// Entity-specific equality filters; keys not declared filterable are dropped on resolve.
    pub filters: BTreeMap<String, String>,
}

/// Lenient page/limit parsing: negative numbers clamp to zero (and later to one), garbage is
/// treated as absent.
fn parse_count(s: &str) -> Option<u32> {
    let n: i64 = s.trim().parse().ok()?;
    Some(n.clamp(0, u32::MAX as i64) as u32)
}

impl FindOptions {
    /// Read `page`, `limit`, `search`, `sortBy`, `sortOrder` and declared filter keys from a
    /// query string.
    pub fn from_query(config: &EntityConfig, params: &HashMap<String, String>) -> Self {
        let mut opts = FindOptions::default();
        for (k, v) in params {
            match k.as_str() {
                "page" => opts.page = parse_count(v),
                "limit" => opts.limit = parse_count(v),
                "search" => opts.search = Some(v.clone()),
                "sortBy" | "sort_by" => opts.sort_by = Some(v.clone()),
                "sortOrder" | "sort_order" => opts.sort_order = Some(v.clone()),
                _ if config.filterable_columns.contains(k) && !v.is_empty() => {
                    opts.filters.insert(k.clone(), v.clone());
                }
                _ => {}
            }
        }
        opts
    }
}

/// Options resolved against the entity config: clamped, whitelisted, safe to render.
#[derive(Clone, Debug, PartialEq)]
pub struct ListPlan {
    pub page: u32,
    pub limit: u32,
    pub sort_column: String,
    pub sort_direction: SortDirection,
    pub filters: Vec<(String, Value)>,
    pub search: Option<String>,
}

impl ListPlan {
    pub fn resolve(config: &EntityConfig, opts: &FindOptions) -> Self {
        let page = opts.page.unwrap_or(DEFAULT_PAGE).max(1);
        let limit = opts.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);

        let requested = opts
            .sort_by
            .as_deref()
            .filter(|c| config.sortable_columns.contains(*c));
        let (sort_column, sort_direction) = match requested {
            Some(c) => (
                c.to_string(),
                opts.sort_order
                    .as_deref()
                    .and_then(SortDirection::parse)
                    .unwrap_or(config.default_sort.direction),
            ),
            None => {
                if let Some(c) = &opts.sort_by {
                    tracing::debug!(resource = %config.resource, sort_by = %c, "unsortable column, using default sort");
                }
                (config.default_sort.column.clone(), config.default_sort.direction)
            }
        };

        let filters = opts
            .filters
            .iter()
            .filter(|(k, _)| config.filterable_columns.contains(*k))
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect();
        let search = opts
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        ListPlan {
            page,
            limit,
            sort_column,
            sort_direction,
            filters,
            search,
        }
    }

    pub fn offset(&self) -> u64 {
        (self.page as u64 - 1) * self.limit as u64
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl Pagination {
    pub fn new(page: u32, limit: u32, total: u64) -> Self {
        let limit = limit.max(1);
        let total_pages = total.div_ceil(limit as u64);
        Pagination {
            page,
            limit,
            total,
            total_pages,
            has_next: (page as u64) < total_pages,
            has_prev: page > 1,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct PaginatedResult<E> {
    pub data: Vec<E>,
    pub pagination: Pagination,
}
