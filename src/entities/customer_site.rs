//! Customer sites: which site codes belong to which customer.
//!
//! Generic CRUD comes from `GenericModel`; the display name of the owning customer is filled in
//! afterwards by `CustomerNameEnricher`, so the generic queries never join.

use crate::config::{EntityConfig, SortDirection, ValidationRule};
use crate::error::{AppError, ConfigError};
use crate::handlers::GenericController;
use crate::response::{success_many, Envelope};
use crate::routes::entity_routes;
use crate::service::{from_row, Enricher, GenericModel};
use async_trait::async_trait;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use std::collections::HashMap;
use std::sync::Arc;

pub const RESOURCE: &str = "customer-sites";
pub const TABLE: &str = "customer_sites";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, FromRow)]
pub struct CustomerSite {
    pub code: String,
    /// Code of the owning customer (`customers.code`).
    pub customers: String,
    pub site: String,
    #[sqlx(skip)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_by: Option<i64>,
    pub updated_by: Option<i64>,
}

pub fn entity_config() -> EntityConfig {
    EntityConfig::new(RESOURCE, TABLE, ["code"])
        .column("customers")
        .column("site")
        .filterable(["customers", "site"])
        .sortable(["code", "customers", "site", "created_at", "updated_at"])
        .searchable(["code", "customers", "site"])
        .default_sort("code", SortDirection::Asc)
        .audit_user(true)
        .rule("code", ValidationRule::required().max_length(50).pattern("^[A-Za-z0-9_.-]+$"))
        .rule("customers", ValidationRule::required().max_length(50))
        .rule("site", ValidationRule::required().max_length(100))
}

/// Fills `customer_name` with one `= ANY($1)` lookup per batch of rows.
pub struct CustomerNameEnricher;

#[async_trait]
impl Enricher<CustomerSite> for CustomerNameEnricher {
    async fn enrich(&self, pool: &PgPool, rows: &mut [CustomerSite]) -> Result<(), sqlx::Error> {
        let mut codes: Vec<String> = rows.iter().map(|r| r.customers.clone()).collect();
        codes.sort();
        codes.dedup();
        if codes.is_empty() {
            return Ok(());
        }
        let names: HashMap<String, String> =
            sqlx::query_as::<_, (String, String)>("SELECT code, name FROM customers WHERE code = ANY($1)")
                .bind(codes)
                .fetch_all(pool)
                .await?
                .into_iter()
                .collect();
        for row in rows.iter_mut() {
            row.customer_name = names.get(&row.customers).cloned();
        }
        Ok(())
    }
}

pub fn controller(pool: PgPool) -> Result<Arc<GenericController<CustomerSite>>, ConfigError> {
    let model = GenericModel::new(pool, Arc::new(entity_config()), from_row::<CustomerSite>)
        .with_enricher(CustomerNameEnricher);
    Ok(Arc::new(GenericController::new(model)?))
}

/// All sites of one customer, ordered by code. Not paginated.
pub async fn get_by_customer(
    model: &GenericModel<CustomerSite>,
    customer: &str,
) -> Result<Vec<CustomerSite>, AppError> {
    let sql = format!(
        "SELECT * FROM {} WHERE customers = $1 ORDER BY code",
        model.config().qualified_table()
    );
    let mut rows = sqlx::query_as::<_, CustomerSite>(&sql)
        .bind(customer)
        .fetch_all(model.pool())
        .await?;
    CustomerNameEnricher.enrich(model.pool(), &mut rows).await?;
    Ok(rows)
}

async fn by_customer(
    State(controller): State<Arc<GenericController<CustomerSite>>>,
    Path(customer): Path<String>,
) -> Result<(StatusCode, Json<Envelope<Vec<CustomerSite>>>), AppError> {
    let sites = get_by_customer(controller.model(), &customer).await?;
    Ok(success_many(sites))
}

/// Generic CRUD routes plus `GET /customer-sites/by-customer/:customer`.
pub fn routes(controller: Arc<GenericController<CustomerSite>>) -> Router {
    let extra = Router::new()
        .route(&format!("/{}/by-customer/:customer", RESOURCE), get(by_customer))
        .with_state(controller.clone());
    entity_routes(controller).merge(extra)
}
