pub mod common;
pub mod entity;

pub use common::common_routes;
pub use entity::{dynamic_entity_routes, entity_routes, key_path};

use crate::config::{validate_all, EntityConfig};
use crate::entities::customer_site;
use crate::error::{AppError, ConfigError};
use crate::state::AppState;
use axum::Router;
use sqlx::PgPool;

/// Prefix for entity routes.
pub const API_PREFIX: &str = "/api/v1";

/// Full application router without transport layers: common routes at the root, entities
/// under `API_PREFIX`.
pub fn app_router(pool: PgPool, dynamic: Vec<EntityConfig>) -> Result<Router, AppError> {
    let api = api_routes(pool.clone(), dynamic)?;
    Ok(common_routes(AppState { pool }).nest(API_PREFIX, api))
}

/// Every entity route: the built-in entities plus any declared in configuration. Fails when a
/// descriptor is invalid or two entities claim the same resource path.
pub fn api_routes(pool: PgPool, dynamic: Vec<EntityConfig>) -> Result<Router, ConfigError> {
    let mut all = vec![customer_site::entity_config()];
    all.extend(dynamic.iter().cloned());
    if let Err(e) = validate_all(&all) {
        tracing::warn!(error = %e, "rejecting entity configuration");
        return Err(e);
    }
    let sites = customer_site::routes(customer_site::controller(pool.clone())?);
    Ok(sites.merge(dynamic_entity_routes(&pool, dynamic)?))
}
