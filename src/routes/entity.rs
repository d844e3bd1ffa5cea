//! Per-entity CRUD routes. The item path carries one segment per key column, in key order.

use crate::config::EntityConfig;
use crate::error::ConfigError;
use crate::handlers::entity::{create, delete as delete_handler, list, read, update};
use crate::handlers::GenericController;
use crate::service::{json_row_mapper, Entity, GenericModel};
use axum::{routing::get, Router};
use serde_json::Value;
use sqlx::PgPool;
use std::sync::Arc;

/// `/{resource}/:k1/:k2...` for the config's key columns.
pub fn key_path(config: &EntityConfig) -> String {
    let mut path = format!("/{}", config.resource);
    for column in &config.key_columns {
        path.push_str("/:");
        path.push_str(column);
    }
    path
}

pub fn entity_routes<E: Entity>(controller: Arc<GenericController<E>>) -> Router {
    let collection = format!("/{}", controller.model().config().resource);
    let item = key_path(controller.model().config());
    Router::new()
        .route(&collection, get(list::<E>).post(create::<E>))
        .route(
            &item,
            get(read::<E>)
                .put(update::<E>)
                .patch(update::<E>)
                .delete(delete_handler::<E>),
        )
        .with_state(controller)
}

/// Routes for entities declared only in configuration; rows come back as JSON objects.
pub fn dynamic_entity_routes(pool: &PgPool, configs: Vec<EntityConfig>) -> Result<Router, ConfigError> {
    let mut router = Router::new();
    for config in configs {
        tracing::info!(resource = %config.resource, path = %key_path(&config), "mounting entity");
        let model = GenericModel::<Value>::new(pool.clone(), Arc::new(config), json_row_mapper);
        router = router.merge(entity_routes(Arc::new(GenericController::new(model)?)));
    }
    Ok(router)
}
