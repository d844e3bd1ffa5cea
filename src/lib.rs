//! QC registry: generic keyed-entity CRUD over PostgreSQL, served as a REST API.

pub mod config;
pub mod context;
pub mod entities;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod response;
pub mod routes;
pub mod service;
pub mod sql;
pub mod state;
pub mod store;

pub use config::{load_entity_configs, EntityConfig, Settings};
pub use context::RequestContext;
pub use error::{AppError, ConfigError, ErrorKind, OperationFailure, OperationResult};
pub use extractors::AuthenticatedUser;
pub use handlers::GenericController;
pub use routes::{api_routes, app_router, common_routes, entity_routes, API_PREFIX};
pub use service::{Enricher, GenericModel};
pub use state::AppState;
pub use store::ensure_tables;
