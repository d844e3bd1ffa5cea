//! State shared by the non-entity routes. Entity routers carry their own controller.

use sqlx::PgPool;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
}
