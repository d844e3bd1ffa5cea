//! DDL for the built-in entity tables. Idempotent; run on startup when `AUTO_MIGRATE` is set.

use crate::error::AppError;
use sqlx::PgPool;

const BUILTIN_DDL: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS customers (
        code TEXT PRIMARY KEY,
        name TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS customer_sites (
        code TEXT PRIMARY KEY,
        customers TEXT NOT NULL REFERENCES customers (code),
        site TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        created_by BIGINT,
        updated_by BIGINT
    )
    "#,
    "CREATE INDEX IF NOT EXISTS customer_sites_customers_idx ON customer_sites (customers)",
];

/// Create `customers` and `customer_sites` (and their index) in the connection's search path.
pub async fn ensure_tables(pool: &PgPool) -> Result<(), AppError> {
    for ddl in BUILTIN_DDL {
        sqlx::query(ddl).execute(pool).await?;
    }
    tracing::info!(tables = BUILTIN_DDL.len(), "built-in tables ensured");
    Ok(())
}
