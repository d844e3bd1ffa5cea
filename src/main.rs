//! QC registry server.
//!
//! Configuration comes from the environment (or `.env`); see `Settings`.

use qc_registry::{app_router, ensure_tables, load_entity_configs, Settings};
use tokio::net::TcpListener;
use tower_http::{limit::RequestBodyLimitLayer, timeout::TimeoutLayer};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("qc_registry=info")),
        )
        .init();

    let settings = Settings::from_env()?;
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(settings.db_max_connections)
        .connect(&settings.database_url)
        .await?;

    if settings.auto_migrate {
        ensure_tables(&pool).await?;
    }
    let dynamic = match &settings.entity_config_path {
        Some(path) => load_entity_configs(path).await?,
        None => Vec::new(),
    };

    let app = app_router(pool, dynamic)?
        .layer(TimeoutLayer::new(settings.request_timeout))
        .layer(RequestBodyLimitLayer::new(settings.max_body_bytes));

    let listener = TcpListener::bind(&settings.bind_addr).await?;
    tracing::info!("qc-registry listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
