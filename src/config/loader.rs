//! Load entity descriptors from a JSON file (an array of `EntityConfig`).

use crate::config::{validate_all, EntityConfig};
use crate::error::ConfigError;
use std::path::Path;

/// Parse and validate a JSON array of entity descriptors.
pub fn parse_entity_configs(json: &str) -> Result<Vec<EntityConfig>, ConfigError> {
    let configs: Vec<EntityConfig> =
        serde_json::from_str(json).map_err(|e| ConfigError::Load(e.to_string()))?;
    validate_all(&configs)?;
    Ok(configs)
}

pub async fn load_entity_configs(path: &Path) -> Result<Vec<EntityConfig>, ConfigError> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ConfigError::Load(format!("{}: {}", path.display(), e)))?;
    let configs = parse_entity_configs(&raw)?;
    tracing::info!(path = %path.display(), count = configs.len(), "loaded entity configs");
    Ok(configs)
}
