use std::path::PathBuf;

use core_config::{ConfigError, FromEnv, env_optional, env_or_default, env_parse_or, env_required};

pub const DEFAULT_CATALOG_PATH: &str = "data/test.json";
pub const DEFAULT_SEARCH_LIMIT: usize = 10;
pub const COSMOS_CONNECTION_VAR: &str = "AZURE_COSMOS_CONNECTION_STRING";

fn search_limit() -> Result<usize, ConfigError> {
    let limit = env_parse_or("SEARCH_LIMIT", DEFAULT_SEARCH_LIMIT)?;
    if limit == 0 {
        return Err(ConfigError::ParseError {
            key: "SEARCH_LIMIT".to_string(),
            details: "must be at least 1".to_string(),
        });
    }
    Ok(limit)
}

/// Local JSON catalog settings
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    pub path: PathBuf,
    pub search_limit: usize,
}

impl FromEnv for CatalogConfig {
    /// - CATALOG_PATH: defaults to data/test.json
    /// - SEARCH_LIMIT: defaults to 10
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            path: PathBuf::from(env_or_default("CATALOG_PATH", DEFAULT_CATALOG_PATH)),
            search_limit: search_limit()?,
        })
    }
}

/// Cosmos DB for MongoDB vCore settings
#[derive(Clone)]
pub struct CosmosConfig {
    pub connection_string: String,
    pub database: String,
    pub collection: String,
    pub search_limit: usize,
}

impl CosmosConfig {
    /// `None` when no connection string is configured
    pub fn from_env_optional() -> Result<Option<Self>, ConfigError> {
        match env_optional(COSMOS_CONNECTION_VAR) {
            Some(_) => Self::from_env().map(Some),
            None => Ok(None),
        }
    }
}

// Connection strings carry credentials.
impl std::fmt::Debug for CosmosConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CosmosConfig")
            .field("connection_string", &"<redacted>")
            .field("database", &self.database)
            .field("collection", &self.collection)
            .field("search_limit", &self.search_limit)
            .finish()
    }
}

impl FromEnv for CosmosConfig {
    /// - AZURE_COSMOS_CONNECTION_STRING (required)
    /// - AZURE_COSMOS_DATABASE, AZURE_COSMOS_COLLECTION: default to products
    /// - SEARCH_LIMIT: defaults to 10
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            connection_string: env_required(COSMOS_CONNECTION_VAR)?,
            database: env_or_default("AZURE_COSMOS_DATABASE", "products"),
            collection: env_or_default("AZURE_COSMOS_COLLECTION", "products"),
            search_limit: search_limit()?,
        })
    }
}
