use core_config::{AppInfo, FromEnv, app_info, server::ServerConfig};
use domain_ai::{AzureOpenAIConfig, VisionConfig};
use domain_products::{CatalogConfig, CosmosConfig};

// Re-export Environment for use in other modules
pub use core_config::Environment;

/// Application configuration, built once at startup
#[derive(Clone, Debug)]
pub struct Config {
    pub app: AppInfo,
    pub environment: Environment,
    pub server: ServerConfig,
    pub openai: AzureOpenAIConfig,
    /// Set only when both VISION_ENDPOINT and VISION_API_KEY are present
    pub vision: Option<VisionConfig>,
    pub catalog: CatalogConfig,
    /// Set only when AZURE_COSMOS_CONNECTION_STRING is present
    pub cosmos: Option<CosmosConfig>,
}

impl Config {
    pub fn from_env() -> eyre::Result<Self> {
        Ok(Self {
            app: app_info!(),
            environment: Environment::from_env(),
            server: ServerConfig::from_env()?,
            openai: AzureOpenAIConfig::from_env()?,
            vision: VisionConfig::from_env_optional(),
            catalog: CatalogConfig::from_env()?,
            cosmos: CosmosConfig::from_env_optional()?,
        })
    }
}

/// Which search backend serves requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Local,
    Cosmos,
}

impl BackendKind {
    pub fn from_config(config: &Config) -> Self {
        if config.cosmos.is_some() {
            BackendKind::Cosmos
        } else {
            BackendKind::Local
        }
    }
}
