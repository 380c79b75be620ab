use core_config::{ConfigError, FromEnv, env_optional, env_or_default, env_required};

pub const DEFAULT_API_VERSION: &str = "2024-02-15-preview";
pub const DEFAULT_CHAT_DEPLOYMENT: &str = "gpt-35-turbo";
pub const DEFAULT_EMBEDDINGS_DEPLOYMENT: &str = "text-embedding-ada-002";

/// Azure OpenAI resource configuration
#[derive(Debug, Clone)]
pub struct AzureOpenAIConfig {
    /// Resource endpoint, e.g. `https://my-resource.openai.azure.com`
    pub endpoint: String,
    /// Static key; when absent a bearer token is taken from the Azure CLI
    pub api_key: Option<String>,
    pub tenant_id: Option<String>,
    pub api_version: String,
    pub chat_deployment: String,
    pub embeddings_deployment: String,
}

impl AzureOpenAIConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: None,
            tenant_id: None,
            api_version: DEFAULT_API_VERSION.to_string(),
            chat_deployment: DEFAULT_CHAT_DEPLOYMENT.to_string(),
            embeddings_deployment: DEFAULT_EMBEDDINGS_DEPLOYMENT.to_string(),
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Endpoint without a trailing slash
    pub fn base_url(&self) -> &str {
        self.endpoint.trim_end_matches('/')
    }
}

impl FromEnv for AzureOpenAIConfig {
    /// Reads:
    /// - AZURE_OPENAI_ENDPOINT (required)
    /// - AZURE_OPENAI_KEY, AZURE_TENANT_ID (optional)
    /// - AZURE_OPENAI_API_VERSION: defaults to 2024-02-15-preview
    /// - CHAT_DEPLOYMENT_NAME: defaults to gpt-35-turbo
    /// - EMBEDDINGS_DEPLOYMENT_NAME: defaults to text-embedding-ada-002
    fn from_env() -> Result<Self, ConfigError> {
        let endpoint = env_optional("AZURE_OPENAI_ENDPOINT")
            .ok_or_else(|| ConfigError::MissingEnvVar("AZURE_OPENAI_ENDPOINT".to_string()))?;

        Ok(Self {
            endpoint,
            api_key: env_optional("AZURE_OPENAI_KEY"),
            tenant_id: env_optional("AZURE_TENANT_ID"),
            api_version: env_or_default("AZURE_OPENAI_API_VERSION", DEFAULT_API_VERSION),
            chat_deployment: env_or_default("CHAT_DEPLOYMENT_NAME", DEFAULT_CHAT_DEPLOYMENT),
            embeddings_deployment: env_or_default(
                "EMBEDDINGS_DEPLOYMENT_NAME",
                DEFAULT_EMBEDDINGS_DEPLOYMENT,
            ),
        })
    }
}

/// Azure AI Vision configuration for image embeddings
#[derive(Debug, Clone)]
pub struct VisionConfig {
    pub endpoint: String,
    pub api_key: String,
}

impl VisionConfig {
    /// `Some` only when both VISION_ENDPOINT and VISION_API_KEY are set.
    pub fn from_env_optional() -> Option<Self> {
        Self::from_env().ok()
    }

    pub fn base_url(&self) -> &str {
        self.endpoint.trim_end_matches('/')
    }
}

impl FromEnv for VisionConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let endpoint = env_required("VISION_ENDPOINT")?;
        let api_key = env_required("VISION_API_KEY")?;
        if endpoint.trim().is_empty() || api_key.trim().is_empty() {
            return Err(ConfigError::MissingEnvVar("VISION_ENDPOINT/VISION_API_KEY".to_string()));
        }

        Ok(Self { endpoint, api_key })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_is_required() {
        temp_env::with_var_unset("AZURE_OPENAI_ENDPOINT", || {
            let err = AzureOpenAIConfig::from_env().unwrap_err();
            assert!(matches!(err, ConfigError::MissingEnvVar(ref v) if v == "AZURE_OPENAI_ENDPOINT"));
        });
    }

    #[test]
    fn test_defaults() {
        temp_env::with_vars(
            [
                ("AZURE_OPENAI_ENDPOINT", Some("https://demo.openai.azure.com/")),
                ("AZURE_OPENAI_KEY", None),
                ("AZURE_TENANT_ID", None),
                ("AZURE_OPENAI_API_VERSION", None),
                ("CHAT_DEPLOYMENT_NAME", None),
                ("EMBEDDINGS_DEPLOYMENT_NAME", None),
            ],
            || {
                let config = AzureOpenAIConfig::from_env().unwrap();
                assert_eq!(config.base_url(), "https://demo.openai.azure.com");
                assert_eq!(config.api_key, None);
                assert_eq!(config.api_version, DEFAULT_API_VERSION);
                assert_eq!(config.chat_deployment, "gpt-35-turbo");
                assert_eq!(config.embeddings_deployment, "text-embedding-ada-002");
            },
        );
    }

    #[test]
    fn test_overrides() {
        temp_env::with_vars(
            [
                ("AZURE_OPENAI_ENDPOINT", Some("https://demo.openai.azure.com")),
                ("AZURE_OPENAI_KEY", Some("secret")),
                ("CHAT_DEPLOYMENT_NAME", Some("gpt-4o")),
            ],
            || {
                let config = AzureOpenAIConfig::from_env().unwrap();
                assert_eq!(config.api_key.as_deref(), Some("secret"));
                assert_eq!(config.chat_deployment, "gpt-4o");
            },
        );
    }

    #[test]
    fn test_vision_needs_both_variables() {
        temp_env::with_vars(
            [("VISION_ENDPOINT", Some("https://vision.example.com")), ("VISION_API_KEY", None)],
            || assert!(VisionConfig::from_env_optional().is_none()),
        );
        temp_env::with_vars(
            [
                ("VISION_ENDPOINT", Some("https://vision.example.com/")),
                ("VISION_API_KEY", Some("k")),
            ],
            || {
                let vision = VisionConfig::from_env_optional().unwrap();
                assert_eq!(vision.base_url(), "https://vision.example.com");
            },
        );
    }
}
