use chrono::{DateTime, Duration, TimeZone, Utc};
use reqwest::RequestBuilder;
use serde::Deserialize;
use tokio::process::Command;
use tokio::sync::Mutex;
use tracing::{debug, instrument};

use crate::config::AzureOpenAIConfig;
use crate::error::{AiError, AiResult};

pub const COGNITIVE_SERVICES_RESOURCE: &str = "https://cognitiveservices.azure.com";

/// Tokens are refreshed this long before they expire
const REFRESH_MARGIN_SECS: i64 = 5 * 60;

/// How requests to Azure OpenAI authenticate
#[derive(Debug)]
pub enum Credential {
    /// Static key sent in the `api-key` header
    ApiKey(String),
    /// Bearer token obtained from the Azure CLI
    AzureCli(AzureCliCredential),
}

impl Credential {
    /// Key auth when a key is configured, the Azure CLI otherwise.
    pub fn from_config(config: &AzureOpenAIConfig) -> Self {
        match &config.api_key {
            Some(key) => Credential::ApiKey(key.clone()),
            None => Credential::AzureCli(AzureCliCredential::new(config.tenant_id.clone())),
        }
    }

    /// Attach the authentication header to a request
    pub async fn authorize(&self, request: RequestBuilder) -> AiResult<RequestBuilder> {
        match self {
            Credential::ApiKey(key) => Ok(request.header("api-key", key)),
            Credential::AzureCli(cli) => Ok(request.bearer_auth(cli.token().await?)),
        }
    }
}

#[derive(Debug, Clone)]
struct CachedToken {
    token: String,
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(REFRESH_MARGIN_SECS) < self.expires_at
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AzCliToken {
    access_token: String,
    /// Unix seconds; older CLI versions only print the local-time `expiresOn`
    #[serde(rename = "expires_on")]
    expires_on: Option<i64>,
}

/// Token provider backed by `az account get-access-token`.
#[derive(Debug)]
pub struct AzureCliCredential {
    tenant_id: Option<String>,
    program: String,
    leading_args: Vec<String>,
    cache: Mutex<Option<CachedToken>>,
}

impl AzureCliCredential {
    pub fn new(tenant_id: Option<String>) -> Self {
        Self {
            tenant_id,
            program: "az".to_string(),
            leading_args: Vec::new(),
            cache: Mutex::new(None),
        }
    }

    /// Run `program leading_args.. account get-access-token ..` instead of `az`
    pub fn with_program(mut self, program: impl Into<String>, leading_args: Vec<String>) -> Self {
        self.program = program.into();
        self.leading_args = leading_args;
        self
    }

    /// A bearer token for the cognitive services audience, cached until
    /// five minutes before expiry.
    pub async fn token(&self) -> AiResult<String> {
        let mut cache = self.cache.lock().await;
        if let Some(cached) = cache.as_ref().filter(|c| c.is_fresh(Utc::now())) {
            return Ok(cached.token.clone());
        }

        let fetched = self.fetch().await?;
        let token = fetched.token.clone();
        *cache = Some(fetched);
        Ok(token)
    }

    #[instrument(skip(self), fields(tenant = ?self.tenant_id))]
    async fn fetch(&self) -> AiResult<CachedToken> {
        let mut command = Command::new(&self.program);
        command
            .args(&self.leading_args)
            .args(["account", "get-access-token", "--resource", COGNITIVE_SERVICES_RESOURCE]);
        if let Some(tenant) = &self.tenant_id {
            command.args(["--tenant", tenant.as_str()]);
        }
        command.args(["--output", "json"]);

        let output = command
            .output()
            .await
            .map_err(|e| AiError::Credential(format!("failed to run {}: {}", self.program, e)))?;

        if !output.status.success() {
            return Err(AiError::Credential(format!(
                "az account get-access-token exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let parsed: AzCliToken = serde_json::from_slice(&output.stdout)
            .map_err(|e| AiError::Credential(format!("unreadable token output: {}", e)))?;

        // Without an expiry the token is used once and never cached as fresh.
        let expires_at = parsed
            .expires_on
            .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
            .unwrap_or_else(Utc::now);

        debug!(%expires_at, "Obtained Azure CLI access token");
        Ok(CachedToken {
            token: parsed.access_token,
            expires_at,
        })
    }
}
