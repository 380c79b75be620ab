use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::config::AzureOpenAIConfig;
use crate::credential::Credential;
use crate::error::{AiError, AiResult};

const SERVICE: &str = "Azure OpenAI";

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: MessageContent,
}

impl ChatMessage {
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: "system",
            content: MessageContent::Text(text.into()),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: "user",
            content: MessageContent::Text(text.into()),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: "assistant",
            content: MessageContent::Text(text.into()),
        }
    }

    /// User turn mixing text and images
    pub fn user_parts(parts: Vec<ContentPart>) -> Self {
        Self {
            role: "user",
            content: MessageContent::Parts(parts),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

impl ContentPart {
    pub fn text(text: impl Into<String>) -> Self {
        ContentPart::Text { text: text.into() }
    }

    /// Inline image as a `data:` URI
    pub fn image_data(mime: &str, base64_data: &str) -> Self {
        ContentPart::ImageUrl {
            image_url: ImageUrl {
                url: format!("data:{};base64,{}", mime, base64_data),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ImageUrl {
    pub url: String,
}

/// Body of a chat completions call
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    pub n: u32,
    pub temperature: f32,
    pub stream: bool,
}

impl ChatRequest {
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            max_tokens: 100,
            n: 1,
            temperature: 0.3,
            stream: false,
        }
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    input: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

/// Azure OpenAI REST client: chat completions and embeddings against named
/// deployments.
#[derive(Debug)]
pub struct AzureOpenAIClient {
    http: Client,
    config: AzureOpenAIConfig,
    credential: Credential,
}

impl AzureOpenAIClient {
    pub fn new(config: AzureOpenAIConfig) -> Self {
        let credential = Credential::from_config(&config);
        Self::with_credential(config, credential)
    }

    pub fn with_credential(config: AzureOpenAIConfig, credential: Credential) -> Self {
        Self {
            http: Client::new(),
            config,
            credential,
        }
    }

    pub fn config(&self) -> &AzureOpenAIConfig {
        &self.config
    }

    fn deployment_url(&self, deployment: &str, operation: &str) -> String {
        format!(
            "{}/openai/deployments/{}/{}?api-version={}",
            self.config.base_url(),
            deployment,
            operation,
            self.config.api_version
        )
    }

    async fn post<B: Serialize + ?Sized>(&self, url: String, body: &B) -> AiResult<reqwest::Response> {
        let request = self.credential.authorize(self.http.post(url)).await?;
        let response = request.json(body).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AiError::Upstream {
                service: SERVICE,
                status,
                body,
            });
        }

        Ok(response)
    }

    /// Run a chat completion on the configured chat deployment and return the
    /// first choice's text (empty when the model returned no content).
    #[instrument(skip(self, request), fields(deployment = %self.config.chat_deployment))]
    pub async fn chat(&self, request: &ChatRequest) -> AiResult<String> {
        let url = self.deployment_url(&self.config.chat_deployment, "chat/completions");
        let response: ChatResponse = self.post(url, request).await?.json().await?;

        let content = response
            .choices
            .into_iter()
            .next()
            .ok_or(AiError::EmptyResponse(SERVICE))?
            .message
            .content
            .unwrap_or_default();

        debug!(chars = content.len(), "Chat completion received");
        Ok(content)
    }

    /// Embed one input on `deployment`, optionally reducing the vector to
    /// `dimensions`.
    #[instrument(skip(self, input))]
    pub async fn embeddings(
        &self,
        deployment: &str,
        input: &str,
        dimensions: Option<u32>,
    ) -> AiResult<Vec<f32>> {
        let url = self.deployment_url(deployment, "embeddings");
        let response: EmbeddingResponse = self
            .post(url, &EmbeddingRequest { input, dimensions })
            .await?
            .json()
            .await?;

        response
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or(AiError::EmptyResponse(SERVICE))
    }
}
