use std::sync::Arc;

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use tracing::{info, instrument};

use crate::client::{AzureOpenAIClient, ChatMessage, ChatRequest, ContentPart};
use crate::error::{AiError, AiResult};
use crate::prompts::{DESCRIBE_USER_PROMPT, describe_system_prompt};

/// Describes a product photo in the requested language
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ImageDescriber: Send + Sync {
    async fn describe(&self, image: &[u8], mime: &str, language: &str) -> AiResult<String>;
}

/// Multimodal chat completion on the chat deployment
pub struct AzureImageDescriber {
    client: Arc<AzureOpenAIClient>,
}

impl AzureImageDescriber {
    pub fn new(client: Arc<AzureOpenAIClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ImageDescriber for AzureImageDescriber {
    #[instrument(skip(self, image), fields(bytes = image.len()))]
    async fn describe(&self, image: &[u8], mime: &str, language: &str) -> AiResult<String> {
        let request = ChatRequest::new(vec![
            ChatMessage::system(describe_system_prompt(language)),
            ChatMessage::user_parts(vec![
                ContentPart::text(DESCRIBE_USER_PROMPT),
                ContentPart::image_data(mime, &STANDARD.encode(image)),
            ]),
        ])
        .max_tokens(150);

        let description = self.client.chat(&request).await?.trim().to_string();
        if description.is_empty() {
            return Err(AiError::EmptyResponse("Azure OpenAI image description"));
        }

        info!(%description, "Described uploaded image");
        Ok(description)
    }
}
