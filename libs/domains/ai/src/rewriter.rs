use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, instrument};

use crate::client::{AzureOpenAIClient, ChatMessage, ChatRequest};
use crate::error::AiResult;
use crate::prompts::{REWRITE_EXAMPLES, REWRITE_SYSTEM_PROMPT, rewrite_user_prompt};

/// Keyword query meaning "no keyword constraint"
pub const FALLBACK_KEYWORDS: &str = "0";

/// Turns a free-text (possibly non-English) question into an FTS keyword
/// query with `NOT` for exclusions.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QueryRewriter: Send + Sync {
    async fn rewrite(&self, query: &str) -> AiResult<String>;
}

/// Few-shot chat completion rewriter
pub struct AzureQueryRewriter {
    client: Arc<AzureOpenAIClient>,
}

impl AzureQueryRewriter {
    pub fn new(client: Arc<AzureOpenAIClient>) -> Self {
        Self { client }
    }

    fn request(query: &str) -> ChatRequest {
        let mut messages = vec![ChatMessage::system(REWRITE_SYSTEM_PROMPT)];
        for (question, answer) in REWRITE_EXAMPLES {
            messages.push(ChatMessage::user(*question));
            messages.push(ChatMessage::assistant(*answer));
        }
        messages.push(ChatMessage::user(rewrite_user_prompt(query)));

        ChatRequest::new(messages)
    }
}

#[async_trait]
impl QueryRewriter for AzureQueryRewriter {
    #[instrument(skip(self))]
    async fn rewrite(&self, query: &str) -> AiResult<String> {
        let completion = self.client.chat(&Self::request(query)).await?;
        let keywords = completion.trim();

        let keywords = if keywords.is_empty() {
            FALLBACK_KEYWORDS.to_string()
        } else {
            keywords.to_string()
        };

        info!(%keywords, "Rewrote search query");
        Ok(keywords)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AzureOpenAIConfig;
    use crate::test_support::{StubServer, chat_reply};
    use axum::http::StatusCode;

    async fn rewriter_replying(content: &str) -> (AzureQueryRewriter, StubServer) {
        let stub = StubServer::start(StatusCode::OK, chat_reply(content)).await;
        let client = AzureOpenAIClient::new(AzureOpenAIConfig::new(&stub.url).with_api_key("k"));
        (AzureQueryRewriter::new(Arc::new(client)), stub)
    }

    #[tokio::test]
    async fn test_rewrite_trims_completion() {
        let (rewriter, stub) = rewriter_replying("  red shoes NOT sneakers\n").await;

        let keywords = rewriter.rewrite("red shoes, not sneakers").await.unwrap();
        assert_eq!(keywords, "red shoes NOT sneakers");

        let seen = stub.single_request().await;
        let messages = seen.body["messages"].as_array().unwrap();
        assert_eq!(messages[0]["role"], "system");
        assert_eq!(messages.len(), 2 + REWRITE_EXAMPLES.len() * 2);
        assert_eq!(
            messages.last().unwrap()["content"],
            "Generate a search query for: red shoes, not sneakers"
        );
        assert!((seen.body["temperature"].as_f64().unwrap() - 0.3).abs() < 1e-6);
        assert_eq!(seen.body["max_tokens"], 100);
    }

    #[tokio::test]
    async fn test_blank_completion_falls_back_to_zero() {
        let (rewriter, _stub) = rewriter_replying("   ").await;
        assert_eq!(rewriter.rewrite("???").await.unwrap(), FALLBACK_KEYWORDS);
    }
}
