//! Azure OpenAI and Azure AI Vision access for product search.
//!
//! One [`AzureOpenAIClient`] is built at startup from [`AzureOpenAIConfig`]
//! and shared behind `Arc` by the components that call it:
//!
//! - [`QueryRewriter`]: free text to an FTS keyword query
//! - [`EmbeddingFetcher`]: text to a vector for a chosen [`EmbeddingModel`]
//! - [`ImageDescriber`]: product photo to a short description
//! - [`ImageEmbedder`]: product photo to a vision vector

pub mod client;
pub mod config;
pub mod credential;
pub mod describe;
pub mod embedding;
pub mod error;
pub mod models;
pub mod prompts;
pub mod rewriter;
pub mod vision;

#[cfg(test)]
mod test_support;

pub use client::{AzureOpenAIClient, ChatMessage, ChatRequest, ContentPart, MessageContent};
pub use config::{AzureOpenAIConfig, VisionConfig};
pub use credential::{AzureCliCredential, Credential};
pub use describe::{AzureImageDescriber, ImageDescriber};
pub use embedding::{AzureEmbeddingFetcher, EmbeddingFetcher};
pub use error::{AiError, AiResult};
pub use models::EmbeddingModel;
pub use rewriter::{AzureQueryRewriter, FALLBACK_KEYWORDS, QueryRewriter};
pub use vision::{AzureVisionEmbedder, ImageEmbedder};
