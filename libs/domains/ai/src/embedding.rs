use std::sync::Arc;

use async_trait::async_trait;
use tracing::instrument;

use crate::client::AzureOpenAIClient;
use crate::error::AiResult;
use crate::models::{EmbeddingModel, LARGE_EMBEDDINGS_DEPLOYMENT};

/// Maps text to a vector for the selected embedding model
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmbeddingFetcher: Send + Sync {
    async fn embed(&self, text: &str, model: EmbeddingModel) -> AiResult<Vec<f32>>;
}

pub struct AzureEmbeddingFetcher {
    client: Arc<AzureOpenAIClient>,
}

impl AzureEmbeddingFetcher {
    pub fn new(client: Arc<AzureOpenAIClient>) -> Self {
        Self { client }
    }

    fn deployment(&self, model: EmbeddingModel) -> &str {
        match model {
            EmbeddingModel::Ada002 => &self.client.config().embeddings_deployment,
            EmbeddingModel::Large3 => LARGE_EMBEDDINGS_DEPLOYMENT,
        }
    }
}

#[async_trait]
impl EmbeddingFetcher for AzureEmbeddingFetcher {
    #[instrument(skip(self, text), fields(model = %model))]
    async fn embed(&self, text: &str, model: EmbeddingModel) -> AiResult<Vec<f32>> {
        self.client
            .embeddings(self.deployment(model), text, model.dimensions())
            .await
    }
}
