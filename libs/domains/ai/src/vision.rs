use async_trait::async_trait;
use reqwest::{Client, header::CONTENT_TYPE};
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::config::VisionConfig;
use crate::error::{AiError, AiResult};

const SERVICE: &str = "Azure AI Vision";
const API_VERSION: &str = "2024-02-01";
const MODEL_VERSION: &str = "2023-04-15";

/// Maps raw image bytes to a vision embedding
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ImageEmbedder: Send + Sync {
    async fn embed_image(&self, image: &[u8], mime: &str) -> AiResult<Vec<f32>>;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VectorizeResponse {
    vector: Vec<f32>,
}

/// Azure AI Vision multimodal embeddings (`retrieval:vectorizeImage`)
pub struct AzureVisionEmbedder {
    http: Client,
    config: VisionConfig,
}

impl AzureVisionEmbedder {
    pub fn new(config: VisionConfig) -> Self {
        Self {
            http: Client::new(),
            config,
        }
    }

    fn url(&self) -> String {
        format!(
            "{}/computervision/retrieval:vectorizeImage?api-version={}&model-version={}",
            self.config.base_url(),
            API_VERSION,
            MODEL_VERSION
        )
    }
}

#[async_trait]
impl ImageEmbedder for AzureVisionEmbedder {
    #[instrument(skip(self, image), fields(bytes = image.len()))]
    async fn embed_image(&self, image: &[u8], mime: &str) -> AiResult<Vec<f32>> {
        let response = self
            .http
            .post(self.url())
            .header("Ocp-Apim-Subscription-Key", &self.config.api_key)
            .header(CONTENT_TYPE, mime)
            .body(image.to_vec())
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AiError::Upstream {
                service: SERVICE,
                status,
                body,
            });
        }

        let parsed: VectorizeResponse = response.json().await?;
        if parsed.vector.is_empty() {
            return Err(AiError::EmptyResponse(SERVICE));
        }

        debug!(dimensions = parsed.vector.len(), "Image vectorized");
        Ok(parsed.vector)
    }
}
