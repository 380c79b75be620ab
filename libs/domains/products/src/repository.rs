use async_trait::async_trait;

use crate::error::ProductResult;
use crate::models::{EmbeddingField, Product};

/// Product lookup against one backing store
///
/// Implementations: the local JSON catalog and Cosmos DB for MongoDB vCore.
/// Exactly one is chosen at startup.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProductSearchBackend: Send + Sync {
    /// Short backend name for logs and readiness output
    fn name(&self) -> &'static str;

    /// Hybrid search: keyword match on `keyword_query` fused with vector
    /// similarity of `embedding` against `field`. Best match first.
    async fn search_products(
        &self,
        original_query: &str,
        keyword_query: &str,
        embedding: &[f32],
        field: EmbeddingField,
    ) -> ProductResult<Vec<Product>>;

    /// Nearest neighbours by image embedding only
    async fn search_images(&self, embedding: &[f32]) -> ProductResult<Vec<Product>>;

    /// Cheap reachability check for readiness probes
    async fn ping(&self) -> ProductResult<()>;
}
