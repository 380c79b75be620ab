//! Search service - query rewriting, embedding and backend lookup

use std::sync::Arc;

use domain_ai::{
    AiError, EmbeddingFetcher, EmbeddingModel, ImageDescriber, ImageEmbedder, QueryRewriter,
};
use tracing::{info, instrument};
use validator::Validate;

use crate::error::ProductResult;
use crate::models::{
    EmbeddingField, EmbeddingSource, MatchRequest, ProductView, SearchRequest, SearchResponse,
    SimilarityMode,
};
use crate::repository::ProductSearchBackend;

/// Orchestrates the AI components and the selected backend.
///
/// Every collaborator sits behind a trait object so the graph is assembled
/// once at startup and shared across requests.
pub struct SearchService {
    backend: Arc<dyn ProductSearchBackend>,
    rewriter: Arc<dyn QueryRewriter>,
    embedder: Arc<dyn EmbeddingFetcher>,
    describer: Arc<dyn ImageDescriber>,
    image_embedder: Option<Arc<dyn ImageEmbedder>>,
}

impl SearchService {
    pub fn new(
        backend: Arc<dyn ProductSearchBackend>,
        rewriter: Arc<dyn QueryRewriter>,
        embedder: Arc<dyn EmbeddingFetcher>,
        describer: Arc<dyn ImageDescriber>,
    ) -> Self {
        Self {
            backend,
            rewriter,
            embedder,
            describer,
            image_embedder: None,
        }
    }

    /// Enable `embedding_source=image` on `/match`
    pub fn with_image_embedder(mut self, image_embedder: Arc<dyn ImageEmbedder>) -> Self {
        self.image_embedder = Some(image_embedder);
        self
    }

    pub fn backend(&self) -> &Arc<dyn ProductSearchBackend> {
        &self.backend
    }

    /// Free-text search: rewrite to keywords, embed, hybrid search
    #[instrument(skip(self), fields(backend = self.backend.name()))]
    pub async fn search(&self, request: SearchRequest) -> ProductResult<SearchResponse> {
        let keywords = self.rewriter.rewrite(&request.query).await?;
        info!(%keywords, "Rewrote query");

        let embedding_input = match request.mode {
            SimilarityMode::Processed => keywords.as_str(),
            SimilarityMode::Raw => request.query.as_str(),
        };
        let embedding = self.embedder.embed(embedding_input, request.model).await?;

        let products = self
            .backend
            .search_products(
                &request.query,
                &keywords,
                &embedding,
                EmbeddingField::from(request.model),
            )
            .await?;

        Ok(SearchResponse {
            keywords,
            results: products.into_iter().map(ProductView::from).collect(),
        })
    }

    /// Image search: describe the photo, then search by the description's
    /// text embedding or by the photo's vision embedding.
    #[instrument(
        skip(self, request),
        fields(
            backend = self.backend.name(),
            source = %request.source,
            max_items = request.max_items,
            bytes = request.image.len()
        )
    )]
    pub async fn match_image(&self, request: MatchRequest) -> ProductResult<SearchResponse> {
        request.validate()?;

        let description = self
            .describer
            .describe(&request.image, &request.mime, &request.language)
            .await?;
        info!(%description, "Described image");

        let products = match request.source {
            EmbeddingSource::Image => {
                let image_embedder = self.image_embedder.as_ref().ok_or(AiError::VisionDisabled)?;
                let embedding = image_embedder
                    .embed_image(&request.image, &request.mime)
                    .await?;
                self.backend.search_images(&embedding).await?
            }
            EmbeddingSource::Text => {
                let embedding = self
                    .embedder
                    .embed(&description, EmbeddingModel::Ada002)
                    .await?;
                self.backend
                    .search_products(
                        &description,
                        &description,
                        &embedding,
                        EmbeddingField::Embedding,
                    )
                    .await?
            }
        };

        Ok(SearchResponse {
            keywords: description,
            results: products
                .into_iter()
                .take(request.max_items)
                .map(ProductView::from)
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProductError;
    use crate::models::{Product, ProductId};
    use crate::repository::MockProductSearchBackend;
    use crate::test_support::{FakeDescriber, FakeEmbedder, FakeImageEmbedder, FakeRewriter};

    fn products(count: i64) -> Vec<Product> {
        (1..=count)
            .map(|i| Product::new(ProductId::Int(i), format!("Product {}", i), "", 1.0))
            .collect()
    }

    fn service(backend: MockProductSearchBackend, embedder: Arc<FakeEmbedder>) -> SearchService {
        SearchService::new(
            Arc::new(backend),
            Arc::new(FakeRewriter::replying("red shoes NOT sneakers")),
            embedder,
            Arc::new(FakeDescriber::replying("a red leather boot")),
        )
    }

    fn match_request(source: EmbeddingSource, max_items: usize) -> MatchRequest {
        MatchRequest {
            image: b"PNGDATA".to_vec(),
            mime: "image/png".to_string(),
            max_items,
            language: "English".to_string(),
            source,
        }
    }

    #[tokio::test]
    async fn test_search_returns_rewritten_keywords() {
        let mut backend = MockProductSearchBackend::new();
        backend.expect_name().return_const("mock");
        backend
            .expect_search_products()
            .withf(|original, keywords, _, field| {
                original == "red shoes, not sneakers"
                    && keywords == "red shoes NOT sneakers"
                    && *field == EmbeddingField::Embedding
            })
            .times(1)
            .returning(|_, _, _, _| Ok(products(2)));

        let embedder = Arc::new(FakeEmbedder::new(4));
        let service = service(backend, embedder.clone());

        let response = service
            .search(SearchRequest {
                query: "red shoes, not sneakers".to_string(),
                model: EmbeddingModel::Ada002,
                mode: SimilarityMode::Processed,
            })
            .await
            .unwrap();

        assert_eq!(response.keywords, "red shoes NOT sneakers");
        assert_eq!(response.results.len(), 2);
        assert_eq!(embedder.inputs(), vec!["red shoes NOT sneakers".to_string()]);
    }

    #[tokio::test]
    async fn test_raw_mode_embeds_original_query_on_large_field() {
        let mut backend = MockProductSearchBackend::new();
        backend.expect_name().return_const("mock");
        backend
            .expect_search_products()
            .withf(|_, _, embedding, field| {
                embedding.len() == 1024 && *field == EmbeddingField::EmbeddingLarge
            })
            .returning(|_, _, _, _| Ok(Vec::new()));

        let embedder = Arc::new(FakeEmbedder::new(1024));
        let service = service(backend, embedder.clone());

        service
            .search(SearchRequest {
                query: "zapatos rojos".to_string(),
                model: EmbeddingModel::Large3,
                mode: SimilarityMode::Raw,
            })
            .await
            .unwrap();

        assert_eq!(embedder.inputs(), vec!["zapatos rojos".to_string()]);
    }

    #[tokio::test]
    async fn test_match_text_source_searches_by_description_and_truncates() {
        let mut backend = MockProductSearchBackend::new();
        backend.expect_name().return_const("mock");
        backend
            .expect_search_products()
            .withf(|original, keywords, _, field| {
                original == "a red leather boot"
                    && keywords == "a red leather boot"
                    && *field == EmbeddingField::Embedding
            })
            .returning(|_, _, _, _| Ok(products(5)));

        let service = service(backend, Arc::new(FakeEmbedder::new(4)));
        let response = service
            .match_image(match_request(EmbeddingSource::Text, 3))
            .await
            .unwrap();

        assert_eq!(response.keywords, "a red leather boot");
        let ids: Vec<_> = response.results.iter().map(|p| p.id.clone()).collect();
        assert_eq!(ids, vec![ProductId::Int(1), ProductId::Int(2), ProductId::Int(3)]);
    }

    #[tokio::test]
    async fn test_match_image_source_uses_vision_embedding() {
        let mut backend = MockProductSearchBackend::new();
        backend.expect_name().return_const("mock");
        backend
            .expect_search_images()
            .withf(|embedding| embedding == &[0.5f32, 0.5][..])
            .returning(|_| Ok(products(1)));
        backend.expect_search_products().never();

        let embedder = Arc::new(FakeEmbedder::new(4));
        let service = service(backend, embedder.clone())
            .with_image_embedder(Arc::new(FakeImageEmbedder::replying(vec![0.5, 0.5])));

        let response = service
            .match_image(match_request(EmbeddingSource::Image, 10))
            .await
            .unwrap();

        assert_eq!(response.results.len(), 1);
        assert!(embedder.inputs().is_empty());
    }

    #[tokio::test]
    async fn test_match_image_source_without_vision_is_rejected() {
        let mut backend = MockProductSearchBackend::new();
        backend.expect_name().return_const("mock");
        backend.expect_search_images().never();

        let service = service(backend, Arc::new(FakeEmbedder::new(4)));
        let err = service
            .match_image(match_request(EmbeddingSource::Image, 10))
            .await
            .unwrap_err();

        assert!(matches!(err, ProductError::Ai(AiError::VisionDisabled)));
    }

    #[tokio::test]
    async fn test_match_rejects_out_of_range_max_items() {
        let mut backend = MockProductSearchBackend::new();
        backend.expect_name().return_const("mock");

        let service = service(backend, Arc::new(FakeEmbedder::new(4)));
        let err = service
            .match_image(match_request(EmbeddingSource::Text, 0))
            .await
            .unwrap_err();

        assert!(matches!(err, ProductError::Validation(_)));
    }
}
