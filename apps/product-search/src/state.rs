//! Application state management.
//!
//! Builds the service graph once at startup. Everything downstream of
//! [`AppState`] is shared through `Arc`.

use std::future::Future;
use std::sync::Arc;

use domain_ai::{
    AzureEmbeddingFetcher, AzureImageDescriber, AzureOpenAIClient, AzureQueryRewriter,
    AzureVisionEmbedder, EmbeddingFetcher,
};
use domain_products::{
    CatalogFile, CosmosConfig, CosmosProductRepository, LocalCatalog, ProductSearchBackend,
    ProductsState, SearchService, SeedService,
};
use tracing::info;

use crate::config::{BackendKind, Config};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub backend: Arc<dyn ProductSearchBackend>,
    pub products: ProductsState,
}

impl AppState {
    pub async fn build(config: Config) -> eyre::Result<Self> {
        let client = Arc::new(AzureOpenAIClient::new(config.openai.clone()));
        let embedder: Arc<dyn EmbeddingFetcher> =
            Arc::new(AzureEmbeddingFetcher::new(client.clone()));

        // Seeding always writes the local catalog, whichever backend serves reads.
        let catalog = Arc::new(CatalogFile::new(config.catalog.path.clone()));

        let backend = select_backend(
            &config,
            || -> Arc<dyn ProductSearchBackend> {
                Arc::new(LocalCatalog::new(catalog.clone(), config.catalog.search_limit))
            },
            |cosmos| async move {
                let repository = CosmosProductRepository::connect(&cosmos).await?;
                repository.init_indexes().await;
                Ok(Arc::new(repository) as Arc<dyn ProductSearchBackend>)
            },
        )
        .await?;

        let mut search = SearchService::new(
            backend.clone(),
            Arc::new(AzureQueryRewriter::new(client.clone())),
            embedder.clone(),
            Arc::new(AzureImageDescriber::new(client)),
        );
        match &config.vision {
            Some(vision) => {
                search = search.with_image_embedder(Arc::new(AzureVisionEmbedder::new(vision.clone())));
            }
            None => info!("Vision not configured; embedding_source=image is disabled"),
        }

        let seed = SeedService::new(catalog, embedder);

        Ok(Self {
            config,
            backend,
            products: ProductsState::new(search, seed),
        })
    }
}

/// Choose the search backend: Cosmos DB when a connection string is
/// configured, the local catalog otherwise. Only the chosen factory runs.
pub async fn select_backend<L, C, F>(
    config: &Config,
    local: L,
    cosmos: C,
) -> eyre::Result<Arc<dyn ProductSearchBackend>>
where
    L: FnOnce() -> Arc<dyn ProductSearchBackend>,
    C: FnOnce(CosmosConfig) -> F,
    F: Future<Output = eyre::Result<Arc<dyn ProductSearchBackend>>>,
{
    match (BackendKind::from_config(config), &config.cosmos) {
        (BackendKind::Cosmos, Some(settings)) => {
            info!(database = %settings.database, collection = %settings.collection, "Using Cosmos DB backend");
            cosmos(settings.clone()).await
        }
        _ => {
            info!(path = %config.catalog.path.display(), "Using local catalog backend");
            Ok(local())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tests::test_config;
    use async_trait::async_trait;
    use domain_products::{EmbeddingField, Product, ProductResult};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingBackend {
        name: &'static str,
        searches: AtomicUsize,
    }

    impl CountingBackend {
        fn new(name: &'static str) -> Arc<Self> {
            Arc::new(Self {
                name,
                searches: AtomicUsize::new(0),
            })
        }

        fn searches(&self) -> usize {
            self.searches.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ProductSearchBackend for CountingBackend {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn search_products(
            &self,
            _original_query: &str,
            _keyword_query: &str,
            _embedding: &[f32],
            _field: EmbeddingField,
        ) -> ProductResult<Vec<Product>> {
            self.searches.fetch_add(1, Ordering::SeqCst);
            Ok(Vec::new())
        }

        async fn search_images(&self, _embedding: &[f32]) -> ProductResult<Vec<Product>> {
            Ok(Vec::new())
        }

        async fn ping(&self) -> ProductResult<()> {
            Ok(())
        }
    }

    async fn search_through(
        config: &Config,
        local: Arc<CountingBackend>,
        cosmos: Arc<CountingBackend>,
    ) -> Arc<dyn ProductSearchBackend> {
        let backend = select_backend(
            config,
            move || -> Arc<dyn ProductSearchBackend> { local },
            move |_| async move { Ok(cosmos as Arc<dyn ProductSearchBackend>) },
        )
        .await
        .unwrap();
        backend
            .search_products("shoes", "shoes", &[1.0], EmbeddingField::Embedding)
            .await
            .unwrap();
        backend
    }

    #[tokio::test]
    async fn test_local_catalog_serves_without_connection_string() {
        let config = test_config(None);
        let local = CountingBackend::new("local");
        let cosmos = CountingBackend::new("cosmos");

        let backend = search_through(&config, local.clone(), cosmos.clone()).await;

        assert_eq!(backend.name(), "local");
        assert_eq!(local.searches(), 1);
        assert_eq!(cosmos.searches(), 0);
    }

    #[tokio::test]
    async fn test_cosmos_serves_with_connection_string() {
        let config = test_config(Some("mongodb+srv://u:p@example.mongocluster.cosmos.azure.com"));
        let local = CountingBackend::new("local");
        let cosmos = CountingBackend::new("cosmos");

        let backend = search_through(&config, local.clone(), cosmos.clone()).await;

        assert_eq!(backend.name(), "cosmos");
        assert_eq!(local.searches(), 0);
        assert_eq!(cosmos.searches(), 1);
    }

    #[tokio::test]
    async fn test_cosmos_connection_failure_is_fatal() {
        let config = test_config(Some("mongodb+srv://u:p@example.mongocluster.cosmos.azure.com"));
        let local = CountingBackend::new("local");

        let result = select_backend(
            &config,
            move || -> Arc<dyn ProductSearchBackend> { local },
            |_| async { Err(eyre::eyre!("connection refused")) },
        )
        .await;

        assert!(result.is_err());
    }
}
