//! Fill missing embedding vectors in the local catalog.

use std::sync::Arc;

use domain_ai::{EmbeddingFetcher, EmbeddingModel};
use tracing::{info, instrument};

use crate::catalog::CatalogFile;
use crate::error::{ProductError, ProductResult};
use crate::models::EmbeddingField;

/// Outcome of one seed run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SeedReport {
    pub seeded: usize,
    pub skipped: usize,
}

pub struct SeedService {
    catalog: Arc<CatalogFile>,
    embedder: Arc<dyn EmbeddingFetcher>,
}

impl SeedService {
    pub fn new(catalog: Arc<CatalogFile>, embedder: Arc<dyn EmbeddingFetcher>) -> Self {
        Self { catalog, embedder }
    }

    /// Embed `name description` for every product whose field for `model` is
    /// empty, then rewrite the catalog.
    ///
    /// Products that already carry a vector cost no embedding call. A vector
    /// of the wrong length aborts the run before anything is written.
    #[instrument(skip(self), fields(path = %self.catalog.path().display()))]
    pub async fn seed(&self, model: EmbeddingModel) -> ProductResult<SeedReport> {
        let field = EmbeddingField::from(model);
        let _guard = self.catalog.lock().await;

        let mut products = self.catalog.load().await?;
        let mut report = SeedReport::default();

        for product in products.iter_mut() {
            if product.vector(field).is_some() {
                report.skipped += 1;
                continue;
            }

            let vector = self.embedder.embed(&product.embedding_input(), model).await?;
            if vector.len() != field.expected_dimensions() {
                return Err(ProductError::DimensionMismatch {
                    field,
                    expected: field.expected_dimensions(),
                    actual: vector.len(),
                });
            }
            product.set_vector(field, vector);
            report.seeded += 1;
        }

        self.catalog.save(&products).await?;
        info!(seeded = report.seeded, skipped = report.skipped, %field, "Seeded catalog");
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Product, ProductId};
    use crate::test_support::FakeEmbedder;

    async fn catalog_with(products: &[Product]) -> (tempfile::TempDir, Arc<CatalogFile>) {
        let dir = tempfile::tempdir().unwrap();
        let catalog = Arc::new(CatalogFile::new(dir.path().join("test.json")));
        catalog.save(products).await.unwrap();
        (dir, catalog)
    }

    #[tokio::test]
    async fn test_second_run_makes_no_embedding_calls() {
        let (_dir, catalog) = catalog_with(&[
            Product::new(ProductId::Int(1), "Tent", "Two person", 120.0),
            Product::new(ProductId::Int(2), "Stove", "Gas", 40.0),
        ])
        .await;
        let embedder = Arc::new(FakeEmbedder::new(1536));
        let service = SeedService::new(catalog.clone(), embedder.clone());

        let first = service.seed(EmbeddingModel::Ada002).await.unwrap();
        assert_eq!(first, SeedReport { seeded: 2, skipped: 0 });
        assert_eq!(embedder.inputs(), vec!["Tent Two person", "Stove Gas"]);

        let second = service.seed(EmbeddingModel::Ada002).await.unwrap();
        assert_eq!(second, SeedReport { seeded: 0, skipped: 2 });
        assert_eq!(embedder.inputs().len(), 2);

        let stored = catalog.load().await.unwrap();
        assert!(stored.iter().all(|p| p.embedding.as_ref().map(Vec::len) == Some(1536)));
        assert!(stored.iter().all(|p| p.embedding_large.is_none()));
    }

    #[tokio::test]
    async fn test_large_model_fills_its_own_field() {
        let mut seeded = Product::new(ProductId::Int(1), "Tent", "Two person", 120.0);
        seeded.embedding = Some(vec![0.0; 1536]);
        let (_dir, catalog) = catalog_with(&[seeded]).await;

        let service = SeedService::new(catalog.clone(), Arc::new(FakeEmbedder::new(1024)));
        let report = service.seed(EmbeddingModel::Large3).await.unwrap();

        assert_eq!(report.seeded, 1);
        let stored = catalog.load().await.unwrap();
        assert_eq!(stored[0].embedding_large.as_ref().map(Vec::len), Some(1024));
    }

    #[tokio::test]
    async fn test_wrong_dimensions_are_not_persisted() {
        let original = vec![Product::new(ProductId::Int(1), "Tent", "", 120.0)];
        let (_dir, catalog) = catalog_with(&original).await;

        let service = SeedService::new(catalog.clone(), Arc::new(FakeEmbedder::new(3)));
        let err = service.seed(EmbeddingModel::Ada002).await.unwrap_err();

        assert!(matches!(
            err,
            ProductError::DimensionMismatch { expected: 1536, actual: 3, .. }
        ));
        assert_eq!(catalog.load().await.unwrap(), original);
    }
}
