//! Search over the local JSON catalog.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, instrument};

use crate::catalog::CatalogFile;
use crate::error::ProductResult;
use crate::fusion::{DEFAULT_RRF_K, cosine_similarity, reciprocal_rank_fusion};
use crate::keywords::KeywordQuery;
use crate::models::{EmbeddingField, Product};
use crate::repository::ProductSearchBackend;

/// In-process hybrid search over the catalog file.
///
/// The file is re-read per request so seeded vectors are picked up without a
/// restart.
pub struct LocalCatalog {
    catalog: Arc<CatalogFile>,
    limit: usize,
}

impl LocalCatalog {
    pub fn new(catalog: Arc<CatalogFile>, limit: usize) -> Self {
        Self { catalog, limit }
    }

    pub fn catalog(&self) -> &Arc<CatalogFile> {
        &self.catalog
    }
}

/// Indices of products matching `query`, best term-frequency score first
fn keyword_ranking(products: &[Product], query: &KeywordQuery) -> Vec<usize> {
    let mut scored: Vec<(usize, f32)> = products
        .iter()
        .enumerate()
        .filter_map(|(i, p)| query.score(&p.searchable_text()).map(|s| (i, s)))
        .collect();
    scored.sort_by(|a, b| b.1.total_cmp(&a.1));
    scored.into_iter().map(|(i, _)| i).collect()
}

/// Indices of products with a comparable vector in `field`, most similar first
fn vector_ranking(products: &[Product], embedding: &[f32], field: EmbeddingField) -> Vec<usize> {
    let mut scored: Vec<(usize, f32)> = products
        .iter()
        .enumerate()
        .filter_map(|(i, p)| {
            let vector = p.vector(field)?;
            (vector.len() == embedding.len()).then(|| (i, cosine_similarity(vector, embedding)))
        })
        .collect();
    scored.sort_by(|a, b| b.1.total_cmp(&a.1));
    scored.into_iter().map(|(i, _)| i).collect()
}

/// Hybrid ranking of `products`: RRF of keyword and vector rankings, minus
/// products the query explicitly excludes.
pub fn rank_products(
    products: Vec<Product>,
    keyword_query: &str,
    embedding: &[f32],
    field: EmbeddingField,
    limit: usize,
) -> Vec<Product> {
    let query = KeywordQuery::parse_lenient(keyword_query);

    let keyword = keyword_ranking(&products, &query);
    let vector = vector_ranking(&products, embedding, field);
    debug!(
        keyword_hits = keyword.len(),
        vector_hits = vector.len(),
        "Ranked catalog"
    );

    let mut slots: Vec<Option<Product>> = products.into_iter().map(Some).collect();
    reciprocal_rank_fusion(&[keyword, vector], DEFAULT_RRF_K)
        .into_iter()
        .filter_map(|(i, _)| slots[i].take())
        .filter(|p| !query.excludes(&p.searchable_text()))
        .take(limit)
        .collect()
}

#[async_trait]
impl ProductSearchBackend for LocalCatalog {
    fn name(&self) -> &'static str {
        "local"
    }

    #[instrument(skip(self, embedding))]
    async fn search_products(
        &self,
        original_query: &str,
        keyword_query: &str,
        embedding: &[f32],
        field: EmbeddingField,
    ) -> ProductResult<Vec<Product>> {
        let products = self.catalog.load().await?;
        Ok(rank_products(products, keyword_query, embedding, field, self.limit))
    }

    #[instrument(skip(self, embedding))]
    async fn search_images(&self, embedding: &[f32]) -> ProductResult<Vec<Product>> {
        let products = self.catalog.load().await?;
        let ranking = vector_ranking(&products, embedding, EmbeddingField::ImageEmbedding);

        let mut slots: Vec<Option<Product>> = products.into_iter().map(Some).collect();
        Ok(ranking
            .into_iter()
            .filter_map(|i| slots[i].take())
            .take(self.limit)
            .collect())
    }

    async fn ping(&self) -> ProductResult<()> {
        tokio::fs::metadata(self.catalog.path()).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProductId;

    fn product(id: i64, name: &str, description: &str, embedding: Option<Vec<f32>>) -> Product {
        let mut p = Product::new(ProductId::Int(id), name, description, 10.0);
        p.embedding = embedding;
        p
    }

    fn ids(products: &[Product]) -> Vec<ProductId> {
        products.iter().map(|p| p.id.clone()).collect()
    }

    fn catalog() -> Vec<Product> {
        vec![
            product(1, "Red running shoes", "Lightweight shoes", Some(vec![0.9, 0.1])),
            product(2, "Red sneakers", "Canvas sneakers, red", Some(vec![1.0, 0.0])),
            product(3, "Blue shoes", "Leather shoes", Some(vec![0.1, 0.9])),
            product(4, "Camping stove", "Gas stove", None),
        ]
    }

    #[test]
    fn test_not_terms_are_excluded_from_fused_results() {
        let results = rank_products(
            catalog(),
            "red shoes NOT sneakers",
            &[1.0, 0.0],
            EmbeddingField::Embedding,
            10,
        );
        let ids = ids(&results);
        assert_eq!(ids[0], ProductId::Int(1));
        assert!(!ids.contains(&ProductId::Int(2)));
        // vector-only hits still come back, after keyword+vector hits
        assert!(ids.contains(&ProductId::Int(3)));
    }

    #[test]
    fn test_and_not_and_leading_not_exclude_terms() {
        let results = rank_products(
            catalog(),
            "red shoes AND NOT sneakers",
            &[1.0, 0.0],
            EmbeddingField::Embedding,
            10,
        );
        assert_eq!(ids(&results), vec![ProductId::Int(1), ProductId::Int(3)]);

        let results = rank_products(catalog(), "NOT sneakers", &[1.0, 0.0], EmbeddingField::Embedding, 10);
        assert_eq!(ids(&results), vec![ProductId::Int(1), ProductId::Int(3)]);
    }

    #[test]
    fn test_fallback_keywords_rank_by_vector_only() {
        let results = rank_products(catalog(), "0", &[0.0, 1.0], EmbeddingField::Embedding, 10);
        assert_eq!(
            ids(&results),
            vec![ProductId::Int(3), ProductId::Int(1), ProductId::Int(2)]
        );
    }

    #[test]
    fn test_unseeded_catalog_still_matches_keywords() {
        let results = rank_products(catalog(), "stove", &[1.0, 0.0], EmbeddingField::EmbeddingLarge, 10);
        assert_eq!(ids(&results), vec![ProductId::Int(4)]);
    }

    #[test]
    fn test_limit_applies_after_fusion() {
        let results = rank_products(catalog(), "shoes OR stove", &[1.0, 0.0], EmbeddingField::Embedding, 2);
        assert_eq!(results.len(), 2);
    }

    #[tokio::test]
    async fn test_search_images_reads_catalog_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = Arc::new(CatalogFile::new(dir.path().join("catalog.json")));

        let mut boot = product(1, "Boot", "Hiking boot", None);
        boot.image_embedding = Some(vec![0.0, 1.0]);
        let mut hat = product(2, "Hat", "Sun hat", None);
        hat.image_embedding = Some(vec![1.0, 0.0]);
        file.save(&[boot, hat, product(3, "Map", "Trail map", None)]).await.unwrap();

        let backend = LocalCatalog::new(file, 10);
        backend.ping().await.unwrap();

        let results = backend.search_images(&[0.9, 0.1]).await.unwrap();
        assert_eq!(ids(&results), vec![ProductId::Int(2), ProductId::Int(1)]);
    }
}
