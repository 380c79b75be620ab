//! Azure Cosmos DB for MongoDB vCore implementation of ProductSearchBackend

use std::collections::HashMap;

use async_trait::async_trait;
use futures_util::TryStreamExt;
use mongodb::{
    bson::{doc, from_document, Bson, Document},
    options::{ClientOptions, IndexOptions},
    Client, Collection, Database, IndexModel,
};
use tracing::{info, instrument, warn};

use crate::config::CosmosConfig;
use crate::error::{ProductError, ProductResult};
use crate::fusion::{reciprocal_rank_fusion, DEFAULT_RRF_K};
use crate::keywords::KeywordQuery;
use crate::models::{EmbeddingField, Product, ProductId};
use crate::repository::ProductSearchBackend;

const APP_NAME: &str = "product-search";

/// Cosmos DB vCore repository: `cosmosSearch` vector queries plus `$text`
pub struct CosmosProductRepository {
    database: Database,
    collection: Collection<Document>,
    limit: usize,
}

impl CosmosProductRepository {
    pub fn new(database: &Database, collection_name: &str, limit: usize) -> Self {
        Self {
            database: database.clone(),
            collection: database.collection::<Document>(collection_name),
            limit,
        }
    }

    /// Build a client from the connection string. No I/O happens until the
    /// first command.
    pub async fn connect(config: &CosmosConfig) -> ProductResult<Self> {
        let mut options = ClientOptions::parse(&config.connection_string).await?;
        options.app_name = Some(APP_NAME.to_string());

        let client = Client::with_options(options)?;
        let database = client.database(&config.database);
        Ok(Self::new(&database, &config.collection, config.search_limit))
    }

    /// Create the text index and one vector index per embedding field.
    ///
    /// Failures are logged and skipped; an existing index with other options
    /// must be dropped by hand.
    pub async fn init_indexes(&self) {
        let text_index = IndexModel::builder()
            .keys(doc! { "name": "text", "description": "text" })
            .options(
                IndexOptions::builder()
                    .name("idx_text_search".to_string())
                    .build(),
            )
            .build();
        match self.collection.create_index(text_index).await {
            Ok(_) => info!("Text index ready"),
            Err(e) => warn!(error = %e, "Could not create text index"),
        }

        for field in [
            EmbeddingField::Embedding,
            EmbeddingField::EmbeddingLarge,
            EmbeddingField::ImageEmbedding,
        ] {
            let command = vector_index_command(self.collection.name(), field);
            match self.database.run_command(command).await {
                Ok(_) => info!(%field, "Vector index ready"),
                Err(e) => warn!(%field, error = %e, "Could not create vector index"),
            }
        }
    }

    async fn run(&self, pipeline: Vec<Document>) -> ProductResult<Vec<Product>> {
        let documents: Vec<Document> = self.collection.aggregate(pipeline).await?.try_collect().await?;
        documents
            .into_iter()
            .map(|d| {
                from_document::<Product>(d)
                    .map_err(|e| ProductError::Database(format!("Unreadable product document: {}", e)))
            })
            .collect()
    }
}

fn vector_index_command(collection: &str, field: EmbeddingField) -> Document {
    let path = field.to_string();
    doc! {
        "createIndexes": collection,
        "indexes": [{
            "name": format!("idx_vector_{}", field),
            "key": { path: "cosmosSearch" },
            "cosmosSearchOptions": {
                "kind": "vector-ivf",
                "numLists": 1,
                "similarity": "COS",
                "dimensions": field.expected_dimensions() as i32,
            }
        }]
    }
}

/// Expose `_id` as `id` when documents have no `id` of their own
fn normalize_stages() -> Vec<Document> {
    vec![
        doc! { "$addFields": { "id": { "$ifNull": ["$id", { "$toString": "$_id" }] } } },
        doc! { "$project": { "_id": 0 } },
    ]
}

fn vector_pipeline(field: EmbeddingField, embedding: &[f32], k: usize) -> Vec<Document> {
    let vector: Vec<Bson> = embedding.iter().map(|v| Bson::Double(f64::from(*v))).collect();
    let mut pipeline = vec![doc! {
        "$search": {
            "cosmosSearch": {
                "vector": vector,
                "path": field.to_string(),
                "k": k as i32,
            },
            "returnStoredSource": true,
        }
    }];
    pipeline.extend(normalize_stages());
    pipeline
}

fn text_pipeline(search: &str, k: usize) -> Vec<Document> {
    let mut pipeline = vec![
        doc! { "$match": { "$text": { "$search": search } } },
        doc! { "$sort": { "score": { "$meta": "textScore" } } },
        doc! { "$limit": k as i64 },
    ];
    pipeline.extend(normalize_stages());
    pipeline
}

/// RRF of the two result lists, dropping explicit exclusions
fn fuse(
    keyword_hits: Vec<Product>,
    vector_hits: Vec<Product>,
    query: &KeywordQuery,
    limit: usize,
) -> Vec<Product> {
    let keyword_ids: Vec<ProductId> = keyword_hits.iter().map(|p| p.id.clone()).collect();
    let vector_ids: Vec<ProductId> = vector_hits.iter().map(|p| p.id.clone()).collect();

    let mut by_id: HashMap<ProductId, Product> = HashMap::new();
    for product in vector_hits.into_iter().chain(keyword_hits) {
        by_id.entry(product.id.clone()).or_insert(product);
    }

    reciprocal_rank_fusion(&[keyword_ids, vector_ids], DEFAULT_RRF_K)
        .into_iter()
        .filter_map(|(id, _)| by_id.remove(&id))
        .filter(|p| !query.excludes(&p.searchable_text()))
        .take(limit)
        .collect()
}

#[async_trait]
impl ProductSearchBackend for CosmosProductRepository {
    fn name(&self) -> &'static str {
        "cosmos"
    }

    #[instrument(skip(self, embedding))]
    async fn search_products(
        &self,
        original_query: &str,
        keyword_query: &str,
        embedding: &[f32],
        field: EmbeddingField,
    ) -> ProductResult<Vec<Product>> {
        let query = KeywordQuery::parse_lenient(keyword_query);

        let vector_hits = self.run(vector_pipeline(field, embedding, self.limit)).await?;
        let keyword_hits = match query.to_text_search() {
            Some(search) => self.run(text_pipeline(&search, self.limit)).await?,
            None => Vec::new(),
        };

        Ok(fuse(keyword_hits, vector_hits, &query, self.limit))
    }

    #[instrument(skip(self, embedding))]
    async fn search_images(&self, embedding: &[f32]) -> ProductResult<Vec<Product>> {
        self.run(vector_pipeline(
            EmbeddingField::ImageEmbedding,
            embedding,
            self.limit,
        ))
        .await
    }

    async fn ping(&self) -> ProductResult<()> {
        self.database.run_command(doc! { "ping": 1 }).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: i64, name: &str) -> Product {
        Product::new(ProductId::Int(id), name, "", 1.0)
    }

    #[test]
    fn test_vector_pipeline_shape() {
        let pipeline = vector_pipeline(EmbeddingField::EmbeddingLarge, &[0.5, 0.25], 5);

        let search = pipeline[0].get_document("$search").unwrap();
        let cosmos = search.get_document("cosmosSearch").unwrap();
        assert_eq!(cosmos.get_str("path").unwrap(), "embedding_large");
        assert_eq!(cosmos.get_i32("k").unwrap(), 5);
        assert_eq!(cosmos.get_array("vector").unwrap().len(), 2);
        assert!(search.get_bool("returnStoredSource").unwrap());
        assert!(pipeline.last().unwrap().contains_key("$project"));
    }

    #[test]
    fn test_text_pipeline_shape() {
        let pipeline = text_pipeline("red shoes -sneakers", 10);
        let text = pipeline[0]
            .get_document("$match")
            .and_then(|m| m.get_document("$text"))
            .unwrap();
        assert_eq!(text.get_str("$search").unwrap(), "red shoes -sneakers");
        assert_eq!(pipeline[2].get_i64("$limit").unwrap(), 10);
    }

    #[test]
    fn test_vector_index_dimensions() {
        let command = vector_index_command("products", EmbeddingField::Embedding);
        let index = command.get_array("indexes").unwrap()[0].as_document().unwrap();
        let options = index.get_document("cosmosSearchOptions").unwrap();
        assert_eq!(options.get_i32("dimensions").unwrap(), 1536);
        assert_eq!(index.get_document("key").unwrap().get_str("embedding").unwrap(), "cosmosSearch");
    }

    #[test]
    fn test_fuse_prefers_products_in_both_lists() {
        let query = KeywordQuery::parse("tent NOT stove").unwrap();
        let keyword_hits = vec![product(1, "Tent"), product(2, "Tent footprint")];
        let vector_hits = vec![product(2, "Tent footprint"), product(3, "Camp stove"), product(4, "Tarp")];

        let fused = fuse(keyword_hits, vector_hits, &query, 10);
        let ids: Vec<_> = fused.iter().map(|p| p.id.clone()).collect();
        assert_eq!(ids, vec![ProductId::Int(2), ProductId::Int(1), ProductId::Int(4)]);
    }
}
