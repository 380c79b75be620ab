//! Products Domain
//!
//! Hybrid product search over a catalog: keyword matching fused with vector
//! similarity, fed by the AI components in `domain_ai`.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  ← /search, /match, /seed_embeddings*, /image_trigger
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │  Services   │  ← SearchService, SeedService
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │  Backend    │  ← ProductSearchBackend: LocalCatalog or CosmosProductRepository
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Models    │  ← Product, requests, responses
//! └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use domain_products::{handlers, CatalogFile, LocalCatalog, SearchService, SeedService};
//!
//! let catalog = Arc::new(CatalogFile::new("data/test.json"));
//! let backend = Arc::new(LocalCatalog::new(catalog.clone(), 10));
//! let search = SearchService::new(backend, rewriter, embedder.clone(), describer);
//! let seed = SeedService::new(catalog, embedder);
//!
//! let router = handlers::router(handlers::ProductsState::new(search, seed));
//! ```

pub mod catalog;
pub mod config;
pub mod cosmos;
pub mod error;
pub mod fusion;
pub mod handlers;
pub mod keywords;
pub mod local;
pub mod models;
pub mod repository;
pub mod seed;
pub mod service;

#[cfg(test)]
mod test_support;

pub use catalog::CatalogFile;
pub use config::{CatalogConfig, CosmosConfig};
pub use cosmos::CosmosProductRepository;
pub use error::{ProductError, ProductResult};
pub use handlers::{ApiDoc, ProductsState, TriggerApiDoc};
pub use keywords::{KeywordError, KeywordQuery};
pub use local::LocalCatalog;
pub use models::{
    EmbeddingField, EmbeddingSource, MatchRequest, Product, ProductId, ProductView, SearchRequest,
    SearchResponse, SimilarityMode,
};
pub use repository::ProductSearchBackend;
pub use seed::{SeedReport, SeedService};
pub use service::SearchService;
