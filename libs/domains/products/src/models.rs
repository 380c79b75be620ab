use std::fmt;

use domain_ai::EmbeddingModel;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;
use validator::Validate;

/// Catalog identifier; catalogs use either integer or string keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum ProductId {
    Int(i64),
    Text(String),
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProductId::Int(id) => write!(f, "{}", id),
            ProductId::Text(id) => f.write_str(id),
        }
    }
}

/// Vector field of a product document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum EmbeddingField {
    Embedding,
    EmbeddingLarge,
    ImageEmbedding,
}

impl EmbeddingField {
    /// Length a populated vector in this field must have
    pub fn expected_dimensions(&self) -> usize {
        match self {
            EmbeddingField::Embedding => EmbeddingModel::Ada002.vector_len(),
            EmbeddingField::EmbeddingLarge => EmbeddingModel::Large3.vector_len(),
            EmbeddingField::ImageEmbedding => 1024,
        }
    }
}

impl From<EmbeddingModel> for EmbeddingField {
    fn from(model: EmbeddingModel) -> Self {
        match model {
            EmbeddingModel::Ada002 => EmbeddingField::Embedding,
            EmbeddingModel::Large3 => EmbeddingField::EmbeddingLarge,
        }
    }
}

/// Catalog product, as stored in the JSON catalog or the document store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding_large: Option<Vec<f32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_embedding: Option<Vec<f32>>,
    /// Catalog fields this service does not interpret
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Product {
    pub fn new(id: ProductId, name: impl Into<String>, description: impl Into<String>, price: f64) -> Self {
        Self {
            id,
            name: name.into(),
            description: description.into(),
            price,
            image: None,
            embedding: None,
            embedding_large: None,
            image_embedding: None,
            extra: Map::new(),
        }
    }

    pub fn vector(&self, field: EmbeddingField) -> Option<&[f32]> {
        match field {
            EmbeddingField::Embedding => self.embedding.as_deref(),
            EmbeddingField::EmbeddingLarge => self.embedding_large.as_deref(),
            EmbeddingField::ImageEmbedding => self.image_embedding.as_deref(),
        }
    }

    pub fn set_vector(&mut self, field: EmbeddingField, vector: Vec<f32>) {
        let slot = match field {
            EmbeddingField::Embedding => &mut self.embedding,
            EmbeddingField::EmbeddingLarge => &mut self.embedding_large,
            EmbeddingField::ImageEmbedding => &mut self.image_embedding,
        };
        *slot = Some(vector);
    }

    /// Text embedded when seeding: name and description joined by a space
    pub fn embedding_input(&self) -> String {
        format!("{} {}", self.name, self.description)
    }

    /// Text searched by keyword queries
    pub fn searchable_text(&self) -> String {
        self.embedding_input()
    }
}

/// Product as returned by the search endpoints, without vectors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ProductView {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl From<Product> for ProductView {
    fn from(product: Product) -> Self {
        Self {
            id: product.id,
            name: product.name,
            description: product.description,
            price: product.price,
            image: product.image,
        }
    }
}

/// Whether `/search` embeds the rewritten keywords or the raw query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SimilarityMode {
    #[default]
    Processed,
    Raw,
}

impl SimilarityMode {
    pub const PROCESSED: &'static str = "similarity-processed";

    /// An absent field or exactly `similarity-processed` selects
    /// [`SimilarityMode::Processed`]; any other value, blank included,
    /// embeds the raw query.
    pub fn from_form(value: Option<&str>) -> Self {
        match value {
            None | Some(Self::PROCESSED) => SimilarityMode::Processed,
            Some(_) => SimilarityMode::Raw,
        }
    }
}

/// Which vector `/match` searches with
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingSource {
    /// Embed the generated description and run a product search
    #[default]
    Text,
    /// Vision-embed the uploaded image and run an image search
    Image,
}

#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub query: String,
    pub model: EmbeddingModel,
    pub mode: SimilarityMode,
}

#[derive(Debug, Clone, Validate)]
pub struct MatchRequest {
    pub image: Vec<u8>,
    pub mime: String,
    #[validate(range(min = 1, max = 100, message = "max_items must be between 1 and 100"))]
    pub max_items: usize,
    #[validate(length(min = 1, max = 40))]
    pub language: String,
    pub source: EmbeddingSource,
}

pub const DEFAULT_MAX_ITEMS: usize = 10;
pub const DEFAULT_LANGUAGE: &str = "English";

/// Response body of `/search` and `/match`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SearchResponse {
    /// Keyword query (for `/match`, the generated image description)
    pub keywords: String,
    pub results: Vec<ProductView>,
}

/// `/search` form fields (documentation only)
#[derive(Deserialize, ToSchema)]
pub struct SearchForm {
    /// Free-text search question
    pub query: String,
    /// `text-embedding-ada-002` (default) or `text-embedding-3-large`
    #[serde(rename = "embedding-model")]
    pub embedding_model: Option<String>,
    /// `similarity-processed` (default) embeds the keywords, anything else the raw query
    #[serde(rename = "similarity-mode")]
    pub similarity_mode: Option<String>,
}

/// `/match` multipart fields (documentation only)
#[derive(Deserialize, ToSchema)]
pub struct MatchForm {
    #[schema(value_type = String, format = Binary)]
    pub image_upload: Vec<u8>,
    /// 1 to 100, default 10
    pub max_items: Option<usize>,
    /// Response language, default English
    pub language: Option<String>,
    pub embedding_source: Option<EmbeddingSource>,
}
