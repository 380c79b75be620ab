//! HTTP handlers for the product search API

use std::str::FromStr;
use std::sync::Arc;

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use axum_helpers::{
    errors::responses::{BadGatewayResponse, BadRequestResponse, InternalServerErrorResponse},
    FormFields,
};
use domain_ai::EmbeddingModel;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::info;
use utoipa::{OpenApi, ToSchema};

use crate::error::{ProductError, ProductResult};
use crate::models::{
    EmbeddingSource, MatchForm, MatchRequest, ProductId, ProductView, SearchForm, SearchRequest,
    SearchResponse, SimilarityMode, DEFAULT_LANGUAGE, DEFAULT_MAX_ITEMS,
};
use crate::seed::SeedService;
use crate::service::SearchService;

/// OpenAPI documentation for the product search API
#[derive(OpenApi)]
#[openapi(
    paths(search, match_image, seed_embeddings, seed_embeddings_large),
    components(
        schemas(SearchForm, MatchForm, SearchResponse, ProductView, ProductId, EmbeddingSource),
        responses(BadRequestResponse, BadGatewayResponse, InternalServerErrorResponse)
    ),
    tags(
        (name = "Search", description = "Text and image product search"),
        (name = "Seed", description = "Catalog embedding backfill")
    )
)]
pub struct ApiDoc;

/// OpenAPI documentation for the Azure Functions trigger routes, served at
/// the root rather than under `/api`
#[derive(OpenApi)]
#[openapi(
    paths(image_trigger),
    components(
        schemas(InvocationRequest, InvocationResponse),
        responses(BadRequestResponse)
    ),
    tags((name = "Triggers", description = "Azure Functions trigger handlers"))
)]
pub struct TriggerApiDoc;

/// Shared handler state
#[derive(Clone)]
pub struct ProductsState {
    pub search: Arc<SearchService>,
    pub seed: Arc<SeedService>,
}

impl ProductsState {
    pub fn new(search: SearchService, seed: SeedService) -> Self {
        Self {
            search: Arc::new(search),
            seed: Arc::new(seed),
        }
    }
}

/// Create the product search router
pub fn router(state: ProductsState) -> Router {
    Router::new()
        .route("/search", post(search))
        .route("/match", post(match_image))
        .route("/seed_embeddings", get(seed_embeddings))
        .route("/seed_embeddings_large", get(seed_embeddings_large))
        .with_state(state)
}

/// Create the trigger router. The Functions host posts invocations to
/// `/<function name>`, so this is merged at the root.
pub fn trigger_router() -> Router {
    Router::new().route("/image_trigger", post(image_trigger))
}

fn search_request(form: &FormFields) -> ProductResult<SearchRequest> {
    let query = form.text("query").ok_or_else(|| {
        ProductError::MissingField(
            "Please pass a query on the query string or in the request body".to_string(),
        )
    })?;

    let model = match form.text("embedding-model") {
        Some(value) => EmbeddingModel::from_str(value)
            .map_err(|_| ProductError::InvalidEmbeddingModel(value.to_string()))?,
        None => EmbeddingModel::default(),
    };

    Ok(SearchRequest {
        query: query.to_string(),
        model,
        mode: SimilarityMode::from_form(form.raw_text("similarity-mode")),
    })
}

fn match_request(form: &FormFields) -> ProductResult<MatchRequest> {
    let image = form.file("image_upload").ok_or_else(|| {
        ProductError::MissingField("Please upload an image as image_upload".to_string())
    })?;

    let max_items = match form.text("max_items") {
        Some(value) => value.parse::<usize>().map_err(|_| {
            ProductError::Validation(format!("max_items must be an integer, got '{}'", value))
        })?,
        None => DEFAULT_MAX_ITEMS,
    };

    let source = match form.text("embedding_source") {
        Some(value) => EmbeddingSource::from_str(value).map_err(|_| {
            ProductError::Validation(format!(
                "embedding_source must be 'text' or 'image', got '{}'",
                value
            ))
        })?,
        None => EmbeddingSource::default(),
    };

    Ok(MatchRequest {
        image: image.bytes.to_vec(),
        mime: image.mime().to_string(),
        max_items,
        language: form.text_or("language", DEFAULT_LANGUAGE).to_string(),
        source,
    })
}

/// Search products by free text
///
/// Rewrites the query into keywords, embeds it and runs a hybrid search.
#[utoipa::path(
    post,
    path = "/search",
    tag = "Search",
    request_body(content = SearchForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Keywords and matching products", body = SearchResponse),
        (status = 400, response = BadRequestResponse),
        (status = 502, response = BadGatewayResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn search(
    State(state): State<ProductsState>,
    form: FormFields,
) -> ProductResult<Json<SearchResponse>> {
    let request = search_request(&form)?;
    let response = state.search.search(request).await?;
    Ok(Json(response))
}

/// Find products that look like an uploaded photo
#[utoipa::path(
    post,
    path = "/match",
    tag = "Search",
    request_body(content = MatchForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Image description and matching products", body = SearchResponse),
        (status = 400, response = BadRequestResponse),
        (status = 502, response = BadGatewayResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn match_image(
    State(state): State<ProductsState>,
    form: FormFields,
) -> ProductResult<Json<SearchResponse>> {
    let request = match_request(&form)?;
    let response = state.search.match_image(request).await?;
    Ok(Json(response))
}

/// Fill missing ada-002 embeddings in the local catalog
#[utoipa::path(
    get,
    path = "/seed_embeddings",
    tag = "Seed",
    responses(
        (status = 200, description = "Catalog seeded", body = String, content_type = "text/plain"),
        (status = 502, response = BadGatewayResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn seed_embeddings(State(state): State<ProductsState>) -> ProductResult<&'static str> {
    state.seed.seed(EmbeddingModel::Ada002).await?;
    Ok("Successfully seeded embeddings")
}

/// Fill missing text-embedding-3-large embeddings in the local catalog
#[utoipa::path(
    get,
    path = "/seed_embeddings_large",
    tag = "Seed",
    responses(
        (status = 200, description = "Catalog seeded", body = String, content_type = "text/plain"),
        (status = 502, response = BadGatewayResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn seed_embeddings_large(State(state): State<ProductsState>) -> ProductResult<&'static str> {
    state.seed.seed(EmbeddingModel::Large3).await?;
    Ok("Successfully seeded large embeddings")
}

/// Azure Functions custom handler invocation payload
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct InvocationRequest {
    #[serde(rename = "Data", default)]
    #[schema(value_type = Object)]
    pub data: Map<String, Value>,
    #[serde(rename = "Metadata", default)]
    #[schema(value_type = Object)]
    pub metadata: Map<String, Value>,
}

impl InvocationRequest {
    /// Blob name from trigger metadata (`name`, else the `BlobTrigger` path)
    pub fn blob_name(&self) -> &str {
        ["name", "BlobTrigger"]
            .iter()
            .find_map(|key| self.metadata.get(*key).and_then(Value::as_str))
            .unwrap_or("<unknown>")
    }

    /// Blob size in bytes: declared content length, else the inline payload length
    pub fn blob_size(&self) -> usize {
        let declared = self
            .metadata
            .get("Properties")
            .and_then(|p| p.get("ContentLength").or_else(|| p.get("Length")))
            .and_then(Value::as_u64);
        match declared {
            Some(size) => size as usize,
            None => self
                .data
                .values()
                .filter_map(Value::as_str)
                .map(str::len)
                .sum(),
        }
    }
}

/// Azure Functions custom handler invocation response
#[derive(Debug, Serialize, ToSchema)]
pub struct InvocationResponse {
    #[serde(rename = "Outputs")]
    #[schema(value_type = Object)]
    pub outputs: Map<String, Value>,
    #[serde(rename = "Logs")]
    pub logs: Vec<String>,
}

/// Blob upload trigger; logs the new blob and produces no outputs
#[utoipa::path(
    post,
    path = "/image_trigger",
    tag = "Triggers",
    request_body = InvocationRequest,
    responses(
        (status = 200, description = "Invocation handled", body = InvocationResponse),
        (status = 400, response = BadRequestResponse)
    )
)]
async fn image_trigger(Json(invocation): Json<InvocationRequest>) -> Json<InvocationResponse> {
    let name = invocation.blob_name();
    let size = invocation.blob_size();
    info!(blob = %name, size, "Blob trigger processed blob");

    Json(InvocationResponse {
        outputs: Map::new(),
        logs: vec![format!("Name: {} Blob Size: {} bytes", name, size)],
    })
}
