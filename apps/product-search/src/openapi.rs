//! OpenAPI documentation configuration

use utoipa::{Modify, OpenApi};

/// Combined OpenAPI documentation for all APIs
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Product Search API",
        version = "0.1.0",
        description = "Text and image product search backed by Azure OpenAI"
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server")
    ),
    nest(
        (path = "/api", api = domain_products::ApiDoc)
    ),
    modifiers(&RootTriggers)
)]
pub struct ApiDoc;

/// Trigger routes live at the root, next to `/health`
struct RootTriggers;

impl Modify for RootTriggers {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.merge(domain_products::TriggerApiDoc::openapi());
    }
}
