//! API routes module

pub mod health;

use std::io;
use std::sync::Arc;

use axum::Router;
use axum_helpers::server::{create_router, health_router};
use domain_products::ProductSearchBackend;

use crate::config::Config;
use crate::openapi::ApiDoc;
use crate::state::AppState;

/// Create all API routes
/// Note: These are nested under /api by axum_helpers::create_router
pub fn routes(state: &AppState) -> Router {
    domain_products::handlers::router(state.products.clone())
}

/// Full application router: `/api` routes and docs, plus the root-level
/// trigger and health endpoints.
pub fn app(
    api_routes: Router,
    config: &Config,
    backend: Arc<dyn ProductSearchBackend>,
) -> io::Result<Router> {
    let router = create_router::<ApiDoc>(api_routes, &config.environment, config.server.body_limit)?;

    Ok(router
        .merge(domain_products::handlers::trigger_router())
        .merge(health_router(config.app))
        .merge(health::router(backend)))
}
