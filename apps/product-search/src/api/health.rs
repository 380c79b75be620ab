//! Readiness endpoint

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::get,
};
use axum_helpers::{HealthCheckFuture, run_health_checks};
use serde_json::{Value, json};
use std::sync::Arc;

use domain_products::ProductSearchBackend;

/// Create the readiness router
pub fn router(backend: Arc<dyn ProductSearchBackend>) -> Router {
    Router::new()
        .route("/ready", get(readiness_check))
        .with_state(backend)
}

/// Readiness check - pings the selected search backend
async fn readiness_check(
    State(backend): State<Arc<dyn ProductSearchBackend>>,
) -> (StatusCode, Json<Value>) {
    let checks: Vec<(&str, HealthCheckFuture)> = vec![(
        backend.name(),
        Box::pin(async { backend.ping().await.map_err(|e| e.to_string()) }),
    )];

    let (status, Json(mut body)) = match run_health_checks(checks).await {
        Ok(ok) => ok,
        Err(err) => err,
    };
    body["backend"] = json!(backend.name());
    (status, Json(body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use domain_products::{CatalogFile, LocalCatalog};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    async fn ready(backend: Arc<dyn ProductSearchBackend>) -> (StatusCode, Value) {
        let response = router(backend)
            .oneshot(Request::get("/ready").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_ready_with_catalog_present() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.json");
        tokio::fs::write(&path, b"[]").await.unwrap();
        let backend = Arc::new(LocalCatalog::new(Arc::new(CatalogFile::new(path)), 10));

        let (status, body) = ready(backend).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["backend"], "local");
        assert_eq!(body["local"], "connected");
    }

    #[tokio::test]
    async fn test_not_ready_without_catalog() {
        let backend = Arc::new(LocalCatalog::new(
            Arc::new(CatalogFile::new("/missing/catalog.json")),
            10,
        ));

        let (status, body) = ready(backend).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["status"], "not ready");
    }
}
