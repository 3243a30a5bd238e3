//! Router configuration for the web API.

use std::path::Path;
use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Json, Router,
};
use tower::ServiceBuilder;
use tower_http::compression::predicate::{DefaultPredicate, NotForContentType, Predicate};
use tower_http::compression::CompressionLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use super::handlers::{
    clear_files, download_zip, get_analytics, list_files, preview_file, search_files,
    upload_files, AppState,
};
use super::middleware::create_cors_layer;
use super::openapi::{ApiDoc, OPENAPI_PATH};
use crate::config::WebConfig;
use crate::file::{Category, PUBLIC_PREFIX};

/// Create the main API router.
///
/// Stored files are served read-only under `/uploads/<category>`, one
/// directory per category. Request bodies on `/upload` are capped at
/// `max_request_bytes`.
pub fn create_router(
    app_state: Arc<AppState>,
    cors_origins: &[String],
    max_request_bytes: usize,
) -> Router {
    let upload_routes = Router::new()
        .route("/upload", post(upload_files))
        .layer(DefaultBodyLimit::max(max_request_bytes));

    let mut router: Router<Arc<AppState>> = Router::new()
        .merge(upload_routes)
        .route("/files", get(list_files))
        .route("/clear-files", post(clear_files))
        .route("/search", get(search_files))
        .route("/download-zip", get(download_zip))
        .route("/analytics", get(get_analytics))
        .route("/preview/:category/:filename", get(preview_file));

    for category in Category::ALL {
        router = router.nest_service(
            &format!("{PUBLIC_PREFIX}/{category}"),
            ServeDir::new(app_state.storage.category_dir(category)),
        );
    }

    router
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(create_cors_layer(cors_origins)),
        )
        .with_state(app_state)
}

/// Create a health check router.
pub fn create_health_router() -> Router {
    Router::new().route("/health", get(health_check))
}

/// Health check handler.
async fn health_check() -> &'static str {
    "OK"
}

/// Create a router serving the OpenAPI document.
pub fn create_openapi_router() -> Router {
    Router::new().route(OPENAPI_PATH, get(|| async { Json(ApiDoc::openapi()) }))
}

/// Create a router serving a static front-end as the fallback.
///
/// Returns `None` when the directory does not exist.
pub fn create_static_router(static_path: &str) -> Option<Router> {
    if !Path::new(static_path).is_dir() {
        tracing::warn!(
            path = %static_path,
            "Static directory not found, front-end will not be served"
        );
        return None;
    }

    let service = ServeDir::new(static_path).append_index_html_on_directories(true);
    Some(Router::new().fallback_service(service))
}

/// Assemble the complete application: API, health check, OpenAPI document,
/// optional static front-end and response compression.
///
/// Zip downloads are already compressed and are sent as they are.
pub fn create_app(
    app_state: Arc<AppState>,
    web_config: &WebConfig,
    max_request_bytes: usize,
) -> Router {
    let mut router = create_router(app_state, &web_config.cors_origins, max_request_bytes)
        .merge(create_health_router())
        .merge(create_openapi_router());

    if web_config.serve_static {
        if let Some(static_router) = create_static_router(&web_config.static_path) {
            router = router.merge(static_router);
        }
    }

    let predicate = DefaultPredicate::new().and(NotForContentType::new("application/zip"));
    router.layer(CompressionLayer::new().compress_when(predicate))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_health_router() {
        let response = create_health_router()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn test_static_router_missing_dir() {
        assert!(create_static_router("/nonexistent/sortbox/static").is_none());
    }

    #[tokio::test]
    async fn test_static_router_serves_index() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("index.html"), "<h1>sortbox</h1>").unwrap();

        let router = create_static_router(temp_dir.path().to_str().unwrap()).unwrap();
        let response = router
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }
}
