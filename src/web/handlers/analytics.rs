//! Storage analytics handler.

use std::sync::Arc;

use axum::{extract::State, Json};

use crate::web::dto::AnalyticsResponse;
use crate::web::handlers::AppState;

/// GET /analytics - File counts and sizes, overall and per category.
///
/// Every category is reported, with zeros when empty.
#[utoipa::path(
    get,
    path = "/analytics",
    tag = "analytics",
    responses(
        (status = 200, description = "Storage statistics", body = AnalyticsResponse)
    )
)]
pub async fn get_analytics(State(state): State<Arc<AppState>>) -> Json<AnalyticsResponse> {
    let stats = state.storage.stats().await;
    Json(AnalyticsResponse::from(stats))
}
