//! SEO metadata API endpoints
//!
//! Handles HTTP requests for per-route SEO metadata:
//! - GET  /api/v1/seo?route=/models/ava - Metadata for one route
//! - GET  /api/v1/admin/seo - All entries
//! - POST /api/v1/admin/seo - Create an entry
//! - PUT  /api/v1/admin/seo/{id} - Update an entry
//! - DELETE /api/v1/admin/seo/{id} - Delete an entry

use axum::{
    extract::{Path, Query, State},
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::middleware::{ApiError, AppState};
use crate::models::{CreateSeoEntryInput, SeoEntry, UpdateSeoEntryInput};
use crate::services::SeoServiceError;

/// Query parameters for the public SEO lookup
#[derive(Debug, Deserialize)]
pub struct SeoQuery {
    pub route: String,
}

/// Response for a single SEO entry
#[derive(Debug, Serialize)]
pub struct SeoEntryResponse {
    pub id: i64,
    pub route: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub og_image_url: Option<String>,
    pub no_index: bool,
}

impl From<SeoEntry> for SeoEntryResponse {
    fn from(entry: SeoEntry) -> Self {
        Self {
            id: entry.id,
            route: entry.route,
            title: entry.title,
            description: entry.description,
            og_image_url: entry.og_image_url,
            no_index: entry.no_index,
        }
    }
}

fn map_service_error(err: SeoServiceError) -> ApiError {
    match err {
        SeoServiceError::NotFound => ApiError::not_found("SEO entry not found"),
        SeoServiceError::RouteExists(route) => {
            ApiError::conflict(format!("SEO entry for route '{}' already exists", route))
        }
        SeoServiceError::ValidationError(msg) => ApiError::validation_error(msg),
        SeoServiceError::InternalError(e) => {
            tracing::error!("SEO operation failed: {:#}", e);
            ApiError::internal_error("SEO operation failed")
        }
    }
}

/// Build the public SEO router
pub fn public_router() -> Router<AppState> {
    Router::new().route("/", get(get_for_route))
}

/// Build the admin SEO router
pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_all))
        .route("/", post(create_entry))
        .route("/{id}", put(update_entry))
        .route("/{id}", delete(delete_entry))
}

/// GET /seo?route=...
async fn get_for_route(
    State(state): State<AppState>,
    Query(query): Query<SeoQuery>,
) -> Result<Json<SeoEntryResponse>, ApiError> {
    let entry = state
        .seo_service
        .get_by_route(&query.route)
        .await
        .map_err(|e| {
            tracing::error!("Failed to load SEO entry: {:#}", e);
            ApiError::internal_error("Failed to load SEO entry")
        })?
        .ok_or_else(|| ApiError::not_found("SEO entry not found"))?;

    Ok(Json(entry.into()))
}

/// GET /admin/seo
async fn list_all(State(state): State<AppState>) -> Result<Json<Vec<SeoEntryResponse>>, ApiError> {
    let entries = state.seo_service.list().await.map_err(|e| {
        tracing::error!("Failed to list SEO entries: {:#}", e);
        ApiError::internal_error("Failed to list SEO entries")
    })?;

    Ok(Json(entries.into_iter().map(Into::into).collect()))
}

/// POST /admin/seo
async fn create_entry(
    State(state): State<AppState>,
    Json(input): Json<CreateSeoEntryInput>,
) -> Result<Json<SeoEntryResponse>, ApiError> {
    let entry = state
        .seo_service
        .create(input)
        .await
        .map_err(map_service_error)?;

    Ok(Json(entry.into()))
}

/// PUT /admin/seo/{id}
async fn update_entry(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<UpdateSeoEntryInput>,
) -> Result<Json<SeoEntryResponse>, ApiError> {
    let entry = state
        .seo_service
        .update(id, input)
        .await
        .map_err(map_service_error)?;

    Ok(Json(entry.into()))
}

/// DELETE /admin/seo/{id}
async fn delete_entry(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state
        .seo_service
        .delete(id)
        .await
        .map_err(map_service_error)?;

    Ok(Json(serde_json::json!({ "ok": true })))
}
