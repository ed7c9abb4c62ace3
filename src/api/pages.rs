//! Legal page API endpoints
//!
//! Handles HTTP requests for legal/info pages:
//! - GET  /api/v1/pages - Published pages
//! - GET  /api/v1/pages/{slug} - One published page
//! - GET  /api/v1/admin/pages - All pages
//! - POST /api/v1/admin/pages - Create a page
//! - PUT  /api/v1/admin/pages/{id} - Update a page
//! - DELETE /api/v1/admin/pages/{id} - Delete a page

use axum::{
    extract::{Path, State},
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::Serialize;

use crate::api::middleware::{ApiError, AppState};
use crate::models::{CreatePageInput, Page, UpdatePageInput};
use crate::services::PageServiceError;

/// Response for a single page
#[derive(Debug, Serialize)]
pub struct PageResponse {
    pub id: i64,
    pub slug: String,
    pub title: String,
    pub content: String,
    pub content_html: String,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Page> for PageResponse {
    fn from(page: Page) -> Self {
        Self {
            id: page.id,
            slug: page.slug,
            title: page.title,
            content: page.content,
            content_html: page.content_html,
            status: page.status.to_string(),
            created_at: page.created_at.to_rfc3339(),
            updated_at: page.updated_at.to_rfc3339(),
        }
    }
}

fn map_service_error(err: PageServiceError) -> ApiError {
    match err {
        PageServiceError::NotFound => ApiError::not_found("Page not found"),
        PageServiceError::SlugExists(slug) => {
            ApiError::conflict(format!("Page with slug '{}' already exists", slug))
        }
        PageServiceError::ValidationError(msg) => ApiError::validation_error(msg),
        PageServiceError::InternalError(e) => {
            tracing::error!("Page operation failed: {:#}", e);
            ApiError::internal_error("Page operation failed")
        }
    }
}

/// Build the public pages router
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_published))
        .route("/{slug}", get(get_published))
}

/// Build the admin pages router
pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_all))
        .route("/", post(create_page))
        .route("/{id}", put(update_page))
        .route("/{id}", delete(delete_page))
}

/// GET /pages
async fn list_published(State(state): State<AppState>) -> Result<Json<Vec<PageResponse>>, ApiError> {
    let pages = state.page_service.list_published().await.map_err(|e| {
        tracing::error!("Failed to list pages: {:#}", e);
        ApiError::internal_error("Failed to list pages")
    })?;

    Ok(Json(pages.into_iter().map(Into::into).collect()))
}

/// GET /pages/{slug}
async fn get_published(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<PageResponse>, ApiError> {
    let page = state
        .page_service
        .get_published_by_slug(&slug)
        .await
        .map_err(|e| {
            tracing::error!("Failed to load page: {:#}", e);
            ApiError::internal_error("Failed to load page")
        })?
        .ok_or_else(|| ApiError::not_found("Page not found"))?;

    Ok(Json(page.into()))
}

/// GET /admin/pages
async fn list_all(State(state): State<AppState>) -> Result<Json<Vec<PageResponse>>, ApiError> {
    let pages = state.page_service.list().await.map_err(|e| {
        tracing::error!("Failed to list pages: {:#}", e);
        ApiError::internal_error("Failed to list pages")
    })?;

    Ok(Json(pages.into_iter().map(Into::into).collect()))
}

/// POST /admin/pages
async fn create_page(
    State(state): State<AppState>,
    Json(input): Json<CreatePageInput>,
) -> Result<Json<PageResponse>, ApiError> {
    let page = state
        .page_service
        .create(input)
        .await
        .map_err(map_service_error)?;

    Ok(Json(page.into()))
}

/// PUT /admin/pages/{id}
async fn update_page(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<UpdatePageInput>,
) -> Result<Json<PageResponse>, ApiError> {
    let page = state
        .page_service
        .update(id, input)
        .await
        .map_err(map_service_error)?;

    Ok(Json(page.into()))
}

/// DELETE /admin/pages/{id}
async fn delete_page(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state
        .page_service
        .delete(id)
        .await
        .map_err(map_service_error)?;

    Ok(Json(serde_json::json!({ "ok": true })))
}
