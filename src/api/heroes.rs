//! Hero carousel API endpoints
//!
//! Handles HTTP requests for hero slides:
//! - GET  /api/v1/heroes - Active slides for the landing page
//! - GET  /api/v1/admin/heroes - All slides
//! - POST /api/v1/admin/heroes - Create a slide
//! - PUT  /api/v1/admin/heroes/{id} - Update a slide
//! - DELETE /api/v1/admin/heroes/{id} - Delete a slide

use axum::{
    extract::{Path, State},
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::Serialize;

use crate::api::middleware::{ApiError, AppState};
use crate::models::{CreateHeroSlideInput, HeroSlide, UpdateHeroSlideInput};
use crate::services::HeroServiceError;

/// Response for a single hero slide
#[derive(Debug, Serialize)]
pub struct HeroSlideResponse {
    pub id: i64,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    pub image_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link_url: Option<String>,
    pub sort_order: i32,
    pub active: bool,
}

impl From<HeroSlide> for HeroSlideResponse {
    fn from(slide: HeroSlide) -> Self {
        Self {
            id: slide.id,
            title: slide.title,
            subtitle: slide.subtitle,
            image_url: slide.image_url,
            link_url: slide.link_url,
            sort_order: slide.sort_order,
            active: slide.active,
        }
    }
}

fn map_service_error(err: HeroServiceError) -> ApiError {
    match err {
        HeroServiceError::NotFound => ApiError::not_found("Hero slide not found"),
        HeroServiceError::ValidationError(msg) => ApiError::validation_error(msg),
        HeroServiceError::InternalError(e) => {
            tracing::error!("Hero slide operation failed: {:#}", e);
            ApiError::internal_error("Hero slide operation failed")
        }
    }
}

/// Build the public heroes router
pub fn public_router() -> Router<AppState> {
    Router::new().route("/", get(list_active))
}

/// Build the admin heroes router
pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_all))
        .route("/", post(create_slide))
        .route("/{id}", put(update_slide))
        .route("/{id}", delete(delete_slide))
}

/// GET /heroes
async fn list_active(
    State(state): State<AppState>,
) -> Result<Json<Vec<HeroSlideResponse>>, ApiError> {
    let slides = state.hero_service.list_active().await.map_err(|e| {
        tracing::error!("Failed to list hero slides: {:#}", e);
        ApiError::internal_error("Failed to list hero slides")
    })?;

    Ok(Json(slides.into_iter().map(Into::into).collect()))
}

/// GET /admin/heroes
async fn list_all(State(state): State<AppState>) -> Result<Json<Vec<HeroSlideResponse>>, ApiError> {
    let slides = state.hero_service.list().await.map_err(|e| {
        tracing::error!("Failed to list hero slides: {:#}", e);
        ApiError::internal_error("Failed to list hero slides")
    })?;

    Ok(Json(slides.into_iter().map(Into::into).collect()))
}

/// POST /admin/heroes
async fn create_slide(
    State(state): State<AppState>,
    Json(input): Json<CreateHeroSlideInput>,
) -> Result<Json<HeroSlideResponse>, ApiError> {
    let slide = state
        .hero_service
        .create(input)
        .await
        .map_err(map_service_error)?;

    Ok(Json(slide.into()))
}

/// PUT /admin/heroes/{id}
async fn update_slide(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<UpdateHeroSlideInput>,
) -> Result<Json<HeroSlideResponse>, ApiError> {
    let slide = state
        .hero_service
        .update(id, input)
        .await
        .map_err(map_service_error)?;

    Ok(Json(slide.into()))
}

/// DELETE /admin/heroes/{id}
async fn delete_slide(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state
        .hero_service
        .delete(id)
        .await
        .map_err(map_service_error)?;

    Ok(Json(serde_json::json!({ "ok": true })))
}
