//! Banner API endpoints
//!
//! Handles HTTP requests for announcement banners:
//! - GET  /api/v1/banners - Currently live banners (optional placement filter)
//! - GET  /api/v1/admin/banners - All banners
//! - POST /api/v1/admin/banners - Create a banner
//! - PUT  /api/v1/admin/banners/{id} - Update a banner
//! - DELETE /api/v1/admin/banners/{id} - Delete a banner

use axum::{
    extract::{Path, Query, State},
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::api::middleware::{ApiError, AppState};
use crate::models::{Banner, BannerPlacement, CreateBannerInput, UpdateBannerInput};
use crate::services::BannerServiceError;

/// Query parameters for the public banner list
#[derive(Debug, Deserialize)]
pub struct ListBannersQuery {
    pub placement: Option<String>,
}

/// Response for a single banner
#[derive(Debug, Serialize)]
pub struct BannerResponse {
    pub id: i64,
    pub placement: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link_url: Option<String>,
    pub active: bool,
    pub starts_at: Option<String>,
    pub ends_at: Option<String>,
}

impl From<Banner> for BannerResponse {
    fn from(banner: Banner) -> Self {
        Self {
            id: banner.id,
            placement: banner.placement.to_string(),
            message: banner.message,
            link_url: banner.link_url,
            active: banner.active,
            starts_at: banner.starts_at.map(|dt| dt.to_rfc3339()),
            ends_at: banner.ends_at.map(|dt| dt.to_rfc3339()),
        }
    }
}

fn map_service_error(err: BannerServiceError) -> ApiError {
    match err {
        BannerServiceError::NotFound => ApiError::not_found("Banner not found"),
        BannerServiceError::ValidationError(msg) => ApiError::validation_error(msg),
        BannerServiceError::InternalError(e) => {
            tracing::error!("Banner operation failed: {:#}", e);
            ApiError::internal_error("Banner operation failed")
        }
    }
}

/// Build the public banners router
pub fn public_router() -> Router<AppState> {
    Router::new().route("/", get(list_live))
}

/// Build the admin banners router
pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_all))
        .route("/", post(create_banner))
        .route("/{id}", put(update_banner))
        .route("/{id}", delete(delete_banner))
}

/// GET /banners
async fn list_live(
    State(state): State<AppState>,
    Query(query): Query<ListBannersQuery>,
) -> Result<Json<Vec<BannerResponse>>, ApiError> {
    let placement = match query.placement.as_deref() {
        Some(raw) => Some(
            BannerPlacement::from_str(raw)
                .map_err(|_| ApiError::validation_error(format!("Invalid placement: '{}'", raw)))?,
        ),
        None => None,
    };

    let banners = state.banner_service.list_live(placement).await.map_err(|e| {
        tracing::error!("Failed to list banners: {:#}", e);
        ApiError::internal_error("Failed to list banners")
    })?;

    Ok(Json(banners.into_iter().map(Into::into).collect()))
}

/// GET /admin/banners
async fn list_all(State(state): State<AppState>) -> Result<Json<Vec<BannerResponse>>, ApiError> {
    let banners = state.banner_service.list().await.map_err(|e| {
        tracing::error!("Failed to list banners: {:#}", e);
        ApiError::internal_error("Failed to list banners")
    })?;

    Ok(Json(banners.into_iter().map(Into::into).collect()))
}

/// POST /admin/banners
async fn create_banner(
    State(state): State<AppState>,
    Json(input): Json<CreateBannerInput>,
) -> Result<Json<BannerResponse>, ApiError> {
    let banner = state
        .banner_service
        .create(input)
        .await
        .map_err(map_service_error)?;

    Ok(Json(banner.into()))
}

/// PUT /admin/banners/{id}
async fn update_banner(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<UpdateBannerInput>,
) -> Result<Json<BannerResponse>, ApiError> {
    let banner = state
        .banner_service
        .update(id, input)
        .await
        .map_err(map_service_error)?;

    Ok(Json(banner.into()))
}

/// DELETE /admin/banners/{id}
async fn delete_banner(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state
        .banner_service
        .delete(id)
        .await
        .map_err(map_service_error)?;

    Ok(Json(serde_json::json!({ "ok": true })))
}
