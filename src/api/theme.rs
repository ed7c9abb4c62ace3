//! Theme color API endpoints
//!
//! Handles HTTP requests for the site palette:
//! - GET  /api/v1/theme - The whole palette (public; the site maps tokens
//!   onto CSS custom properties)
//! - PUT  /api/v1/admin/theme/{name} - Create or replace a color token
//! - DELETE /api/v1/admin/theme/{name} - Delete a color token

use axum::{
    extract::{Path, State},
    routing::{delete, get, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::middleware::{ApiError, AppState};
use crate::models::ThemeColor;
use crate::services::ThemeServiceError;

/// Response for a single theme color
#[derive(Debug, Serialize)]
pub struct ThemeColorResponse {
    pub name: String,
    pub value: String,
}

impl From<ThemeColor> for ThemeColorResponse {
    fn from(color: ThemeColor) -> Self {
        Self {
            name: color.name,
            value: color.value,
        }
    }
}

/// Request body for setting a color token
#[derive(Debug, Deserialize)]
pub struct SetThemeColorRequest {
    pub value: String,
}

fn map_service_error(err: ThemeServiceError) -> ApiError {
    match err {
        ThemeServiceError::NotFound => ApiError::not_found("Theme color not found"),
        ThemeServiceError::ValidationError(msg) => ApiError::validation_error(msg),
        ThemeServiceError::InternalError(e) => {
            tracing::error!("Theme operation failed: {:#}", e);
            ApiError::internal_error("Theme operation failed")
        }
    }
}

/// Build the public theme router
pub fn public_router() -> Router<AppState> {
    Router::new().route("/", get(get_palette))
}

/// Build the admin theme router
pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/{name}", put(set_color))
        .route("/{name}", delete(delete_color))
}

/// GET /theme
async fn get_palette(
    State(state): State<AppState>,
) -> Result<Json<Vec<ThemeColorResponse>>, ApiError> {
    let palette = state.theme_service.palette().await.map_err(|e| {
        tracing::error!("Failed to load palette: {:#}", e);
        ApiError::internal_error("Failed to load palette")
    })?;

    Ok(Json(palette.into_iter().map(Into::into).collect()))
}

/// PUT /admin/theme/{name}
async fn set_color(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(body): Json<SetThemeColorRequest>,
) -> Result<Json<ThemeColorResponse>, ApiError> {
    let color = state
        .theme_service
        .upsert(&name, &body.value)
        .await
        .map_err(map_service_error)?;

    Ok(Json(color.into()))
}

/// DELETE /admin/theme/{name}
async fn delete_color(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state
        .theme_service
        .delete(&name)
        .await
        .map_err(map_service_error)?;

    Ok(Json(serde_json::json!({ "ok": true })))
}
