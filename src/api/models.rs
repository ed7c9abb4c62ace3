//! Model profile API endpoints
//!
//! Handles HTTP requests for model profiles:
//! - GET  /api/v1/models - Published profiles for the public site
//! - GET  /api/v1/models/{slug} - One published profile
//! - GET  /api/v1/admin/models - All profiles
//! - POST /api/v1/admin/models - Create a profile
//! - PUT  /api/v1/admin/models/{id} - Update a profile
//! - DELETE /api/v1/admin/models/{id} - Delete a profile

use axum::{
    extract::{Path, State},
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::Serialize;

use crate::api::middleware::{ApiError, AppState};
use crate::models::{CreateModelInput, Model, UpdateModelInput};
use crate::services::ModelServiceError;

/// Public view of a model profile
#[derive(Debug, Serialize)]
pub struct ModelResponse {
    pub id: i64,
    pub slug: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tagline: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_image_url: Option<String>,
    pub members_only: bool,
    pub all_photos_public: bool,
    pub published: bool,
    pub sort_order: i32,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Model> for ModelResponse {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            slug: model.slug,
            name: model.name,
            tagline: model.tagline,
            bio: model.bio,
            profile_image_url: model.profile_image_url,
            members_only: model.members_only,
            all_photos_public: model.all_photos_public,
            published: model.published,
            sort_order: model.sort_order,
            created_at: model.created_at.to_rfc3339(),
            updated_at: model.updated_at.to_rfc3339(),
        }
    }
}

fn map_service_error(err: ModelServiceError) -> ApiError {
    match err {
        ModelServiceError::NotFound => ApiError::not_found("Model not found"),
        ModelServiceError::SlugExists(slug) => {
            ApiError::conflict(format!("Model with slug '{}' already exists", slug))
        }
        ModelServiceError::ValidationError(msg) => ApiError::validation_error(msg),
        ModelServiceError::InternalError(e) => {
            tracing::error!("Model operation failed: {:#}", e);
            ApiError::internal_error("Model operation failed")
        }
    }
}

/// Build the public models router
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_published))
        .route("/{slug}", get(get_published))
}

/// Build the admin models router
pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_all))
        .route("/", post(create_model))
        .route("/{id}", put(update_model))
        .route("/{id}", delete(delete_model))
}

/// GET /models
async fn list_published(
    State(state): State<AppState>,
) -> Result<Json<Vec<ModelResponse>>, ApiError> {
    let models = state.model_service.list_published().await.map_err(|e| {
        tracing::error!("Failed to list models: {:#}", e);
        ApiError::internal_error("Failed to list models")
    })?;

    Ok(Json(models.into_iter().map(Into::into).collect()))
}

/// GET /models/{slug}
async fn get_published(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<ModelResponse>, ApiError> {
    let model = state
        .model_service
        .get_published_by_slug(&slug)
        .await
        .map_err(|e| {
            tracing::error!("Failed to load model: {:#}", e);
            ApiError::internal_error("Failed to load model")
        })?
        .ok_or_else(|| ApiError::not_found("Model not found"))?;

    Ok(Json(model.into()))
}

/// GET /admin/models
async fn list_all(State(state): State<AppState>) -> Result<Json<Vec<ModelResponse>>, ApiError> {
    let models = state.model_service.list().await.map_err(|e| {
        tracing::error!("Failed to list models: {:#}", e);
        ApiError::internal_error("Failed to list models")
    })?;

    Ok(Json(models.into_iter().map(Into::into).collect()))
}

/// POST /admin/models
async fn create_model(
    State(state): State<AppState>,
    Json(input): Json<CreateModelInput>,
) -> Result<Json<ModelResponse>, ApiError> {
    let model = state
        .model_service
        .create(input)
        .await
        .map_err(map_service_error)?;

    Ok(Json(model.into()))
}

/// PUT /admin/models/{id}
async fn update_model(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<UpdateModelInput>,
) -> Result<Json<ModelResponse>, ApiError> {
    let model = state
        .model_service
        .update(id, input)
        .await
        .map_err(map_service_error)?;

    Ok(Json(model.into()))
}

/// DELETE /admin/models/{id}
async fn delete_model(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state
        .model_service
        .delete(id)
        .await
        .map_err(map_service_error)?;

    Ok(Json(serde_json::json!({ "ok": true })))
}
