//! Gallery API endpoints
//!
//! Handles HTTP requests for resolved galleries and photo management:
//! - GET  /api/v1/gallery/{slug} - Resolved gallery for the current viewer
//! - GET  /api/v1/gallery/{slug}/live - Server-sent stream of re-resolved galleries
//! - GET  /api/v1/admin/models/{id}/photos - All photos of a model
//! - POST /api/v1/admin/models/{id}/photos - Add a photo
//! - PUT  /api/v1/admin/photos/{id} - Update a photo
//! - DELETE /api/v1/admin/photos/{id} - Delete a photo

use axum::{
    extract::{Path, State},
    response::sse::{Event, KeepAlive, Sse},
    routing::{delete, get, post, put},
    Extension, Json, Router,
};
use futures::Stream;
use serde::Serialize;
use std::convert::Infallible;
use std::sync::Arc;

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::models::{AccessContext, CreatePhotoInput, GalleryPhoto, UpdatePhotoInput};
use crate::services::{spawn_gallery_watcher, GalleryError, GalleryView, ResolvedGallery};

/// Response for a resolved gallery
#[derive(Debug, Serialize)]
pub struct GalleryResponse {
    pub model_id: i64,
    pub tier: String,
    pub placeholder: bool,
    pub photos: Vec<PhotoResponse>,
}

/// Response for a single photo
#[derive(Debug, Serialize)]
pub struct PhotoResponse {
    pub id: i64,
    pub model_id: i64,
    pub image_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    pub order_index: i32,
    pub visibility: String,
}

impl From<GalleryPhoto> for PhotoResponse {
    fn from(photo: GalleryPhoto) -> Self {
        Self {
            id: photo.id,
            model_id: photo.model_id,
            image_url: photo.image_url,
            caption: photo.caption,
            order_index: photo.order_index,
            visibility: photo.visibility.to_string(),
        }
    }
}

fn gallery_response(gallery: ResolvedGallery, ctx: &AccessContext) -> GalleryResponse {
    GalleryResponse {
        model_id: gallery.model_id,
        tier: ctx.tier.to_string(),
        placeholder: gallery.placeholder,
        photos: gallery.photos.into_iter().map(Into::into).collect(),
    }
}

fn map_gallery_error(err: GalleryError) -> ApiError {
    match err {
        GalleryError::ModelNotFound => ApiError::not_found("Model not found"),
        GalleryError::PhotoNotFound => ApiError::not_found("Photo not found"),
        GalleryError::Lookup(e) => {
            tracing::error!("Gallery lookup failed: {:#}", e);
            ApiError::gallery_load_failed()
        }
    }
}

/// Build the public gallery router (runs behind optional auth)
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/{slug}", get(get_gallery))
        .route("/{slug}/live", get(live_gallery))
}

/// Build the admin photo management router
pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/models/{id}/photos", get(list_photos))
        .route("/models/{id}/photos", post(add_photo))
        .route("/photos/{id}", put(update_photo))
        .route("/photos/{id}", delete(delete_photo))
}

/// Resolve the viewer's access context from the optional auth extension.
async fn viewer_context(state: &AppState, user: Option<&AuthenticatedUser>) -> AccessContext {
    match user {
        Some(authenticated) => state.access_resolver.resolve_for_user(&authenticated.0).await,
        None => AccessContext::anonymous(),
    }
}

/// Look up a model for gallery access: unpublished profiles are only
/// visible to admins.
async fn gallery_model(
    state: &AppState,
    slug: &str,
    ctx: &AccessContext,
) -> Result<crate::models::Model, ApiError> {
    let model = state
        .model_service
        .get_by_slug(slug)
        .await
        .map_err(|e| {
            tracing::error!("Model lookup failed: {:#}", e);
            ApiError::gallery_load_failed()
        })?
        .ok_or_else(|| ApiError::not_found("Model not found"))?;

    if !model.published && !ctx.is_admin() {
        return Err(ApiError::not_found("Model not found"));
    }

    Ok(model)
}

/// GET /gallery/{slug}
async fn get_gallery(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    user: Option<Extension<AuthenticatedUser>>,
) -> Result<Json<GalleryResponse>, ApiError> {
    let ctx = viewer_context(&state, user.as_deref()).await;
    let model = gallery_model(&state, &slug, &ctx).await?;

    let gallery = state
        .gallery_service
        .load(&ctx, model.id)
        .await
        .map_err(map_gallery_error)?;

    Ok(Json(gallery_response(gallery, &ctx)))
}

/// GET /gallery/{slug}/live
///
/// Server-sent events: the current resolution immediately, then a fresh one
/// after every gallery-updated signal for this model. Each event re-runs
/// the full resolution; there is no incremental patching.
async fn live_gallery(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    user: Option<Extension<AuthenticatedUser>>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let ctx = viewer_context(&state, user.as_deref()).await;
    let model = gallery_model(&state, &slug, &ctx).await?;

    let initial = state
        .gallery_service
        .load(&ctx, model.id)
        .await
        .map_err(map_gallery_error)?;

    let view = Arc::new(GalleryView::new());
    view.focus(model.id);
    view.apply(initial.clone());

    let (tx, rx) = tokio::sync::mpsc::channel::<ResolvedGallery>(8);
    // The watcher ends on its own once the client goes away and rx is dropped
    spawn_gallery_watcher(state.gallery_service.clone(), view, ctx, tx.clone());

    let _ = tx.send(initial).await;

    let stream = futures::stream::unfold((rx, ctx), |(mut rx, ctx)| async move {
        let gallery = rx.recv().await?;
        let event = match Event::default()
            .event("gallery")
            .json_data(gallery_response(gallery, &ctx))
        {
            Ok(event) => event,
            Err(e) => {
                tracing::error!("Failed to serialize gallery event: {}", e);
                Event::default().event("error").data("serialization failed")
            }
        };
        Some((Ok(event), (rx, ctx)))
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

/// GET /admin/models/{id}/photos
async fn list_photos(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<PhotoResponse>>, ApiError> {
    let photos = state
        .gallery_service
        .list_all(id)
        .await
        .map_err(map_gallery_error)?;

    Ok(Json(photos.into_iter().map(Into::into).collect()))
}

/// POST /admin/models/{id}/photos
async fn add_photo(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<CreatePhotoInput>,
) -> Result<Json<PhotoResponse>, ApiError> {
    if input.image_url.trim().is_empty() {
        return Err(ApiError::validation_error("Image URL must not be empty"));
    }

    let photo = state
        .gallery_service
        .add_photo(id, input)
        .await
        .map_err(map_gallery_error)?;

    Ok(Json(photo.into()))
}

/// PUT /admin/photos/{id}
async fn update_photo(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<UpdatePhotoInput>,
) -> Result<Json<PhotoResponse>, ApiError> {
    let photo = state
        .gallery_service
        .update_photo(id, input)
        .await
        .map_err(map_gallery_error)?;

    Ok(Json(photo.into()))
}

/// DELETE /admin/photos/{id}
async fn delete_photo(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state
        .gallery_service
        .delete_photo(id)
        .await
        .map_err(map_gallery_error)?;

    Ok(Json(serde_json::json!({ "ok": true })))
}
