//! Blog post API endpoints
//!
//! Handles HTTP requests for blog posts:
//! - GET  /api/v1/posts - Published posts with pagination
//! - GET  /api/v1/posts/{slug} - One published post
//! - GET  /api/v1/admin/posts - All posts with pagination
//! - POST /api/v1/admin/posts - Create a post
//! - PUT  /api/v1/admin/posts/{id} - Update a post
//! - DELETE /api/v1/admin/posts/{id} - Delete a post

use axum::{
    extract::{Path, Query, State},
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::middleware::{ApiError, AppState};
use crate::models::{CreatePostInput, ListParams, PagedResult, Post, UpdatePostInput};
use crate::services::PostServiceError;

/// Query parameters for listing posts
#[derive(Debug, Deserialize)]
pub struct ListPostsQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

fn default_page() -> u32 {
    1
}

fn default_per_page() -> u32 {
    10
}

impl ListPostsQuery {
    fn params(&self) -> ListParams {
        ListParams::new(self.page, self.per_page)
    }
}

/// Response for a post list
#[derive(Debug, Serialize)]
pub struct PostListResponse {
    pub posts: Vec<PostResponse>,
    pub total: i64,
    pub page: u32,
    pub per_page: u32,
    pub total_pages: u32,
}

impl From<PagedResult<Post>> for PostListResponse {
    fn from(result: PagedResult<Post>) -> Self {
        let total_pages = result.total_pages();
        Self {
            total: result.total,
            page: result.page,
            per_page: result.per_page,
            total_pages,
            posts: result.items.into_iter().map(Into::into).collect(),
        }
    }
}

/// Response for a single post
#[derive(Debug, Serialize)]
pub struct PostResponse {
    pub id: i64,
    pub slug: String,
    pub title: String,
    pub content: String,
    pub content_html: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_image_url: Option<String>,
    pub published_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Post> for PostResponse {
    fn from(post: Post) -> Self {
        Self {
            id: post.id,
            slug: post.slug,
            title: post.title,
            content: post.content,
            content_html: post.content_html,
            status: post.status.to_string(),
            cover_image_url: post.cover_image_url,
            published_at: post.published_at.map(|dt| dt.to_rfc3339()),
            created_at: post.created_at.to_rfc3339(),
            updated_at: post.updated_at.to_rfc3339(),
        }
    }
}

fn map_service_error(err: PostServiceError) -> ApiError {
    match err {
        PostServiceError::NotFound => ApiError::not_found("Post not found"),
        PostServiceError::SlugExists(slug) => {
            ApiError::conflict(format!("Post with slug '{}' already exists", slug))
        }
        PostServiceError::ValidationError(msg) => ApiError::validation_error(msg),
        PostServiceError::InternalError(e) => {
            tracing::error!("Post operation failed: {:#}", e);
            ApiError::internal_error("Post operation failed")
        }
    }
}

/// Build the public posts router
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_published))
        .route("/{slug}", get(get_published))
}

/// Build the admin posts router
pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_all))
        .route("/", post(create_post))
        .route("/{id}", put(update_post))
        .route("/{id}", delete(delete_post))
}

/// GET /posts
async fn list_published(
    State(state): State<AppState>,
    Query(query): Query<ListPostsQuery>,
) -> Result<Json<PostListResponse>, ApiError> {
    let result = state
        .post_service
        .list_published(&query.params())
        .await
        .map_err(|e| {
            tracing::error!("Failed to list posts: {:#}", e);
            ApiError::internal_error("Failed to list posts")
        })?;

    Ok(Json(result.into()))
}

/// GET /posts/{slug}
async fn get_published(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<PostResponse>, ApiError> {
    let post = state
        .post_service
        .get_published_by_slug(&slug)
        .await
        .map_err(|e| {
            tracing::error!("Failed to load post: {:#}", e);
            ApiError::internal_error("Failed to load post")
        })?
        .ok_or_else(|| ApiError::not_found("Post not found"))?;

    Ok(Json(post.into()))
}

/// GET /admin/posts
async fn list_all(
    State(state): State<AppState>,
    Query(query): Query<ListPostsQuery>,
) -> Result<Json<PostListResponse>, ApiError> {
    let result = state
        .post_service
        .list_all(&query.params())
        .await
        .map_err(|e| {
            tracing::error!("Failed to list posts: {:#}", e);
            ApiError::internal_error("Failed to list posts")
        })?;

    Ok(Json(result.into()))
}

/// POST /admin/posts
async fn create_post(
    State(state): State<AppState>,
    Json(input): Json<CreatePostInput>,
) -> Result<Json<PostResponse>, ApiError> {
    let post = state
        .post_service
        .create(input)
        .await
        .map_err(map_service_error)?;

    Ok(Json(post.into()))
}

/// PUT /admin/posts/{id}
async fn update_post(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<UpdatePostInput>,
) -> Result<Json<PostResponse>, ApiError> {
    let post = state
        .post_service
        .update(id, input)
        .await
        .map_err(map_service_error)?;

    Ok(Json(post.into()))
}

/// DELETE /admin/posts/{id}
async fn delete_post(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state
        .post_service
        .delete(id)
        .await
        .map_err(map_service_error)?;

    Ok(Json(serde_json::json!({ "ok": true })))
}
