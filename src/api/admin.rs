//! Admin API endpoints
//!
//! Handles HTTP requests for administration:
//! - Dashboard counts and system resource stats
//! - User and security management (create, update, ban, session revocation)
//! - Subscription management

use axum::{
    extract::{Path, State},
    routing::{delete, get, post, put},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::process;
use sysinfo::{Pid, System};

use crate::api::auth::UserResponse;
use crate::api::middleware::{ApiError, AppState};
use crate::models::{CreateUserInput, Subscription, UpdateUserInput};
use crate::services::{SubscriptionServiceError, UserServiceError};

/// Application version reported by the stats endpoint
const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Response for dashboard counts
#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub total_models: i64,
    pub total_photos: i64,
    pub total_users: i64,
}

/// Response for system resource stats
#[derive(Debug, Serialize)]
pub struct SystemStatsResponse {
    pub version: String,
    pub memory_bytes: u64,
    pub memory_formatted: String,
    pub system_total_memory: u64,
    pub system_used_memory: u64,
    pub os_name: String,
    pub uptime_seconds: u64,
    pub uptime_formatted: String,
    pub total_requests: u64,
    pub avg_response_time_ms: f64,
}

/// Response for a subscription
#[derive(Debug, Serialize)]
pub struct SubscriptionResponse {
    pub id: i64,
    pub user_id: i64,
    pub active: bool,
    pub currently_valid: bool,
    pub started_at: String,
    pub expires_at: Option<String>,
}

impl From<Subscription> for SubscriptionResponse {
    fn from(sub: Subscription) -> Self {
        let currently_valid = sub.is_active();
        Self {
            id: sub.id,
            user_id: sub.user_id,
            active: sub.active,
            currently_valid,
            started_at: sub.started_at.to_rfc3339(),
            expires_at: sub.expires_at.map(|dt| dt.to_rfc3339()),
        }
    }
}

/// Request body for granting a subscription
#[derive(Debug, Deserialize)]
pub struct GrantSubscriptionRequest {
    pub user_id: i64,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

fn map_user_error(err: UserServiceError) -> ApiError {
    match err {
        UserServiceError::NotFound => ApiError::not_found("User not found"),
        UserServiceError::UserExists(msg) => ApiError::conflict(msg),
        UserServiceError::ValidationError(msg) => ApiError::validation_error(msg),
        UserServiceError::AuthenticationError(msg) => ApiError::unauthorized(msg),
        UserServiceError::Banned => ApiError::new("USER_BANNED", "Account is banned"),
        UserServiceError::InternalError(e) => {
            tracing::error!("User operation failed: {:#}", e);
            ApiError::internal_error("User operation failed")
        }
    }
}

fn map_subscription_error(err: SubscriptionServiceError) -> ApiError {
    match err {
        SubscriptionServiceError::NotFound => ApiError::not_found("Subscription not found"),
        SubscriptionServiceError::UserNotFound => ApiError::not_found("User not found"),
        SubscriptionServiceError::ValidationError(msg) => ApiError::validation_error(msg),
        SubscriptionServiceError::InternalError(e) => {
            tracing::error!("Subscription operation failed: {:#}", e);
            ApiError::internal_error("Subscription operation failed")
        }
    }
}

/// Build the admin router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(dashboard))
        .route("/stats", get(system_stats))
        .route("/users", get(list_users))
        .route("/users", post(create_user))
        .route("/users/{id}", put(update_user))
        .route("/users/{id}", delete(delete_user))
        .route("/users/{id}/sessions", delete(revoke_sessions))
        .route("/subscriptions", get(list_subscriptions))
        .route("/subscriptions", post(grant_subscription))
        .route("/subscriptions/{id}/cancel", post(cancel_subscription))
        .route("/subscriptions/{id}", delete(delete_subscription))
}

/// GET /admin/dashboard
async fn dashboard(State(state): State<AppState>) -> Result<Json<DashboardResponse>, ApiError> {
    let total_models = state.model_service.count().await.map_err(|e| {
        tracing::error!("Dashboard count failed: {:#}", e);
        ApiError::internal_error("Dashboard count failed")
    })?;
    let total_users = state.user_service.count().await.map_err(|e| {
        tracing::error!("Dashboard count failed: {:#}", e);
        ApiError::internal_error("Dashboard count failed")
    })?;

    let total_photos = state.gallery_service.photo_count().await.map_err(|e| {
        tracing::error!("Dashboard count failed: {:#}", e);
        ApiError::internal_error("Dashboard count failed")
    })?;

    Ok(Json(DashboardResponse {
        total_models,
        total_photos,
        total_users,
    }))
}

/// GET /admin/stats - System resource stats
///
/// Returns memory usage and request statistics for the current process.
async fn system_stats(State(state): State<AppState>) -> Result<Json<SystemStatsResponse>, ApiError> {
    let mut sys = System::new_all();
    sys.refresh_all();

    let pid = Pid::from_u32(process::id());
    let memory_bytes = sys.process(pid).map_or(0, |proc| proc.memory());

    let uptime_seconds = state.request_stats.uptime_seconds();

    Ok(Json(SystemStatsResponse {
        version: APP_VERSION.to_string(),
        memory_bytes,
        memory_formatted: format_bytes(memory_bytes),
        system_total_memory: sys.total_memory(),
        system_used_memory: sys.used_memory(),
        os_name: System::name().unwrap_or_else(|| "Unknown".to_string()),
        uptime_seconds,
        uptime_formatted: format_uptime(uptime_seconds),
        total_requests: state.request_stats.total_requests(),
        avg_response_time_ms: state.request_stats.avg_response_time_us() / 1000.0,
    }))
}

/// GET /admin/users
async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let users = state.user_service.list().await.map_err(|e| {
        tracing::error!("Failed to list users: {:#}", e);
        ApiError::internal_error("Failed to list users")
    })?;

    Ok(Json(users.into_iter().map(Into::into).collect()))
}

/// POST /admin/users
async fn create_user(
    State(state): State<AppState>,
    Json(input): Json<CreateUserInput>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state
        .user_service
        .create_user(input)
        .await
        .map_err(map_user_error)?;

    Ok(Json(user.into()))
}

/// PUT /admin/users/{id}
async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<UpdateUserInput>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state
        .user_service
        .update_user(id, input)
        .await
        .map_err(map_user_error)?;

    Ok(Json(user.into()))
}

/// DELETE /admin/users/{id}
async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state
        .user_service
        .delete_user(id)
        .await
        .map_err(map_user_error)?;

    Ok(Json(serde_json::json!({ "ok": true })))
}

/// DELETE /admin/users/{id}/sessions
async fn revoke_sessions(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let revoked = state.user_service.revoke_sessions(id).await.map_err(|e| {
        tracing::error!("Failed to revoke sessions: {:#}", e);
        ApiError::internal_error("Failed to revoke sessions")
    })?;

    Ok(Json(serde_json::json!({ "ok": true, "revoked": revoked })))
}

/// GET /admin/subscriptions
async fn list_subscriptions(
    State(state): State<AppState>,
) -> Result<Json<Vec<SubscriptionResponse>>, ApiError> {
    let subs = state.subscription_service.list().await.map_err(|e| {
        tracing::error!("Failed to list subscriptions: {:#}", e);
        ApiError::internal_error("Failed to list subscriptions")
    })?;

    Ok(Json(subs.into_iter().map(Into::into).collect()))
}

/// POST /admin/subscriptions
async fn grant_subscription(
    State(state): State<AppState>,
    Json(body): Json<GrantSubscriptionRequest>,
) -> Result<Json<SubscriptionResponse>, ApiError> {
    let sub = state
        .subscription_service
        .grant(body.user_id, body.expires_at)
        .await
        .map_err(map_subscription_error)?;

    Ok(Json(sub.into()))
}

/// POST /admin/subscriptions/{id}/cancel
async fn cancel_subscription(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<SubscriptionResponse>, ApiError> {
    let sub = state
        .subscription_service
        .cancel(id)
        .await
        .map_err(map_subscription_error)?;

    Ok(Json(sub.into()))
}

/// DELETE /admin/subscriptions/{id}
async fn delete_subscription(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state
        .subscription_service
        .delete(id)
        .await
        .map_err(map_subscription_error)?;

    Ok(Json(serde_json::json!({ "ok": true })))
}

/// Format uptime to human readable string
fn format_uptime(seconds: u64) -> String {
    let days = seconds / 86400;
    let hours = (seconds % 86400) / 3600;
    let minutes = (seconds % 3600) / 60;

    if days > 0 {
        format!("{}d {}h {}m", days, hours, minutes)
    } else if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else if minutes > 0 {
        format!("{}m", minutes)
    } else {
        format!("{}s", seconds)
    }
}

/// Format bytes to human readable string
fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut unit = 0;

    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    if unit == 0 {
        format!("{} {}", bytes, UNITS[unit])
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_uptime() {
        assert_eq!(format_uptime(30), "30s");
        assert_eq!(format_uptime(90), "1m");
        assert_eq!(format_uptime(3660), "1h 1m");
        assert_eq!(format_uptime(90061), "1d 1h 1m");
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(5 * 1024 * 1024), "5.0 MB");
    }
}
