//! Auth API endpoints
//!
//! Handles HTTP requests for authentication:
//! - POST /api/v1/auth/login - Login with credentials
//! - POST /api/v1/auth/logout - End the current session
//! - GET  /api/v1/auth/me - Current user info
//! - POST /api/v1/auth/password - Change own password

use axum::{
    extract::{ConnectInfo, State},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser, SessionToken};
use crate::services::{LoginInput, UserServiceError};

/// Response for a successful login
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: String,
    pub user: UserResponse,
}

/// Public view of a user account
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role: String,
    pub status: String,
}

impl From<crate::models::User> for UserResponse {
    fn from(user: crate::models::User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            role: user.role.to_string(),
            status: user.status.to_string(),
        }
    }
}

/// Request body for changing the own password
#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// Build the public auth router
pub fn public_router() -> Router<AppState> {
    Router::new().route("/login", post(login))
}

/// Build the protected auth router
pub fn protected_router() -> Router<AppState> {
    Router::new()
        .route("/logout", post(logout))
        .route("/me", get(me))
        .route("/password", post(change_password))
}

/// POST /auth/login
async fn login(
    State(state): State<AppState>,
    addr: Option<Extension<ConnectInfo<SocketAddr>>>,
    Json(input): Json<LoginInput>,
) -> Result<Json<LoginResponse>, ApiError> {
    // ConnectInfo is absent behind test transports; IP limiting only
    // applies when the peer address is known
    if let Some(Extension(ConnectInfo(addr))) = addr {
        if state.rate_limiter.is_ip_limited(addr.ip()).await {
            return Err(ApiError::rate_limited("Too many requests, slow down"));
        }
        state.rate_limiter.record_ip_request(addr.ip()).await;
    }

    if state.rate_limiter.is_username_limited(&input.username).await {
        return Err(ApiError::rate_limited(
            "Too many failed attempts, try again later",
        ));
    }

    let username = input.username.clone();
    match state.user_service.login(input).await {
        Ok(session) => {
            state.rate_limiter.clear_username_attempts(&username).await;

            let user = state
                .user_service
                .get_by_id(session.user_id)
                .await
                .map_err(|e| ApiError::internal_error(format!("Failed to load user: {}", e)))?
                .ok_or_else(|| ApiError::internal_error("Session user vanished"))?;

            Ok(Json(LoginResponse {
                token: session.id,
                expires_at: session.expires_at.to_rfc3339(),
                user: user.into(),
            }))
        }
        Err(UserServiceError::AuthenticationError(msg)) => {
            state.rate_limiter.record_failed_attempt(&username).await;
            Err(ApiError::unauthorized(msg))
        }
        Err(UserServiceError::Banned) => Err(ApiError::new("USER_BANNED", "Account is banned")),
        Err(e) => Err(ApiError::internal_error(format!("Login failed: {}", e))),
    }
}

/// POST /auth/logout
async fn logout(
    State(state): State<AppState>,
    Extension(token): Extension<SessionToken>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state
        .user_service
        .logout(&token.0)
        .await
        .map_err(|e| ApiError::internal_error(format!("Logout failed: {}", e)))?;

    Ok(Json(serde_json::json!({ "ok": true })))
}

/// GET /auth/me
async fn me(Extension(user): Extension<AuthenticatedUser>) -> Json<UserResponse> {
    Json(user.0.into())
}

/// POST /auth/password
async fn change_password(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(body): Json<ChangePasswordRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    match state
        .user_service
        .change_password(user.0.id, &body.current_password, &body.new_password)
        .await
    {
        Ok(()) => Ok(Json(serde_json::json!({ "ok": true }))),
        Err(UserServiceError::AuthenticationError(msg)) => Err(ApiError::unauthorized(msg)),
        Err(UserServiceError::ValidationError(msg)) => Err(ApiError::validation_error(msg)),
        Err(e) => Err(ApiError::internal_error(format!(
            "Password change failed: {}",
            e
        ))),
    }
}
