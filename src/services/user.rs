//! User service
//!
//! Implements business logic for account and security administration:
//! - Registration (the first account becomes the admin)
//! - Login/logout with database-backed session tokens
//! - Session validation and revocation
//! - Password changes and ban management

use crate::db::repositories::{SessionRepository, UserRepository};
use crate::models::{CreateUserInput, Session, UpdateUserInput, User, UserRole, UserStatus};
use crate::services::password::{hash_password, verify_password};
use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use std::sync::Arc;
use uuid::Uuid;

/// Default session expiration time in days
const DEFAULT_SESSION_EXPIRATION_DAYS: i64 = 7;

/// Minimum password length
const MIN_PASSWORD_LEN: usize = 8;

/// Error types for user service operations
#[derive(Debug, thiserror::Error)]
pub enum UserServiceError {
    /// Authentication failed (invalid credentials)
    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    /// Validation error (invalid input)
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// User already exists
    #[error("User already exists: {0}")]
    UserExists(String),

    /// The account is banned
    #[error("Account is banned")]
    Banned,

    /// User not found
    #[error("User not found")]
    NotFound,

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Login input
#[derive(Debug, Clone, serde::Deserialize)]
pub struct LoginInput {
    pub username: String,
    pub password: String,
}

/// User service for managing users and authentication
pub struct UserService {
    user_repo: Arc<dyn UserRepository>,
    session_repo: Arc<dyn SessionRepository>,
    session_expiration_days: i64,
}

impl UserService {
    /// Create a new user service with the given repositories
    pub fn new(user_repo: Arc<dyn UserRepository>, session_repo: Arc<dyn SessionRepository>) -> Self {
        Self {
            user_repo,
            session_repo,
            session_expiration_days: DEFAULT_SESSION_EXPIRATION_DAYS,
        }
    }

    /// Create a new user service with custom session expiration
    pub fn with_session_expiration(
        user_repo: Arc<dyn UserRepository>,
        session_repo: Arc<dyn SessionRepository>,
        session_expiration_days: i64,
    ) -> Self {
        Self {
            user_repo,
            session_repo,
            session_expiration_days,
        }
    }

    fn validate_create_input(&self, input: &CreateUserInput) -> Result<(), UserServiceError> {
        if input.username.trim().is_empty() {
            return Err(UserServiceError::ValidationError(
                "Username must not be empty".to_string(),
            ));
        }
        if !input.email.contains('@') {
            return Err(UserServiceError::ValidationError(
                "Invalid email address".to_string(),
            ));
        }
        if input.password.len() < MIN_PASSWORD_LEN {
            return Err(UserServiceError::ValidationError(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }
        Ok(())
    }

    /// Create a new account.
    ///
    /// The first account in the system automatically becomes the admin so a
    /// fresh deployment can be bootstrapped without manual database edits.
    /// Subsequent accounts default to the regular role unless the caller
    /// (an admin screen) specifies one.
    pub async fn create_user(&self, input: CreateUserInput) -> Result<User, UserServiceError> {
        self.validate_create_input(&input)?;

        if self
            .user_repo
            .get_by_username(&input.username)
            .await
            .context("Failed to check username")?
            .is_some()
        {
            return Err(UserServiceError::UserExists(format!(
                "Username '{}' is already taken",
                input.username
            )));
        }

        if self
            .user_repo
            .get_by_email(&input.email)
            .await
            .context("Failed to check email")?
            .is_some()
        {
            return Err(UserServiceError::UserExists(format!(
                "Email '{}' is already registered",
                input.email
            )));
        }

        let is_first = self
            .user_repo
            .count()
            .await
            .context("Failed to count users")?
            == 0;
        let role = if is_first {
            UserRole::Admin
        } else {
            input.role.unwrap_or(UserRole::User)
        };

        let password_hash = hash_password(&input.password).context("Failed to hash password")?;
        let user = User::new(input.username, input.email, password_hash, role);

        Ok(self
            .user_repo
            .create(&user)
            .await
            .context("Failed to create user")?)
    }

    /// Login with credentials, creating a new session on success.
    pub async fn login(&self, input: LoginInput) -> Result<Session, UserServiceError> {
        let user = self
            .user_repo
            .get_by_username(&input.username)
            .await
            .context("Failed to look up user")?
            .ok_or_else(|| {
                UserServiceError::AuthenticationError("Invalid username or password".to_string())
            })?;

        if user.is_banned() {
            return Err(UserServiceError::Banned);
        }

        let valid = verify_password(&input.password, &user.password_hash)
            .context("Password verification failed")?;
        if !valid {
            return Err(UserServiceError::AuthenticationError(
                "Invalid username or password".to_string(),
            ));
        }

        let session = Session {
            id: Uuid::new_v4().simple().to_string(),
            user_id: user.id,
            expires_at: Utc::now() + Duration::days(self.session_expiration_days),
            created_at: Utc::now(),
        };

        self.session_repo
            .create(&session)
            .await
            .context("Failed to create session")?;

        Ok(session)
    }

    /// Validate a session token, returning the user it belongs to.
    ///
    /// Expired sessions are deleted on sight and treated as absent. Banned
    /// users never validate.
    pub async fn validate_session(&self, token: &str) -> Result<Option<User>> {
        let Some(session) = self
            .session_repo
            .get_by_id(token)
            .await
            .context("Failed to look up session")?
        else {
            return Ok(None);
        };

        if session.is_expired() {
            self.session_repo
                .delete(token)
                .await
                .context("Failed to delete expired session")?;
            return Ok(None);
        }

        let user = self
            .user_repo
            .get_by_id(session.user_id)
            .await
            .context("Failed to load session user")?;

        Ok(user.filter(|u| !u.is_banned()))
    }

    /// Logout: delete the session token
    pub async fn logout(&self, token: &str) -> Result<()> {
        self.session_repo
            .delete(token)
            .await
            .context("Failed to delete session")
    }

    /// Revoke every session of a user (security administration)
    pub async fn revoke_sessions(&self, user_id: i64) -> Result<u64> {
        self.session_repo
            .delete_for_user(user_id)
            .await
            .context("Failed to revoke sessions")
    }

    /// Remove expired sessions; returns how many were deleted
    pub async fn cleanup_expired_sessions(&self) -> Result<u64> {
        self.session_repo
            .delete_expired()
            .await
            .context("Failed to clean up sessions")
    }

    /// Change a user's password, verifying the current one first.
    ///
    /// All existing sessions are revoked afterwards.
    pub async fn change_password(
        &self,
        user_id: i64,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), UserServiceError> {
        if new_password.len() < MIN_PASSWORD_LEN {
            return Err(UserServiceError::ValidationError(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }

        let mut user = self
            .user_repo
            .get_by_id(user_id)
            .await
            .context("Failed to load user")?
            .ok_or(UserServiceError::NotFound)?;

        let valid = verify_password(current_password, &user.password_hash)
            .context("Password verification failed")?;
        if !valid {
            return Err(UserServiceError::AuthenticationError(
                "Current password is incorrect".to_string(),
            ));
        }

        user.password_hash = hash_password(new_password).context("Failed to hash password")?;
        self.user_repo
            .update(&user)
            .await
            .context("Failed to update user")?;

        self.revoke_sessions(user_id).await?;
        Ok(())
    }

    /// Update a user from the admin screen.
    pub async fn update_user(
        &self,
        user_id: i64,
        input: UpdateUserInput,
    ) -> Result<User, UserServiceError> {
        let mut user = self
            .user_repo
            .get_by_id(user_id)
            .await
            .context("Failed to load user")?
            .ok_or(UserServiceError::NotFound)?;

        if let Some(username) = input.username {
            if username.trim().is_empty() {
                return Err(UserServiceError::ValidationError(
                    "Username must not be empty".to_string(),
                ));
            }
            user.username = username.trim().to_string();
        }
        if let Some(email) = input.email {
            if !email.contains('@') {
                return Err(UserServiceError::ValidationError(
                    "Invalid email address".to_string(),
                ));
            }
            user.email = email;
        }
        if let Some(password) = input.password {
            if password.len() < MIN_PASSWORD_LEN {
                return Err(UserServiceError::ValidationError(format!(
                    "Password must be at least {} characters",
                    MIN_PASSWORD_LEN
                )));
            }
            user.password_hash = hash_password(&password).context("Failed to hash password")?;
        }
        if let Some(role) = input.role {
            user.role = role;
        }

        let banned_now = matches!(input.status, Some(UserStatus::Banned)) && !user.is_banned();
        if let Some(status) = input.status {
            user.status = status;
        }

        let updated = self
            .user_repo
            .update(&user)
            .await
            .context("Failed to update user")?;

        // A banned account loses its sessions immediately
        if banned_now {
            self.revoke_sessions(user_id).await?;
        }

        Ok(updated)
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<User>> {
        self.user_repo.get_by_id(id).await
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        self.user_repo.get_by_username(username).await
    }

    pub async fn list(&self) -> Result<Vec<User>> {
        self.user_repo.list().await
    }

    pub async fn count(&self) -> Result<i64> {
        self.user_repo.count().await
    }

    pub async fn delete_user(&self, user_id: i64) -> Result<(), UserServiceError> {
        if self
            .user_repo
            .get_by_id(user_id)
            .await
            .context("Failed to load user")?
            .is_none()
        {
            return Err(UserServiceError::NotFound);
        }
        self.user_repo
            .delete(user_id)
            .await
            .context("Failed to delete user")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{SqlxSessionRepository, SqlxUserRepository};
    use crate::db::{create_test_pool, migrations};

    async fn setup() -> UserService {
        let pool = create_test_pool().await.unwrap();
        migrations::run_migrations(&pool).await.unwrap();
        UserService::new(
            Arc::new(SqlxUserRepository::new(pool.clone())),
            Arc::new(SqlxSessionRepository::new(pool)),
        )
    }

    fn create_input(username: &str) -> CreateUserInput {
        CreateUserInput {
            username: username.to_string(),
            email: format!("{}@example.com", username),
            password: "correct-horse".to_string(),
            role: None,
        }
    }

    #[tokio::test]
    async fn test_first_user_becomes_admin() {
        let service = setup().await;

        let first = service.create_user(create_input("boss")).await.unwrap();
        assert_eq!(first.role, UserRole::Admin);

        let second = service.create_user(create_input("guest")).await.unwrap();
        assert_eq!(second.role, UserRole::User);
    }

    #[tokio::test]
    async fn test_duplicate_username_rejected() {
        let service = setup().await;
        service.create_user(create_input("ava")).await.unwrap();

        let result = service.create_user(create_input("ava")).await;
        assert!(matches!(result, Err(UserServiceError::UserExists(_))));
    }

    #[tokio::test]
    async fn test_short_password_rejected() {
        let service = setup().await;
        let mut input = create_input("ava");
        input.password = "short".to_string();

        let result = service.create_user(input).await;
        assert!(matches!(result, Err(UserServiceError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_login_and_validate_session() {
        let service = setup().await;
        service.create_user(create_input("ava")).await.unwrap();

        let session = service
            .login(LoginInput {
                username: "ava".to_string(),
                password: "correct-horse".to_string(),
            })
            .await
            .unwrap();

        let user = service.validate_session(&session.id).await.unwrap().unwrap();
        assert_eq!(user.username, "ava");

        service.logout(&session.id).await.unwrap();
        assert!(service.validate_session(&session.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_login_wrong_password() {
        let service = setup().await;
        service.create_user(create_input("ava")).await.unwrap();

        let result = service
            .login(LoginInput {
                username: "ava".to_string(),
                password: "wrong-password".to_string(),
            })
            .await;
        assert!(matches!(result, Err(UserServiceError::AuthenticationError(_))));
    }

    #[tokio::test]
    async fn test_banned_user_cannot_login_or_validate() {
        let service = setup().await;
        let admin = service.create_user(create_input("boss")).await.unwrap();
        let user = service.create_user(create_input("ava")).await.unwrap();
        assert!(admin.is_admin());

        let session = service
            .login(LoginInput {
                username: "ava".to_string(),
                password: "correct-horse".to_string(),
            })
            .await
            .unwrap();

        service
            .update_user(
                user.id,
                UpdateUserInput {
                    status: Some(UserStatus::Banned),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        // Sessions are revoked on ban, and login is refused
        assert!(service.validate_session(&session.id).await.unwrap().is_none());
        let result = service
            .login(LoginInput {
                username: "ava".to_string(),
                password: "correct-horse".to_string(),
            })
            .await;
        assert!(matches!(result, Err(UserServiceError::Banned)));
    }

    #[tokio::test]
    async fn test_change_password_revokes_sessions() {
        let service = setup().await;
        let user = service.create_user(create_input("ava")).await.unwrap();

        let session = service
            .login(LoginInput {
                username: "ava".to_string(),
                password: "correct-horse".to_string(),
            })
            .await
            .unwrap();

        service
            .change_password(user.id, "correct-horse", "battery-staple")
            .await
            .unwrap();

        assert!(service.validate_session(&session.id).await.unwrap().is_none());

        // New password works, old one does not
        assert!(service
            .login(LoginInput {
                username: "ava".to_string(),
                password: "battery-staple".to_string(),
            })
            .await
            .is_ok());
        assert!(service
            .login(LoginInput {
                username: "ava".to_string(),
                password: "correct-horse".to_string(),
            })
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_change_password_requires_current() {
        let service = setup().await;
        let user = service.create_user(create_input("ava")).await.unwrap();

        let result = service
            .change_password(user.id, "not-the-password", "battery-staple")
            .await;
        assert!(matches!(result, Err(UserServiceError::AuthenticationError(_))));
    }
}
