//! API layer - HTTP handlers and routing
//!
//! This module contains all HTTP API endpoints for the Vitrine backend.
//! It includes:
//! - Gallery API endpoints (resolved per viewer tier)
//! - Model profile API endpoints
//! - Blog post API endpoints
//! - Legal page API endpoints
//! - Hero carousel and banner API endpoints
//! - SEO and theme API endpoints
//! - User/Auth API endpoints
//! - Admin API endpoints
//! - Upload API endpoints

pub mod admin;
pub mod auth;
pub mod banners;
pub mod gallery;
pub mod heroes;
pub mod middleware;
pub mod models;
pub mod pages;
pub mod posts;
pub mod seo;
pub mod theme;
pub mod upload;

use axum::{
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    Router,
};
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, services::ServeDir, trace::TraceLayer,
};

pub use middleware::{ApiError, AppState, AuthenticatedUser, RequestStats, SessionToken};

/// Build the main API router
pub fn build_api_router(state: AppState) -> Router<AppState> {
    // Admin routes (need admin role)
    let admin_routes = Router::new()
        .nest("/admin/models", models::admin_router())
        .nest("/admin/posts", posts::admin_router())
        .nest("/admin/pages", pages::admin_router())
        .nest("/admin/heroes", heroes::admin_router())
        .nest("/admin/banners", banners::admin_router())
        .nest("/admin/seo", seo::admin_router())
        .nest("/admin/theme", theme::admin_router())
        .nest("/admin", admin::router().merge(gallery::admin_router()))
        .route_layer(axum_middleware::from_fn(middleware::require_admin))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    // Protected routes (need auth but not admin)
    let protected_routes = Router::new()
        .nest("/auth", auth::protected_router())
        .nest("/upload", upload::router())
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    // Gallery routes resolve the viewer tier themselves, so auth is optional
    let gallery_routes = Router::new()
        .nest("/gallery", gallery::public_router())
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::optional_auth,
        ));

    // Public routes
    Router::new()
        .nest("/models", models::public_router())
        .nest("/posts", posts::public_router())
        .nest("/pages", pages::public_router())
        .nest("/heroes", heroes::public_router())
        .nest("/banners", banners::public_router())
        .nest("/seo", seo::public_router())
        .nest("/theme", theme::public_router())
        .nest("/auth", auth::public_router())
        .merge(gallery_routes)
        .merge(admin_routes)
        .merge(protected_routes)
}

/// Build the complete router with middleware
pub fn build_router(state: AppState, cors_origin: &str) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(
            cors_origin
                .parse::<HeaderValue>()
                .unwrap_or_else(|_| HeaderValue::from_static("http://localhost:3000")),
        )
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::COOKIE])
        .allow_credentials(true);

    let upload_dir = state.upload_config.path.clone();

    Router::new()
        .nest("/api/v1", build_api_router(state.clone()))
        // Uploaded images are served straight from disk
        .nest_service("/uploads", ServeDir::new(upload_dir))
        .layer(cors)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        // Request stats middleware (outermost layer, runs for all requests)
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::request_stats_middleware,
        ))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::create_cache;
    use crate::config::CacheConfig;
    use crate::db::repositories::{
        SqlxBannerRepository, SqlxHeroSlideRepository, SqlxModelRepository, SqlxPageRepository,
        SqlxPhotoRepository, SqlxPostRepository, SqlxSeoRepository, SqlxSessionRepository,
        SqlxSubscriptionRepository, SqlxThemeRepository, SqlxUserRepository,
    };
    use crate::db::{create_test_pool, migrations};
    use crate::models::{CreateModelInput, CreatePhotoInput, CreateUserInput, PhotoVisibility};
    use crate::services::*;
    use axum_test::TestServer;
    use serde_json::json;
    use std::sync::Arc;

    async fn test_state() -> AppState {
        let pool = create_test_pool().await.unwrap();
        migrations::run_migrations(&pool).await.unwrap();

        let cache = create_cache(&CacheConfig::default()).await.unwrap();

        let user_repo = SqlxUserRepository::boxed(pool.clone());
        let session_repo = SqlxSessionRepository::boxed(pool.clone());
        let subscription_repo = SqlxSubscriptionRepository::boxed(pool.clone());
        let model_repo = SqlxModelRepository::boxed(pool.clone());
        let photo_repo = SqlxPhotoRepository::boxed(pool.clone());

        AppState {
            pool: pool.clone(),
            user_service: Arc::new(UserService::new(user_repo.clone(), session_repo)),
            access_resolver: Arc::new(AccessResolver::new(
                user_repo.clone(),
                subscription_repo.clone(),
            )),
            model_service: Arc::new(ModelService::new(model_repo.clone())),
            gallery_service: Arc::new(GalleryService::new(model_repo, photo_repo)),
            post_service: Arc::new(PostService::new(
                SqlxPostRepository::boxed(pool.clone()),
                cache.clone(),
            )),
            page_service: Arc::new(PageService::new(
                SqlxPageRepository::boxed(pool.clone()),
                cache.clone(),
            )),
            hero_service: Arc::new(HeroService::new(
                SqlxHeroSlideRepository::boxed(pool.clone()),
                cache.clone(),
            )),
            banner_service: Arc::new(BannerService::new(
                SqlxBannerRepository::boxed(pool.clone()),
                cache.clone(),
            )),
            seo_service: Arc::new(SeoService::new(
                SqlxSeoRepository::boxed(pool.clone()),
                cache.clone(),
            )),
            theme_service: Arc::new(ThemeService::new(
                SqlxThemeRepository::boxed(pool.clone()),
                cache,
            )),
            subscription_service: Arc::new(SubscriptionService::new(
                subscription_repo,
                user_repo,
            )),
            upload_config: Arc::new(crate::config::UploadConfig::default()),
            request_stats: Arc::new(RequestStats::new()),
            rate_limiter: Arc::new(LoginRateLimiter::new()),
        }
    }

    async fn server() -> (TestServer, AppState) {
        let state = test_state().await;
        let router = build_router(state.clone(), "http://localhost:3000");
        (TestServer::new(router).unwrap(), state)
    }

    /// Create the bootstrap admin and log in, returning the token
    async fn admin_token(server: &TestServer, state: &AppState) -> String {
        state
            .user_service
            .create_user(CreateUserInput {
                username: "boss".to_string(),
                email: "boss@example.com".to_string(),
                password: "correct-horse".to_string(),
                role: None,
            })
            .await
            .unwrap();

        let response = server
            .post("/api/v1/auth/login")
            .json(&json!({ "username": "boss", "password": "correct-horse" }))
            .await;
        response.assert_status_ok();
        response.json::<serde_json::Value>()["token"]
            .as_str()
            .unwrap()
            .to_string()
    }

    #[tokio::test]
    async fn test_admin_routes_require_auth_and_role() {
        let (server, state) = server().await;

        let response = server.get("/api/v1/admin/models").await;
        response.assert_status_unauthorized();

        // A regular (non-admin) user is forbidden. First create the admin so
        // the next account does not get bootstrapped into the role.
        let _admin = admin_token(&server, &state).await;
        state
            .user_service
            .create_user(CreateUserInput {
                username: "guest".to_string(),
                email: "guest@example.com".to_string(),
                password: "correct-horse".to_string(),
                role: None,
            })
            .await
            .unwrap();

        let login = server
            .post("/api/v1/auth/login")
            .json(&json!({ "username": "guest", "password": "correct-horse" }))
            .await;
        let token = login.json::<serde_json::Value>()["token"]
            .as_str()
            .unwrap()
            .to_string();

        let response = server
            .get("/api/v1/admin/models")
            .authorization_bearer(&token)
            .await;
        response.assert_status_forbidden();
    }

    #[tokio::test]
    async fn test_gallery_resolution_over_http() {
        let (server, state) = server().await;
        let token = admin_token(&server, &state).await;

        // Create a members-only, published model with one public and one
        // exclusive photo
        let model = state
            .model_service
            .create(CreateModelInput {
                slug: "ava".to_string(),
                name: "Ava".to_string(),
                tagline: None,
                bio: None,
                profile_image_url: Some("profile.jpg".to_string()),
                members_only: true,
                all_photos_public: false,
                published: true,
                sort_order: 0,
            })
            .await
            .unwrap();

        state
            .gallery_service
            .add_photo(
                model.id,
                CreatePhotoInput {
                    image_url: "a.jpg".to_string(),
                    caption: None,
                    order_index: Some(0),
                    visibility: PhotoVisibility::Public,
                },
            )
            .await
            .unwrap();
        state
            .gallery_service
            .add_photo(
                model.id,
                CreatePhotoInput {
                    image_url: "b.jpg".to_string(),
                    caption: None,
                    order_index: Some(1),
                    visibility: PhotoVisibility::MembersOnly,
                },
            )
            .await
            .unwrap();

        // Anonymous viewers get the placeholder, never the restricted photos
        let response = server.get("/api/v1/gallery/ava").await;
        response.assert_status_ok();
        let body = response.json::<serde_json::Value>();
        assert_eq!(body["tier"], "anonymous");
        assert_eq!(body["placeholder"], true);
        assert_eq!(body["photos"][0]["image_url"], "profile.jpg");

        // The admin sees the exclusive set
        let response = server
            .get("/api/v1/gallery/ava")
            .authorization_bearer(&token)
            .await;
        response.assert_status_ok();
        let body = response.json::<serde_json::Value>();
        assert_eq!(body["tier"], "admin");
        assert_eq!(body["placeholder"], false);
        assert_eq!(body["photos"].as_array().unwrap().len(), 1);
        assert_eq!(body["photos"][0]["image_url"], "b.jpg");
    }

    #[tokio::test]
    async fn test_member_sees_exclusive_photos() {
        let (server, state) = server().await;
        let _admin = admin_token(&server, &state).await;

        let member = state
            .user_service
            .create_user(CreateUserInput {
                username: "vip".to_string(),
                email: "vip@example.com".to_string(),
                password: "correct-horse".to_string(),
                role: None,
            })
            .await
            .unwrap();
        state
            .subscription_service
            .grant(member.id, None)
            .await
            .unwrap();

        let model = state
            .model_service
            .create(CreateModelInput {
                slug: "zoe".to_string(),
                name: "Zoe".to_string(),
                tagline: None,
                bio: None,
                profile_image_url: None,
                members_only: true,
                all_photos_public: false,
                published: true,
                sort_order: 0,
            })
            .await
            .unwrap();
        state
            .gallery_service
            .add_photo(
                model.id,
                CreatePhotoInput {
                    image_url: "exclusive.jpg".to_string(),
                    caption: None,
                    order_index: None,
                    visibility: PhotoVisibility::MembersOnly,
                },
            )
            .await
            .unwrap();

        let login = server
            .post("/api/v1/auth/login")
            .json(&json!({ "username": "vip", "password": "correct-horse" }))
            .await;
        let token = login.json::<serde_json::Value>()["token"]
            .as_str()
            .unwrap()
            .to_string();

        let response = server
            .get("/api/v1/gallery/zoe")
            .authorization_bearer(&token)
            .await;
        response.assert_status_ok();
        let body = response.json::<serde_json::Value>();
        assert_eq!(body["tier"], "member");
        assert_eq!(body["photos"][0]["image_url"], "exclusive.jpg");
    }

    #[tokio::test]
    async fn test_unpublished_model_hidden_from_public() {
        let (server, state) = server().await;

        state
            .model_service
            .create(CreateModelInput {
                slug: "draft".to_string(),
                name: "Draft".to_string(),
                tagline: None,
                bio: None,
                profile_image_url: None,
                members_only: false,
                all_photos_public: false,
                published: false,
                sort_order: 0,
            })
            .await
            .unwrap();

        let response = server.get("/api/v1/gallery/draft").await;
        response.assert_status_not_found();

        let response = server.get("/api/v1/models/draft").await;
        response.assert_status_not_found();
    }

    #[tokio::test]
    async fn test_public_theme_palette() {
        let (server, _state) = server().await;

        let response = server.get("/api/v1/theme").await;
        response.assert_status_ok();
        let body = response.json::<serde_json::Value>();
        assert!(body
            .as_array()
            .unwrap()
            .iter()
            .any(|c| c["name"] == "primary"));
    }
}
