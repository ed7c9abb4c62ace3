//! Vitrine - Admin and gallery backend for a model showcase site

use anyhow::Result;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vitrine::{
    api::{self, middleware::RequestStats, AppState},
    cache::create_cache,
    config::Config,
    db::{
        self,
        repositories::{
            SqlxBannerRepository, SqlxHeroSlideRepository, SqlxModelRepository,
            SqlxPageRepository, SqlxPhotoRepository, SqlxPostRepository, SqlxSeoRepository,
            SqlxSessionRepository, SqlxSubscriptionRepository, SqlxThemeRepository,
            SqlxUserRepository,
        },
    },
    services::{
        AccessResolver, BannerService, GalleryService, HeroService, LoginRateLimiter,
        ModelService, PageService, PostService, SeoService, SubscriptionService, ThemeService,
        UserService,
    },
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vitrine=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Vitrine backend...");

    // Load configuration
    let config = Config::load_with_env(Path::new("config.yml"))?;
    tracing::info!("Configuration loaded");

    // Initialize database
    let pool = db::create_pool(&config.database).await?;
    tracing::info!("Database connected: {:?}", config.database.driver);

    // Run migrations
    db::migrations::run_migrations(&pool).await?;
    tracing::info!("Database migrations completed");

    // Initialize cache
    let cache = create_cache(&config.cache).await?;
    tracing::info!("Cache initialized");

    // Create repositories
    let user_repo = SqlxUserRepository::boxed(pool.clone());
    let session_repo = SqlxSessionRepository::boxed(pool.clone());
    let subscription_repo = SqlxSubscriptionRepository::boxed(pool.clone());
    let model_repo = SqlxModelRepository::boxed(pool.clone());
    let photo_repo = SqlxPhotoRepository::boxed(pool.clone());
    let post_repo = SqlxPostRepository::boxed(pool.clone());
    let page_repo = SqlxPageRepository::boxed(pool.clone());
    let hero_repo = SqlxHeroSlideRepository::boxed(pool.clone());
    let banner_repo = SqlxBannerRepository::boxed(pool.clone());
    let seo_repo = SqlxSeoRepository::boxed(pool.clone());
    let theme_repo = SqlxThemeRepository::boxed(pool.clone());

    // Initialize services
    let user_service = Arc::new(UserService::new(user_repo.clone(), session_repo));
    let access_resolver = Arc::new(AccessResolver::new(
        user_repo.clone(),
        subscription_repo.clone(),
    ));
    let model_service = Arc::new(ModelService::new(model_repo.clone()));
    let gallery_service = Arc::new(GalleryService::new(model_repo, photo_repo));
    let post_service = Arc::new(PostService::new(post_repo, cache.clone()));
    let page_service = Arc::new(PageService::new(page_repo, cache.clone()));
    let hero_service = Arc::new(HeroService::new(hero_repo, cache.clone()));
    let banner_service = Arc::new(BannerService::new(banner_repo, cache.clone()));
    let seo_service = Arc::new(SeoService::new(seo_repo, cache.clone()));
    let theme_service = Arc::new(ThemeService::new(theme_repo, cache));
    let subscription_service = Arc::new(SubscriptionService::new(subscription_repo, user_repo));

    // Build application state
    let request_stats = Arc::new(RequestStats::new());
    let rate_limiter = Arc::new(LoginRateLimiter::new());

    let state = AppState {
        pool: pool.clone(),
        user_service: user_service.clone(),
        access_resolver,
        model_service,
        gallery_service,
        post_service,
        page_service,
        hero_service,
        banner_service,
        seo_service,
        theme_service,
        subscription_service,
        upload_config: Arc::new(config.upload.clone()),
        request_stats,
        rate_limiter: rate_limiter.clone(),
    };

    // Periodic cleanup: rate limiter buckets and expired sessions
    {
        let limiter = rate_limiter.clone();
        let users = user_service.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(tokio::time::Duration::from_secs(300));
            loop {
                interval.tick().await;
                limiter.cleanup().await;
                match users.cleanup_expired_sessions().await {
                    Ok(0) => {}
                    Ok(n) => tracing::debug!("Removed {} expired sessions", n),
                    Err(e) => tracing::warn!("Session cleanup failed: {:#}", e),
                }
            }
        });
    }

    // Build router
    let app = api::build_router(state, &config.server.cors_origin);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
