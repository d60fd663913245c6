//! Yatube-rs server entry point.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use fred::clients::Client as RedisClient;
use fred::error::Error as RedisError;
use fred::interfaces::ClientLike;
use fred::types::config::Config as RedisClientConfig;
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use yatube_api::AppState;
use yatube_common::{
    AppError, Config, LocalStorage, StorageBackend,
    config::{CacheBackend, RedisConfig},
};
use yatube_core::{
    CommentService, FeedService, FollowService, GroupService, ListingCache, ListingService,
    MemoryListingCache, PostService, RedisListingCache, UserService,
};
use yatube_db::repositories::{
    CommentRepository, FollowRepository, GroupRepository, PostRepository, UserRepository,
};

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

/// Connect to Redis for the shared listing cache.
async fn connect_redis(config: &RedisConfig) -> Result<Arc<RedisClient>, RedisError> {
    let fred_config = RedisClientConfig::from_url(&config.url)?;
    let client = RedisClient::new(fred_config, None, None, None);
    client.connect();
    client.wait_for_connect().await?;
    Ok(Arc::new(client))
}

/// Build the listing cache selected by configuration.
async fn listing_cache(config: &Config) -> Result<Arc<dyn ListingCache>, Box<dyn std::error::Error>> {
    match config.cache.backend {
        CacheBackend::Memory => {
            info!("Using in-process listing cache");
            Ok(Arc::new(MemoryListingCache::new()))
        }
        CacheBackend::Redis => {
            let redis = config.redis.as_ref().ok_or_else(|| {
                AppError::Config("cache.backend = \"redis\" requires a [redis] section".to_string())
            })?;
            info!("Connecting to Redis...");
            let client = connect_redis(redis).await?;
            info!("Connected to Redis listing cache");
            Ok(Arc::new(RedisListingCache::new(client, redis.prefix.clone())))
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "yatube=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting yatube-rs server...");

    // Load configuration
    let config = Config::load()?;

    // Connect to database
    let db = yatube_db::init(&config).await?;
    info!("Connected to database");

    // Run migrations
    info!("Running database migrations...");
    yatube_db::migrate(&db).await?;
    info!("Migrations completed");

    let db = Arc::new(db);

    // Initialize repositories
    let user_repo = UserRepository::new(Arc::clone(&db));
    let group_repo = GroupRepository::new(Arc::clone(&db));
    let post_repo = PostRepository::new(Arc::clone(&db));
    let comment_repo = CommentRepository::new(Arc::clone(&db));
    let follow_repo = FollowRepository::new(Arc::clone(&db));

    // Media storage
    let storage: Arc<dyn StorageBackend> = Arc::new(LocalStorage::new(
        config.media.path.clone(),
        config.media.base_url.clone(),
    ));

    // Initialize services
    let user_service = UserService::new(user_repo.clone());
    let group_service = GroupService::new(group_repo.clone());
    let post_service = PostService::new(
        post_repo.clone(),
        user_repo.clone(),
        group_repo,
        storage.clone(),
    );
    let comment_service = CommentService::new(comment_repo, post_repo, user_repo.clone());
    let follow_service = FollowService::new(follow_repo, user_repo);
    let feed_service = FeedService::new(post_service.clone());
    let listing_service = ListingService::new(
        post_service.clone(),
        listing_cache(&config).await?,
        Duration::from_secs(config.cache.index_ttl_secs),
    );

    // Bootstrap administrator
    if let (Some(username), Some(token)) = (&config.admin.username, &config.admin.token) {
        user_service.ensure_admin(username, token).await?;
    }

    // Create app state
    let state = AppState {
        user_service,
        group_service,
        post_service,
        comment_service,
        follow_service,
        feed_service,
        listing_service,
        storage,
        max_upload_bytes: config.media.max_upload_bytes,
    };

    // Build router
    let mut app = yatube_api::app(state);
    let media_url = config.media.base_url.trim_end_matches('/');
    if media_url.starts_with('/') && media_url.len() > 1 {
        app = app.nest_service(media_url, ServeDir::new(&config.media.path));
        info!(url = %media_url, path = %config.media.path.display(), "Serving media files");
    }
    let app = app.layer(TraceLayer::new_for_http()).layer(
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
    );

    // Start server with graceful shutdown
    let host: std::net::IpAddr = config.server.host.parse()?;
    let addr = SocketAddr::from((host, config.server.port));
    info!(url = %config.server.url, "Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
