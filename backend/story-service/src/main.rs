use std::io;
use std::sync::Arc;
use std::time::Duration;

use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use redis::aio::ConnectionManager;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use story_service::clients::{
    DisabledMediaUploader, HttpMediaUploader, MediaUploader, PgNotifier, PgProfileLookup,
};
use story_service::config::{Config, StorageBackend};
use story_service::db::{PgBookmarkStore, PgStoryStore, RedisPreferenceStore};
use story_service::handlers::{self, AppState, Backends};
use story_service::middleware::{JwtAuthMiddleware, JwtValidator};

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = terminate.recv() => {},
                }
            }
            Err(e) => {
                tracing::warn!("Failed to install SIGTERM handler: {}", e);
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

fn to_io_error(context: &str, err: impl std::fmt::Display) -> io::Error {
    io::Error::new(io::ErrorKind::Other, format!("{context}: {err}"))
}

fn media_uploader(config: &Config) -> io::Result<Arc<dyn MediaUploader>> {
    if !config.media.is_enabled() {
        tracing::warn!("MEDIA_UPLOAD_URL not set; stories with images will be rejected");
        return Ok(Arc::new(DisabledMediaUploader));
    }

    let uploader = HttpMediaUploader::from_config(&config.media)
        .map_err(|e| to_io_error("Failed to create media uploader", e))?;
    Ok(Arc::new(uploader))
}

async fn postgres_backends(config: &Config) -> io::Result<Backends> {
    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .connect(&config.database.url)
        .await
        .map_err(|e| to_io_error("Failed to connect to database", e))?;
    tracing::info!("Connected to database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|e| to_io_error("Failed to run migrations", e))?;
    tracing::info!("Database migrations applied");

    let redis_client = redis::Client::open(config.cache.url.as_str())
        .map_err(|e| to_io_error("Invalid Redis URL", e))?;
    let redis = ConnectionManager::new(redis_client)
        .await
        .map_err(|e| to_io_error("Failed to initialize Redis connection", e))?;
    tracing::info!("Connected to Redis");

    Ok(Backends {
        stories: Arc::new(PgStoryStore::new(pool.clone())),
        preferences: Arc::new(RedisPreferenceStore::new(
            redis,
            config.cache.preference_key_prefix.clone(),
        )),
        bookmarks: Arc::new(PgBookmarkStore::new(pool.clone())),
        notifier: Arc::new(PgNotifier::new(pool.clone())),
        profiles: Arc::new(PgProfileLookup::new(pool)),
        uploader: media_uploader(config)?,
    })
}

/// Story Service
///
/// # Routes
///
/// - `/api/v1/stories/*` - story lifecycle, listings, comments, reactions and ranking
/// - `/api/v1/bookmarks/*` - bookmark toggle and listing
/// - `/api/v1/health*` - liveness and readiness
/// - `/metrics` - Prometheus exposition
#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,actix_web=info,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!("Configuration loading failed: {:#}", e);
            eprintln!("ERROR: Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!("Starting story-service v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "Environment: {}, storage: {:?}",
        config.app.env,
        config.app.storage
    );

    let backends = match config.app.storage {
        StorageBackend::Postgres => postgres_backends(&config).await?,
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; data is lost on restart");
            let mut backends = story_service::memory_backends();
            backends.uploader = media_uploader(&config)?;
            backends
        }
    };

    let state = web::Data::new(AppState::new(backends, config.ranking.clone()));
    let validator = Arc::new(JwtValidator::new(&config.auth.jwt_secret));

    let bind_address = format!("{}:{}", config.app.host, config.app.port);
    tracing::info!("Starting HTTP server at {}", bind_address);

    let allowed_origins = config.cors.allowed_origins.clone();
    let server = HttpServer::new(move || {
        let mut cors = Cors::default();
        for origin in allowed_origins.split(',') {
            let origin = origin.trim();
            if origin == "*" {
                cors = cors.allow_any_origin();
            } else if !origin.is_empty() {
                cors = cors.allowed_origin(origin);
            }
        }
        cors = cors.allow_any_method().allow_any_header().max_age(3600);

        App::new()
            .app_data(state.clone())
            .wrap(cors)
            .wrap(tracing_actix_web::TracingLogger::default())
            .route(
                "/metrics",
                web::get().to(story_service::metrics::serve_metrics),
            )
            .service(
                web::scope("/api/v1")
                    .wrap(JwtAuthMiddleware::new(validator.clone()))
                    .configure(handlers::configure),
            )
    })
    .bind(&bind_address)?
    .run();

    let server_handle = server.handle();
    let server_task = tokio::spawn(server);

    tokio::select! {
        result = server_task => {
            match result {
                Ok(Ok(())) => tracing::info!("HTTP server stopped"),
                Ok(Err(e)) => {
                    tracing::error!("HTTP server error: {}", e);
                    return Err(e);
                }
                Err(e) => return Err(to_io_error("HTTP server task failed", e)),
            }
        }
        _ = shutdown_signal() => {
            tracing::info!("Shutdown signal received");
            server_handle.stop(true).await;
        }
    }

    tracing::info!("story-service shut down");
    Ok(())
}
