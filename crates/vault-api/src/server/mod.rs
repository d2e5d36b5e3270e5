//! Server setup and initialization
//!
//! Provides the main application builder and server runner.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tracing::{info, warn};
use vault_common::{AppConfig, AppError};
use vault_db::{
    create_pool, run_migrations, PgDeliveryRepository, PgJoinRequestRepository,
    PgTokenRepository, PgUserRepository,
};
use vault_service::services::maintenance;
use vault_service::{GateConfig, ServiceContextBuilder};

use crate::middleware::{apply_middleware, apply_rate_limit};
use crate::platform::TelegramClient;
use crate::routes::{create_router, health_routes};
use crate::state::AppState;

/// Build the complete Axum application with all routes and middleware
pub fn create_app(state: AppState) -> Router {
    let api = apply_rate_limit(create_router(), &state.config().rate_limit);
    let router = apply_middleware(api.merge(health_routes()));
    router.with_state(state)
}

/// Initialize all dependencies and create AppState
pub async fn create_app_state(config: AppConfig) -> Result<AppState, AppError> {
    let platform = TelegramClient::new(&config.telegram)
        .map_err(|e| AppError::Config(format!("Failed to build Telegram client: {e}")))?;

    let mut builder = ServiceContextBuilder::new()
        .platform(Arc::new(platform))
        .config(GateConfig::from(&config));

    builder = match &config.database {
        Some(database) => {
            info!("Connecting to PostgreSQL...");
            let pool = create_pool(&vault_db::DatabaseConfig::from(database))
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
            run_migrations(&pool)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
            info!("PostgreSQL connection established");

            builder
                .token_repo(Arc::new(PgTokenRepository::new(pool.clone())))
                .delivery_repo(Arc::new(PgDeliveryRepository::new(pool.clone())))
                .user_repo(Arc::new(PgUserRepository::new(pool.clone())))
                .join_request_repo(Arc::new(PgJoinRequestRepository::new(pool.clone())))
                .pool(pool)
        }
        None => {
            warn!("DATABASE_URL not set, tokens and pending deletions will not survive a restart");
            builder.memory_repositories()
        }
    };

    let service_context = builder
        .build()
        .map_err(|e| AppError::Config(e.to_string()))?;

    info!(
        archive_channel = %service_context.config().archive_channel,
        required_channels = service_context.config().required_channels.len(),
        auto_delete = ?service_context.config().auto_delete,
        "Service context ready"
    );

    Ok(AppState::new(service_context, config))
}

/// Run the HTTP server until a shutdown signal arrives
///
/// In-flight requests are allowed to finish before this returns.
pub async fn run_server(app: Router, addr: SocketAddr) -> Result<(), AppError> {
    info!("Starting HTTP server on {}", addr);

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::Config(format!("Failed to bind to {addr}: {e}")))?;

    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::Config(format!("Server error: {e}")))?;

    Ok(())
}

/// Run the complete server with configuration
pub async fn run(config: AppConfig) -> Result<(), AppError> {
    let addr: SocketAddr = config
        .api
        .address()
        .parse()
        .map_err(|e| AppError::Config(format!("Invalid bind address: {e}")))?;

    let state = create_app_state(config).await?;

    // Reload deletions persisted by a previous run; overdue ones fire on the first pass
    let scheduler = state.service_context().scheduler().clone();
    let restored = scheduler.restore().await.map_err(AppError::from)?;
    info!(restored, "Deletion queue restored");
    let scheduler_task = scheduler.start(state.shutdown().clone());

    let context = state.service_context().clone();
    let sweep_every = maintenance::sweep_interval(&context);
    let maintenance_task = maintenance::start(context, sweep_every, state.shutdown().clone());

    let app = create_app(state.clone());
    let result = run_server(app, addr).await;

    state.shutdown().cancel();
    if let Some(task) = scheduler_task {
        if let Err(e) = task.await {
            warn!(error = %e, "Deletion scheduler task ended abnormally");
        }
    }
    if let Err(e) = maintenance_task.await {
        warn!(error = %e, "Cache maintenance task ended abnormally");
    }
    info!("Server stopped");

    result
}

/// Resolves on Ctrl-C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
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
        () = ctrl_c => info!("Received SIGINT, starting graceful shutdown"),
        () = terminate => info!("Received SIGTERM, starting graceful shutdown"),
    }
}
