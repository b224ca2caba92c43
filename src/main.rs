//! Entry point: wires configuration, storage, the policy kernel and the
//! HTTP facade together, then serves until a shutdown signal arrives.

mod shutdown;

use anyhow::{Context, Result};
use auth_api::AppState;
use auth_config::{ConfigLoader, ConfigValidator};
use auth_core::{InsertBuffer, RevokeBuffer, Scheduler, SchedulerConfig, Store, Sweeper, TokenService};
use auth_db::{create_mysql_pool, RefreshTokenRepository};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use shutdown::shutdown_signal;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "refresh_token_authority=debug,auth_core=debug,auth_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("starting refresh-token authority");

    let environment = std::env::var("AUTH__ENVIRONMENT").unwrap_or_else(|_| "development".into());
    let config = ConfigLoader::new("config", &environment)
        .load()
        .context("failed to load configuration")?;
    ConfigValidator::validate_config(&config).context("configuration failed validation")?;
    info!(environment = %environment, "configuration loaded");

    let pool = create_mysql_pool(&config.database)
        .await
        .context("failed to connect to MySQL")?;
    info!("database connection established");

    sqlx::migrate!()
        .run(&pool)
        .await
        .context("failed to run migrations")?;
    info!("migrations applied");

    let store: Arc<dyn Store> = Arc::new(RefreshTokenRepository::new(pool));

    let insert_buffer = Arc::new(InsertBuffer::new(store.clone()));
    let revoke_buffer = Arc::new(RevokeBuffer::new(store.clone()));
    let sweeper = Arc::new(Sweeper::new(store));

    let token_service = Arc::new(TokenService::new(
        insert_buffer.clone(),
        revoke_buffer.clone(),
        &config.tokens,
    ));

    let scheduler_config = SchedulerConfig {
        insert_interval: Duration::from_secs(config.tokens.delay_saver_seconds),
        revoke_interval: Duration::from_secs(config.tokens.delay_blocker_seconds),
        sweep_interval: Duration::from_secs(config.tokens.delay_clear_seconds),
        shutdown_flush_timeout: Duration::from_secs(config.server.shutdown_timeout_seconds),
    };
    let scheduler = Scheduler::new(insert_buffer, revoke_buffer, sweeper, scheduler_config);

    let shutdown = CancellationToken::new();
    let scheduler_shutdown = shutdown.clone();
    let scheduler_handle = tokio::spawn(async move { scheduler.run(scheduler_shutdown).await });

    let app_state = AppState { token_service };
    let app = auth_api::app(app_state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("invalid server.host/server.port")?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("failed to bind listener")?;
    info!(%addr, "listening");

    tokio::select! {
        result = axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        ) => {
            result.context("server error")?;
        }
        _ = shutdown_signal() => {
            info!("shutdown signal received, draining background workers");
        }
    }

    shutdown.cancel();
    scheduler_handle
        .await
        .context("scheduler task panicked")?;

    info!("shutdown complete");
    Ok(())
}
