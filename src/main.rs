use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context};
use metrics_exporter_prometheus::PrometheusBuilder;

use comment_board::config::AppConfig;
use comment_board::delivery::http::v1::router;
use comment_board::repository::postgres::{create_pool, PostgresCommentRepository};
use comment_board::telemetry;
use comment_board::usecase::comments::CommentsUseCase;
use comment_board::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env().context("failed to load configuration")?;

    let tracer_provider = telemetry::init(&config)
        .map_err(|e| anyhow!("failed to initialize telemetry: {e}"))?;

    tracing::info!("starting the comment board service");
    tracing::info!("config loaded, telemetry_enabled={}", config.telemetry_enabled);

    let metrics_handle = PrometheusBuilder::new()
        .install_recorder()
        .context("failed to install Prometheus recorder")?;
    metrics_process::Collector::default().describe();
    tracing::info!("prometheus metrics initialized");

    let pool = create_pool(
        &config.database_url,
        config.database_max_connections,
        Duration::from_secs(config.database_acquire_timeout_secs),
    )
    .await
    .context("failed to create database pool")?;
    tracing::info!("database pool created");

    sqlx::migrate!().run(&pool).await?;
    tracing::info!("database migrations applied");

    let shared_state = Arc::new(AppState {
        comments_usecase: CommentsUseCase::new(PostgresCommentRepository::new(pool.clone())),
        metrics_handle,
    });

    let app = router(shared_state, &config.normalized_api_prefix());

    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "comment board service running");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("shutting down");
    pool.close().await;
    telemetry::shutdown_telemetry(tracer_provider);

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
