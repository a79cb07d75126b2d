//! Pedidos web service entry point

use anyhow::Context;
use metrics_exporter_prometheus::PrometheusBuilder;
use pedidos_common::{config::AppConfig, db::schema, metrics, DbPool};
use pedidos_web::{create_router, AppState};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::{signal, sync::Notify};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Load configuration
    let config = AppConfig::load().context("Failed to load configuration")?;
    config.check()?;

    // 2. Setup logging
    init_tracing(&config);
    info!(
        service = %config.observability.service_name,
        "Starting Pedidos v{}",
        pedidos_common::VERSION
    );

    if config.auth.session_secret.as_deref().unwrap_or_default().is_empty() {
        warn!("No session secret configured, using the development secret");
    }

    // 3. Metrics
    metrics::register_metrics();
    if config.observability.metrics_port != 0 {
        let addr = SocketAddr::from(([0, 0, 0, 0], config.observability.metrics_port));
        PrometheusBuilder::new()
            .with_http_listener(addr)
            .set_buckets(metrics::LATENCY_BUCKETS)?
            .install()
            .context("Failed to install Prometheus exporter")?;
        info!("Metrics exporter listening on {}", addr);
    }

    // 4. Database
    let db = DbPool::new(&config.database).await?;
    if config.database.auto_migrate {
        schema::create_schema(db.write()).await?;
        info!("Database schema ready");
    }

    // 5. Router
    let config = Arc::new(config);
    let state = AppState::new(config.clone(), db);
    let app = create_router(state);

    // 6. Serve
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Listening on {}", addr);

    let shutdown = Arc::new(Notify::new());
    let server = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal(shutdown.clone()));

    // in-flight requests get `shutdown_timeout` to finish once a signal arrives
    let drain_deadline = async {
        shutdown.notified().await;
        tokio::time::sleep(config.shutdown_timeout()).await;
    };

    tokio::select! {
        result = async { server.await } => result?,
        _ = drain_deadline => warn!("Shutdown timeout elapsed, dropping open connections"),
    }

    info!("Server shutdown complete");
    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.observability.log_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    if config.observability.json_logging {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Resolves on Ctrl+C or SIGTERM and starts the drain deadline
async fn shutdown_signal(shutdown: Arc<Notify>) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
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
        _ = ctrl_c => info!("Received Ctrl+C, starting shutdown..."),
        _ = terminate => info!("Received SIGTERM, starting shutdown..."),
    }

    shutdown.notify_one();
}
