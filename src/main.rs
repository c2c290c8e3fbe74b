use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use contacts_api::repo::{ContactRepository, InMemoryContactRepository, PgContactRepository};
use contacts_api::{app, AppState, Config};
use mimalloc::MiMalloc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

fn init_tracing(default_level: &str) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .try_init()
        .map_err(|err| anyhow!(err))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "failed to listen for ctrl-c");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "failed to listen for SIGTERM");
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
    info!("shutdown signal received");
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load().context("failed to load configuration")?;
    init_tracing(&config.log_level)?;

    let repo: Arc<dyn ContactRepository> = match &config.database_url {
        Some(url) => {
            let repo = PgContactRepository::connect(url, config.db_max_connections)
                .await
                .context("failed to connect to database")?;
            repo.ensure_schema()
                .await
                .context("failed to prepare contacts table")?;
            Arc::new(repo)
        }
        None => {
            warn!("DATABASE_URL not set; contacts are kept in memory and lost on exit");
            Arc::new(InMemoryContactRepository::new())
        }
    };

    let router = app(AppState::new(repo, config.page_limits()));

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    info!("Server running at http://{}", config.bind_addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}
