mod api;
mod middleware;

use std::sync::Arc;

use immo_core::{CatalogStore, QueryEngine};
use tracing_subscriber::EnvFilter;

use crate::api::{build_app, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = immo_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    tracing::info!(env = %config.env, "starting immo-server");

    // Blocking read; nothing is served until the catalog is complete.
    let catalog = CatalogStore::load(&config.dataset_path)?;

    let state = AppState {
        catalog: Arc::new(catalog),
        engine: QueryEngine::new(config.page_limits),
    };

    match config.static_dir.as_deref() {
        Some(dir) if !dir.is_dir() => {
            tracing::warn!(
                dir = %dir.display(),
                "static directory does not exist; requests outside /api will 404"
            );
        }
        Some(dir) => tracing::info!(dir = %dir.display(), "serving static assets"),
        None => {}
    }
    let app = build_app(state, config.static_dir.as_deref());

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
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
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
