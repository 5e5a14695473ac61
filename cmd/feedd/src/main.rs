//! # feedd
//!
//! Assembles the community feed: settings, backend selection, the feed
//! service and the HTTP routes.

use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use configs::Settings;
use services::{CannedExamples, FeedOptions, FeedService};
use storage_adapters::{select_backend, SelectorOptions};
use tokio::net::TcpListener;
use tokio::signal;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().context("failed to load settings")?;
    init_tracing(&settings);

    // 1. Pick the physical store once; the rest of the process never asks again
    let backend = select_backend(&selector_options(&settings)).await;

    // 2. Build the service over the chosen store
    let mut service = FeedService::new(
        backend.store,
        FeedOptions {
            admin_emails: settings.feed.admin_emails.clone(),
            serialize_writes: settings.feed.serialize_writes,
        },
    );
    if settings.feed.seed_examples {
        service = service.with_seeder(Arc::new(CannedExamples));
    }
    info!(mode = %service.mode(), "storage backend ready");

    // 3. Serve
    let app = Router::new().nest("/api", api_adapters::router(Arc::new(service)));

    let address = settings.server.bind_address();
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {address}"))?;
    info!("feed API listening on http://{address}/api");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("feed API stopped");
    Ok(())
}

fn init_tracing(settings: &Settings) {
    // RUST_LOG wins over the configured filter when set.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.log.filter));

    if settings.log.json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

fn selector_options(settings: &Settings) -> SelectorOptions {
    SelectorOptions {
        data_dir: settings.storage.data_dir.clone(),
        document_uri: settings.storage.document_uri(),
        #[cfg(feature = "db-document")]
        document: storage_adapters::DocumentOptions {
            connect_timeout: settings.storage.connect_timeout(),
            op_timeout: settings.storage.op_timeout(),
            max_connections: settings.storage.max_connections,
        },
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if signal::ctrl_c().await.is_ok() {
            info!("received Ctrl+C, shutting down");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
                info!("received terminate signal, shutting down");
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
