use crate::config::Config;
use crate::modules::handlers::{self, AppState};
use anyhow::{Context, Result};
use axum::{extract::Extension, routing, Router, Server};
use clap::Args;
use contest_radar_libs::cache::TtlCache;
use contest_radar_libs::cancel::CancelToken;
use contest_radar_libs::ingest::{IngestError, IngestionOrchestrator};
use contest_radar_libs::registry::AdapterRegistry;
use contest_radar_libs::store::MemoryStore;
use contest_radar_libs::verify::VerificationOrchestrator;
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tower_http::cors::CorsLayer;

#[derive(Debug, Args)]
pub struct ServerArgs {
    #[arg(long)]
    port: Option<u16>,
}

pub async fn run(args: ServerArgs) -> Result<()> {
    let config = Config::from_env()?;
    let registry = Arc::new(
        AdapterRegistry::build(&config.registry).context("couldn't build the adapter registry")?,
    );
    let store = Arc::new(MemoryStore::new());
    let cancel = CancelToken::new();

    let state = Arc::new(AppState {
        ingest: IngestionOrchestrator::new(
            registry.clone(),
            store.clone(),
            config.max_concurrent,
            config.retention_days,
        ),
        verify: VerificationOrchestrator::new(registry, config.max_concurrent),
        store,
        verify_cache: TtlCache::new(),
        cancel: cancel.clone(),
    });

    tokio::spawn(schedule_loop(
        state.clone(),
        config.fetch_interval,
        cancel.clone(),
    ));

    let app = create_router(state);
    let port = match args.port {
        Some(port) => port,
        None => config.port,
    };
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Server start at port {}", port);
    Server::bind(&addr)
        .serve(app.into_make_service())
        .with_graceful_shutdown(shutdown_signal(cancel))
        .await
        .context("server failed")?;

    Ok(())
}

fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/contests/refresh", routing::post(handlers::refresh))
        .route(
            "/api/contests/refresh/platform/:platform",
            routing::post(handlers::refresh_platform),
        )
        .route(
            "/api/contests/platforms/list",
            routing::get(handlers::platforms_list),
        )
        .route("/api/contests/upcoming", routing::get(handlers::upcoming))
        .route(
            "/api/verify/:platform/:handle",
            routing::get(handlers::verify_one),
        )
        .route("/api/verify", routing::post(handlers::verify_batch))
        .route("/api/liveness", routing::get(handlers::liveness))
        .layer(Extension(state))
        .layer(CorsLayer::permissive())
}

/// Fixed-interval ingestion. The single-flight guard inside the
/// orchestrator means a manual refresh racing this loop is rejected rather
/// than interleaved.
async fn schedule_loop(state: Arc<AppState>, every: Duration, cancel: CancelToken) {
    let mut interval = tokio::time::interval(every);
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("scheduler stopping");
                return;
            }
            _ = interval.tick() => {}
        }
        match state.ingest.run(&cancel).await {
            Ok(summary) => {
                tracing::info!(
                    total = summary.total_fetched,
                    "scheduled ingestion run finished"
                );
            }
            Err(IngestError::AlreadyRunning) => {
                tracing::info!("scheduled run skipped, another run is in progress");
            }
            Err(IngestError::Cancelled) => {
                tracing::info!("scheduled run cancelled");
                return;
            }
        }
    }
}

async fn shutdown_signal(cancel: CancelToken) {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler.");
    };

    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received, cancelling in-flight fetches");
    cancel.cancel();
}
