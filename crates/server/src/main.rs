// crates/server/src/main.rs
//! Pipeline server binary.
//!
//! Parses flags, prepares the upload directory and serves the API until
//! Ctrl-C.

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use pipeline_server::{create_app, AppState, Config};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn,pipeline_server=info,pipeline_jobs=info".into()),
        )
        .compact()
        .init();

    let config = Config::parse();

    // Step 1: Shared state and upload directory
    let state = AppState::new(&config);
    state
        .uploads
        .ensure_dir()
        .await
        .context("preparing upload directory")?;

    // Step 2: Bind
    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;

    tracing::info!(
        %addr,
        upload_dir = %state.uploads.dir().display(),
        max_upload_bytes = config.max_upload_bytes,
        max_record_delay_ms = config.max_record_delay_ms,
        "Web server started"
    );

    // Step 3: Serve until Ctrl-C
    let app = create_app(state);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Web server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
