//! platebook - food review blog backend
//!
//! Serves the public review/list API, the admin API and the Beli import
//! endpoints, backed by SQLite and a local object store.

use anyhow::{Context, Result};
use clap::Parser;
use platebook_common::config::{ensure_root_folder, TomlConfig};
use std::sync::Arc;
use tokio::signal;
use tracing::{info, warn};

use platebook_server::config::{Cli, ServerConfig};
use platebook_server::services::{AuthContext, GeminiClient, GoogleTokenVerifier};
use platebook_server::storage::LocalObjectStore;
use platebook_server::{build_router, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    // Log build identification before anything slow happens
    info!(
        "Starting platebook v{} [{}] ({})",
        env!("CARGO_PKG_VERSION"),
        platebook_server::GIT_HASH,
        if cfg!(debug_assertions) { "debug" } else { "release" }
    );

    let cli = Cli::parse();
    let toml_config = TomlConfig::load_or_default(cli.config.as_deref());
    let config = ServerConfig::resolve(&cli, &toml_config);

    info!("Root folder: {}", config.root_folder.display());
    ensure_root_folder(&config.root_folder)
        .map_err(|e| anyhow::anyhow!("Failed to initialize root folder: {}", e))?;

    let db_path = config.database_path();
    info!("Database: {}", db_path.display());
    let db_pool = platebook_server::db::init_database_pool(&db_path)
        .await
        .context("Failed to open database")?;
    info!("Database connection established");

    let storage_dir = config.storage_path();
    let storage = Arc::new(LocalObjectStore::new(&storage_dir, &config.public_base_url));

    if config.admin_emails.is_empty() {
        warn!("No admin e-mails configured; admin routes will reject every request");
    } else {
        info!("Admin allowlist: {} address(es)", config.admin_emails.len());
    }
    let verifier = GoogleTokenVerifier::new(config.google_client_id.clone())
        .context("Failed to build identity verifier")?;
    let auth = AuthContext::new(config.admin_emails.clone(), Arc::new(verifier));

    let mut state = AppState::new(db_pool, storage, auth).with_files_dir(&storage_dir);

    match &config.gemini_api_key {
        Some(key) => {
            let client = GeminiClient::new(key.clone()).context("Failed to build Gemini client")?;
            info!("Gemini model: {}", client.model());
            state = state.with_inference(Arc::new(client));
        }
        None => warn!("GEMINI_API_KEY not set; /api/parse-beli will report a setup error"),
    }

    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(config.listen_addr())
        .await
        .with_context(|| format!("Failed to bind {}", config.listen_addr()))?;
    info!("Listening on http://{}", config.listen_addr());
    info!("Health check: http://{}/health", config.listen_addr());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received terminate signal, shutting down"),
    }
}
