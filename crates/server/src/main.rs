use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use leadgen_core::{
    create_authenticator, load_config, validate_config, ArtifactStore, Authenticator,
    ExpiryReaper, FsArtifactStore, GeminiClient, GeneratorConfig, JobStore, LeadGenerator,
    SanitizedConfig, SerperClient,
};
use leadgen_server::api::create_router;
use leadgen_server::state::AppState;

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        eprintln!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // The TOML file is optional; the flat environment variables are enough.
    let config_path = std::env::var("LEADGEN_CONFIG").ok().map(PathBuf::from);
    match &config_path {
        Some(path) => info!("Loading configuration from {:?}", path),
        None => info!("Loading configuration from environment"),
    }
    let config = load_config(config_path.as_deref()).context("Failed to load config")?;
    validate_config(&config).context("Configuration validation failed")?;

    let sanitized_json =
        serde_json::to_string(&SanitizedConfig::from(&config)).unwrap_or_default();
    let config_hash = format!("{:x}", Sha256::digest(sanitized_json.as_bytes()));
    info!(
        version = VERSION,
        config_hash = &config_hash[..16],
        ttl_secs = config.artifacts.ttl_secs,
        storage_dir = %config.artifacts.storage_dir.display(),
        "Configuration loaded"
    );

    let authenticator: Arc<dyn Authenticator> = Arc::from(
        create_authenticator(&config.auth).context("Failed to create authenticator")?,
    );
    info!("Using authenticator: {}", authenticator.method_name());

    let artifacts: Arc<dyn ArtifactStore> = Arc::new(
        FsArtifactStore::open(
            &config.artifacts.storage_dir,
            config.artifacts.tombstone_retention(),
        )
        .await
        .context("Failed to open artifact store")?,
    );

    let llm = Arc::new(GeminiClient::new(&config.llm).context("Failed to create LLM client")?);
    let search =
        Arc::new(SerperClient::new(&config.search).context("Failed to create search client")?);
    info!(model = %config.llm.model, search_api = %config.search.api_base, "Upstream clients ready");

    let jobs = Arc::new(JobStore::new());
    let generator = Arc::new(LeadGenerator::new(
        llm,
        search,
        Arc::clone(&artifacts),
        Arc::clone(&jobs),
        GeneratorConfig::from_config(&config),
    ));

    // Jobs outlive their artifact by the tombstone window so `create` can still report expiry.
    let job_retention = std::time::Duration::from_secs(config.artifacts.ttl_secs)
        + config.artifacts.tombstone_retention();
    let reaper = Arc::new(
        ExpiryReaper::new(Arc::clone(&artifacts), config.artifacts.reap_interval())
            .with_job_store(jobs, job_retention),
    );
    reaper.start().await;

    let addr = SocketAddr::new(config.server.host, config.server.port);
    let state = Arc::new(
        AppState::new(config, authenticator, artifacts, generator)
            .with_reaper(Arc::clone(&reaper)),
    );
    let app = create_router(state);

    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("Server error")?;

    info!("Server shutting down...");
    reaper.stop().await;

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
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
                error!("Failed to install SIGTERM handler: {}", e);
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
