//! kiosk-daemon entry point.
//!
//! Loads layered config, resolves secrets, opens and migrates the database,
//! boots the shared state and serves the router. Handlers live in
//! `routes.rs`; shared state lives in `state.rs`.

use std::sync::Arc;

use anyhow::Context;
use axum::http::{header, HeaderValue, Method};
use kiosk_config::{KioskConfig, UnusedKeyPolicy};
use kiosk_daemon::{routes, state};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::{info, warn, Level};

const ENV_CONFIG: &str = "KIOSK_CONFIG";
const ENV_ADDR: &str = "KIOSK_DAEMON_ADDR";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Silent if the file does not exist; deployments inject env vars directly.
    let _ = dotenvy::from_filename(".env.local");

    init_tracing();

    let config = load_config()?;
    let secrets = kiosk_config::resolve_secrets(&config)?;

    let db_url = kiosk_db::database_url(&config.database.url);
    let pool = kiosk_db::connect(&db_url, config.database.max_connections)
        .await
        .with_context(|| format!("open database {db_url}"))?;
    kiosk_db::migrate(&pool).await?;

    let cors = cors_from_config(&config);
    let addr = state::listen_addr(&config, std::env::var(ENV_ADDR).ok().as_deref())?;

    let shared = Arc::new(state::AppState::boot(config, &secrets, pool).await?);

    let app = routes::build_router(Arc::clone(&shared))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors);

    info!(
        profile = shared.config.runtime.profile.as_str(),
        "kiosk-daemon listening on http://{}", addr
    );

    axum::serve(tokio::net::TcpListener::bind(addr).await?, app)
        .with_graceful_shutdown(shutdown_signal(Arc::clone(&shared)))
        .await
        .context("server crashed")?;

    info!("kiosk-daemon stopped");
    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();
}

/// `KIOSK_CONFIG` is a comma-separated list of YAML layers, base first.
/// Unset means built-in defaults only.
fn load_config() -> anyhow::Result<KioskConfig> {
    let raw = std::env::var(ENV_CONFIG).unwrap_or_default();
    let paths: Vec<&str> = raw
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();

    let loaded = if paths.is_empty() {
        kiosk_config::load_layered_yaml_from_strings(&[])?
    } else {
        kiosk_config::load_layered_yaml(&paths)?
    };

    let report = kiosk_config::report_unused_keys(&loaded.config_json, UnusedKeyPolicy::Warn)?;
    for pointer in &report.unused_leaf_pointers {
        warn!(pointer = %pointer, "unused config key");
    }

    info!(config_hash = %loaded.config_hash, layers = paths.len(), "config loaded");
    loaded.typed()
}

/// Credentialed CORS for the configured screen origins.
fn cors_from_config(config: &KioskConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .server
        .cors_origins
        .iter()
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true)
}

/// Waits for Ctrl-C, then ends the live streams so in-flight SSE responses
/// finish and the server can drain.
async fn shutdown_signal(shared: Arc<state::AppState>) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "ctrl-c handler failed; shutting down");
    }
    info!("shutdown requested");
    shared.shutdown();
}
