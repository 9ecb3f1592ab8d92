//! Shared runtime state for kiosk-daemon.
//!
//! Handlers receive `State<Arc<AppState>>` from Axum. The live hub is owned
//! here and reached by reference; nothing in this crate is a global.

use std::{net::SocketAddr, sync::Arc};

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use kiosk_auth::TokenSigner;
use kiosk_config::{KioskConfig, Profile, ResolvedSecrets};
use kiosk_live::LiveHub;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tokio::sync::watch;
use tracing::{info, warn};

// Well-known development fallbacks, never used under the production profile
// for the session secret or the admin password.
const DEV_SESSION_SECRET: &str = "kiosk-dev-session-secret";
const DEV_ADMIN_PASSWORD: &str = "admin123";
const DEV_CLIENT_PASSWORD: &str = "user123";
const DEV_CLEAR_PASSWORD: &str = "5678";

// ---------------------------------------------------------------------------
// BuildInfo
// ---------------------------------------------------------------------------

/// Static build metadata included in health responses.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BuildInfo {
    pub service: &'static str,
    pub version: &'static str,
}

impl Default for BuildInfo {
    fn default() -> Self {
        Self {
            service: "kiosk-daemon",
            version: env!("CARGO_PKG_VERSION"),
        }
    }
}

// ---------------------------------------------------------------------------
// Listen address
// ---------------------------------------------------------------------------

/// Socket to bind: `env_override` (from `KIOSK_DAEMON_ADDR`) wins over
/// `server.bind_addr`. Whichever source is used must parse.
pub fn listen_addr(config: &KioskConfig, env_override: Option<&str>) -> Result<SocketAddr> {
    match env_override.map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => raw
            .parse()
            .with_context(|| format!("KIOSK_DAEMON_ADDR '{raw}' is not a socket address")),
        None => config.server.bind_addr.parse().with_context(|| {
            format!(
                "server.bind_addr '{}' is not a socket address",
                config.server.bind_addr
            )
        }),
    }
}

// ---------------------------------------------------------------------------
// AppState
// ---------------------------------------------------------------------------

pub struct AppState {
    pub build: BuildInfo,
    pub config: KioskConfig,
    pub pool: SqlitePool,
    /// Current cart plus the cart and order channels.
    pub live: Arc<LiveHub>,
    pub signer: TokenSigner,
    /// Master password for wiping orders; `None` disables the endpoint.
    pub clear_password: Option<String>,
    /// Flips to `true` once; every open stream ends when it does.
    shutdown: watch::Sender<bool>,
}

impl AppState {
    /// Build the state and provision boot accounts.
    ///
    /// Expects a migrated pool. The admin account always exists afterwards;
    /// the default client exists when configured and a password is known.
    pub async fn boot(
        config: KioskConfig,
        secrets: &ResolvedSecrets,
        pool: SqlitePool,
    ) -> Result<Self> {
        let dev = config.runtime.profile == Profile::Dev;

        let session_secret = secrets.session_secret.clone().unwrap_or_else(|| {
            warn!(env = %config.auth.secret_env, "session secret unset; using development secret");
            DEV_SESSION_SECRET.to_string()
        });

        let admin_password = secrets.admin_password.clone().unwrap_or_else(|| {
            warn!(env = %config.accounts.admin_password_env, "admin password unset; using development password");
            DEV_ADMIN_PASSWORD.to_string()
        });
        kiosk_db::seed_account(&pool, &config.accounts.admin_username, &admin_password, true)
            .await?;

        if let Some(client) = &config.accounts.default_client {
            let password = match (&secrets.default_client_password, dev) {
                (Some(p), _) => Some(p.clone()),
                (None, true) => {
                    warn!(env = %client.password_env, "default client password unset; using development password");
                    Some(DEV_CLIENT_PASSWORD.to_string())
                }
                (None, false) => {
                    warn!(env = %client.password_env, username = %client.username, "default client password unset; account not provisioned");
                    None
                }
            };
            if let Some(p) = password {
                kiosk_db::seed_account(&pool, &client.username, &p, false).await?;
            }
        }

        let clear_password = match (&secrets.clear_password, dev) {
            (Some(p), _) => Some(p.clone()),
            (None, true) => {
                warn!(env = %config.orders.clear_password_env, "master password unset; using development password");
                Some(DEV_CLEAR_PASSWORD.to_string())
            }
            (None, false) => {
                info!("master password unset; POST /api/orders/clear is disabled");
                None
            }
        };

        let signer = TokenSigner::new(
            session_secret,
            Duration::hours(config.auth.admin_ttl_hours),
            Duration::days(config.auth.client_ttl_days),
        );

        let (shutdown, _) = watch::channel(false);

        Ok(Self {
            build: BuildInfo::default(),
            config,
            pool,
            live: Arc::new(LiveHub::new()),
            signer,
            clear_password,
            shutdown,
        })
    }

    /// Business day an instant falls on, per the configured UTC offset.
    pub fn business_date(&self, now: DateTime<Utc>) -> NaiveDate {
        kiosk_db::business_date(now, self.config.business_day.utc_offset_minutes)
    }

    /// End every open SSE stream. Graceful shutdown waits on in-flight
    /// responses, so this must happen before the server can stop.
    pub fn shutdown(&self) {
        if !self.shutdown.send_replace(true) {
            info!(
                cart_subscribers = self.live.cart_subscribers(),
                order_subscribers = self.live.order_subscribers(),
                "closing live streams"
            );
        }
    }

    pub fn is_shutting_down(&self) -> bool {
        *self.shutdown.borrow()
    }

    /// Receiver handed to each stream so it can end on [`AppState::shutdown`].
    pub fn shutdown_watch(&self) -> watch::Receiver<bool> {
        self.shutdown.subscribe()
    }
}
