//! Runtime secret resolution.
//!
//! # Contract
//! - Config YAML stores only **env var NAMES** (e.g. `"KIOSK_SESSION_SECRET"`).
//! - At startup, callers invoke [`resolve_secrets`] once and pass the result
//!   into constructors; never scatter `std::env::var` calls elsewhere.
//! - `Debug` redacts every value.
//! - Error messages reference the env var **NAME**, never the value.
//!
//! # Profile enforcement
//! - `production`: session secret and admin password are **required**.
//! - `dev`: everything optional; the daemon substitutes development
//!   fallbacks and logs a warning for each.
//!
//! The order-clearing master password and the default client password are
//! optional in every profile.

use anyhow::{bail, Result};

use crate::{KioskConfig, Profile};

#[derive(Clone)]
pub struct ResolvedSecrets {
    pub session_secret: Option<String>,
    pub admin_password: Option<String>,
    pub default_client_password: Option<String>,
    /// Master password for `POST /api/orders/clear`. `None` disables the endpoint.
    pub clear_password: Option<String>,
}

impl std::fmt::Debug for ResolvedSecrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedSecrets")
            .field("session_secret", &self.session_secret.as_ref().map(|_| "<REDACTED>"))
            .field("admin_password", &self.admin_password.as_ref().map(|_| "<REDACTED>"))
            .field(
                "default_client_password",
                &self.default_client_password.as_ref().map(|_| "<REDACTED>"),
            )
            .field("clear_password", &self.clear_password.as_ref().map(|_| "<REDACTED>"))
            .finish()
    }
}

/// Returns `None` if the variable is unset or blank.
fn resolve_env(var_name: &str) -> Option<String> {
    match std::env::var(var_name) {
        Ok(v) if !v.trim().is_empty() => Some(v),
        _ => None,
    }
}

/// Resolve every secret named by `cfg` from the process environment.
///
/// # Errors
/// In the `production` profile, returns `Err` naming the first missing
/// required env var.
pub fn resolve_secrets(cfg: &KioskConfig) -> Result<ResolvedSecrets> {
    let session_secret = resolve_env(&cfg.auth.secret_env);
    let admin_password = resolve_env(&cfg.accounts.admin_password_env);
    let default_client_password = cfg
        .accounts
        .default_client
        .as_ref()
        .and_then(|c| resolve_env(&c.password_env));
    let clear_password = resolve_env(&cfg.orders.clear_password_env);

    if cfg.runtime.profile == Profile::Production {
        if session_secret.is_none() {
            bail!(
                "SECRETS_MISSING profile=production: required env var '{}' \
                 (session signing secret) is not set or empty",
                cfg.auth.secret_env,
            );
        }
        if admin_password.is_none() {
            bail!(
                "SECRETS_MISSING profile=production: required env var '{}' \
                 (admin password) is not set or empty",
                cfg.accounts.admin_password_env,
            );
        }
    }

    Ok(ResolvedSecrets {
        session_secret,
        admin_password,
        default_client_password,
        clear_password,
    })
}
