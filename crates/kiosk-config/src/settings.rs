//! Typed view over the merged config document.
//!
//! Every section has defaults so an empty document is a working dev setup.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    /// Missing secrets fall back to well-known development values.
    #[default]
    Dev,
    /// Session secret and admin password must come from the environment.
    Production,
}

impl Profile {
    pub fn as_str(&self) -> &'static str {
        match self {
            Profile::Dev => "dev",
            Profile::Production => "production",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KioskConfig {
    pub runtime: RuntimeSection,
    pub server: ServerSection,
    pub database: DatabaseSection,
    pub stream: StreamSection,
    pub business_day: BusinessDaySection,
    pub auth: AuthSection,
    pub accounts: AccountsSection,
    pub orders: OrdersSection,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeSection {
    pub profile: Profile,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub bind_addr: String,
    /// Browser origins allowed to call the API with cookies.
    pub cors_origins: Vec<String>,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:3000".to_string(),
            cors_origins: vec![
                "http://localhost:3000".to_string(),
                "http://127.0.0.1:3000".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSection {
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseSection {
    fn default() -> Self {
        Self {
            url: "sqlite://database/kiosk.db".to_string(),
            max_connections: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamSection {
    /// Period of the `{"type":"heartbeat"}` keepalive on both streams.
    pub heartbeat_secs: u64,
    /// Reconnect delay advertised to EventSource clients.
    pub retry_ms: u64,
}

impl Default for StreamSection {
    fn default() -> Self {
        Self {
            heartbeat_secs: 30,
            retry_ms: 3000,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BusinessDaySection {
    /// Offset from UTC used to decide which day an order belongs to.
    pub utc_offset_minutes: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthSection {
    /// Name of the env var holding the token signing secret.
    pub secret_env: String,
    pub admin_ttl_hours: i64,
    pub client_ttl_days: i64,
    pub secure_cookies: bool,
}

impl Default for AuthSection {
    fn default() -> Self {
        Self {
            secret_env: "KIOSK_SESSION_SECRET".to_string(),
            admin_ttl_hours: 24,
            client_ttl_days: 7,
            secure_cookies: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountsSection {
    pub admin_username: String,
    pub admin_password_env: String,
    /// Optional staff account provisioned at boot.
    pub default_client: Option<DefaultClientSection>,
}

impl Default for AccountsSection {
    fn default() -> Self {
        Self {
            admin_username: "admin".to_string(),
            admin_password_env: "KIOSK_ADMIN_PASSWORD".to_string(),
            default_client: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultClientSection {
    pub username: String,
    pub password_env: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrdersSection {
    /// Env var holding the master password for wiping all orders.
    pub clear_password_env: String,
}

impl Default for OrdersSection {
    fn default() -> Self {
        Self {
            clear_password_env: "KIOSK_MASTER_PASSWORD".to_string(),
        }
    }
}

impl KioskConfig {
    pub fn from_json(config_json: &Value) -> Result<Self> {
        let cfg: KioskConfig =
            serde_json::from_value(config_json.clone()).context("config does not match schema")?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<()> {
        if self.stream.heartbeat_secs == 0 {
            bail!("CONFIG_INVALID: stream.heartbeat_secs must be > 0");
        }
        if self.auth.admin_ttl_hours <= 0 || self.auth.client_ttl_days <= 0 {
            bail!("CONFIG_INVALID: auth token TTLs must be > 0");
        }
        if self.database.max_connections == 0 {
            bail!("CONFIG_INVALID: database.max_connections must be > 0");
        }
        if self.accounts.admin_username.trim().is_empty() {
            bail!("CONFIG_INVALID: accounts.admin_username must not be blank");
        }
        if self.business_day.utc_offset_minutes.abs() >= 24 * 60 {
            bail!("CONFIG_INVALID: business_day.utc_offset_minutes out of range");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let cfg = KioskConfig::from_json(&serde_json::json!({})).unwrap();
        assert_eq!(cfg.runtime.profile, Profile::Dev);
        assert_eq!(cfg.stream.heartbeat_secs, 30);
        assert_eq!(cfg.stream.retry_ms, 3000);
        assert_eq!(cfg.auth.admin_ttl_hours, 24);
        assert!(cfg.accounts.default_client.is_none());
    }

    #[test]
    fn zero_heartbeat_is_rejected() {
        let err = KioskConfig::from_json(&serde_json::json!({"stream": {"heartbeat_secs": 0}}))
            .unwrap_err();
        assert!(err.to_string().contains("heartbeat_secs"));
    }
}
