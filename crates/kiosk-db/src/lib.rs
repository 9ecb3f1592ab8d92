//! SQLite persistence for the kiosk: catalog, orders, accounts, stats.
//!
//! Connection and migration helpers return `anyhow::Result` (infra paths).
//! Domain operations return [`StoreResult`] so the daemon can map each
//! failure to an HTTP status.

use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;

use kiosk_schemas::OrderStatus;

mod accounts;
mod catalog;
mod orders;
mod stats;

pub use accounts::{
    create_account, delete_client_account, get_account, list_accounts, list_client_accounts,
    permissions_for, seed_account, update_client_permissions, verify_credentials, NewAccount,
};
pub use catalog::{
    create_category, create_menu_item, create_option_choice, create_option_group,
    delete_category, delete_menu_item, delete_option_choice, delete_option_group, get_category,
    get_menu_item, list_categories, list_menu_items, load_option_groups, update_category,
    update_menu_item, CategoryPatch, MenuItemPatch, NewCategory, NewMenuItem, NewOptionChoice,
    NewOptionGroup,
};
pub use orders::{
    clear_all_orders, count_active_orders, create_order, get_order, list_active_orders,
    list_orders, update_order_status,
};
pub use stats::daily_stats;

pub const ENV_DB_URL: &str = "KIOSK_DATABASE_URL";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    Validation(String),
    #[error("invalid status transition: {from} -> {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },
    #[error("stored row is corrupt: {0}")]
    Decode(String),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// `KIOSK_DATABASE_URL` wins over the configured URL.
pub fn database_url(configured: &str) -> String {
    match std::env::var(ENV_DB_URL) {
        Ok(v) if !v.trim().is_empty() => v,
        _ => configured.to_string(),
    }
}

/// Open a pooled SQLite connection (WAL, foreign keys on), creating the file
/// and its parent directory when missing.
pub async fn connect(url: &str, max_connections: u32) -> Result<SqlitePool> {
    if let Some(path) = sqlite_file_path(url) {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("failed to create database dir {}", dir.display()))?;
        }
    }

    let opts = SqliteConnectOptions::from_str(url)
        .with_context(|| format!("invalid sqlite url: {url}"))?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(opts)
        .await
        .context("failed to connect to SQLite")?;

    Ok(pool)
}

/// Fresh migrated in-memory database. One connection, never recycled, so the
/// data lives as long as the pool.
pub async fn connect_in_memory() -> Result<SqlitePool> {
    let opts = SqliteConnectOptions::from_str("sqlite::memory:")
        .context("invalid in-memory sqlite url")?
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(opts)
        .await
        .context("failed to open in-memory SQLite")?;

    migrate(&pool).await?;
    Ok(pool)
}

/// Run embedded SQLx migrations.
pub async fn migrate(pool: &SqlitePool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("db migrate failed")?;
    Ok(())
}

#[derive(Debug, Clone)]
pub struct DbStatus {
    pub ok: bool,
    pub has_orders_table: bool,
}

/// Connectivity + schema presence.
pub async fn status(pool: &SqlitePool) -> Result<DbStatus> {
    let (one,): (i64,) = sqlx::query_as("select 1")
        .fetch_one(pool)
        .await
        .context("status connectivity query failed")?;

    let (tables,): (i64,) = sqlx::query_as(
        "select count(*) from sqlite_master where type = 'table' and name = 'orders'",
    )
    .fetch_one(pool)
    .await
    .context("status table-exists query failed")?;

    Ok(DbStatus {
        ok: one == 1,
        has_orders_table: tables > 0,
    })
}

/// Calendar day an instant belongs to, shifted by the shop's UTC offset.
pub fn business_date(now: DateTime<Utc>, utc_offset_minutes: i32) -> NaiveDate {
    (now + Duration::minutes(i64::from(utc_offset_minutes))).date_naive()
}

/// `YYYY-MM-DD`, the form stored in `orders.business_date`.
pub(crate) fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn sqlite_file_path(url: &str) -> Option<PathBuf> {
    let rest = url
        .strip_prefix("sqlite://")
        .or_else(|| url.strip_prefix("sqlite:"))?;
    let path = rest.split('?').next().unwrap_or_default();
    if path.is_empty() || path == ":memory:" {
        return None;
    }
    Some(PathBuf::from(path))
}

pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn business_date_applies_offset() {
        let t = DateTime::parse_from_rfc3339("2026-10-16T20:30:00Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(business_date(t, 0), NaiveDate::from_ymd_opt(2026, 10, 16).unwrap());
        assert_eq!(business_date(t, 540), NaiveDate::from_ymd_opt(2026, 10, 17).unwrap());
        assert_eq!(business_date(t, -21 * 60), NaiveDate::from_ymd_opt(2026, 10, 15).unwrap());
    }

    #[test]
    fn sqlite_file_path_handles_url_forms() {
        assert_eq!(
            sqlite_file_path("sqlite://database/kiosk.db"),
            Some(PathBuf::from("database/kiosk.db"))
        );
        assert_eq!(
            sqlite_file_path("sqlite:///var/lib/kiosk.db?mode=rwc"),
            Some(PathBuf::from("/var/lib/kiosk.db"))
        );
        assert_eq!(sqlite_file_path("sqlite::memory:"), None);
        assert_eq!(sqlite_file_path("postgres://x"), None);
    }
}
