//! Accounts: the admin, staff clients, and their screen permissions.

use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::info;

use kiosk_auth::{hash_password, verify_password};
use kiosk_schemas::{Account, Permissions};

use crate::{is_unique_violation, StoreError, StoreResult};

#[derive(Debug, Clone)]
pub struct NewAccount {
    pub username: String,
    pub password: String,
    pub is_admin: bool,
    pub permissions: Permissions,
}

fn account_from_row(row: &SqliteRow) -> StoreResult<Account> {
    Ok(Account {
        id: row.try_get("id")?,
        username: row.try_get("username")?,
        is_admin: row.try_get("is_admin")?,
        can_access_cooking: row.try_get("can_access_cooking")?,
        can_access_order: row.try_get("can_access_order")?,
        created_at: row.try_get("created_at")?,
    })
}

/// Create the account or refresh its password. Used at boot for the admin
/// and the optional default client; an existing admin flag is never cleared.
pub async fn seed_account(
    pool: &SqlitePool,
    username: &str,
    password: &str,
    is_admin: bool,
) -> StoreResult<Account> {
    let row = sqlx::query(
        r#"
        insert into accounts (username, password_hash, is_admin, can_access_cooking, can_access_order, created_at)
        values (?, ?, ?, 1, 1, ?)
        on conflict(username) do update
           set password_hash = excluded.password_hash,
               is_admin = max(accounts.is_admin, excluded.is_admin)
        returning *
        "#,
    )
    .bind(username)
    .bind(hash_password(password))
    .bind(is_admin)
    .bind(Utc::now())
    .fetch_one(pool)
    .await?;

    let account = account_from_row(&row)?;
    info!(username = %account.username, is_admin = account.is_admin, "account seeded");
    Ok(account)
}

/// `None` when the user is unknown or the password is wrong.
pub async fn verify_credentials(
    pool: &SqlitePool,
    username: &str,
    password: &str,
) -> StoreResult<Option<Account>> {
    let row = sqlx::query("select * from accounts where username = ?")
        .bind(username)
        .fetch_optional(pool)
        .await?;
    let Some(row) = row else {
        return Ok(None);
    };
    let hash: String = row.try_get("password_hash")?;
    if !verify_password(password, &hash) {
        return Ok(None);
    }
    account_from_row(&row).map(Some)
}

pub async fn get_account(pool: &SqlitePool, id: i64) -> StoreResult<Account> {
    let row = sqlx::query("select * from accounts where id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(StoreError::NotFound("account"))?;
    account_from_row(&row)
}

/// Every account, admins first.
pub async fn list_accounts(pool: &SqlitePool) -> StoreResult<Vec<Account>> {
    let rows = sqlx::query("select * from accounts order by is_admin desc, id")
        .fetch_all(pool)
        .await?;
    rows.iter().map(account_from_row).collect()
}

/// Non-admin accounts, newest first.
pub async fn list_client_accounts(pool: &SqlitePool) -> StoreResult<Vec<Account>> {
    let rows =
        sqlx::query("select * from accounts where is_admin = 0 order by created_at desc, id desc")
            .fetch_all(pool)
            .await?;
    rows.iter().map(account_from_row).collect()
}

pub async fn create_account(pool: &SqlitePool, new: &NewAccount) -> StoreResult<Account> {
    let username = new.username.trim();
    if username.is_empty() {
        return Err(StoreError::Validation("username is required".into()));
    }
    if new.password.is_empty() {
        return Err(StoreError::Validation("password is required".into()));
    }

    let res = sqlx::query(
        r#"
        insert into accounts (username, password_hash, is_admin, can_access_cooking, can_access_order, created_at)
        values (?, ?, ?, ?, ?, ?)
        returning *
        "#,
    )
    .bind(username)
    .bind(hash_password(&new.password))
    .bind(new.is_admin)
    .bind(new.permissions.can_access_cooking)
    .bind(new.permissions.can_access_order)
    .bind(Utc::now())
    .fetch_one(pool)
    .await;

    match res {
        Ok(row) => account_from_row(&row),
        Err(e) if is_unique_violation(&e) => Err(StoreError::Conflict(format!(
            "username '{username}' already exists"
        ))),
        Err(e) => Err(e.into()),
    }
}

/// Admin accounts cannot be edited through this path.
pub async fn update_client_permissions(
    pool: &SqlitePool,
    id: i64,
    permissions: Permissions,
) -> StoreResult<Account> {
    let existing = get_account(pool, id).await?;
    if existing.is_admin {
        return Err(StoreError::Forbidden(
            "admin accounts cannot be modified".into(),
        ));
    }

    let row = sqlx::query(
        r#"
        update accounts
           set can_access_cooking = ?, can_access_order = ?
         where id = ? and is_admin = 0
        returning *
        "#,
    )
    .bind(permissions.can_access_cooking)
    .bind(permissions.can_access_order)
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(StoreError::NotFound("account"))?;
    account_from_row(&row)
}

pub async fn delete_client_account(pool: &SqlitePool, id: i64) -> StoreResult<()> {
    let existing = get_account(pool, id).await?;
    if existing.is_admin {
        return Err(StoreError::Forbidden("admin accounts cannot be deleted".into()));
    }

    let res = sqlx::query("delete from accounts where id = ? and is_admin = 0")
        .bind(id)
        .execute(pool)
        .await?;
    if res.rows_affected() == 0 {
        return Err(StoreError::NotFound("account"));
    }
    Ok(())
}

/// Admins hold every permission regardless of the stored flags.
pub async fn permissions_for(pool: &SqlitePool, id: i64) -> StoreResult<Permissions> {
    let account = get_account(pool, id).await?;
    Ok(Permissions::from(&account))
}
