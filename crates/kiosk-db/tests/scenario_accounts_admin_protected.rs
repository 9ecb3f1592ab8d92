//! Scenario: account management.
//!
//! # Invariant under test
//! - Seeding refreshes the password and keeps one row per username.
//! - Duplicate usernames conflict.
//! - Admin accounts cannot be edited or deleted through client paths.
//! - Admins hold every permission.

use kiosk_db::{NewAccount, StoreError};
use kiosk_schemas::Permissions;

#[tokio::test]
async fn seeding_refreshes_password() -> anyhow::Result<()> {
    let pool = kiosk_db::connect_in_memory().await?;
    let first = kiosk_db::seed_account(&pool, "admin", "old-pass", true).await?;
    let second = kiosk_db::seed_account(&pool, "admin", "new-pass", true).await?;
    assert_eq!(first.id, second.id);
    assert!(second.is_admin);

    assert!(kiosk_db::verify_credentials(&pool, "admin", "old-pass").await?.is_none());
    let ok = kiosk_db::verify_credentials(&pool, "admin", "new-pass").await?;
    assert_eq!(ok.map(|a| a.id), Some(first.id));
    assert!(kiosk_db::verify_credentials(&pool, "nobody", "x").await?.is_none());
    Ok(())
}

#[tokio::test]
async fn duplicate_username_conflicts() -> anyhow::Result<()> {
    let pool = kiosk_db::connect_in_memory().await?;
    let new = NewAccount {
        username: "counter1".into(),
        password: "pw".into(),
        is_admin: false,
        permissions: Permissions {
            can_access_cooking: false,
            can_access_order: true,
        },
    };
    let created = kiosk_db::create_account(&pool, &new).await?;
    assert!(!created.can_access_cooking);
    assert!(created.can_access_order);

    let dup = kiosk_db::create_account(&pool, &new).await;
    assert!(matches!(dup, Err(StoreError::Conflict(_))));
    Ok(())
}

#[tokio::test]
async fn admin_is_protected_from_client_paths() -> anyhow::Result<()> {
    let pool = kiosk_db::connect_in_memory().await?;
    let admin = kiosk_db::seed_account(&pool, "admin", "pw", true).await?;
    let client = kiosk_db::seed_account(&pool, "22user", "pw", false).await?;

    let edit = kiosk_db::update_client_permissions(&pool, admin.id, Permissions::NONE).await;
    assert!(matches!(edit, Err(StoreError::Forbidden(_))));
    let delete = kiosk_db::delete_client_account(&pool, admin.id).await;
    assert!(matches!(delete, Err(StoreError::Forbidden(_))));

    let clients = kiosk_db::list_client_accounts(&pool).await?;
    assert_eq!(clients.iter().map(|a| a.id).collect::<Vec<_>>(), vec![client.id]);
    assert_eq!(kiosk_db::list_accounts(&pool).await?.len(), 2);

    let narrowed = kiosk_db::update_client_permissions(
        &pool,
        client.id,
        Permissions {
            can_access_cooking: true,
            can_access_order: false,
        },
    )
    .await?;
    assert!(!narrowed.can_access_order);

    assert_eq!(kiosk_db::permissions_for(&pool, admin.id).await?, Permissions::ALL);
    kiosk_db::delete_client_account(&pool, client.id).await?;
    assert!(matches!(
        kiosk_db::permissions_for(&pool, client.id).await,
        Err(StoreError::NotFound(_))
    ));
    Ok(())
}
