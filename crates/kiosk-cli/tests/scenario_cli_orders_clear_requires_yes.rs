use predicates::prelude::*;

/// `kiosk orders clear` must refuse while any order is pending or cooking
/// unless --yes is given. Runs against a throwaway SQLite file.
#[allow(deprecated)]
#[tokio::test]
async fn cli_orders_clear_requires_yes_when_orders_active() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let url = format!("sqlite://{}", dir.path().join("kiosk.db").display());

    let pool = kiosk_db::connect(&url, 1).await?;
    kiosk_db::migrate(&pool).await?;
    let now = chrono::Utc::now();
    let line = kiosk_schemas::CartLine {
        menu_item_id: None,
        name: "Hotteok".to_string(),
        price: 2000,
        quantity: 3,
        options: Vec::new(),
        total_price: 0,
    };
    kiosk_db::create_order(&pool, &[line], now.date_naive(), now).await?;
    pool.close().await;

    let mut cmd = assert_cmd::Command::cargo_bin("kiosk")?;
    cmd.env(kiosk_db::ENV_DB_URL, &url)
        .env_remove("KIOSK_CONFIG")
        .args(["orders", "active"]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("active_orders=1"))
        .stdout(predicate::str::contains("total_price=6000"));

    // Without --yes => refusal, nothing removed.
    let mut cmd = assert_cmd::Command::cargo_bin("kiosk")?;
    cmd.env(kiosk_db::ENV_DB_URL, &url)
        .env_remove("KIOSK_CONFIG")
        .args(["orders", "clear"]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("REFUSING CLEAR"));

    // With --yes => the order is gone.
    let mut cmd = assert_cmd::Command::cargo_bin("kiosk")?;
    cmd.env(kiosk_db::ENV_DB_URL, &url)
        .env_remove("KIOSK_CONFIG")
        .args(["orders", "clear", "--yes"]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("removed=1"));

    Ok(())
}
