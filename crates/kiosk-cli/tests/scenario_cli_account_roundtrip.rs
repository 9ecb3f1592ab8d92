use predicates::prelude::*;

/// Migrate a fresh file, create accounts through the CLI and list them back.
#[allow(deprecated)]
#[test]
fn cli_creates_and_lists_accounts() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let url = format!("sqlite://{}", dir.path().join("kiosk.db").display());

    let kiosk = || -> anyhow::Result<assert_cmd::Command> {
        let mut cmd = assert_cmd::Command::cargo_bin("kiosk")?;
        cmd.env(kiosk_db::ENV_DB_URL, &url).env_remove("KIOSK_CONFIG");
        Ok(cmd)
    };

    kiosk()?
        .args(["db", "migrate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("migrations_applied=true"));

    kiosk()?
        .args(["db", "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("db_ok=true has_orders_table=true"));

    kiosk()?
        .args(["account", "create", "--username", "grill", "--password", "fire", "--no-order"])
        .assert()
        .success()
        .stdout(predicate::str::contains("created=true"));

    // Duplicate usernames are rejected.
    kiosk()?
        .args(["account", "create", "--username", "grill", "--password", "fire"])
        .assert()
        .failure();

    kiosk()?
        .args(["account", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "username=grill is_admin=false can_access_cooking=true can_access_order=false",
        ));

    kiosk()?
        .args(["stats", "--date", "2026-05-05"])
        .assert()
        .success()
        .stdout(predicate::str::contains("business_date=2026-05-05"))
        .stdout(predicate::str::contains("total_orders=0"));

    kiosk()?
        .args(["stats", "--date", "05/05/2026"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid --date"));

    Ok(())
}
