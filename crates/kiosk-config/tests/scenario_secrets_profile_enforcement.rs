//! Scenario: secret resolution per profile.
//!
//! # Test design
//! Each test names its own env vars so tests never race on shared names.
//! Missing-secret tests use sentinel names that are never set.

use kiosk_config::{load_layered_yaml_from_strings, resolve_secrets, KioskConfig};

fn typed(yaml: &str) -> KioskConfig {
    load_layered_yaml_from_strings(&[yaml])
        .expect("test yaml must parse cleanly")
        .typed()
        .expect("test yaml must match schema")
}

#[test]
fn production_fails_without_session_secret() {
    let cfg = typed(
        r#"
runtime:
  profile: production
auth:
  secret_env: "KIOSK_T1_SENTINEL_SECRET_MISSING"
accounts:
  admin_password_env: "KIOSK_T1_SENTINEL_ADMIN_MISSING"
"#,
    );
    let msg = resolve_secrets(&cfg).unwrap_err().to_string();
    assert!(msg.contains("SECRETS_MISSING"), "got: {msg}");
    assert!(msg.contains("profile=production"), "got: {msg}");
    assert!(msg.contains("KIOSK_T1_SENTINEL_SECRET_MISSING"), "got: {msg}");
}

#[test]
fn production_fails_without_admin_password() {
    std::env::set_var("KIOSK_T2_SESSION_SECRET", "t2-signing-secret");
    let cfg = typed(
        r#"
runtime:
  profile: production
auth:
  secret_env: "KIOSK_T2_SESSION_SECRET"
accounts:
  admin_password_env: "KIOSK_T2_SENTINEL_ADMIN_MISSING"
"#,
    );
    let msg = resolve_secrets(&cfg).unwrap_err().to_string();
    assert!(msg.contains("KIOSK_T2_SENTINEL_ADMIN_MISSING"), "got: {msg}");
    assert!(!msg.contains("t2-signing-secret"), "values never leak");
}

#[test]
fn dev_profile_tolerates_missing_secrets() {
    let cfg = typed(
        r#"
auth:
  secret_env: "KIOSK_T3_SENTINEL_SECRET_MISSING"
accounts:
  admin_password_env: "KIOSK_T3_SENTINEL_ADMIN_MISSING"
orders:
  clear_password_env: "KIOSK_T3_SENTINEL_CLEAR_MISSING"
"#,
    );
    let secrets = resolve_secrets(&cfg).unwrap();
    assert!(secrets.session_secret.is_none());
    assert!(secrets.admin_password.is_none());
    assert!(secrets.clear_password.is_none());
    assert!(secrets.default_client_password.is_none());
}

#[test]
fn present_secrets_resolve_and_debug_is_redacted() {
    std::env::set_var("KIOSK_T4_SESSION_SECRET", "t4-signing-secret");
    std::env::set_var("KIOSK_T4_ADMIN_PASSWORD", "t4-admin-pass");
    std::env::set_var("KIOSK_T4_CLIENT_PASSWORD", "t4-client-pass");
    std::env::set_var("KIOSK_T4_BLANK_CLEAR", "   ");
    let cfg = typed(
        r#"
runtime:
  profile: production
auth:
  secret_env: "KIOSK_T4_SESSION_SECRET"
accounts:
  admin_password_env: "KIOSK_T4_ADMIN_PASSWORD"
  default_client:
    username: "22user"
    password_env: "KIOSK_T4_CLIENT_PASSWORD"
orders:
  clear_password_env: "KIOSK_T4_BLANK_CLEAR"
"#,
    );
    let secrets = resolve_secrets(&cfg).unwrap();
    assert_eq!(secrets.session_secret.as_deref(), Some("t4-signing-secret"));
    assert_eq!(secrets.admin_password.as_deref(), Some("t4-admin-pass"));
    assert_eq!(secrets.default_client_password.as_deref(), Some("t4-client-pass"));
    assert!(secrets.clear_password.is_none(), "blank counts as unset");

    let dbg = format!("{secrets:?}");
    assert!(dbg.contains("<REDACTED>"));
    assert!(!dbg.contains("t4-signing-secret"));
    assert!(!dbg.contains("t4-admin-pass"));
}
