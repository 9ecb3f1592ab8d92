//! Scenario: unused config keys.
//!
//! # Invariant under test
//! Keys nobody reads are reported. `Warn` returns the report, `Fail` errors.

use kiosk_config::{load_layered_yaml_from_strings, report_unused_keys, UnusedKeyPolicy};

const CLEAN_YAML: &str = r#"
runtime:
  profile: dev
accounts:
  admin_username: "admin"
  default_client:
    username: "22user"
    password_env: "KIOSK_DEFAULT_USER_PASSWORD"
orders:
  clear_password_env: "KIOSK_MASTER_PASSWORD"
"#;

const TYPO_YAML: &str = r#"
stream:
  heartbeat_sec: 10
server:
  bind_addr: "127.0.0.1:3000"
  cors_origin: "http://localhost:3000"
"#;

#[test]
fn clean_config_has_no_unused_keys() {
    let loaded = load_layered_yaml_from_strings(&[CLEAN_YAML]).unwrap();
    let report = report_unused_keys(&loaded.config_json, UnusedKeyPolicy::Fail).unwrap();
    assert!(report.is_clean(), "unexpected: {:?}", report.unused_leaf_pointers);
}

#[test]
fn warn_policy_lists_typos() {
    let loaded = load_layered_yaml_from_strings(&[TYPO_YAML]).unwrap();
    let report = report_unused_keys(&loaded.config_json, UnusedKeyPolicy::Warn).unwrap();
    assert_eq!(
        report.unused_leaf_pointers,
        vec![
            "/server/cors_origin".to_string(),
            "/stream/heartbeat_sec".to_string()
        ]
    );
}

#[test]
fn fail_policy_errors_on_typos() {
    let loaded = load_layered_yaml_from_strings(&[TYPO_YAML]).unwrap();
    let err = report_unused_keys(&loaded.config_json, UnusedKeyPolicy::Fail).unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("CONFIG_UNUSED_KEYS"), "got: {msg}");
    assert!(msg.contains("2 unused"), "got: {msg}");
}
