//! The YAML layers shipped under `config/` must load, use only consumed
//! keys, and carry no secret literals.

use kiosk_config::{load_layered_yaml, report_unused_keys, Profile, UnusedKeyPolicy};

fn shipped(name: &str) -> String {
    std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../../config")
        .join(name)
        .display()
        .to_string()
}

#[test]
fn base_layer_alone_is_a_dev_setup() {
    let base = shipped("base.yaml");
    let loaded = load_layered_yaml(&[base.as_str()]).unwrap();
    report_unused_keys(&loaded.config_json, UnusedKeyPolicy::Fail).unwrap();

    let cfg = loaded.typed().unwrap();
    assert_eq!(cfg.runtime.profile, Profile::Dev);
    assert_eq!(cfg.business_day.utc_offset_minutes, 540);
    assert!(cfg.accounts.default_client.is_some());
}

#[test]
fn production_overlay_switches_profile_and_cookies() {
    let base = shipped("base.yaml");
    let prod = shipped("production.yaml");
    let loaded = load_layered_yaml(&[base.as_str(), prod.as_str()]).unwrap();
    report_unused_keys(&loaded.config_json, UnusedKeyPolicy::Fail).unwrap();

    let cfg = loaded.typed().unwrap();
    assert_eq!(cfg.runtime.profile, Profile::Production);
    assert!(cfg.auth.secure_cookies);
    assert_eq!(cfg.server.bind_addr, "0.0.0.0:3000");
    assert_eq!(cfg.stream.heartbeat_secs, 30);
}
