//! Scenario: resolving the daemon's listen address.
//!
//! # Invariant under test
//! - `KIOSK_DAEMON_ADDR` overrides `server.bind_addr`.
//! - An unparsable address from either source is an error naming the
//!   source, never a silent fallback.

use kiosk_config::KioskConfig;
use kiosk_daemon::state::listen_addr;

#[test]
fn config_address_is_used_without_override() {
    let mut config = KioskConfig::default();
    config.server.bind_addr = "0.0.0.0:8080".to_string();
    let addr = listen_addr(&config, None).unwrap();
    assert_eq!(addr.to_string(), "0.0.0.0:8080");

    // A blank override counts as unset.
    assert_eq!(listen_addr(&config, Some("  ")).unwrap(), addr);
}

#[test]
fn env_override_wins() {
    let config = KioskConfig::default();
    let addr = listen_addr(&config, Some("127.0.0.1:4100")).unwrap();
    assert_eq!(addr.port(), 4100);
}

#[test]
fn unparsable_override_is_an_error() {
    let config = KioskConfig::default();
    let err = listen_addr(&config, Some("localhost:abc")).unwrap_err();
    assert!(format!("{err:#}").contains("KIOSK_DAEMON_ADDR 'localhost:abc'"));
}

#[test]
fn unparsable_config_address_is_an_error() {
    let mut config = KioskConfig::default();
    config.server.bind_addr = "port 3000".to_string();
    let err = listen_addr(&config, None).unwrap_err();
    assert!(format!("{err:#}").contains("server.bind_addr 'port 3000'"));
}
