//! Scenario: tampered or foreign tokens are rejected.
//!
//! # Invariant under test
//! Only tokens signed with the same secret, unmodified, verify.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Duration;
use kiosk_auth::{TokenError, TokenKind, TokenSigner};

fn signer(secret: &str) -> TokenSigner {
    TokenSigner::new(secret, Duration::hours(24), Duration::days(7))
}

#[test]
fn other_secret_is_rejected() {
    let t = signer("secret-a").issue(TokenKind::Admin, 1, "admin");
    assert_eq!(
        signer("secret-b").verify(&t, TokenKind::Admin),
        Err(TokenError::BadSignature)
    );
}

#[test]
fn promoted_claims_are_rejected() {
    let s = signer("secret-a");
    let t = s.issue(TokenKind::Client, 7, "22user");
    let (_, sig) = t.split_once('.').unwrap();

    // Rewrite the payload to claim the admin role, keep the old signature.
    let forged_claims = serde_json::json!({
        "sub": 7, "username": "22user", "role": "admin", "exp": i64::MAX
    });
    let forged_payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&forged_claims).unwrap());
    let forged = format!("{forged_payload}.{sig}");

    assert_eq!(s.verify(&forged, TokenKind::Admin), Err(TokenError::BadSignature));
}

#[test]
fn garbage_is_malformed() {
    let s = signer("secret-a");
    for t in ["", "no-dot", ".sig", "payload.", "a.b.c", "!!!.???"] {
        assert_eq!(
            s.verify(t, TokenKind::Client),
            Err(TokenError::Malformed),
            "token {t:?}"
        );
    }
}
