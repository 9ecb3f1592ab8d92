//! Signed session tokens: `base64url(claims JSON) "." base64url(HMAC-SHA256)`.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

const MAX_TOKEN_LEN: usize = 2048;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    /// Issued by `/api/auth/login` to admin accounts only.
    Admin,
    /// Issued by `/api/auth/jwt-login` to any account.
    Client,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Admin => "admin",
            TokenKind::Client => "client",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Account id.
    pub sub: i64,
    pub username: String,
    pub role: TokenKind,
    /// Expiry, unix seconds.
    pub exp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("token is malformed")]
    Malformed,
    #[error("token signature mismatch")]
    BadSignature,
    #[error("token expired")]
    Expired,
    #[error("expected {expected} token, got {actual}")]
    WrongKind {
        expected: &'static str,
        actual: &'static str,
    },
}

/// Issues and verifies tokens with one shared secret.
#[derive(Clone)]
pub struct TokenSigner {
    secret: Vec<u8>,
    admin_ttl: Duration,
    client_ttl: Duration,
}

impl std::fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSigner")
            .field("secret", &"<REDACTED>")
            .field("admin_ttl", &self.admin_ttl)
            .field("client_ttl", &self.client_ttl)
            .finish()
    }
}

impl TokenSigner {
    pub fn new(secret: impl AsRef<[u8]>, admin_ttl: Duration, client_ttl: Duration) -> Self {
        Self {
            secret: secret.as_ref().to_vec(),
            admin_ttl,
            client_ttl,
        }
    }

    pub fn ttl(&self, kind: TokenKind) -> Duration {
        match kind {
            TokenKind::Admin => self.admin_ttl,
            TokenKind::Client => self.client_ttl,
        }
    }

    pub fn issue(&self, kind: TokenKind, account_id: i64, username: &str) -> String {
        self.issue_at(kind, account_id, username, Utc::now())
    }

    pub fn issue_at(
        &self,
        kind: TokenKind,
        account_id: i64,
        username: &str,
        now: DateTime<Utc>,
    ) -> String {
        let claims = Claims {
            sub: account_id,
            username: username.to_string(),
            role: kind,
            exp: (now + self.ttl(kind)).timestamp(),
        };
        // Claims hold only plain fields; serialization cannot fail.
        let payload = serde_json::to_vec(&claims).unwrap_or_default();
        let payload_part = URL_SAFE_NO_PAD.encode(payload);
        let sig_part = URL_SAFE_NO_PAD.encode(self.sign(payload_part.as_bytes()));
        format!("{payload_part}.{sig_part}")
    }

    pub fn verify(&self, token: &str, expected: TokenKind) -> Result<Claims, TokenError> {
        self.verify_at(token, expected, Utc::now())
    }

    pub fn verify_at(
        &self,
        token: &str,
        expected: TokenKind,
        now: DateTime<Utc>,
    ) -> Result<Claims, TokenError> {
        if token.is_empty() || token.len() > MAX_TOKEN_LEN {
            return Err(TokenError::Malformed);
        }
        let (payload_part, sig_part) = token.split_once('.').ok_or(TokenError::Malformed)?;
        if payload_part.is_empty() || sig_part.is_empty() || sig_part.contains('.') {
            return Err(TokenError::Malformed);
        }

        let sig = URL_SAFE_NO_PAD
            .decode(sig_part)
            .map_err(|_| TokenError::Malformed)?;
        let mut mac = self.mac();
        mac.update(payload_part.as_bytes());
        mac.verify_slice(&sig).map_err(|_| TokenError::BadSignature)?;

        let payload = URL_SAFE_NO_PAD
            .decode(payload_part)
            .map_err(|_| TokenError::Malformed)?;
        let claims: Claims = serde_json::from_slice(&payload).map_err(|_| TokenError::Malformed)?;

        if claims.role != expected {
            return Err(TokenError::WrongKind {
                expected: expected.as_str(),
                actual: claims.role.as_str(),
            });
        }
        if claims.exp <= now.timestamp() {
            return Err(TokenError::Expired);
        }
        Ok(claims)
    }

    fn mac(&self) -> HmacSha256 {
        // HMAC accepts keys of any length.
        match HmacSha256::new_from_slice(&self.secret) {
            Ok(m) => m,
            Err(_) => unreachable!("hmac key length is unrestricted"),
        }
    }

    fn sign(&self, bytes: &[u8]) -> Vec<u8> {
        let mut mac = self.mac();
        mac.update(bytes);
        mac.finalize().into_bytes().to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signer() -> TokenSigner {
        TokenSigner::new("unit-secret", Duration::hours(24), Duration::days(7))
    }

    #[test]
    fn issued_token_verifies() {
        let s = signer();
        let t = s.issue(TokenKind::Admin, 1, "admin");
        let c = s.verify(&t, TokenKind::Admin).unwrap();
        assert_eq!(c.sub, 1);
        assert_eq!(c.username, "admin");
        assert_eq!(c.role, TokenKind::Admin);
    }

    #[test]
    fn kinds_do_not_cross() {
        let s = signer();
        let client = s.issue(TokenKind::Client, 2, "22user");
        assert!(matches!(
            s.verify(&client, TokenKind::Admin),
            Err(TokenError::WrongKind { .. })
        ));
        let admin = s.issue(TokenKind::Admin, 1, "admin");
        assert!(matches!(
            s.verify(&admin, TokenKind::Client),
            Err(TokenError::WrongKind { .. })
        ));
    }

    #[test]
    fn expiry_follows_kind_ttl() {
        let s = signer();
        let t0 = Utc::now();
        let admin = s.issue_at(TokenKind::Admin, 1, "admin", t0);
        assert!(s.verify_at(&admin, TokenKind::Admin, t0 + Duration::hours(23)).is_ok());
        assert_eq!(
            s.verify_at(&admin, TokenKind::Admin, t0 + Duration::hours(24)),
            Err(TokenError::Expired)
        );

        let client = s.issue_at(TokenKind::Client, 2, "u", t0);
        assert!(s.verify_at(&client, TokenKind::Client, t0 + Duration::days(6)).is_ok());
        assert_eq!(
            s.verify_at(&client, TokenKind::Client, t0 + Duration::days(7)),
            Err(TokenError::Expired)
        );
    }
}
