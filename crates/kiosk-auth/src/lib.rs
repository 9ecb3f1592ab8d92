//! Credentials and session tokens for the kiosk.
//!
//! - `password`: salted SHA-256 hashes stored in the accounts table.
//! - `token`: HMAC-signed session tokens (admin and client kinds).
//! - `cookie`: `Set-Cookie` rendering and `Cookie` header lookup.

pub mod cookie;
pub mod password;
pub mod token;

pub use cookie::{clear_cookie, read_cookie, session_cookie, ADMIN_COOKIE, CLIENT_COOKIE};
pub use password::{hash_password, verify_password};
pub use token::{Claims, TokenError, TokenKind, TokenSigner};
