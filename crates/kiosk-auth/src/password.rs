use sha2::{Digest, Sha256};

const SCHEME: &str = "sha256";

/// Hash `password` with a fresh random salt.
///
/// Format: `sha256$<salt>$<hex digest of salt || password>`.
pub fn hash_password(password: &str) -> String {
    let salt = uuid::Uuid::new_v4().simple().to_string();
    format!("{SCHEME}${salt}${}", digest(&salt, password))
}

/// Constant-shape comparison against a stored hash. Unknown formats never match.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let mut parts = stored.splitn(3, '$');
    let (Some(scheme), Some(salt), Some(expected)) = (parts.next(), parts.next(), parts.next())
    else {
        return false;
    };
    if scheme != SCHEME || salt.is_empty() {
        return false;
    }
    let actual = digest(salt, password);
    actual.len() == expected.len()
        && actual
            .bytes()
            .zip(expected.bytes())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
}

fn digest(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify() {
        let h = hash_password("admin123");
        assert!(h.starts_with("sha256$"));
        assert!(verify_password("admin123", &h));
        assert!(!verify_password("admin124", &h));
    }

    #[test]
    fn same_password_gets_different_salts() {
        assert_ne!(hash_password("user123"), hash_password("user123"));
    }

    #[test]
    fn malformed_hashes_never_match() {
        assert!(!verify_password("x", ""));
        assert!(!verify_password("x", "plain-text"));
        assert!(!verify_password("x", "md5$salt$abcd"));
        assert!(!verify_password("x", "sha256$$abcd"));
    }
}
