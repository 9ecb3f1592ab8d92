//! Session cookie helpers.

pub const ADMIN_COOKIE: &str = "admin_token";
pub const CLIENT_COOKIE: &str = "user_token";

/// `Set-Cookie` value carrying a session token.
pub fn session_cookie(name: &str, token: &str, max_age_secs: i64, secure: bool) -> String {
    let mut c = format!("{name}={token}; Path=/; Max-Age={max_age_secs}; HttpOnly; SameSite=Lax");
    if secure {
        c.push_str("; Secure");
    }
    c
}

/// `Set-Cookie` value that expires the named cookie immediately.
pub fn clear_cookie(name: &str, secure: bool) -> String {
    session_cookie(name, "", 0, secure)
}

/// Find `name` in a raw `Cookie` request header.
pub fn read_cookie<'a>(header: &'a str, name: &str) -> Option<&'a str> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, _)| *k == name)
        .map(|(_, v)| v.trim())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_named_cookie_among_others() {
        let h = "theme=dark; admin_token=abc.def; user_token=xyz";
        assert_eq!(read_cookie(h, ADMIN_COOKIE), Some("abc.def"));
        assert_eq!(read_cookie(h, CLIENT_COOKIE), Some("xyz"));
        assert_eq!(read_cookie(h, "missing"), None);
        assert_eq!(read_cookie("admin_token=", ADMIN_COOKIE), None);
    }

    #[test]
    fn cookie_attributes() {
        let c = session_cookie(ADMIN_COOKIE, "t", 86400, true);
        assert!(c.starts_with("admin_token=t;"));
        assert!(c.contains("HttpOnly"));
        assert!(c.contains("SameSite=Lax"));
        assert!(c.contains("Max-Age=86400"));
        assert!(c.ends_with("; Secure"));
        assert!(clear_cookie(CLIENT_COOKIE, false).contains("Max-Age=0"));
    }
}
