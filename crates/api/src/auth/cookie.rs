//! The `auth_token` cookie.
//!
//! The dashboard is served same-site, so the access token also travels as an
//! HttpOnly cookie. `Authorization: Bearer` still takes precedence.

use axum::http::header::COOKIE;
use axum::http::HeaderMap;

pub const AUTH_COOKIE: &str = "auth_token";

/// `Set-Cookie` value carrying `token` for `max_age_secs`.
pub fn auth_cookie(token: &str, max_age_secs: i64, secure: bool) -> String {
    let mut cookie =
        format!("{AUTH_COOKIE}={token}; HttpOnly; SameSite=Strict; Path=/; Max-Age={max_age_secs}");
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// `Set-Cookie` value that expires the cookie immediately.
pub fn clear_auth_cookie(secure: bool) -> String {
    auth_cookie("", 0, secure)
}

/// Value of cookie `name` from the request's `Cookie` headers.
pub fn read_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
        .filter(|value| !value.is_empty())
}
