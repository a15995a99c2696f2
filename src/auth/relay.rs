// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! How a credential crosses the web → API hop.
//!
//! - The browser holds the credential in the `session` cookie.
//! - The web tier copies it into `X-Session` on every server-to-server call;
//!   the API tier never sees the browser's cookie jar.
//! - `X-User` is only meaningful when set by a trusted edge proxy.

use axum::http::{
    header::{InvalidHeaderValue, COOKIE},
    HeaderMap, HeaderValue,
};

/// Header carrying the relayed credential.
pub const SESSION_HEADER: &str = "x-session";

/// Header carrying a proxy-resolved username.
pub const TRUSTED_USER_HEADER: &str = "x-user";

/// Browser-facing cookie carrying the credential.
pub const SESSION_COOKIE: &str = "session";

/// Read a cookie value by name across all `Cookie` headers.
pub fn parse_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    for value in headers.get_all(COOKIE) {
        let Ok(s) = value.to_str() else {
            continue;
        };
        for part in s.split(';') {
            if let Some((k, v)) = part.trim().split_once('=') {
                if k == name {
                    return Some(v.to_string());
                }
            }
        }
    }
    None
}

fn non_empty_header(headers: &HeaderMap, name: &str) -> Option<String> {
    let value = headers.get(name)?.to_str().ok()?.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// Credential from `X-Session`, falling back to the `session` cookie.
pub fn forwarded_credential(headers: &HeaderMap) -> Option<String> {
    non_empty_header(headers, SESSION_HEADER).or_else(|| {
        parse_cookie(headers, SESSION_COOKIE)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    })
}

/// Username from `X-User`, if present and non-empty.
pub fn trusted_username(headers: &HeaderMap) -> Option<String> {
    non_empty_header(headers, TRUSTED_USER_HEADER)
}

/// `Set-Cookie` value storing the credential in the browser.
pub fn session_cookie(credential: &str, secure: bool) -> Result<HeaderValue, InvalidHeaderValue> {
    let secure = if secure { "; Secure" } else { "" };
    HeaderValue::from_str(&format!(
        "{SESSION_COOKIE}={credential}; HttpOnly; SameSite=Lax; Path=/{secure}"
    ))
}

/// `Set-Cookie` value removing the credential from the browser.
pub fn clear_session_cookie(secure: bool) -> HeaderValue {
    if secure {
        HeaderValue::from_static(
            "session=deleted; Expires=Thu, 01 Jan 1970 00:00:00 GMT; HttpOnly; SameSite=Lax; Path=/; Secure",
        )
    } else {
        HeaderValue::from_static(
            "session=deleted; Expires=Thu, 01 Jan 1970 00:00:00 GMT; HttpOnly; SameSite=Lax; Path=/",
        )
    }
}

/// Attach the credential to an outgoing backend request.
pub fn relay_credential(request: reqwest::RequestBuilder, credential: &str) -> reqwest::RequestBuilder {
    request.header(SESSION_HEADER, credential)
}
