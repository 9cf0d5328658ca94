//! The signed-cookie shape tokens travel in.
//!
//! On the wire a signed session id looks like an Express session cookie:
//! `connect.sid=s%3A<id>.<signature>`. The `s:` prefix marks the value as
//! signed; the whole value is percent-encoded because base64 signatures
//! contain `+` and `/`.

use ::cookie::Cookie;

use crate::{sign, verify, VerificationFailure};

/// Prefix marking a cookie value as a signed token.
pub const SIGNED_PREFIX: &str = "s:";

/// Produces the percent-encoded cookie value for a session id.
pub fn encode_cookie_value(session_id: &str, secret: &str) -> String {
    let signed = format!("{SIGNED_PREFIX}{}", sign(session_id, secret));
    urlencoding::encode(&signed).into_owned()
}

/// Decodes a raw cookie value and verifies the token inside it.
///
/// Accepts the value exactly as it appears after `name=` in a `Cookie`
/// header, optionally wrapped in double quotes.
///
/// # Errors
/// Returns [`VerificationFailure::MalformedCookie`] when the value is not
/// valid percent-encoding or lacks the `s:` prefix, and any error from
/// [`verify`] otherwise.
pub fn decode_cookie_value(
    raw: &str,
    secret: &str,
) -> Result<String, VerificationFailure> {
    let raw = raw
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(raw);

    let decoded = urlencoding::decode(raw)
        .map_err(|_| VerificationFailure::MalformedCookie)?;

    let token = decoded
        .strip_prefix(SIGNED_PREFIX)
        .ok_or(VerificationFailure::MalformedCookie)?;

    verify(token, secret)
}

/// The session cookie for `session_id`, without attributes.
///
/// Callers add `Path`, `HttpOnly` and friends when the cookie is headed
/// for a browser.
pub fn session_cookie(
    name: &str,
    session_id: &str,
    secret: &str,
) -> Cookie<'static> {
    Cookie::new(name.to_string(), encode_cookie_value(session_id, secret))
}

/// Builds the `name=value` pair an outbound call puts in its `Cookie`
/// header.
///
/// ```rust
/// let header = tessera_token::cookie_header("connect.sid", "abc", "k");
/// assert!(header.starts_with("connect.sid=s%3Aabc."));
/// ```
pub fn cookie_header(name: &str, session_id: &str, secret: &str) -> String {
    session_cookie(name, session_id, secret).to_string()
}
