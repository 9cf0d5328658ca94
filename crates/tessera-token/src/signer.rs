//! The signer/verifier pair.
//!
//! `sign` and `verify` are pure: no clock, no nonce, no I/O. The front end
//! recomputes the token on every outbound call, and the back end recomputes
//! the expected token from the base it was handed. Both sides arrive at the
//! same bytes only because nothing but `(session_id, secret)` goes in.

use base64::engine::general_purpose::STANDARD_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::VerificationFailure;

type HmacSha256 = Hmac<Sha256>;

/// Signs a session id with the shared secret.
///
/// Returns `"<session_id>.<signature>"`, where the signature is the
/// HMAC-SHA256 of the session id, encoded as standard base64 with the
/// trailing `=` padding removed. This is the same layout
/// `cookie-signature` produces, so cookies issued by an Express front end
/// verify here and vice versa.
///
/// # Example
///
/// ```rust
/// let token = tessera_token::sign("abc123", "secret");
/// assert!(token.starts_with("abc123."));
/// assert_eq!(token, tessera_token::sign("abc123", "secret"));
/// ```
pub fn sign(session_id: &str, secret: &str) -> String {
    format!("{session_id}.{}", signature(session_id, secret))
}

/// Verifies a token and recovers the session id it attests.
///
/// The token is split at its LAST `.`, the expected token is recomputed
/// from the base, and the two are compared in constant time over their
/// full length. A prefix of a valid signature, or a valid signature with
/// trailing junk, does not match.
///
/// # Errors
/// - [`VerificationFailure::MissingSeparator`]: no `.` in the token
/// - [`VerificationFailure::EmptyBase`]: nothing before the `.`
/// - [`VerificationFailure::SignatureMismatch`]: wrong secret or tampered
pub fn verify(
    token: &str,
    secret: &str,
) -> Result<String, VerificationFailure> {
    let (base, _) = token
        .rsplit_once('.')
        .ok_or(VerificationFailure::MissingSeparator)?;

    if base.is_empty() {
        return Err(VerificationFailure::EmptyBase);
    }

    let expected = sign(base, secret);

    // `ct_eq` on slices of different lengths is simply "not equal".
    if bool::from(expected.as_bytes().ct_eq(token.as_bytes())) {
        Ok(base.to_string())
    } else {
        Err(VerificationFailure::SignatureMismatch)
    }
}

fn signature(base: &str, secret: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(base.as_bytes());
    STANDARD_NO_PAD.encode(mac.finalize().into_bytes())
}
