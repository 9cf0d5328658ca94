//! Session id attestation for Tessera.
//!
//! A front-end service proves to a back-end service that it holds a
//! session by sending the session id together with a keyed signature:
//!
//! ```text
//! token  = session_id "." base64(HMAC-SHA256(secret, session_id))
//! cookie = <name> "=" percent_encode("s:" token)
//! ```
//!
//! - **Signer** ([`sign`], [`verify`]): the pure function pair. Signing is
//!   deterministic, so the same session always yields the same token.
//! - **Cookie** ([`encode_cookie_value`], [`decode_cookie_value`],
//!   [`cookie_header`], [`session_cookie`]): the `Cookie`-header shape the
//!   token travels in.
//!
//! # How it fits in the stack
//!
//! ```text
//! Services (above)  ← sign outbound calls, verify inbound cookies
//!     ↕
//! Session Layer     ← trusts only ids recovered by verify()
//!     ↕
//! Token (this crate)
//! ```
//!
//! The token carries nothing but the session id. Everything a service is
//! allowed to do lives in the session record, never in the token.

mod signed_cookie;
mod error;
mod signer;

pub use signed_cookie::{
    cookie_header, decode_cookie_value, encode_cookie_value, session_cookie,
    SIGNED_PREFIX,
};
pub use error::VerificationFailure;
pub use signer::{sign, verify};
