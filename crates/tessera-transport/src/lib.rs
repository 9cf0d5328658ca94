//! Service-to-service transport for Tessera.
//!
//! The front end reaches the back end over plain HTTP. [`HttpUpstream`]
//! wraps a `reqwest` client with the two rules that call must obey:
//!
//! - it carries the caller's signed session cookie, and
//! - it finishes (successfully or not) within a fixed timeout.
//!
//! Every way it can fail is a [`TransportError`]; none of them produce a
//! default value.

mod error;
mod http;

pub use error::TransportError;
pub use http::HttpUpstream;
