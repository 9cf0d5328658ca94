//! Wire types for Tessera.
//!
//! This crate defines what the services say to each other and to the
//! session store:
//!
//! - **Types** ([`StatusBody`], [`ApiViews`], [`LoginRequest`],
//!   [`PageModel`]): the JSON bodies on the HTTP routes.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how records are turned
//!   into bytes for a store that persists them.
//! - **Errors** ([`ProtocolError`]): what can go wrong while encoding or
//!   decoding.
//!
//! It knows nothing about sessions, tokens or sockets.

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{ApiViews, LoginRequest, PageModel, StatusBody};
