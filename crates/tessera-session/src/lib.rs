//! Session state shared by Tessera services.
//!
//! This crate owns everything about a session except how it travels:
//!
//! 1. **Records**: [`SessionId`] and the typed [`SessionRecord`]
//! 2. **Stores**: the [`SessionStore`] trait and two backends,
//!    [`MemoryStore`] (one process) and [`FileStore`] (one host)
//! 3. **Login**: the [`Authenticator`] trait that decides who may set the
//!    record's identity
//!
//! # How it fits in the stack
//!
//! ```text
//! Services (above)  ← load, mutate and save records per request
//!     ↕
//! Session Layer (this crate)  ← records, TTL-bounded storage, login
//!     ↕
//! Protocol Layer (below)  ← codec used to persist records as bytes
//! ```
//!
//! The store is the only shared mutable resource between the services and
//! the only source of truth about a session.

#![allow(async_fn_in_trait)]

mod auth;
mod error;
mod session;
mod store;

pub use auth::{Authenticator, StaticAuthenticator};
pub use error::SessionError;
pub use session::{SessionConfig, SessionId, SessionRecord};
pub use store::{FileStore, MemoryStore, SessionStore, SharedStore};
