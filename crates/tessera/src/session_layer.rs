//! Bridges HTTP cookies and the session store.
//!
//! Route handlers never touch cookies or the store directly. They ask the
//! [`SessionLayer`] for the request's session, mutate the record, and hand
//! it back to [`save`](SessionLayer::save). The layer owns the cookie name
//! and secret, so handlers can't sign or verify with the wrong ones.
//!
//! The one rule this module enforces: a session id comes from a verified
//! token or from the store's `create()`. Never from anywhere else.

use std::sync::Arc;

use axum::http::header::COOKIE;
use axum::http::HeaderMap;
use cookie::time::Duration as CookieDuration;
use cookie::{Cookie, SameSite};
use tessera_session::{
    SessionConfig, SessionError, SessionId, SessionRecord, SharedStore,
};

/// A session loaded (or created) for the current request.
#[derive(Debug, Clone)]
pub struct LoadedSession {
    /// The id the record is stored under.
    pub id: SessionId,
    /// The record as of load time, plus any changes the handler made.
    pub record: SessionRecord,
    /// `true` if this request created the session, so the browser has no
    /// cookie for it yet.
    pub is_new: bool,
}

/// Loads and saves sessions on behalf of route handlers.
///
/// Cheap to clone: the config is behind an `Arc` and the store is a
/// shared trait object.
#[derive(Clone)]
pub struct SessionLayer {
    store: SharedStore,
    config: Arc<SessionConfig>,
}

impl SessionLayer {
    /// Creates a layer over `store` with the given cookie name, secret and
    /// TTL.
    pub fn new(store: SharedStore, config: SessionConfig) -> Self {
        Self {
            store,
            config: Arc::new(config),
        }
    }

    /// The session configuration this layer signs and verifies with.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Returns the session id attested by the request's signed cookie.
    ///
    /// `None` when there's no cookie, or it's unsigned, malformed, or
    /// signed with another secret. The reason is logged at `debug` and
    /// otherwise discarded.
    pub fn verified_id(&self, headers: &HeaderMap) -> Option<SessionId> {
        let cookie = headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(Cookie::split_parse)
            .filter_map(Result::ok)
            .find(|cookie| cookie.name() == self.config.cookie_name)?;

        match tessera_token::decode_cookie_value(cookie.value(), &self.config.secret) {
            Ok(id) => Some(SessionId::new(id)),
            Err(e) => {
                tracing::debug!(reason = %e, "ignoring session cookie");
                None
            }
        }
    }

    /// Loads the request's existing session, without creating one.
    ///
    /// `Ok(None)` if the cookie doesn't verify or the record has expired.
    ///
    /// # Errors
    /// Store failures only.
    pub async fn load_existing(
        &self,
        headers: &HeaderMap,
    ) -> Result<Option<LoadedSession>, SessionError> {
        let Some(id) = self.verified_id(headers) else {
            return Ok(None);
        };

        Ok(self.store.get(&id).await?.map(|record| LoadedSession {
            id,
            record,
            is_new: false,
        }))
    }

    /// Loads the request's session, creating a fresh one if there's none.
    ///
    /// # Errors
    /// Store failures only.
    pub async fn load(
        &self,
        headers: &HeaderMap,
    ) -> Result<LoadedSession, SessionError> {
        if let Some(session) = self.load_existing(headers).await? {
            return Ok(session);
        }
        self.create().await
    }

    /// Creates a fresh, empty session.
    pub async fn create(&self) -> Result<LoadedSession, SessionError> {
        let id = self.store.create().await?;
        Ok(LoadedSession {
            id,
            record: SessionRecord::default(),
            is_new: true,
        })
    }

    /// Writes the session back to the store and restarts its TTL.
    ///
    /// Returns once the store has acknowledged the write. Anything that
    /// depends on another service seeing this write must come after.
    pub async fn save(&self, session: &LoadedSession) -> Result<(), SessionError> {
        self.store
            .set(&session.id, &session.record, self.config.ttl)
            .await?;
        tracing::debug!(
            session_id = %session.id,
            views = session.record.view_count,
            "session saved"
        );
        Ok(())
    }

    /// The `Cookie` header value that attests `id` to another service.
    pub fn outbound_cookie(&self, id: &SessionId) -> String {
        tessera_token::cookie_header(
            &self.config.cookie_name,
            id.as_str(),
            &self.config.secret,
        )
    }

    /// The `Set-Cookie` header value handing `session` to a browser.
    ///
    /// `Path=/`, `HttpOnly`, `SameSite=Lax`, and a `Max-Age` equal to the
    /// store TTL.
    pub fn set_cookie(&self, session: &LoadedSession) -> String {
        let max_age = i64::try_from(self.config.ttl.as_secs()).unwrap_or(i64::MAX);
        Cookie::build(tessera_token::session_cookie(
            &self.config.cookie_name,
            session.id.as_str(),
            &self.config.secret,
        ))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(CookieDuration::seconds(max_age))
        .build()
        .to_string()
    }
}
