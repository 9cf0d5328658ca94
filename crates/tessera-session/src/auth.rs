//! Login hook: who may put an identity into a session record.
//!
//! Tessera doesn't check passwords itself. The front end hands the posted
//! credentials to an [`Authenticator`] and, if it answers with an
//! identity, writes that identity into the session record. From then on the
//! back end trusts the record, not the credentials.

use std::collections::HashMap;

use subtle::ConstantTimeEq;

use crate::SessionError;

/// Validates login credentials and returns the identity to record.
///
/// `Send + Sync + 'static` because one authenticator is shared by every
/// request task for the life of the server.
///
/// # Example
///
/// ```rust
/// use tessera_session::{Authenticator, SessionError};
///
/// /// Lets anyone in under the name they typed. Development only.
/// struct OpenDoor;
///
/// impl Authenticator for OpenDoor {
///     async fn authenticate(
///         &self,
///         username: &str,
///         _password: &str,
///     ) -> Result<String, SessionError> {
///         if username.is_empty() {
///             return Err(SessionError::AuthFailed("empty username".into()));
///         }
///         Ok(username.to_string())
///     }
/// }
/// ```
pub trait Authenticator: Send + Sync + 'static {
    /// Checks the credentials.
    ///
    /// # Returns
    /// - `Ok(identity)`: store this as the session's identity
    /// - `Err(SessionError::AuthFailed)`: reject the login
    fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> impl std::future::Future<Output = Result<String, SessionError>> + Send;
}

/// An [`Authenticator`] over a fixed table of usernames and passwords.
///
/// Meant for demos and tests. Passwords are compared in constant time.
#[derive(Default, Clone)]
pub struct StaticAuthenticator {
    users: HashMap<String, String>,
}

impl StaticAuthenticator {
    /// Creates an authenticator that accepts nobody.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) a user.
    pub fn with_user(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.users.insert(username.into(), password.into());
        self
    }

    /// Number of known users.
    pub fn len(&self) -> usize {
        self.users.len()
    }

    /// `true` if no user can log in.
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

impl std::fmt::Debug for StaticAuthenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticAuthenticator")
            .field("users", &self.users.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Authenticator for StaticAuthenticator {
    async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<String, SessionError> {
        let expected = self
            .users
            .get(username)
            .ok_or_else(|| SessionError::AuthFailed("unknown user".into()))?;

        if bool::from(expected.as_bytes().ct_eq(password.as_bytes())) {
            Ok(username.to_string())
        } else {
            Err(SessionError::AuthFailed("wrong password".into()))
        }
    }
}
