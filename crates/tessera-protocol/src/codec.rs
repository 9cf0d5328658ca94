//! Codec trait and implementations for store payloads.
//!
//! A store that keeps records outside the process (a file, a socket) needs
//! them as bytes. It asks a [`Codec`] for those bytes instead of calling a
//! serializer directly, so the on-disk format can change without touching
//! the store.

use serde::{de::DeserializeOwned, Serialize};

use crate::ProtocolError;

/// Encodes values to bytes and decodes them back.
///
/// `Send + Sync + 'static` because the codec lives inside a store shared by
/// every request task.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if the value can't be represented.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed or don't
    /// match `T`.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] backed by `serde_json`.
///
/// JSON keeps stored sessions readable with `cat`, which is what you want
/// when two services disagree about a view count.
///
/// ```rust
/// use tessera_protocol::{ApiViews, Codec, JsonCodec};
///
/// let bytes = JsonCodec.encode(&ApiViews::ok(3)).unwrap();
/// assert_eq!(bytes, br#"{"status":"OK","views":3}"#);
///
/// let back: ApiViews = JsonCodec.decode(&bytes).unwrap();
/// assert_eq!(back.views, 3);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
