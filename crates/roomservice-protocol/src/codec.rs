//! Codec trait and implementations for configuration and event logs.
//!
//! The core doesn't own a file format. Anything that implements [`Codec`]
//! can turn bytes into a `ServiceConfig` or a list of [`HostEvent`]s.
//! [`JsonCodec`] is the format the plugin ships with.
//!
//! [`HostEvent`]: crate::HostEvent

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// A codec that can encode Rust types to bytes and decode bytes back.
///
/// `Send + Sync + 'static` so a codec can live inside the service actor.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed or
    /// don't match the expected type.
    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// Configurations are hand-edited by server hosts, so a human-readable
/// format is the default. Behind the `json` feature (enabled by default).
///
/// ## Example
///
/// ```rust
/// use roomservice_protocol::{Codec, HostEvent, JsonCodec, PlayerId};
///
/// let codec = JsonCodec;
///
/// let bytes = codec.encode(&HostEvent::PlayerLeft { player_id: PlayerId(7) }).unwrap();
/// let decoded: HostEvent = codec.decode(&bytes).unwrap();
/// assert_eq!(decoded, HostEvent::PlayerLeft { player_id: PlayerId(7) });
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
