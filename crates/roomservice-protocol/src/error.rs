//! Error types for the protocol layer.
//!
//! Each crate in RoomService defines its own error enum. A
//! `ProtocolError` always means a problem turning bytes or names into
//! protocol values, never a problem with game state.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into bytes).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (turning bytes into a Rust type).
    ///
    /// Common causes: malformed JSON, missing required fields, or a
    /// config file saved by a different tool.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// A string did not name one of the lifecycle events.
    #[error("{0} is not a valid event name")]
    UnknownEvent(String),
}
