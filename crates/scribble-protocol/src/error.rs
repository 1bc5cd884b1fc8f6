//! Error types for the protocol layer.
//!
//! Each crate in Scribble defines its own error enum. When you see a
//! `ProtocolError`, the problem is in serialization or in a value that
//! can't be represented on the wire, not in game rules.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into bytes).
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (turning bytes into a Rust type).
    ///
    /// Common causes: malformed JSON, unknown command `type`, missing
    /// required fields, or a room code that isn't 6 alphanumerics.
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// A room code that isn't exactly six ASCII letters or digits.
    #[error("invalid room code {0:?}")]
    InvalidRoomCode(String),

    /// The message is invalid at the protocol level.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
