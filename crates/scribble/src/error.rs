//! Unified error type for the Scribble engine.

use scribble_protocol::{ConnectionId, ErrorCode, ProtocolError};
use scribble_room::GameError;
use scribble_words::WordBankError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant auto-generates `From` impls,
/// so the `?` operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum ScribbleError {
    /// Bytes that don't decode into a command (or an event that won't encode).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A command the room rules refused.
    #[error(transparent)]
    Game(#[from] GameError),

    /// The configured word file couldn't be loaded.
    #[error(transparent)]
    WordBank(#[from] WordBankError),

    /// Configuration sources couldn't be read or deserialized.
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// The connection was never registered with `connect`, or already left.
    #[error("unknown connection {0}")]
    UnknownConnection(ConnectionId),
}

impl ScribbleError {
    /// The wire code reported to the originating connection.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Protocol(_) => ErrorCode::MalformedCommand,
            Self::Game(e) => e.code(),
            Self::UnknownConnection(_) => ErrorCode::NotInRoom,
            Self::WordBank(_) | Self::Config(_) => ErrorCode::Unavailable,
        }
    }
}
