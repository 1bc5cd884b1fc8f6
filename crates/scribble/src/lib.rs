//! # Scribble
//!
//! Room session engine for real-time multiplayer drawing-and-guessing
//! games.
//!
//! A transport (WebSocket server, test harness, ...) registers each
//! connection with [`SessionEngine::connect`], feeds it inbound messages
//! through [`SessionEngine::dispatch_bytes`] and drains the connection's
//! outbox of [`ServerEvent`](scribble_protocol::ServerEvent)s. Everything
//! else (rooms, turns, timers, scoring) happens inside the engine.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use scribble::prelude::*;
//!
//! # async fn run() -> Result<(), ScribbleError> {
//! let config = EngineConfig::load(None)?;
//! scribble::telemetry::init_tracing(&config.log.filter);
//!
//! let engine = SessionEngine::new(&config)?;
//! let (conn, mut outbox) = engine.open();
//! engine
//!     .dispatch_bytes(conn, br#"{"type":"createRoom","name":"ann"}"#)
//!     .await;
//! while let Some(event) = outbox.recv().await {
//!     let _bytes = engine.encode(&event)?;
//! }
//! # Ok(())
//! # }
//! ```

mod config;
mod engine;
mod error;
pub mod telemetry;

pub use config::{EngineConfig, LogConfig, RoomRules, WordBankConfig};
pub use engine::SessionEngine;
pub use error::ScribbleError;

/// Commonly used types, re-exported for convenience.
pub mod prelude {
    pub use crate::{EngineConfig, ScribbleError, SessionEngine};
    pub use scribble_protocol::{
        Avatar, ClientCommand, Codec, ConnectionId, Difficulty, ErrorCode,
        JsonCodec, Phase, RoomCode, RoomSettings, ServerEvent, Visibility,
    };
    pub use scribble_room::{GameError, RoomConfig, RoomRegistry};
    pub use scribble_session::{EventKind, RateLimitConfig, WindowLimit};
    pub use scribble_words::{StaticWordBank, WordBank};
}
