//! Wire protocol for Scribble.
//!
//! This crate defines the "language" that the transport layer and the
//! room engine speak:
//!
//! - **Types** ([`ConnectionId`], [`RoomCode`], [`RoomSettings`],
//!   [`RoomSnapshot`], etc.): identities and views shared by both sides.
//! - **Commands** ([`ClientCommand`]): the closed set of things a
//!   connection may ask for. Anything that doesn't decode into one of
//!   these never reaches room logic.
//! - **Events** ([`ServerEvent`]): everything the engine pushes back.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how those messages are
//!   converted to/from bytes.
//! - **Errors** ([`ProtocolError`], [`ErrorCode`]).
//!
//! # Architecture
//!
//! ```text
//! Transport (bytes) → Protocol (ClientCommand) → Engine → Room
//! Room → Protocol (ServerEvent) → Transport (bytes)
//! ```
//!
//! Message framing is the transport's concern; this crate only knows how
//! to turn typed messages into bytes and back.

mod codec;
mod command;
mod error;
mod event;
mod types;

pub use codec::{Codec, JsonCodec};
pub use command::{ClientCommand, StrokePayload};
pub use error::ProtocolError;
pub use event::ServerEvent;
pub use types::{
    Avatar, ConnectionId, Difficulty, ErrorCode, Phase, PlayerView,
    Recipient, RoomCode, RoomListEntry, RoomSettings, RoomSnapshot,
    TurnEndReason, Visibility,
};
