//! Room lifecycle and game flow for Scribble.
//!
//! Each room runs as an isolated Tokio task (actor model) that owns one
//! [`Room`] state machine. Commands and phase timers arrive on the same
//! channel, so a room's state only ever changes one event at a time.
//!
//! # Key types
//!
//! - [`Room`]: the synchronous state machine (lobby → word selection →
//!   drawing → turn end → … → game end); returns [`Effects`]
//! - [`RoomRegistry`]: creates/destroys rooms, indexes members, routes
//! - [`RoomHandle`]: send commands to a running room actor
//! - [`RoomConfig`]: engine-side tunables (timeouts, hint schedule, caps)

mod config;
mod error;
mod game;
pub mod hint;
mod player;
mod registry;
mod room;
pub mod text;

pub use config::{RoomConfig, validate_settings};
pub use error::GameError;
pub use game::{Action, Effects, Room, TimerKind, TimerRequest};
pub use player::{NewPlayer, Player};
pub use registry::RoomRegistry;
pub use room::{PlayerSender, RoomHandle, RoomInfo};
