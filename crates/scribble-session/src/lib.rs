//! Per-connection admission control for Scribble.
//!
//! Every inbound command passes through the [`RateLimiter`] before it is
//! routed to a room. Commands over the limit are dropped silently: no
//! error goes back to the client and nothing is queued, so a flooding
//! connection can't grow server memory.
//!
//! # How it fits in the stack
//!
//! ```text
//! SessionEngine (above)  ← asks allow(conn, kind) for every command
//!     ↕
//! Session Layer (this crate)  ← sliding windows keyed by (conn, kind)
//! ```

mod config;
mod limiter;

pub use config::{EventKind, RateLimitConfig, WindowLimit};
pub use limiter::RateLimiter;
