//! Rate-limit configuration.

use std::fmt;
use std::time::Duration;

use serde::Deserialize;

// ---------------------------------------------------------------------------
// EventKind
// ---------------------------------------------------------------------------

/// Rate-limit bucket a command falls into.
///
/// Strokes arrive far more often than guesses, so they get their own
/// (larger) budget and can't starve chat, and vice versa.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// `draw`, `undo`, `clearCanvas`.
    Stroke,
    /// `guess`.
    Chat,
    /// Everything else (create/join/start/select/kick/list).
    Control,
}

impl EventKind {
    pub const ALL: [EventKind; 3] = [Self::Stroke, Self::Chat, Self::Control];
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stroke => write!(f, "stroke"),
            Self::Chat => write!(f, "chat"),
            Self::Control => write!(f, "control"),
        }
    }
}

// ---------------------------------------------------------------------------
// WindowLimit
// ---------------------------------------------------------------------------

/// At most `max_events` within any `window_secs`-long sliding window.
///
/// `max_events == 0` disables limiting for that kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct WindowLimit {
    pub window_secs: u64,
    pub max_events: u32,
}

impl WindowLimit {
    pub fn new(window_secs: u64, max_events: u32) -> Self {
        Self {
            window_secs,
            max_events,
        }
    }

    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }

    pub fn is_unlimited(&self) -> bool {
        self.max_events == 0
    }
}

// ---------------------------------------------------------------------------
// RateLimitConfig
// ---------------------------------------------------------------------------

/// Limits for each [`EventKind`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    pub stroke: WindowLimit,
    pub chat: WindowLimit,
    pub control: WindowLimit,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            stroke: WindowLimit::new(60, 120),
            chat: WindowLimit::new(60, 30),
            control: WindowLimit::new(60, 60),
        }
    }
}

impl RateLimitConfig {
    /// The limit that applies to `kind`.
    pub fn limit_for(&self, kind: EventKind) -> WindowLimit {
        match kind {
            EventKind::Stroke => self.stroke,
            EventKind::Chat => self.chat,
            EventKind::Control => self.control,
        }
    }
}
