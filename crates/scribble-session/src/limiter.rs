//! Sliding-window rate limiter keyed by connection and event kind.
//!
//! # Concurrency note
//!
//! `RateLimiter` is shared by every connection task, so the windows live
//! in a `DashMap`. Each check locks one shard for a few pointer moves and
//! never across an `.await`.

use std::collections::VecDeque;
use std::time::Instant;

use dashmap::DashMap;
use scribble_protocol::ConnectionId;

use crate::{EventKind, RateLimitConfig};

/// Admission control for inbound commands.
///
/// For every `(connection, kind)` pair it remembers the timestamps of the
/// events admitted within the current window. An event is admitted when
/// fewer than `max_events` timestamps are younger than `window`.
pub struct RateLimiter {
    windows: DashMap<(ConnectionId, EventKind), VecDeque<Instant>>,
    config: RateLimitConfig,
}

impl RateLimiter {
    /// Creates a limiter with the given per-kind limits.
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            windows: DashMap::new(),
            config,
        }
    }

    /// Records an event happening now; returns `false` if it must be
    /// dropped.
    pub fn allow(&self, conn: ConnectionId, kind: EventKind) -> bool {
        self.allow_at(conn, kind, Instant::now())
    }

    /// Like [`allow`](Self::allow) with an explicit clock reading.
    ///
    /// `now` must not go backwards for a given connection; callers pass
    /// a monotonic reading.
    pub fn allow_at(
        &self,
        conn: ConnectionId,
        kind: EventKind,
        now: Instant,
    ) -> bool {
        let limit = self.config.limit_for(kind);
        if limit.is_unlimited() {
            return true;
        }
        let window = limit.window();

        let mut stamps = self.windows.entry((conn, kind)).or_default();
        while let Some(oldest) = stamps.front() {
            if now.saturating_duration_since(*oldest) >= window {
                stamps.pop_front();
            } else {
                break;
            }
        }

        if stamps.len() >= limit.max_events as usize {
            tracing::trace!(%conn, %kind, "rate limit hit");
            return false;
        }
        stamps.push_back(now);
        true
    }

    /// Drops all windows for a connection (call on disconnect).
    pub fn forget(&self, conn: ConnectionId) {
        for kind in EventKind::ALL {
            self.windows.remove(&(conn, kind));
        }
    }

    /// Number of `(connection, kind)` windows currently tracked.
    pub fn tracked(&self) -> usize {
        self.windows.len()
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(RateLimitConfig::default())
    }
}
