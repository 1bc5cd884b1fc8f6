//! Keyed one-shot timers for room actors.
//!
//! A room never mutates its own state from a timer task. Instead each
//! timer, when it fires, pushes a message into the room's command queue
//! and the room handles it like any other command, in arrival order.
//!
//! # Staleness
//!
//! Cancelling a timer aborts its task, but an abort can race with a
//! message that was already queued. Callers must therefore tag timer
//! messages (e.g. with a phase epoch) and ignore stale ones when they
//! arrive. [`PhaseTimers`] only guarantees that a cancelled timer will
//! not fire *later*.
//!
//! # Lifetime
//!
//! Timer tasks hold a [`WeakSender`](mpsc::WeakSender) so a pending timer
//! never keeps a room's queue open. Once every strong sender is gone the
//! timer wakes up, finds nothing to deliver to, and exits.
//!
//! # Integration
//!
//! ```ignore
//! let (tx, mut rx) = mpsc::channel(64);
//! let mut timers = PhaseTimers::new(&tx);
//! timers.arm(Kind::Deadline, Duration::from_secs(80), Cmd::Timer(Kind::Deadline, epoch));
//!
//! while let Some(cmd) = rx.recv().await {
//!     // ... on phase change:
//!     timers.cancel_all();
//! }
//! ```

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tracing::trace;

// ---------------------------------------------------------------------------
// PhaseTimers
// ---------------------------------------------------------------------------

/// Set of pending one-shot timers, at most one per key.
///
/// Must be used from within a Tokio runtime (arming spawns a task).
pub struct PhaseTimers<K, T> {
    tx: mpsc::WeakSender<T>,
    armed: HashMap<K, JoinHandle<()>>,
}

impl<K, T> PhaseTimers<K, T>
where
    K: Eq + Hash + Copy + Debug,
    T: Send + 'static,
{
    /// Creates an empty timer set delivering into `tx`'s channel.
    pub fn new(tx: &mpsc::Sender<T>) -> Self {
        Self {
            tx: tx.downgrade(),
            armed: HashMap::new(),
        }
    }

    /// Delivers `msg` after `after` has elapsed.
    ///
    /// Re-arming a key replaces (and aborts) the previous timer for it.
    pub fn arm(&mut self, key: K, after: Duration, msg: T) {
        self.arm_at(key, Instant::now() + after, msg);
    }

    /// Delivers `msg` at `deadline`. A deadline in the past fires on the
    /// next scheduler turn.
    pub fn arm_at(&mut self, key: K, deadline: Instant, msg: T) {
        // Drop finished handles so the map doesn't grow over a long game.
        self.armed.retain(|_, handle| !handle.is_finished());

        let tx = self.tx.clone();
        let handle = tokio::spawn(async move {
            time::sleep_until(deadline).await;
            // Room already gone: nothing to do.
            let Some(tx) = tx.upgrade() else {
                return;
            };
            let _ = tx.send(msg).await;
        });

        if let Some(previous) = self.armed.insert(key, handle) {
            previous.abort();
            trace!(?key, "timer re-armed");
        } else {
            trace!(?key, "timer armed");
        }
    }

    /// Cancels the timer for `key`. Returns `true` if one was pending.
    pub fn cancel(&mut self, key: &K) -> bool {
        match self.armed.remove(key) {
            Some(handle) => {
                let pending = !handle.is_finished();
                handle.abort();
                pending
            }
            None => false,
        }
    }

    /// Cancels every pending timer.
    pub fn cancel_all(&mut self) {
        for (_, handle) in self.armed.drain() {
            handle.abort();
        }
    }

    /// Whether a timer for `key` is still waiting to fire.
    pub fn is_armed(&self, key: &K) -> bool {
        self.armed.get(key).is_some_and(|handle| !handle.is_finished())
    }

    /// Number of timers still waiting to fire.
    pub fn pending(&self) -> usize {
        self.armed
            .values()
            .filter(|handle| !handle.is_finished())
            .count()
    }
}

impl<K, T> Drop for PhaseTimers<K, T> {
    fn drop(&mut self) {
        for (_, handle) in self.armed.drain() {
            handle.abort();
        }
    }
}
