//! Room actor: an isolated Tokio task that owns one [`Room`].
//!
//! Each room runs in its own task and talks to the outside world through
//! a bounded mpsc channel. Network commands and timer firings arrive on
//! that same channel and are applied one at a time, so the room state has
//! a single writer and needs no locks.

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};

use scribble_protocol::{
    ConnectionId, Phase, Recipient, RoomCode, RoomListEntry, ServerEvent,
    Visibility,
};
use scribble_timer::PhaseTimers;
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;
use tracing::{debug, error, info};

use crate::game::{Action, Effects, Room, TimerKind};
use crate::{GameError, NewPlayer};

/// Channel sender for delivering events to one connection.
pub type PlayerSender = mpsc::UnboundedSender<ServerEvent>;

/// Commands sent to a room actor through its channel.
///
/// Variants with a `reply` are request/response: the caller awaits the
/// `oneshot` for the outcome.
pub(crate) enum RoomCommand {
    Join {
        player: NewPlayer,
        sender: PlayerSender,
        reply: oneshot::Sender<Result<(), GameError>>,
    },

    /// Replies with the number of members left.
    Leave {
        player_id: ConnectionId,
        reply: oneshot::Sender<Result<usize, GameError>>,
    },

    Kick {
        by: ConnectionId,
        target: ConnectionId,
        reply: oneshot::Sender<Result<(), GameError>>,
    },

    /// A game command from a member.
    Act {
        from: ConnectionId,
        action: Action,
        reply: oneshot::Sender<Result<(), GameError>>,
    },

    /// A phase timer fired. Never sent by the outside world.
    Timer { kind: TimerKind, epoch: u64 },

    GetInfo {
        reply: oneshot::Sender<RoomInfo>,
    },

    Shutdown,
}

/// Room metadata for listings and matchmaking (never the secret word).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomInfo {
    pub code: RoomCode,
    pub phase: Phase,
    pub visibility: Visibility,
    pub player_count: usize,
    pub max_players: usize,
    pub host_name: String,
}

impl RoomInfo {
    /// Public, still in the lobby, and has a free seat.
    pub fn is_open(&self) -> bool {
        self.visibility == Visibility::Public
            && self.phase.is_joinable()
            && self.player_count < self.max_players
    }

    pub fn list_entry(&self) -> RoomListEntry {
        RoomListEntry {
            code: self.code.clone(),
            host_name: self.host_name.clone(),
            player_count: self.player_count,
            max_players: self.max_players,
        }
    }
}

/// Handle to a running room actor.
///
/// Cheap to clone: it's an `mpsc::Sender` plus the code. Every method
/// fails with [`GameError::Unavailable`] once the actor is gone.
#[derive(Clone)]
pub struct RoomHandle {
    code: RoomCode,
    instance: u64,
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    pub fn code(&self) -> &RoomCode {
        &self.code
    }

    /// Unique per spawned actor, even if a code is later reused.
    pub fn instance(&self) -> u64 {
        self.instance
    }

    /// Whether the actor has stopped.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> RoomCommand,
    ) -> Result<T, GameError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(build(reply_tx))
            .await
            .map_err(|_| GameError::Unavailable)?;
        reply_rx.await.map_err(|_| GameError::Unavailable)
    }

    /// Adds a player; their events go to `sender`.
    pub async fn join(
        &self,
        player: NewPlayer,
        sender: PlayerSender,
    ) -> Result<(), GameError> {
        self.request(|reply| RoomCommand::Join {
            player,
            sender,
            reply,
        })
        .await?
    }

    /// Removes a player. Returns how many members remain.
    pub async fn leave(&self, player_id: ConnectionId) -> Result<usize, GameError> {
        self.request(|reply| RoomCommand::Leave { player_id, reply })
            .await?
    }

    pub async fn kick(
        &self,
        by: ConnectionId,
        target: ConnectionId,
    ) -> Result<(), GameError> {
        self.request(|reply| RoomCommand::Kick { by, target, reply })
            .await?
    }

    /// Applies a game command and waits for the verdict.
    pub async fn act(
        &self,
        from: ConnectionId,
        action: Action,
    ) -> Result<(), GameError> {
        self.request(|reply| RoomCommand::Act {
            from,
            action,
            reply,
        })
        .await?
    }

    pub async fn info(&self) -> Result<RoomInfo, GameError> {
        self.request(|reply| RoomCommand::GetInfo { reply }).await
    }

    /// Closes the room; members get `roomClosed`.
    pub async fn shutdown(&self) -> Result<(), GameError> {
        self.sender
            .send(RoomCommand::Shutdown)
            .await
            .map_err(|_| GameError::Unavailable)
    }
}

enum Flow {
    Continue,
    Stop,
}

/// Why the actor stopped, reported to the exit hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Exit {
    /// Last member left or the room was shut down.
    Closed,
    /// A command panicked; members may still be indexed elsewhere.
    Faulted,
}

/// The internal room actor state. Runs inside a Tokio task.
struct RoomActor {
    room: Room,
    /// Per-member outbound channels.
    senders: HashMap<ConnectionId, PlayerSender>,
    timers: PhaseTimers<TimerKind, RoomCommand>,
    receiver: mpsc::Receiver<RoomCommand>,
}

impl RoomActor {
    async fn run(mut self, on_exit: impl FnOnce(Exit)) {
        let code = self.room.code().clone();
        info!(room = %code, "room actor started");

        let mut exit = Exit::Closed;
        while let Some(cmd) = self.receiver.recv().await {
            let now = Instant::now();
            // A panic must take down this room only.
            let step = panic::catch_unwind(AssertUnwindSafe(|| self.handle(cmd, now)));
            match step {
                Ok(Flow::Continue) => {}
                Ok(Flow::Stop) => break,
                Err(_) => {
                    error!(room = %code, "room faulted while handling a command, closing");
                    self.close("internal error");
                    exit = Exit::Faulted;
                    break;
                }
            }
            if self.room.is_empty() {
                debug!(room = %code, "room is empty");
                break;
            }
        }

        self.timers.cancel_all();
        info!(room = %code, ?exit, "room actor stopped");
        on_exit(exit);
    }

    fn handle(&mut self, cmd: RoomCommand, now: Instant) -> Flow {
        match cmd {
            RoomCommand::Join {
                player,
                sender,
                reply,
            } => {
                let id = player.id;
                let result = self.room.join(player).map(|fx| {
                    self.senders.insert(id, sender);
                    self.apply(fx);
                });
                let _ = reply.send(result);
            }
            RoomCommand::Leave { player_id, reply } => {
                let result = self.room.leave(player_id, now).map(|fx| {
                    self.apply(fx);
                    self.room.players().len()
                });
                let _ = reply.send(result);
            }
            RoomCommand::Kick { by, target, reply } => {
                let result = self.room.kick(by, target, now).map(|fx| self.apply(fx));
                let _ = reply.send(result);
            }
            RoomCommand::Act {
                from,
                action,
                reply,
            } => {
                let name = action.name();
                let result = self.room.handle(from, action, now).map(|fx| self.apply(fx));
                if let Err(e) = &result {
                    debug!(
                        room = %self.room.code(),
                        player = %from,
                        command = name,
                        error = %e,
                        "command rejected"
                    );
                }
                let _ = reply.send(result);
            }
            RoomCommand::Timer { kind, epoch } => {
                let fx = self.room.on_timer(kind, epoch, now);
                self.apply(fx);
            }
            RoomCommand::GetInfo { reply } => {
                let _ = reply.send(self.info());
            }
            RoomCommand::Shutdown => {
                info!(room = %self.room.code(), "room shutting down");
                self.close("room shut down");
                return Flow::Stop;
            }
        }
        Flow::Continue
    }

    /// Carries out an operation's effects: timers first, then delivery.
    fn apply(&mut self, fx: Effects) {
        if fx.cancel_timers {
            self.timers.cancel_all();
        }
        for timer in fx.timers {
            self.timers.arm_at(timer.kind, timer.at, RoomCommand::Timer {
                kind: timer.kind,
                epoch: timer.epoch,
            });
        }
        for (recipient, event) in fx.messages {
            self.dispatch(recipient, event);
        }
        // Senders of departed players were kept just long enough for
        // their last unicast (e.g. `kicked`).
        let room = &self.room;
        self.senders.retain(|id, _| room.contains(*id));
    }

    /// Resolves a recipient against the current roster.
    fn dispatch(&self, recipient: Recipient, event: ServerEvent) {
        match recipient {
            Recipient::All => {
                for player in self.room.players() {
                    self.send_to(player.id, event.clone());
                }
            }
            Recipient::Player(id) => self.send_to(id, event),
            Recipient::AllExcept(excluded) => {
                for player in self.room.players() {
                    if player.id != excluded {
                        self.send_to(player.id, event.clone());
                    }
                }
            }
        }
    }

    /// Sends to one member. Silently drops if their receiver is gone.
    fn send_to(&self, id: ConnectionId, event: ServerEvent) {
        if let Some(sender) = self.senders.get(&id) {
            let _ = sender.send(event);
        }
    }

    /// Tells every member the room is gone.
    fn close(&mut self, reason: &str) {
        for sender in self.senders.values() {
            let _ = sender.send(ServerEvent::RoomClosed {
                reason: reason.to_string(),
            });
        }
        self.senders.clear();
    }

    fn info(&self) -> RoomInfo {
        RoomInfo {
            code: self.room.code().clone(),
            phase: self.room.phase(),
            visibility: self.room.settings().visibility,
            player_count: self.room.players().len(),
            max_players: self.room.settings().max_players,
            host_name: self.room.host_name().to_string(),
        }
    }
}

/// Spawns an actor for a freshly created room and returns its handle.
///
/// The creator (the room's host) gets `roomCreated` right away.
/// `on_exit` runs inside the actor task once it stops.
pub(crate) fn spawn_room(
    room: Room,
    instance: u64,
    creator_sender: PlayerSender,
    channel_size: usize,
    on_exit: impl FnOnce(Exit) + Send + 'static,
) -> RoomHandle {
    let code = room.code().clone();
    let (tx, rx) = mpsc::channel(channel_size.max(1));

    let _ = creator_sender.send(ServerEvent::RoomCreated {
        code: code.clone(),
        room: room.snapshot(),
    });
    let mut senders = HashMap::new();
    senders.insert(room.host(), creator_sender);

    let actor = RoomActor {
        room,
        senders,
        timers: PhaseTimers::new(&tx),
        receiver: rx,
    };
    tokio::spawn(actor.run(on_exit));

    RoomHandle {
        code,
        instance,
        sender: tx,
    }
}
