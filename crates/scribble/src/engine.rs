//! The session engine: the one entry point a transport talks to.
//!
//! The flow for every inbound message is:
//!   1. Decode bytes → `ClientCommand` (malformed input never goes further)
//!   2. Rate limit per (connection, event kind) → silently drop excess
//!   3. Map the command to a registry call or a room `Action`
//!   4. On failure, send `error` to the originating connection only
//!
//! Room events travel to connections through the unbounded outboxes
//! registered with [`SessionEngine::connect`]; the transport drains them.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use scribble_protocol::{
    Avatar, ClientCommand, Codec, ConnectionId, JsonCodec, ServerEvent,
};
use scribble_room::{
    Action, GameError, NewPlayer, PlayerSender, RoomRegistry, text,
};
use scribble_session::{EventKind, RateLimiter};
use scribble_words::WordBank;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::{EngineConfig, ScribbleError};

/// Routes connection traffic into rooms.
///
/// Shareable across connection tasks behind an `Arc`: every method takes
/// `&self`.
pub struct SessionEngine<C: Codec = JsonCodec> {
    registry: RoomRegistry,
    limiter: RateLimiter,
    /// Outbox per live connection.
    connections: DashMap<ConnectionId, PlayerSender>,
    next_connection: AtomicU64,
    max_name_chars: usize,
    codec: C,
}

impl SessionEngine {
    /// Builds an engine with the configured word bank and the JSON codec.
    pub fn new(config: &EngineConfig) -> Result<Self, ScribbleError> {
        let words = config.word_bank.load()?;
        Ok(Self::with_word_bank(config, Arc::new(words)))
    }

    /// Builds an engine around an already-constructed word bank.
    pub fn with_word_bank(config: &EngineConfig, words: Arc<dyn WordBank>) -> Self {
        Self::with_parts(config, RoomRegistry::new(config.rooms.room_config(), words), JsonCodec)
    }
}

impl<C: Codec> SessionEngine<C> {
    /// Builds an engine from a prepared registry and codec.
    pub fn with_parts(config: &EngineConfig, registry: RoomRegistry, codec: C) -> Self {
        Self {
            registry,
            limiter: RateLimiter::new(config.rate_limits.clone()),
            connections: DashMap::new(),
            next_connection: AtomicU64::new(1),
            max_name_chars: config.rooms.max_name_chars.max(1),
            codec,
        }
    }

    pub fn registry(&self) -> &RoomRegistry {
        &self.registry
    }

    /// Number of registered connections.
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    // -- connection lifecycle ----------------------------------------------

    /// Registers a connection whose events go to `outbox`.
    pub fn connect(&self, outbox: PlayerSender) -> ConnectionId {
        let id = ConnectionId(self.next_connection.fetch_add(1, Ordering::Relaxed));
        self.connections.insert(id, outbox);
        debug!(player = %id, "connection registered");
        id
    }

    /// Registers a connection and hands back the receiving end of its outbox.
    pub fn open(&self) -> (ConnectionId, mpsc::UnboundedReceiver<ServerEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (self.connect(tx), rx)
    }

    /// Forgets a connection: leaves its room and drops its rate windows.
    pub async fn disconnect(&self, conn: ConnectionId) {
        self.connections.remove(&conn);
        self.limiter.forget(conn);
        match self.registry.leave_room(conn).await {
            Ok(code) => info!(player = %conn, room = %code, "disconnected from room"),
            Err(GameError::NotInRoom) => debug!(player = %conn, "disconnected"),
            Err(e) => warn!(player = %conn, error = %e, "leave on disconnect failed"),
        }
    }

    /// Closes every room and forgets every connection.
    pub async fn shutdown(&self) {
        self.registry.shutdown().await;
        self.connections.clear();
        info!("engine shut down");
    }

    // -- inbound ---------------------------------------------------------------

    /// Decodes and dispatches one raw message.
    ///
    /// Undecodable input counts against the control budget and is answered
    /// with `MalformedCommand`.
    pub async fn dispatch_bytes(&self, conn: ConnectionId, data: &[u8]) {
        match self.codec.decode::<ClientCommand>(data) {
            Ok(cmd) => self.dispatch(conn, cmd).await,
            Err(e) => {
                if self.limiter.allow(conn, EventKind::Control) {
                    self.report(conn, "decode", &e.into());
                }
            }
        }
    }

    /// Handles one command; failures go back to `conn` as `error`.
    pub async fn dispatch(&self, conn: ConnectionId, cmd: ClientCommand) {
        let name = cmd.name();
        if let Err(e) = self.handle(conn, cmd).await {
            self.report(conn, name, &e);
        }
    }

    /// Handles one command and returns the failure instead of reporting it.
    ///
    /// A rate-limited command is dropped and counts as `Ok`.
    pub async fn handle(
        &self,
        conn: ConnectionId,
        cmd: ClientCommand,
    ) -> Result<(), ScribbleError> {
        let outbox = self
            .outbox(conn)
            .ok_or(ScribbleError::UnknownConnection(conn))?;
        if !self.limiter.allow(conn, event_kind(&cmd)) {
            return Ok(());
        }

        match cmd {
            ClientCommand::CreateRoom {
                name,
                avatar,
                settings,
            } => {
                let player = self.new_player(conn, &name, avatar)?;
                self.registry.create_room(player, outbox, settings)?;
                self.leave_if_gone(conn).await;
            }
            ClientCommand::JoinRoom { code, name, avatar } => {
                let player = self.new_player(conn, &name, avatar)?;
                self.registry.join_room(&code, player, outbox).await?;
                self.leave_if_gone(conn).await;
            }
            ClientCommand::QuickJoin { name, avatar } => {
                let player = self.new_player(conn, &name, avatar)?;
                self.registry.quick_join(player, outbox).await?;
                self.leave_if_gone(conn).await;
            }
            ClientCommand::ListRooms => {
                let rooms = self.registry.list_public_rooms().await;
                let _ = outbox.send(ServerEvent::RoomList { rooms });
            }
            ClientCommand::KickPlayer { code, target } => {
                self.registry.kick(&code, conn, target).await?;
            }
            ClientCommand::StartGame { code } => {
                self.registry.route(&code, conn, Action::StartGame).await?;
            }
            ClientCommand::SelectWord { code, word } => {
                self.registry
                    .route(&code, conn, Action::SelectWord(word))
                    .await?;
            }
            ClientCommand::Draw { code, stroke } => {
                self.registry.route(&code, conn, Action::Draw(stroke)).await?;
            }
            ClientCommand::Undo { code } => {
                self.registry.route(&code, conn, Action::Undo).await?;
            }
            ClientCommand::ClearCanvas { code } => {
                self.registry.route(&code, conn, Action::ClearCanvas).await?;
            }
            ClientCommand::Guess { code, text: guess } => {
                self.registry.route(&code, conn, Action::Guess(guess)).await?;
            }
        }
        Ok(())
    }

    // -- outbound --------------------------------------------------------------

    /// Encodes an outbound event with the engine's codec.
    pub fn encode(&self, event: &ServerEvent) -> Result<Vec<u8>, ScribbleError> {
        Ok(self.codec.encode(event)?)
    }

    // -- internals -------------------------------------------------------------

    fn outbox(&self, conn: ConnectionId) -> Option<PlayerSender> {
        self.connections.get(&conn).map(|tx| tx.value().clone())
    }

    fn new_player(
        &self,
        conn: ConnectionId,
        raw_name: &str,
        avatar: Avatar,
    ) -> Result<NewPlayer, GameError> {
        let name = text::sanitize(raw_name, self.max_name_chars);
        if name.is_empty() {
            return Err(GameError::MalformedCommand("name must not be empty".into()));
        }
        Ok(NewPlayer::new(conn, name, avatar))
    }

    /// Undoes a join that completed after its connection disconnected.
    async fn leave_if_gone(&self, conn: ConnectionId) {
        if !self.connections.contains_key(&conn) {
            debug!(player = %conn, "disconnected while joining");
            let _ = self.registry.leave_room(conn).await;
        }
    }

    /// Sends `error` to the originating connection only.
    fn report(&self, conn: ConnectionId, command: &str, err: &ScribbleError) {
        debug!(player = %conn, command, error = %err, "command failed");
        if let Some(outbox) = self.outbox(conn) {
            let _ = outbox.send(ServerEvent::Error {
                code: err.code(),
                message: err.to_string(),
            });
        }
    }
}

/// Which rate-limit budget a command draws from.
fn event_kind(cmd: &ClientCommand) -> EventKind {
    match cmd {
        ClientCommand::Draw { .. }
        | ClientCommand::Undo { .. }
        | ClientCommand::ClearCanvas { .. } => EventKind::Stroke,
        ClientCommand::Guess { .. } => EventKind::Chat,
        _ => EventKind::Control,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scribble_protocol::RoomCode;

    fn code() -> RoomCode {
        RoomCode::parse("ABC123").unwrap()
    }

    #[test]
    fn test_event_kind_separates_strokes_from_chat() {
        assert_eq!(event_kind(&ClientCommand::Undo { code: code() }), EventKind::Stroke);
        assert_eq!(
            event_kind(&ClientCommand::ClearCanvas { code: code() }),
            EventKind::Stroke
        );
        assert_eq!(
            event_kind(&ClientCommand::Guess {
                code: code(),
                text: "cat".into()
            }),
            EventKind::Chat
        );
        assert_eq!(event_kind(&ClientCommand::ListRooms), EventKind::Control);
        assert_eq!(
            event_kind(&ClientCommand::StartGame { code: code() }),
            EventKind::Control
        );
    }

    #[test]
    fn test_new_player_sanitizes_name() {
        let engine = SessionEngine::new(&EngineConfig::default()).unwrap();
        let player = engine
            .new_player(ConnectionId(1), "  <b>ann</b> ", Avatar::default())
            .unwrap();
        assert_eq!(player.name, "bann/b");

        let long = engine
            .new_player(ConnectionId(1), &"x".repeat(50), Avatar::default())
            .unwrap();
        assert_eq!(long.name.chars().count(), 20);

        assert!(matches!(
            engine.new_player(ConnectionId(1), " <> ", Avatar::default()),
            Err(GameError::MalformedCommand(_))
        ));
    }
}
