//! Outbound events pushed from the engine to connections.

use serde::{Deserialize, Serialize};

use crate::{
    ConnectionId, ErrorCode, PlayerView, RoomCode, RoomListEntry, RoomSnapshot,
    StrokePayload, TurnEndReason,
};

/// Everything the engine can send to a connection.
///
/// Internally tagged, camelCase on the wire:
/// `{ "type": "correctGuess", "playerId": 3, "points": 172, ... }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ServerEvent {
    // -- Room membership --
    /// Unicast to the creator.
    RoomCreated { code: RoomCode, room: RoomSnapshot },

    /// Unicast to a player who just joined.
    RoomJoined { room: RoomSnapshot },

    /// Unicast answer to `listRooms`.
    RoomList { rooms: Vec<RoomListEntry> },

    /// Broadcast when someone joins.
    PlayerJoined {
        player: PlayerView,
        players: Vec<PlayerView>,
    },

    /// Broadcast when someone leaves, disconnects or is kicked.
    /// `host` is the (possibly reassigned) host afterwards.
    PlayerLeft {
        player_id: ConnectionId,
        host: ConnectionId,
        players: Vec<PlayerView>,
    },

    /// Unicast to a player the host removed.
    Kicked { code: RoomCode },

    // -- Turn flow --
    /// Broadcast when the host starts the game.
    GameStarted { room: RoomSnapshot },

    /// Broadcast when a new drawer starts choosing.
    TurnStarted {
        drawer: ConnectionId,
        drawer_name: String,
        round: u32,
        total_rounds: u32,
    },

    /// Unicast to the drawer: pick one of these before the timeout.
    SelectWord {
        words: Vec<String>,
        timeout_secs: u64,
    },

    /// Unicast to the drawer: the secret word for this turn.
    WordChosen { word: String },

    /// Broadcast when drawing starts; carries the masked word.
    RoundStarted {
        drawer: ConnectionId,
        hint: String,
        draw_time_secs: u32,
        round: u32,
        total_rounds: u32,
    },

    /// Broadcast when a scheduled hint discloses another letter.
    HintRevealed { hint: String },

    // -- Canvas relay --
    Drawing {
        from: ConnectionId,
        stroke: StrokePayload,
    },
    UndoStroke { from: ConnectionId },
    CanvasCleared { from: ConnectionId },

    // -- Guessing --
    /// Chat line. `is_system` marks engine announcements such as
    /// "ann guessed the word!".
    ChatMessage {
        player_id: ConnectionId,
        player_name: String,
        text: String,
        is_system: bool,
    },

    /// Broadcast on a player's first correct guess of the turn.
    CorrectGuess {
        player_id: ConnectionId,
        player_name: String,
        points: u32,
        players: Vec<PlayerView>,
    },

    /// Broadcast when a turn ends; reveals the word.
    TurnEnded {
        word: Option<String>,
        reason: TurnEndReason,
        guess_order: Vec<ConnectionId>,
        players: Vec<PlayerView>,
    },

    /// Broadcast once the last turn ends. Standings are rank-ordered.
    GameEnded { standings: Vec<PlayerView> },

    // -- Faults --
    /// The room was shut down and will not process further commands.
    RoomClosed { reason: String },

    /// Unicast to the originating connection only.
    Error { code: ErrorCode, message: String },
}
