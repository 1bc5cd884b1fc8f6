//! Core protocol types shared by the engine and the transport layer.
//!
//! Everything here is plain data: identities, room settings, and the
//! read-only views of a room that get pushed to clients.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// Opaque identity of one transport connection.
///
/// A player *is* their connection: the id is stable for the connection's
/// lifetime and is what rosters, host assignment and turn rotation refer
/// to. Serialized as a bare number.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize,
    Deserialize,
)]
#[serde(transparent)]
pub struct ConnectionId(pub u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// A human-shareable room code: exactly six ASCII letters/digits,
/// stored upper-case.
///
/// Input is trimmed and upper-cased, so `" ab12cd "` and `"AB12CD"` name
/// the same room. Deserialization goes through the same normalization,
/// which means a command carrying a malformed code fails to decode.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RoomCode(String);

impl RoomCode {
    /// Number of characters in every room code.
    pub const LEN: usize = 6;

    /// Normalizes and validates a user-supplied room code.
    pub fn parse(raw: &str) -> Result<Self, ProtocolError> {
        let code = raw.trim().to_ascii_uppercase();
        if code.len() != Self::LEN
            || !code.bytes().all(|b| b.is_ascii_alphanumeric())
        {
            return Err(ProtocolError::InvalidRoomCode(raw.to_string()));
        }
        Ok(Self(code))
    }

    /// Returns the normalized code.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for RoomCode {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for RoomCode {
    type Error = ProtocolError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<RoomCode> for String {
    fn from(code: RoomCode) -> Self {
        code.0
    }
}

// ---------------------------------------------------------------------------
// Recipient
// ---------------------------------------------------------------------------

/// Specifies who should receive a server event.
///
/// Room logic returns `(Recipient, ServerEvent)` pairs; the room actor
/// resolves them against its current roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recipient {
    /// Every current member of the room.
    All,

    /// One specific connection.
    Player(ConnectionId),

    /// Every member except one (e.g. strokes go to everyone but the
    /// drawer who produced them).
    AllExcept(ConnectionId),
}

// ---------------------------------------------------------------------------
// Room settings
// ---------------------------------------------------------------------------

/// Cosmetic avatar chosen at join time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Avatar {
    /// CSS color string, e.g. `"#3b82f6"`.
    pub color: String,
    /// Single letter drawn on the avatar.
    pub letter: char,
}

impl Default for Avatar {
    fn default() -> Self {
        Self {
            color: "#3b82f6".to_string(),
            letter: 'A',
        }
    }
}

/// Word difficulty tier.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[default]
    Easy,
    Medium,
    Hard,
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Easy => f.write_str("easy"),
            Self::Medium => f.write_str("medium"),
            Self::Hard => f.write_str("hard"),
        }
    }
}

/// Whether a room shows up in public listings and quick join.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Private,
}

/// Host-chosen settings for one room. Immutable once the room exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RoomSettings {
    /// Number of full rotations through the roster.
    pub rounds: u32,
    /// Seconds each drawer gets once a word is chosen.
    pub draw_time_secs: u32,
    /// Seat limit, 2–8.
    pub max_players: usize,
    pub difficulty: Difficulty,
    pub theme: String,
    /// How many words the drawer picks from, 1–3.
    pub words_per_turn: usize,
    pub visibility: Visibility,
}

impl Default for RoomSettings {
    fn default() -> Self {
        Self {
            rounds: 3,
            draw_time_secs: 80,
            max_players: 8,
            difficulty: Difficulty::Easy,
            theme: "general".to_string(),
            words_per_turn: 3,
            visibility: Visibility::Public,
        }
    }
}

// ---------------------------------------------------------------------------
// Phase
// ---------------------------------------------------------------------------

/// The room's game phase.
///
/// ```text
/// Lobby → WordSelection → Drawing → TurnEnd ─┬→ WordSelection (next drawer)
///                                            └→ GameEnd
/// ```
///
/// `WordSelection` can also go straight to `TurnEnd` when the drawer
/// leaves before choosing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    Lobby,
    WordSelection,
    Drawing,
    TurnEnd,
    GameEnd,
}

impl Phase {
    /// Returns `true` if new players may still join.
    pub fn is_joinable(&self) -> bool {
        matches!(self, Self::Lobby)
    }

    /// Returns `true` while a drawer holds the turn.
    pub fn has_active_drawer(&self) -> bool {
        matches!(self, Self::WordSelection | Self::Drawing)
    }

    /// Returns `true` between `startGame` and `GameEnd`.
    pub fn is_in_game(&self) -> bool {
        !matches!(self, Self::Lobby | Self::GameEnd)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lobby => write!(f, "Lobby"),
            Self::WordSelection => write!(f, "WordSelection"),
            Self::Drawing => write!(f, "Drawing"),
            Self::TurnEnd => write!(f, "TurnEnd"),
            Self::GameEnd => write!(f, "GameEnd"),
        }
    }
}

/// Why a turn ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TurnEndReason {
    /// Every non-drawer guessed the word.
    AllGuessed,
    /// Drawing time ran out.
    TimeUp,
    /// The drawer left mid-turn.
    DrawerLeft,
    /// Too few players remain to keep playing.
    NotEnoughPlayers,
}

// ---------------------------------------------------------------------------
// Views
// ---------------------------------------------------------------------------

/// What clients see of one player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerView {
    pub id: ConnectionId,
    pub name: String,
    pub avatar: Avatar,
    pub score: u32,
    pub rank: u32,
    pub has_guessed: bool,
    pub is_host: bool,
    pub is_drawer: bool,
}

/// A read-only picture of a room, sent on create/join/game start.
///
/// Never contains the secret word: `hint` is the masked form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSnapshot {
    pub code: RoomCode,
    pub host: ConnectionId,
    pub phase: Phase,
    pub settings: RoomSettings,
    /// In join order.
    pub players: Vec<PlayerView>,
    /// 1-based; 0 before the game starts.
    pub round: u32,
    pub total_rounds: u32,
    pub drawer: Option<ConnectionId>,
    pub hint: Option<String>,
}

/// A summary of a public lobby, returned by `listRooms`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomListEntry {
    pub code: RoomCode,
    pub host_name: String,
    pub player_count: usize,
    pub max_players: usize,
}

// ---------------------------------------------------------------------------
// ErrorCode
// ---------------------------------------------------------------------------

/// Machine-readable error kind sent to the originating connection.
///
/// Serialized by variant name (`"RoomNotFound"`, ...) so clients can
/// switch on it without parsing the human-readable message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    RoomNotFound,
    RoomFull,
    GameAlreadyInProgress,
    NotHost,
    NotEnoughPlayers,
    NotYourTurn,
    InvalidWordChoice,
    AlreadyGuessed,
    DrawerCannotGuess,
    InvalidSettings,
    WrongPhase,
    NotInRoom,
    AlreadyInRoom,
    PlayerNotFound,
    InvalidTarget,
    MalformedCommand,
    Unavailable,
}
