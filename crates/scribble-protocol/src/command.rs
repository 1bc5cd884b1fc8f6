//! Inbound commands: the closed set of requests a connection can make.
//!
//! Decoding into [`ClientCommand`] is the first validation gate. Unknown
//! `type` tags, missing fields, or malformed room codes fail here and
//! never reach a room.

use serde::{Deserialize, Serialize};

use crate::{Avatar, ConnectionId, RoomCode, RoomSettings};

/// Opaque drawing data, relayed verbatim to the other room members.
///
/// The engine never interprets strokes; it only measures their encoded
/// size to enforce a bandwidth cap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StrokePayload(pub serde_json::Value);

impl StrokePayload {
    /// Size of the payload once encoded as JSON.
    pub fn encoded_len(&self) -> usize {
        serde_json::to_vec(&self.0).map_or(usize::MAX, |bytes| bytes.len())
    }
}

/// Every request a client can send.
///
/// Internally tagged, camelCase on the wire:
/// `{ "type": "guess", "code": "AB12CD", "text": "cat" }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ClientCommand {
    /// Create a room and become its host.
    CreateRoom {
        name: String,
        #[serde(default)]
        avatar: Avatar,
        #[serde(default)]
        settings: RoomSettings,
    },

    /// Join a lobby by code.
    JoinRoom {
        code: RoomCode,
        name: String,
        #[serde(default)]
        avatar: Avatar,
    },

    /// Join any public lobby with a free seat, or open a new one.
    QuickJoin {
        name: String,
        #[serde(default)]
        avatar: Avatar,
    },

    /// List public lobbies.
    ListRooms,

    /// Host only: leave the lobby and start the first turn.
    StartGame { code: RoomCode },

    /// Drawer only: pick one of the offered words.
    SelectWord { code: RoomCode, word: String },

    /// Drawer only: relay a stroke.
    Draw { code: RoomCode, stroke: StrokePayload },

    /// Drawer only: undo the last stroke.
    Undo { code: RoomCode },

    /// Drawer only: wipe the canvas.
    ClearCanvas { code: RoomCode },

    /// Guess the word (or chat, outside a turn).
    Guess { code: RoomCode, text: String },

    /// Host only: remove another player.
    KickPlayer { code: RoomCode, target: ConnectionId },
}

impl ClientCommand {
    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::CreateRoom { .. } => "createRoom",
            Self::JoinRoom { .. } => "joinRoom",
            Self::QuickJoin { .. } => "quickJoin",
            Self::ListRooms => "listRooms",
            Self::StartGame { .. } => "startGame",
            Self::SelectWord { .. } => "selectWord",
            Self::Draw { .. } => "draw",
            Self::Undo { .. } => "undo",
            Self::ClearCanvas { .. } => "clearCanvas",
            Self::Guess { .. } => "guess",
            Self::KickPlayer { .. } => "kickPlayer",
        }
    }

    /// The room this command targets, if it names one.
    pub fn room_code(&self) -> Option<&RoomCode> {
        match self {
            Self::JoinRoom { code, .. }
            | Self::StartGame { code }
            | Self::SelectWord { code, .. }
            | Self::Draw { code, .. }
            | Self::Undo { code }
            | Self::ClearCanvas { code }
            | Self::Guess { code, .. }
            | Self::KickPlayer { code, .. } => Some(code),
            Self::CreateRoom { .. } | Self::QuickJoin { .. } | Self::ListRooms => {
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Difficulty;

    fn decode(json: &str) -> Result<ClientCommand, serde_json::Error> {
        serde_json::from_str(json)
    }

    #[test]
    fn test_decode_create_room_with_partial_settings() {
        let cmd = decode(
            r#"{"type":"createRoom","name":"ann","settings":{"rounds":2,"drawTimeSecs":60,"difficulty":"medium"}}"#,
        )
        .unwrap();

        match cmd {
            ClientCommand::CreateRoom { name, avatar, settings } => {
                assert_eq!(name, "ann");
                assert_eq!(avatar, Avatar::default());
                assert_eq!(settings.rounds, 2);
                assert_eq!(settings.draw_time_secs, 60);
                assert_eq!(settings.difficulty, Difficulty::Medium);
                assert_eq!(settings.words_per_turn, 3);
            }
            other => panic!("expected CreateRoom, got {other:?}"),
        }
    }

    #[test]
    fn test_decode_draw_keeps_stroke_opaque() {
        let cmd = decode(
            r##"{"type":"draw","code":"ab12cd","stroke":{"x":1,"y":2,"color":"#000"}}"##,
        )
        .unwrap();

        let ClientCommand::Draw { code, stroke } = cmd else {
            panic!("expected Draw");
        };
        assert_eq!(code.as_str(), "AB12CD");
        assert_eq!(stroke.0["color"], "#000");
        assert!(stroke.encoded_len() > 10);
    }

    #[test]
    fn test_decode_kick_player_target_is_numeric() {
        let cmd =
            decode(r#"{"type":"kickPlayer","code":"AB12CD","target":42}"#).unwrap();
        assert_eq!(
            cmd,
            ClientCommand::KickPlayer {
                code: RoomCode::parse("AB12CD").unwrap(),
                target: ConnectionId(42),
            }
        );
    }

    #[test]
    fn test_decode_unknown_type_fails() {
        assert!(decode(r#"{"type":"teleport","code":"AB12CD"}"#).is_err());
    }

    #[test]
    fn test_decode_bad_room_code_fails() {
        assert!(decode(r#"{"type":"undo","code":"A"}"#).is_err());
    }

    #[test]
    fn test_room_code_accessor() {
        let cmd = ClientCommand::ListRooms;
        assert!(cmd.room_code().is_none());
        assert_eq!(cmd.name(), "listRooms");

        let code = RoomCode::parse("QWERTY").unwrap();
        let cmd = ClientCommand::Guess { code: code.clone(), text: "hi".into() };
        assert_eq!(cmd.room_code(), Some(&code));
    }
}
