//! Error types for the room layer.

use scribble_protocol::ErrorCode;

/// Why a room operation was refused.
///
/// Every variant is reported to the originating connection only, as an
/// `error` event carrying [`GameError::code`]. None of them change room
/// state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    /// No live room has this code.
    #[error("room not found")]
    RoomNotFound,

    /// The room already holds `max_players` players.
    #[error("room is full")]
    RoomFull,

    /// Joining or starting is only possible in the lobby.
    #[error("game already in progress")]
    GameAlreadyInProgress,

    /// Only the host may do this.
    #[error("only the host can do that")]
    NotHost,

    /// Starting needs at least the configured minimum of players.
    #[error("need at least {0} players to start")]
    NotEnoughPlayers(usize),

    /// Drawing and word selection belong to the current drawer.
    #[error("it is not your turn to draw")]
    NotYourTurn,

    /// The selected word was not one of the offered choices.
    #[error("that word was not offered")]
    InvalidWordChoice,

    /// The sender already guessed the word this turn.
    #[error("you already guessed the word")]
    AlreadyGuessed,

    /// The drawer can't guess their own word.
    #[error("the drawer cannot guess")]
    DrawerCannotGuess,

    /// Requested room settings are out of range.
    #[error("invalid settings: {0}")]
    InvalidSettings(String),

    /// The command doesn't apply to the room's current phase.
    #[error("not allowed during {0}")]
    WrongPhase(scribble_protocol::Phase),

    /// The sender is not a member of this room.
    #[error("you are not in this room")]
    NotInRoom,

    /// The sender is already a member of a room.
    #[error("you are already in a room")]
    AlreadyInRoom,

    /// The target player is not in this room.
    #[error("player not found")]
    PlayerNotFound,

    /// The target of a host action is not valid (e.g. kicking yourself).
    #[error("invalid target: {0}")]
    InvalidTarget(String),

    /// The command is malformed (bad name, empty payload, ...).
    #[error("malformed command: {0}")]
    MalformedCommand(String),

    /// The room's actor is gone or its queue is closed.
    #[error("room is unavailable")]
    Unavailable,
}

impl GameError {
    /// The wire code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::RoomNotFound => ErrorCode::RoomNotFound,
            Self::RoomFull => ErrorCode::RoomFull,
            Self::GameAlreadyInProgress => ErrorCode::GameAlreadyInProgress,
            Self::NotHost => ErrorCode::NotHost,
            Self::NotEnoughPlayers(_) => ErrorCode::NotEnoughPlayers,
            Self::NotYourTurn => ErrorCode::NotYourTurn,
            Self::InvalidWordChoice => ErrorCode::InvalidWordChoice,
            Self::AlreadyGuessed => ErrorCode::AlreadyGuessed,
            Self::DrawerCannotGuess => ErrorCode::DrawerCannotGuess,
            Self::InvalidSettings(_) => ErrorCode::InvalidSettings,
            Self::WrongPhase(_) => ErrorCode::WrongPhase,
            Self::NotInRoom => ErrorCode::NotInRoom,
            Self::AlreadyInRoom => ErrorCode::AlreadyInRoom,
            Self::PlayerNotFound => ErrorCode::PlayerNotFound,
            Self::InvalidTarget(_) => ErrorCode::InvalidTarget,
            Self::MalformedCommand(_) => ErrorCode::MalformedCommand,
            Self::Unavailable => ErrorCode::Unavailable,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scribble_protocol::Phase;

    #[test]
    fn test_code_maps_each_variant() {
        assert_eq!(GameError::RoomFull.code(), ErrorCode::RoomFull);
        assert_eq!(
            GameError::NotEnoughPlayers(2).code(),
            ErrorCode::NotEnoughPlayers
        );
        assert_eq!(
            GameError::WrongPhase(Phase::Lobby).code(),
            ErrorCode::WrongPhase
        );
    }

    #[test]
    fn test_display_includes_detail() {
        let err = GameError::InvalidSettings("rounds must be 1..=10".into());
        assert!(err.to_string().contains("rounds"));
        assert_eq!(
            GameError::WrongPhase(Phase::Drawing).to_string(),
            "not allowed during Drawing"
        );
    }
}
