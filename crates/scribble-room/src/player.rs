//! Per-connection participant record.

use scribble_protocol::{Avatar, ConnectionId, PlayerView};

/// Who is joining: identity plus cosmetics, already sanitized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPlayer {
    pub id: ConnectionId,
    pub name: String,
    pub avatar: Avatar,
}

impl NewPlayer {
    pub fn new(id: ConnectionId, name: impl Into<String>, avatar: Avatar) -> Self {
        Self {
            id,
            name: name.into(),
            avatar,
        }
    }
}

/// A member of a room.
#[derive(Debug, Clone)]
pub struct Player {
    pub id: ConnectionId,
    pub name: String,
    pub avatar: Avatar,
    /// Never decreases during a game.
    pub score: u32,
    /// 1-based position in the standings; ties go to the earlier joiner.
    pub rank: u32,
    pub has_guessed: bool,
    /// Position in join order; defines turn rotation.
    pub(crate) join_seq: u64,
}

impl Player {
    pub(crate) fn new(new: NewPlayer, join_seq: u64) -> Self {
        Self {
            id: new.id,
            name: new.name,
            avatar: new.avatar,
            score: 0,
            rank: 1,
            has_guessed: false,
            join_seq,
        }
    }

    pub(crate) fn view(
        &self,
        host: ConnectionId,
        drawer: Option<ConnectionId>,
    ) -> PlayerView {
        PlayerView {
            id: self.id,
            name: self.name.clone(),
            avatar: self.avatar.clone(),
            score: self.score,
            rank: self.rank,
            has_guessed: self.has_guessed,
            is_host: self.id == host,
            is_drawer: drawer == Some(self.id),
        }
    }
}
