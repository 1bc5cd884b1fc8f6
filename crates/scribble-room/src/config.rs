//! Room rules shared by every room, and validation of per-room settings.

use std::time::Duration;

use scribble_protocol::RoomSettings;
use tracing::warn;

use crate::GameError;

// ---------------------------------------------------------------------------
// RoomConfig
// ---------------------------------------------------------------------------

/// Server-wide rules every room runs under.
///
/// Per-room choices (rounds, draw time, ...) live in [`RoomSettings`];
/// this is what the operator configures.
#[derive(Debug, Clone, PartialEq)]
pub struct RoomConfig {
    /// Minimum players to start, and to keep a game going.
    pub min_players: usize,

    /// How long the drawer has to pick a word before the first offered
    /// word is picked for them.
    pub selection_timeout: Duration,

    /// Pause between `TurnEnd` and the next `WordSelection`.
    pub inter_turn_delay: Duration,

    /// When hints are revealed, as fractions of the draw time.
    pub hint_fractions: Vec<f64>,

    /// Strokes whose JSON encoding is longer than this are dropped.
    pub max_stroke_bytes: usize,

    /// Chat/guess text is cut to this many characters.
    pub max_chat_chars: usize,

    /// Points for a correct guess before the time bonus.
    pub base_points: u32,

    /// Bounded command queue size per room actor.
    pub channel_size: usize,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            min_players: 2,
            selection_timeout: Duration::from_secs(15),
            inter_turn_delay: Duration::from_secs(3),
            hint_fractions: vec![0.375, 0.75],
            max_stroke_bytes: 10_000,
            max_chat_chars: 100,
            base_points: 100,
            channel_size: 64,
        }
    }
}

impl RoomConfig {
    /// Fixes out-of-range values so the config is safe to run with.
    ///
    /// - `min_players` is at least 2 (a turn needs someone to guess).
    /// - Hint fractions outside `(0, 1)` are dropped; the rest are sorted.
    /// - `channel_size` is at least 1.
    pub fn validated(mut self) -> Self {
        if self.min_players < 2 {
            warn!(min_players = self.min_players, "min_players below 2, raising");
            self.min_players = 2;
        }
        let before = self.hint_fractions.len();
        self.hint_fractions.retain(|f| *f > 0.0 && *f < 1.0);
        if self.hint_fractions.len() != before {
            warn!("dropping hint fractions outside (0, 1)");
        }
        self.hint_fractions.sort_by(f64::total_cmp);
        self.channel_size = self.channel_size.max(1);
        self
    }
}

// ---------------------------------------------------------------------------
// Settings validation
// ---------------------------------------------------------------------------

pub const ROUNDS: std::ops::RangeInclusive<u32> = 1..=10;
pub const DRAW_TIME_SECS: std::ops::RangeInclusive<u32> = 15..=240;
pub const MAX_PLAYERS: std::ops::RangeInclusive<usize> = 2..=8;
pub const WORDS_PER_TURN: std::ops::RangeInclusive<usize> = 1..=3;
const MAX_THEME_CHARS: usize = 32;

/// Checks host-supplied settings against the supported ranges.
pub fn validate_settings(settings: &RoomSettings) -> Result<(), GameError> {
    if !ROUNDS.contains(&settings.rounds) {
        return Err(GameError::InvalidSettings(format!(
            "rounds must be within {}..={}",
            ROUNDS.start(),
            ROUNDS.end()
        )));
    }
    if !DRAW_TIME_SECS.contains(&settings.draw_time_secs) {
        return Err(GameError::InvalidSettings(format!(
            "drawTimeSecs must be within {}..={}",
            DRAW_TIME_SECS.start(),
            DRAW_TIME_SECS.end()
        )));
    }
    if !MAX_PLAYERS.contains(&settings.max_players) {
        return Err(GameError::InvalidSettings(format!(
            "maxPlayers must be within {}..={}",
            MAX_PLAYERS.start(),
            MAX_PLAYERS.end()
        )));
    }
    if !WORDS_PER_TURN.contains(&settings.words_per_turn) {
        return Err(GameError::InvalidSettings(format!(
            "wordsPerTurn must be within {}..={}",
            WORDS_PER_TURN.start(),
            WORDS_PER_TURN.end()
        )));
    }
    let theme = settings.theme.trim();
    if theme.is_empty() || theme.chars().count() > MAX_THEME_CHARS {
        return Err(GameError::InvalidSettings(format!(
            "theme must be 1..={MAX_THEME_CHARS} characters"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_are_valid() {
        assert_eq!(validate_settings(&RoomSettings::default()), Ok(()));
    }

    #[test]
    fn test_validate_settings_rejects_out_of_range() {
        let cases = [
            RoomSettings { rounds: 0, ..RoomSettings::default() },
            RoomSettings { draw_time_secs: 5, ..RoomSettings::default() },
            RoomSettings { max_players: 9, ..RoomSettings::default() },
            RoomSettings { max_players: 1, ..RoomSettings::default() },
            RoomSettings { words_per_turn: 4, ..RoomSettings::default() },
            RoomSettings { theme: "  ".into(), ..RoomSettings::default() },
        ];
        for settings in cases {
            assert!(
                matches!(
                    validate_settings(&settings),
                    Err(GameError::InvalidSettings(_))
                ),
                "{settings:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_validated_fixes_bad_values() {
        let config = RoomConfig {
            min_players: 0,
            hint_fractions: vec![0.75, 1.5, 0.25, -1.0],
            channel_size: 0,
            ..RoomConfig::default()
        }
        .validated();

        assert_eq!(config.min_players, 2);
        assert_eq!(config.hint_fractions, vec![0.25, 0.75]);
        assert_eq!(config.channel_size, 1);
    }
}
