//! Engine configuration: file + environment, every field defaulted.
//!
//! ```toml
//! [rooms]
//! min_players = 2
//! selection_timeout_secs = 15
//! hint_fractions = [0.375, 0.75]
//!
//! [rate_limits.chat]
//! window_secs = 60
//! max_events = 30
//!
//! [word_bank]
//! file_path = "words.json"
//!
//! [log]
//! filter = "scribble=debug"
//! ```
//!
//! Environment variables override the file: `SCRIBBLE__ROOMS__MIN_PLAYERS=3`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use scribble_room::RoomConfig;
use scribble_session::RateLimitConfig;
use scribble_words::StaticWordBank;
use serde::Deserialize;

use crate::ScribbleError;

const ENV_PREFIX: &str = "SCRIBBLE";
const ENV_SEPARATOR: &str = "__";

/// Everything the engine can be tuned with.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub rooms: RoomRules,
    pub rate_limits: RateLimitConfig,
    pub word_bank: WordBankConfig,
    pub log: LogConfig,
}

impl EngineConfig {
    /// Loads from an optional file (format picked by extension) and then
    /// `SCRIBBLE__*` environment variables.
    pub fn load(path: Option<&Path>) -> Result<Self, ScribbleError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        }
        let settings = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator(ENV_SEPARATOR)
                    .separator(ENV_SEPARATOR)
                    .try_parsing(true),
            )
            .build()?;
        Ok(settings.try_deserialize()?)
    }

    /// Parses a TOML document, with no environment overrides.
    pub fn from_toml(toml: &str) -> Result<Self, ScribbleError> {
        let settings = config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()?;
        Ok(settings.try_deserialize()?)
    }
}

// ---------------------------------------------------------------------------
// Rooms
// ---------------------------------------------------------------------------

/// Rules shared by every room, in config-file units (seconds).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RoomRules {
    pub min_players: usize,
    pub selection_timeout_secs: u64,
    pub inter_turn_delay_secs: u64,
    /// Fractions of the draw time at which a hint letter is revealed.
    pub hint_fractions: Vec<f64>,
    pub max_stroke_bytes: usize,
    pub max_chat_chars: usize,
    pub max_name_chars: usize,
    pub base_points: u32,
    /// Per-room actor queue size.
    pub command_queue_size: usize,
}

impl Default for RoomRules {
    fn default() -> Self {
        let rooms = RoomConfig::default();
        Self {
            min_players: rooms.min_players,
            selection_timeout_secs: rooms.selection_timeout.as_secs(),
            inter_turn_delay_secs: rooms.inter_turn_delay.as_secs(),
            hint_fractions: rooms.hint_fractions,
            max_stroke_bytes: rooms.max_stroke_bytes,
            max_chat_chars: rooms.max_chat_chars,
            max_name_chars: 20,
            base_points: rooms.base_points,
            command_queue_size: rooms.channel_size,
        }
    }
}

impl RoomRules {
    pub fn selection_timeout(&self) -> Duration {
        Duration::from_secs(self.selection_timeout_secs)
    }

    pub fn inter_turn_delay(&self) -> Duration {
        Duration::from_secs(self.inter_turn_delay_secs)
    }

    /// The runtime form handed to the room registry.
    pub fn room_config(&self) -> RoomConfig {
        RoomConfig {
            min_players: self.min_players,
            selection_timeout: self.selection_timeout(),
            inter_turn_delay: self.inter_turn_delay(),
            hint_fractions: self.hint_fractions.clone(),
            max_stroke_bytes: self.max_stroke_bytes,
            max_chat_chars: self.max_chat_chars,
            base_points: self.base_points,
            channel_size: self.command_queue_size,
        }
        .validated()
    }
}

// ---------------------------------------------------------------------------
// Word bank
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct WordBankConfig {
    /// JSON word file; the built-in lists when unset.
    pub file_path: Option<PathBuf>,
    /// Overrides the bank's fallback theme.
    pub default_theme: Option<String>,
}

impl WordBankConfig {
    pub fn load(&self) -> Result<StaticWordBank, ScribbleError> {
        let bank = match &self.file_path {
            Some(path) => StaticWordBank::from_file(path)?,
            None => StaticWordBank::builtin(),
        };
        match &self.default_theme {
            Some(theme) => Ok(bank.with_default_theme(theme)?),
            None => Ok(bank),
        }
    }
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// `tracing` filter directive, used when `RUST_LOG` is unset.
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: "scribble=info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_gives_defaults() {
        let config = EngineConfig::from_toml("").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.rooms.max_name_chars, 20);
        assert_eq!(config.log.filter, "scribble=info");
        assert_eq!(config.rooms.room_config(), RoomConfig::default());
    }

    #[test]
    fn test_partial_document_overrides_only_named_fields() {
        let config = EngineConfig::from_toml(
            r#"
            [rooms]
            selection_timeout_secs = 5
            hint_fractions = [0.5]

            [rate_limits.chat]
            window_secs = 10
            max_events = 3
            "#,
        )
        .unwrap();

        assert_eq!(config.rooms.selection_timeout(), Duration::from_secs(5));
        assert_eq!(config.rooms.inter_turn_delay(), Duration::from_secs(3));
        assert_eq!(config.rooms.room_config().hint_fractions, vec![0.5]);
        assert_eq!(config.rate_limits.chat.max_events, 3);
        assert_eq!(
            config.rate_limits.stroke,
            RateLimitConfig::default().stroke
        );
    }

    #[test]
    fn test_room_config_is_validated() {
        let rules = RoomRules {
            min_players: 0,
            hint_fractions: vec![0.9, 1.5, 0.2],
            command_queue_size: 0,
            ..RoomRules::default()
        };
        let rooms = rules.room_config();
        assert_eq!(rooms.min_players, 2);
        assert_eq!(rooms.hint_fractions, vec![0.2, 0.9]);
        assert_eq!(rooms.channel_size, 1);
    }

    #[test]
    fn test_bad_value_is_config_error() {
        let result = EngineConfig::from_toml("[rooms]\nmin_players = \"many\"");
        assert!(matches!(result, Err(ScribbleError::Config(_))));
    }

    #[test]
    fn test_missing_word_file_is_word_bank_error() {
        let words = WordBankConfig {
            file_path: Some("/definitely/not/here.json".into()),
            default_theme: None,
        };
        assert!(matches!(words.load(), Err(ScribbleError::WordBank(_))));
    }

    #[test]
    fn test_default_theme_override() {
        let words = WordBankConfig {
            file_path: None,
            default_theme: Some("Animals".into()),
        };
        assert_eq!(words.load().unwrap().default_theme(), "animals");
    }
}
