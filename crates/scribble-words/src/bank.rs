//! The `WordBank` trait and its in-memory implementation.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use rand::RngCore;
use rand::seq::IndexedRandom;
use scribble_protocol::Difficulty;
use serde::{Deserialize, Serialize};

use crate::WordBankError;
use crate::builtin::{DEFAULT_THEME, builtin_data};

/// Supplies candidate words for a drawer.
///
/// Implementations must return distinct words (no duplicates within one
/// call) and must never block. Randomness comes from the caller so a
/// seeded generator makes the offer reproducible.
pub trait WordBank: Send + Sync + 'static {
    /// Samples up to `count` distinct words without replacement.
    ///
    /// Falls back to a default theme/difficulty when the requested one
    /// isn't configured. Returns fewer than `count` words only if the
    /// chosen list is shorter than that.
    fn pick_words(
        &self,
        theme: &str,
        difficulty: Difficulty,
        count: usize,
        rng: &mut dyn RngCore,
    ) -> Vec<String>;
}

// ---------------------------------------------------------------------------
// File format
// ---------------------------------------------------------------------------

/// Words for one theme, split by difficulty.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TierLists {
    pub easy: Vec<String>,
    pub medium: Vec<String>,
    pub hard: Vec<String>,
}

impl TierLists {
    fn tier(&self, difficulty: Difficulty) -> &[String] {
        match difficulty {
            Difficulty::Easy => &self.easy,
            Difficulty::Medium => &self.medium,
            Difficulty::Hard => &self.hard,
        }
    }

    fn tier_mut(&mut self, difficulty: Difficulty) -> &mut Vec<String> {
        match difficulty {
            Difficulty::Easy => &mut self.easy,
            Difficulty::Medium => &mut self.medium,
            Difficulty::Hard => &mut self.hard,
        }
    }
}

/// On-disk word file:
///
/// ```json
/// { "defaultTheme": "general",
///   "themes": { "general": { "easy": ["cat"], "medium": [], "hard": [] } } }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordBankData {
    #[serde(default = "default_theme_name")]
    pub default_theme: String,
    pub themes: HashMap<String, TierLists>,
}

fn default_theme_name() -> String {
    DEFAULT_THEME.to_string()
}

// ---------------------------------------------------------------------------
// StaticWordBank
// ---------------------------------------------------------------------------

const TIERS: [Difficulty; 3] =
    [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

/// Word lists held in memory.
///
/// Lookup order for `(theme, difficulty)`:
/// 1. the requested theme at the requested difficulty
/// 2. the default theme at the requested difficulty
/// 3. the default theme at the first non-empty difficulty
///
/// Words are trimmed, lower-cased and de-duplicated per list when the
/// bank is built, so sampling distinct indices yields distinct words.
#[derive(Debug, Clone)]
pub struct StaticWordBank {
    default_theme: String,
    themes: HashMap<String, TierLists>,
}

impl StaticWordBank {
    /// The built-in English lists (themes: general, animals, food,
    /// objects, nature).
    pub fn builtin() -> Self {
        Self::normalized(builtin_data())
    }

    /// Builds a bank from parsed data, normalizing every list.
    ///
    /// Fails when the default theme has no words at any difficulty.
    pub fn from_data(data: WordBankData) -> Result<Self, WordBankError> {
        let bank = Self::normalized(data);
        if !bank.has_words(&bank.default_theme) {
            return Err(WordBankError::Empty(bank.default_theme));
        }

        tracing::debug!(
            themes = bank.themes.len(),
            default_theme = %bank.default_theme,
            "word bank loaded"
        );
        Ok(bank)
    }

    fn normalized(data: WordBankData) -> Self {
        let default_theme = normalize_key(&data.default_theme);
        let mut themes = HashMap::with_capacity(data.themes.len());

        for (name, raw) in data.themes {
            let mut lists = TierLists::default();
            for difficulty in TIERS {
                *lists.tier_mut(difficulty) =
                    normalize_list(raw.tier(difficulty));
            }
            themes.insert(normalize_key(&name), lists);
        }

        Self {
            default_theme,
            themes,
        }
    }

    fn has_words(&self, theme: &str) -> bool {
        self.themes
            .get(theme)
            .is_some_and(|lists| TIERS.iter().any(|d| !lists.tier(*d).is_empty()))
    }

    /// Parses a JSON word file (see [`WordBankData`]).
    pub fn from_json(json: &str) -> Result<Self, WordBankError> {
        let data: WordBankData = serde_json::from_str(json)?;
        Self::from_data(data)
    }

    /// Reads and parses a JSON word file from disk.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, WordBankError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| {
            WordBankError::Io {
                path: path.to_path_buf(),
                source,
            }
        })?;
        Self::from_json(&content)
    }

    /// Configured theme names, sorted.
    pub fn themes(&self) -> Vec<&str> {
        let mut names: Vec<&str> =
            self.themes.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// The theme used when a requested one is unknown.
    pub fn default_theme(&self) -> &str {
        &self.default_theme
    }

    /// Switches the fallback theme. It must exist and hold some words.
    pub fn with_default_theme(mut self, theme: &str) -> Result<Self, WordBankError> {
        let theme = normalize_key(theme);
        if !self.has_words(&theme) {
            return Err(WordBankError::Empty(theme));
        }
        self.default_theme = theme;
        Ok(self)
    }

    /// Resolves the list to sample from, applying the fallback chain.
    fn list(&self, theme: &str, difficulty: Difficulty) -> &[String] {
        let requested = self
            .themes
            .get(&normalize_key(theme))
            .map(|lists| lists.tier(difficulty))
            .filter(|list| !list.is_empty());
        if let Some(list) = requested {
            return list;
        }

        let Some(fallback) = self.themes.get(&self.default_theme) else {
            return &[];
        };
        if !fallback.tier(difficulty).is_empty() {
            return fallback.tier(difficulty);
        }
        TIERS
            .iter()
            .map(|d| fallback.tier(*d))
            .find(|list| !list.is_empty())
            .unwrap_or(&[])
    }
}

impl Default for StaticWordBank {
    fn default() -> Self {
        Self::builtin()
    }
}

impl WordBank for StaticWordBank {
    fn pick_words(
        &self,
        theme: &str,
        difficulty: Difficulty,
        count: usize,
        rng: &mut dyn RngCore,
    ) -> Vec<String> {
        self.list(theme, difficulty)
            .choose_multiple(rng, count)
            .cloned()
            .collect()
    }
}

fn normalize_key(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Trims, lower-cases, drops blanks and duplicates; keeps first-seen order.
fn normalize_list(raw: &[String]) -> Vec<String> {
    let mut seen = HashSet::with_capacity(raw.len());
    raw.iter()
        .map(|w| w.trim().to_lowercase())
        .filter(|w| !w.is_empty())
        .filter(|w| seen.insert(w.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    fn tiny_bank() -> StaticWordBank {
        StaticWordBank::from_json(
            r#"{
                "defaultTheme": "General",
                "themes": {
                    "general": { "easy": ["Cat", "dog", " cat ", ""], "hard": ["zeppelin"] },
                    "space": { "medium": ["rocket", "comet", "moon"] }
                }
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_pick_words_returns_distinct_words() {
        let bank = StaticWordBank::builtin();
        let mut rng = rng();

        for _ in 0..50 {
            let words = bank.pick_words("general", Difficulty::Easy, 3, &mut rng);
            assert_eq!(words.len(), 3);
            let unique: HashSet<_> = words.iter().collect();
            assert_eq!(unique.len(), 3, "duplicates in {words:?}");
        }
    }

    #[test]
    fn test_pick_words_is_deterministic_for_a_seed() {
        let bank = StaticWordBank::builtin();
        let a = bank.pick_words("animals", Difficulty::Medium, 3, &mut rng());
        let b = bank.pick_words("animals", Difficulty::Medium, 3, &mut rng());
        assert_eq!(a, b);
    }

    #[test]
    fn test_load_normalizes_and_dedupes() {
        let bank = tiny_bank();
        let words = bank.pick_words("general", Difficulty::Easy, 10, &mut rng());

        let mut sorted = words.clone();
        sorted.sort();
        assert_eq!(sorted, vec!["cat".to_string(), "dog".to_string()]);
    }

    #[test]
    fn test_unknown_theme_falls_back_to_default_theme() {
        let bank = tiny_bank();
        let words = bank.pick_words("pirates", Difficulty::Hard, 3, &mut rng());
        assert_eq!(words, vec!["zeppelin".to_string()]);
    }

    #[test]
    fn test_empty_tier_falls_back_to_default_theme_then_any_tier() {
        let bank = tiny_bank();

        // "space" has no easy words → general/easy.
        let words = bank.pick_words("space", Difficulty::Easy, 5, &mut rng());
        assert!(words.iter().all(|w| w == "cat" || w == "dog"));

        // general has no medium words → general's first non-empty tier.
        let words = bank.pick_words("pirates", Difficulty::Medium, 5, &mut rng());
        assert!(words.iter().all(|w| w == "cat" || w == "dog"));
        assert!(!words.is_empty());
    }

    #[test]
    fn test_theme_lookup_is_case_insensitive() {
        let bank = tiny_bank();
        let words = bank.pick_words(" SPACE ", Difficulty::Medium, 3, &mut rng());
        assert_eq!(words.len(), 3);
        assert!(words.iter().all(|w| ["rocket", "comet", "moon"].contains(&w.as_str())));
    }

    #[test]
    fn test_missing_default_theme_is_rejected() {
        let result = StaticWordBank::from_json(
            r#"{ "defaultTheme": "general", "themes": { "space": { "easy": ["moon"] } } }"#,
        );
        assert!(matches!(result, Err(WordBankError::Empty(t)) if t == "general"));
    }

    #[test]
    fn test_from_file_missing_path_is_io_error() {
        let result = StaticWordBank::from_file("/definitely/not/here.json");
        assert!(matches!(result, Err(WordBankError::Io { .. })));
    }

    #[test]
    fn test_with_default_theme_switches_fallback() {
        let bank = tiny_bank().with_default_theme(" SPACE ").unwrap();
        assert_eq!(bank.default_theme(), "space");

        let words = bank.pick_words("unknown", Difficulty::Medium, 3, &mut rng());
        assert_eq!(words.len(), 3);

        assert!(matches!(
            tiny_bank().with_default_theme("ocean"),
            Err(WordBankError::Empty(theme)) if theme == "ocean"
        ));
    }

    #[test]
    fn test_builtin_themes() {
        let bank = StaticWordBank::builtin();
        assert_eq!(
            bank.themes(),
            vec!["animals", "food", "general", "nature", "objects"]
        );
        assert_eq!(bank.default_theme(), "general");
    }

    #[test]
    fn test_builtin_data_passes_validation() {
        let validated = StaticWordBank::from_data(builtin_data()).unwrap();
        assert_eq!(validated.default_theme(), "general");
        for theme in validated.themes() {
            assert!(validated.has_words(theme), "{theme} has no words");
        }
    }
}
