//! Free-text handling: sanitizing player input and matching guesses.

/// Strips `<` and `>`, trims, and keeps at most `max_chars` characters.
///
/// Used for chat/guess text and display names.
pub fn sanitize(raw: &str, max_chars: usize) -> String {
    let stripped: String =
        raw.chars().filter(|c| !matches!(c, '<' | '>')).collect();
    let capped: String = stripped.trim().chars().take(max_chars).collect();
    capped.trim_end().to_string()
}

/// Case-insensitive, whitespace-trimmed exact match.
pub fn is_correct_guess(guess: &str, word: &str) -> bool {
    let guess = guess.trim();
    let word = word.trim();
    !guess.is_empty() && guess.to_lowercase() == word.to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_strips_angle_brackets_and_trims() {
        assert_eq!(sanitize("  <b>hello</b>  ", 100), "bhello/b");
        assert_eq!(sanitize("<<>>", 100), "");
    }

    #[test]
    fn test_sanitize_caps_length_in_chars() {
        let long = "é".repeat(150);
        assert_eq!(sanitize(&long, 100).chars().count(), 100);
        assert_eq!(sanitize("ab cd", 3), "ab");
    }

    #[test]
    fn test_is_correct_guess_ignores_case_and_outer_whitespace() {
        assert!(is_correct_guess("  CaT ", "cat"));
        assert!(is_correct_guess("fire truck", "Fire Truck"));
        assert!(!is_correct_guess("cats", "cat"));
        assert!(!is_correct_guess("firetruck", "fire truck"));
        assert!(!is_correct_guess("", " "));
    }
}
