//! Masked-word hints.
//!
//! Positions are character indices into the word. Whitespace separates
//! the words of a multi-word answer: it is always shown and is never a
//! candidate for a reveal.

use std::collections::BTreeSet;

use rand::Rng;

/// Renders `word` with unrevealed letters replaced by `_`.
pub fn mask(word: &str, revealed: &BTreeSet<usize>) -> String {
    word.chars()
        .enumerate()
        .map(|(i, c)| {
            if c.is_whitespace() || revealed.contains(&i) {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Character positions that can still be revealed.
pub fn hidden_positions(word: &str, revealed: &BTreeSet<usize>) -> Vec<usize> {
    word.chars()
        .enumerate()
        .filter(|(i, c)| !c.is_whitespace() && !revealed.contains(i))
        .map(|(i, _)| i)
        .collect()
}

/// Reveals one hidden position chosen uniformly at random.
///
/// Returns the position, or `None` when nothing is left to reveal.
pub fn reveal_one<R: Rng + ?Sized>(
    word: &str,
    revealed: &mut BTreeSet<usize>,
    rng: &mut R,
) -> Option<usize> {
    let hidden = hidden_positions(word, revealed);
    if hidden.is_empty() {
        return None;
    }
    let pos = hidden[rng.random_range(0..hidden.len())];
    revealed.insert(pos);
    Some(pos)
}
