//! Word bank for Scribble.
//!
//! Supplies the candidate words a drawer chooses from. The room engine only
//! sees the [`WordBank`] trait, so tests can inject a one-word bank and
//! servers can load their own lists from JSON.
//!
//! # Key types
//!
//! - [`WordBank`]: `pick_words(theme, difficulty, count, rng)`
//! - [`StaticWordBank`]: in-memory lists with a fallback chain
//! - [`WordBankData`]: the JSON file format

mod bank;
mod builtin;
mod error;

pub use bank::{StaticWordBank, TierLists, WordBank, WordBankData};
pub use error::WordBankError;
