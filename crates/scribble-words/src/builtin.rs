//! Built-in word lists, used when no word file is configured.

use crate::{TierLists, WordBankData};

pub(crate) const DEFAULT_THEME: &str = "general";

fn words(list: &[&str]) -> Vec<String> {
    list.iter().map(|w| w.to_string()).collect()
}

pub(crate) fn builtin_data() -> WordBankData {
    let themes = [
        (
            "general",
            TierLists {
                easy: words(&[
                    "apple", "banana", "cat", "dog", "flower", "house", "kite",
                    "lion", "pizza", "robot", "sun", "train", "tree", "zebra",
                    "ball", "boat", "car", "fish", "moon", "star",
                ]),
                medium: words(&[
                    "elephant", "guitar", "island", "jacket", "mountain",
                    "notebook", "ocean", "queen", "sunset", "umbrella",
                    "violin", "waterfall", "airplane", "bicycle", "camera",
                    "diamond", "eagle", "forest", "garden", "helicopter",
                ]),
                hard: words(&[
                    "lighthouse", "skateboard", "telescope", "parachute",
                    "submarine", "microscope", "fire truck", "roller coaster",
                    "hot air balloon", "treasure map", "snow globe",
                    "traffic light",
                ]),
            },
        ),
        (
            "animals",
            TierLists {
                easy: words(&[
                    "cat", "dog", "fish", "bird", "duck", "pig", "cow", "frog",
                    "bee", "snake",
                ]),
                medium: words(&[
                    "elephant", "giraffe", "penguin", "dolphin", "butterfly",
                    "panda", "koala", "whale", "tiger", "octopus",
                ]),
                hard: words(&[
                    "kangaroo", "crocodile", "peacock", "flamingo", "leopard",
                    "hedgehog", "chameleon", "sea turtle",
                ]),
            },
        ),
        (
            "food",
            TierLists {
                easy: words(&[
                    "pizza", "burger", "cake", "egg", "bread", "apple",
                    "cookie", "soup", "salad", "banana",
                ]),
                medium: words(&[
                    "sushi", "pasta", "taco", "donut", "cupcake", "sandwich",
                    "pancake", "waffle", "steak", "ice cream",
                ]),
                hard: words(&[
                    "spaghetti", "croissant", "burrito", "lasagna", "dumpling",
                    "fortune cookie", "corn dog",
                ]),
            },
        ),
        (
            "objects",
            TierLists {
                easy: words(&[
                    "lamp", "chair", "table", "bottle", "phone", "clock", "cup",
                    "key", "book", "hat",
                ]),
                medium: words(&[
                    "computer", "mirror", "scissors", "pencil", "umbrella",
                    "backpack", "helmet", "guitar", "piano", "ladder",
                ]),
                hard: words(&[
                    "hourglass", "typewriter", "chandelier", "wheelbarrow",
                    "paper clip", "sewing machine",
                ]),
            },
        ),
        (
            "nature",
            TierLists {
                easy: words(&[
                    "river", "cloud", "snow", "beach", "rain", "leaf", "rock",
                    "sun", "tree", "grass",
                ]),
                medium: words(&[
                    "mountain", "ocean", "forest", "desert", "volcano",
                    "waterfall", "rainbow", "sunrise", "sunset", "island",
                ]),
                hard: words(&[
                    "lightning", "avalanche", "glacier", "tornado", "canyon",
                    "coral reef", "northern lights",
                ]),
            },
        ),
    ];

    WordBankData {
        default_theme: DEFAULT_THEME.to_string(),
        themes: themes
            .into_iter()
            .map(|(name, tiers)| (name.to_string(), tiers))
            .collect(),
    }
}
