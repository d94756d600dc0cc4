/// Decisions containing any of these end the game immediately.
const VIOLATION_KEYWORDS: &[&str] = &[
    "kill",
    "murder",
    "weapon",
    "bomb",
    "poison",
    "terror",
    "suicide",
    "extort",
    "launder",
    "enslave",
    "traffick",
    "overthrow",
];

const POSITIVE_KEYWORDS: &[&str] = &[
    "charity",
    "kindness",
    "heal",
    "help",
    "teach",
    "festival",
    "community",
    "donate",
    "shelter",
    "harmony",
    "forgive",
    "volunteer",
];

const NEGATIVE_KEYWORDS: &[&str] = &[
    "tithe",
    "punish",
    "forbid",
    "threaten",
    "fear",
    "demand",
    "exile",
    "shun",
    "curse",
    "confiscate",
];

/// Outcome of the keyword screen applied to a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub violation: bool,
    pub positive_hits: i64,
    pub negative_hits: i64,
}

/// Case-insensitive substring screen against the fixed keyword sets.
///
/// The violation set is checked first and short-circuits: once a violation
/// keyword matches, no positive or negative hits are counted. Pure and
/// network-free so it can gate the external scoring call.
pub fn classify(text: &str) -> Classification {
    let lowered = text.to_lowercase();

    if VIOLATION_KEYWORDS
        .iter()
        .any(|keyword| lowered.contains(keyword))
    {
        return Classification {
            violation: true,
            positive_hits: 0,
            negative_hits: 0,
        };
    }

    let positive_hits = POSITIVE_KEYWORDS
        .iter()
        .filter(|keyword| lowered.contains(*keyword))
        .count() as i64;
    let negative_hits = NEGATIVE_KEYWORDS
        .iter()
        .filter(|keyword| lowered.contains(*keyword))
        .count() as i64;

    Classification {
        violation: false,
        positive_hits,
        negative_hits,
    }
}
