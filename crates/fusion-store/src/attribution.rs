//! Attribution strings
//!
//! A ledger attribution names one or more contributors joined by `&`, e.g.
//! `"Alice & Game Freak"`. Some contributors are organisations credited for
//! referencing official art; they never make an artifact a collaboration.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Separator between contributors
pub const CONJUNCTION: char = '&';

/// Non-human contributors, normalized
pub const ORGANISATIONAL_CONTRIBUTORS: &[&str] = &["game freak", "pokemon tcg"];

/// How an attribution relates to one user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Authorship {
    /// Only the user, possibly alongside organisational contributors
    Sole,
    /// The user and at least one other person
    Collab,
    /// The user's name appears but not as a separated contributor
    Ambiguous,
    /// The user is not named
    Unrelated,
}

/// Strip accents, lowercase and trim
#[must_use]
pub fn normalize(name: &str) -> String {
    name.nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
        .trim()
        .to_string()
}

/// Classify an attribution string for `user`
#[must_use]
pub fn classify(attribution: &str, user: &str) -> Authorship {
    let user = normalize(user);
    let whole = normalize(attribution);
    if user.is_empty() || !whole.contains(&user) {
        return Authorship::Unrelated;
    }

    let contributors: Vec<String> = whole
        .split(CONJUNCTION)
        .map(|part| part.trim().to_string())
        .filter(|part| !part.is_empty())
        .collect();

    if !contributors.iter().any(|c| *c == user) {
        return Authorship::Ambiguous;
    }

    let humans_besides_user = contributors
        .iter()
        .filter(|c| **c != user)
        .filter(|c| !ORGANISATIONAL_CONTRIBUTORS.contains(&c.as_str()))
        .count();

    if humans_besides_user == 0 {
        Authorship::Sole
    } else {
        Authorship::Collab
    }
}
