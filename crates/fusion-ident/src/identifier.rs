//! Parsed artifact identifiers
//!
//! An identifier is a numeric group key (`1.59`, `25`) followed by a variant
//! suffix of zero to two lowercase letters (`""`, `a`, `ab`).

use crate::error::{DomainError, ParseError};
use crate::numeral;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Maximum variant depth
pub const MAX_SUFFIX_LEN: usize = 2;

static GROUP_KEY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([0-9]+(?:\.[0-9]+)?)(.*)$").unwrap_or_else(|e| panic!("group key regex: {e}"))
});

/// Artifact identifier split into group key and variant suffix
///
/// Siblings share a group key; the suffix, read as a bijective base-26
/// numeral, is the variant's rank within the group.
///
/// # Examples
/// - `1.59` → group `1.59`, suffix `""`, rank 0
/// - `1.59b` → group `1.59`, suffix `b`, rank 2
/// - `25az` → group `25`, suffix `az`, rank 52
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FusionId {
    raw: String,
    group_len: usize,
    rank: u32,
}

impl FusionId {
    /// Build identifier from a group key and a rank
    ///
    /// # Errors
    /// Returns a [`ParseError`] if the assembled identifier is not valid.
    pub fn from_parts(group_key: &str, rank: u32) -> Result<Self, ParseError> {
        format!("{group_key}{}", numeral::encode(rank)).parse()
    }

    /// Full identifier text
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Numeric prefix shared by all siblings
    #[inline]
    #[must_use]
    pub fn group_key(&self) -> &str {
        &self.raw[..self.group_len]
    }

    /// Trailing variant letters (empty for the base artifact)
    #[inline]
    #[must_use]
    pub fn suffix(&self) -> &str {
        &self.raw[self.group_len..]
    }

    /// Decoded variant rank
    #[inline]
    #[must_use]
    pub fn rank(&self) -> u32 {
        self.rank
    }

    /// Whether this is the base (rank 0) artifact of its group
    #[inline]
    #[must_use]
    pub fn is_base(&self) -> bool {
        self.rank == 0
    }

    /// Whether the group key has no decimal point
    #[inline]
    #[must_use]
    pub fn is_base_sprite(&self) -> bool {
        !self.group_key().contains('.')
    }

    /// Whether both identifiers belong to the same sibling group
    #[inline]
    #[must_use]
    pub fn is_sibling_of(&self, other: &Self) -> bool {
        self.group_key() == other.group_key()
    }

    /// Identifier one rank lower in the same group
    ///
    /// # Errors
    /// Returns [`DomainError::BelowBase`] for a rank 0 identifier.
    pub fn bump_down(&self) -> Result<Self, DomainError> {
        let rank = self
            .rank
            .checked_sub(1)
            .ok_or_else(|| DomainError::BelowBase(self.raw.clone()))?;
        let suffix = numeral::encode(rank);
        Ok(Self {
            raw: format!("{}{suffix}", self.group_key()),
            group_len: self.group_len,
            rank,
        })
    }
}

impl FromStr for FusionId {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let caps = GROUP_KEY
            .captures(s)
            .ok_or_else(|| ParseError::MissingGroupKey(s.to_string()))?;
        let group_len = caps.get(1).map_or(0, |m| m.end());
        let rest = &s[group_len..];

        if !rest.chars().all(|c| c.is_ascii_lowercase()) {
            return Err(ParseError::Malformed {
                identifier: s.to_string(),
                rest: rest.to_string(),
            });
        }
        if rest.len() > MAX_SUFFIX_LEN {
            return Err(ParseError::SuffixTooLong {
                identifier: s.to_string(),
                len: rest.len(),
            });
        }

        // at most two lowercase letters, always decodable
        let rank = numeral::decode(rest).map_err(|_| ParseError::Malformed {
            identifier: s.to_string(),
            rest: rest.to_string(),
        })?;

        Ok(Self {
            raw: s.to_string(),
            group_len,
            rank,
        })
    }
}

impl TryFrom<String> for FusionId {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<FusionId> for String {
    fn from(id: FusionId) -> Self {
        id.raw
    }
}

impl Display for FusionId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl AsRef<str> for FusionId {
    fn as_ref(&self) -> &str {
        &self.raw
    }
}

impl PartialOrd for FusionId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FusionId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.group_key()
            .cmp(other.group_key())
            .then(self.rank.cmp(&other.rank))
            .then_with(|| self.raw.cmp(&other.raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> FusionId {
        s.parse().unwrap()
    }

    #[test]
    fn parses_group_key_and_suffix() {
        let fusion = id("1.59ab");
        assert_eq!(fusion.group_key(), "1.59");
        assert_eq!(fusion.suffix(), "ab");
        assert_eq!(fusion.rank(), 28);
        assert!(!fusion.is_base_sprite());
    }

    #[test]
    fn parses_base_sprite() {
        let fusion = id("25");
        assert_eq!(fusion.group_key(), "25");
        assert_eq!(fusion.suffix(), "");
        assert!(fusion.is_base());
        assert!(fusion.is_base_sprite());
    }

    #[test]
    fn rejects_missing_group_key() {
        assert_eq!(
            "abc".parse::<FusionId>(),
            Err(ParseError::MissingGroupKey("abc".to_string()))
        );
        assert!(matches!(
            "".parse::<FusionId>(),
            Err(ParseError::MissingGroupKey(_))
        ));
    }

    #[test]
    fn rejects_three_letter_suffix() {
        assert_eq!(
            "1.59abc".parse::<FusionId>(),
            Err(ParseError::SuffixTooLong {
                identifier: "1.59abc".to_string(),
                len: 3
            })
        );
    }

    #[test]
    fn rejects_trailing_garbage() {
        assert!(matches!(
            "1.59b_temp".parse::<FusionId>(),
            Err(ParseError::Malformed { .. })
        ));
        assert!(matches!(
            "1.59.2".parse::<FusionId>(),
            Err(ParseError::Malformed { .. })
        ));
    }

    #[test]
    fn bump_down_decrements_suffix() {
        assert_eq!(id("1.59c").bump_down().unwrap().as_str(), "1.59b");
        assert_eq!(id("1.59a").bump_down().unwrap().as_str(), "1.59");
        assert_eq!(id("1.59aa").bump_down().unwrap().as_str(), "1.59z");
        assert_eq!(id("1.59ba").bump_down().unwrap().as_str(), "1.59az");
    }

    #[test]
    fn bump_down_below_base_fails() {
        assert_eq!(
            id("1.59").bump_down(),
            Err(DomainError::BelowBase("1.59".to_string()))
        );
    }

    #[test]
    fn bumped_identifier_matches_reparse() {
        let bumped = id("7.12ba").bump_down().unwrap();
        assert_eq!(bumped, id("7.12az"));
    }

    #[test]
    fn siblings_share_group_key() {
        assert!(id("1.59").is_sibling_of(&id("1.59zz")));
        assert!(!id("1.59").is_sibling_of(&id("1.590")));
        assert!(!id("1.5").is_sibling_of(&id("1.59")));
    }

    #[test]
    fn ordering_follows_rank_not_text() {
        let mut ids = vec![id("1.59aa"), id("1.59z"), id("1.59"), id("1.59b")];
        ids.sort();
        let text: Vec<_> = ids.iter().map(FusionId::as_str).collect();
        assert_eq!(text, vec!["1.59", "1.59b", "1.59z", "1.59aa"]);
    }

    #[test]
    fn from_parts_builds_identifier() {
        assert_eq!(FusionId::from_parts("3.4", 27).unwrap().as_str(), "3.4aa");
        assert_eq!(FusionId::from_parts("3.4", 0).unwrap().as_str(), "3.4");
    }

    #[test]
    fn string_conversions() {
        let fusion = id("1.59a");
        assert_eq!(fusion.to_string(), "1.59a");
        assert_eq!(String::from(fusion.clone()), "1.59a");
        assert_eq!(FusionId::try_from("1.59a".to_string()).unwrap(), fusion);
    }
}
