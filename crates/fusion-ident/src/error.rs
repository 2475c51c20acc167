//! Error types for identifier handling
//!
//! - Numeral errors (invalid suffix digits)
//! - Parse errors (malformed identifiers)
//! - Domain errors (rank arithmetic leaving the valid range)
//! - Cascade errors (sibling groups violating rank uniqueness)

/// Invalid input to the base-26 codec
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NumeralError {
    /// Character outside `a..=z`
    #[error("invalid numeral digit {digit:?} in {letters:?}")]
    InvalidDigit { letters: String, digit: char },

    /// Rank does not fit in `u32`
    #[error("numeral {0:?} overflows the rank range")]
    Overflow(String),
}

/// Malformed artifact identifier
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// Identifier does not start with a numeric group key
    #[error("identifier {0:?} has no group key")]
    MissingGroupKey(String),

    /// Variant suffix deeper than two letters
    #[error("identifier {identifier:?} has a {len}-letter suffix (max 2)")]
    SuffixTooLong { identifier: String, len: usize },

    /// Characters after the group key that are not a lowercase suffix
    #[error("identifier {identifier:?} has unexpected trailing text {rest:?}")]
    Malformed { identifier: String, rest: String },
}

/// Rank arithmetic outside the representable range
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    /// Tried to decrement a base (rank 0) identifier
    #[error("cannot bump below base: {0}")]
    BelowBase(String),
}

/// Sibling group violates the contiguous unique rank invariant
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CascadeError {
    /// Two members of one group hold the same rank
    #[error("duplicate rank {rank} in group {group}: {first} and {second}")]
    DuplicateRank {
        group: String,
        rank: u32,
        first: String,
        second: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_error_display() {
        let err = DomainError::BelowBase("1.59".to_string());
        assert_eq!(err.to_string(), "cannot bump below base: 1.59");
    }

    #[test]
    fn suffix_error_display() {
        let err = ParseError::SuffixTooLong {
            identifier: "1.59abc".to_string(),
            len: 3,
        };
        assert!(err.to_string().contains("3-letter suffix"));
    }
}
