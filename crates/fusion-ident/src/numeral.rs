//! Bijective base-26 numerals
//!
//! Variant suffixes are numerals without a zero digit: `a` = 1 … `z` = 26,
//! `aa` = 27. The empty string is rank 0 (the base artifact).

use crate::error::NumeralError;

const RADIX: u32 = 26;

/// Rank of `"zz"`, the deepest two-letter variant
pub const MAX_TWO_LETTER_RANK: u32 = 702;

/// Decode a lowercase letter sequence into its rank
///
/// # Errors
/// Returns [`NumeralError::InvalidDigit`] for characters outside `a..=z` and
/// [`NumeralError::Overflow`] if the rank does not fit in `u32`.
pub fn decode(letters: &str) -> Result<u32, NumeralError> {
    letters.chars().try_fold(0u32, |acc, c| {
        let digit = digit_value(c).ok_or_else(|| NumeralError::InvalidDigit {
            letters: letters.to_string(),
            digit: c,
        })?;
        acc.checked_mul(RADIX)
            .and_then(|v| v.checked_add(digit))
            .ok_or_else(|| NumeralError::Overflow(letters.to_string()))
    })
}

/// Encode a rank as a lowercase letter sequence
///
/// Rank 0 encodes to the empty string. A zero remainder has no digit of its
/// own, so it becomes `z` and borrows one from the next place.
#[must_use]
pub fn encode(rank: u32) -> String {
    let mut rest = rank;
    let mut digits = Vec::new();
    while rest > 0 {
        let mut low = rest % RADIX;
        rest /= RADIX;
        if low == 0 {
            low = RADIX;
            rest -= 1;
        }
        digits.push(letter(low));
    }
    digits.iter().rev().collect()
}

fn digit_value(c: char) -> Option<u32> {
    c.is_ascii_lowercase().then(|| u32::from(c) - u32::from('a') + 1)
}

fn letter(digit: u32) -> char {
    // digit is always in 1..=26 here
    char::from_u32(u32::from('a') + digit - 1).unwrap_or('z')
}
