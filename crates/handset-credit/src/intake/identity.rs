//! National ID number validation.
//!
//! A valid number is 13 ASCII digits whose first six encode the holder's birth date as
//! `YYMMDD` and whose digits pass a Luhn-style checksum.

use chrono::NaiveDate;
use serde::Serialize;

pub const ID_NUMBER_LENGTH: usize = 13;

/// Outcome of validating an ID number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IdentityCheck {
    pub valid: bool,
    pub date_of_birth: Option<NaiveDate>,
}

impl IdentityCheck {
    const INVALID: Self = Self {
        valid: false,
        date_of_birth: None,
    };
}

/// Validate `raw` against the ID number rules, resolving the two-digit birth year relative to
/// `current_year`.
pub fn validate_id_number(raw: &str, current_year: i32) -> IdentityCheck {
    let Some(digits) = parse_digits(raw) else {
        return IdentityCheck::INVALID;
    };

    let Some(date_of_birth) = embedded_birth_date(&digits, current_year) else {
        return IdentityCheck::INVALID;
    };

    if !luhn_checksum(&digits) {
        return IdentityCheck::INVALID;
    }

    IdentityCheck {
        valid: true,
        date_of_birth: Some(date_of_birth),
    }
}

/// `true` when `raw` is exactly 13 ASCII digits, regardless of checksum.
pub fn is_well_formed(raw: &str) -> bool {
    parse_digits(raw).is_some()
}

fn parse_digits(raw: &str) -> Option<[u32; ID_NUMBER_LENGTH]> {
    if raw.len() != ID_NUMBER_LENGTH {
        return None;
    }

    let mut digits = [0u32; ID_NUMBER_LENGTH];
    for (slot, ch) in digits.iter_mut().zip(raw.chars()) {
        *slot = ch.to_digit(10)?;
    }
    Some(digits)
}

fn embedded_birth_date(digits: &[u32; ID_NUMBER_LENGTH], current_year: i32) -> Option<NaiveDate> {
    let yy = digits[0] * 10 + digits[1];
    let mm = digits[2] * 10 + digits[3];
    let dd = digits[4] * 10 + digits[5];

    let year = century_for(yy, current_year) + yy as i32;
    NaiveDate::from_ymd_opt(year, mm, dd)
}

/// Century for a two-digit birth year: years after the current two-digit year belong to the
/// 1900s, everything else to the 2000s.
///
/// The window slides with `current_year`, so a holder born exactly 100 years before the
/// current year is read as a newborn. Callers that care about centenarians cannot tell them
/// apart from the ID number alone.
pub fn century_for(yy: u32, current_year: i32) -> i32 {
    let current_two_digit = current_year.rem_euclid(100) as u32;
    if yy > current_two_digit {
        1900
    } else {
        2000
    }
}

/// Luhn variant over 0-based positions: even positions add directly, odd positions are
/// doubled and their decimal digits summed.
pub fn luhn_checksum(digits: &[u32]) -> bool {
    let total: u32 = digits
        .iter()
        .enumerate()
        .map(|(index, &digit)| {
            if index % 2 == 0 {
                digit
            } else {
                let doubled = digit * 2;
                doubled / 10 + doubled % 10
            }
        })
        .sum();

    total % 10 == 0
}
