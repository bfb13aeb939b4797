//! Field rules shared by the account forms.

use crate::domain::models::{FIELD_MAX_LENGTH, REGISTRATION_NUMBER_LENGTH};

/// Keeps only the digits of `input`, or `None` when that is longer than a
/// registration number.
pub(crate) fn filter_registration_number(input: &str) -> Option<String> {
    let digits: String = input.chars().filter(char::is_ascii_digit).collect();
    (digits.chars().count() <= REGISTRATION_NUMBER_LENGTH).then_some(digits)
}

pub(crate) fn fits_field(input: &str) -> bool {
    input.chars().count() <= FIELD_MAX_LENGTH
}

pub(crate) fn is_complete_registration_number(registration_number: &str) -> bool {
    registration_number.chars().count() == REGISTRATION_NUMBER_LENGTH
}

pub(crate) fn empty_to_none(input: &str) -> Option<String> {
    (!input.is_empty()).then(|| input.to_string())
}
