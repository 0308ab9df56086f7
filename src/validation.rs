// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2025 Daniel Negri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Field checks for raw user input.
//!
//! Each parser takes the text as typed and returns the value the
//! repositories expect, so they can be plugged straight into `clap` as
//! `value_parser`s.

use crate::error::ValidationError;
use rust_decimal::Decimal;
use std::str::FromStr;

pub const NATIONAL_ID_DIGITS: usize = 13;
pub const CONTACT_NUMBER_DIGITS: usize = 11;
pub const DATE_OF_BIRTH_MIN_LEN: usize = 8;
pub const DATE_OF_BIRTH_MAX_LEN: usize = 11;
pub const MIN_BIRTH_YEAR: u32 = 1900;
pub const MAX_BIRTH_YEAR: u32 = 2100;

/// Non-empty text of ASCII letters and spaces.
pub fn parse_alphabetic(field: &'static str, input: &str) -> Result<String, ValidationError> {
    let value = input.trim();
    if value.is_empty() {
        return Err(ValidationError::Empty { field });
    }
    if !value.chars().all(|c| c.is_ascii_alphabetic() || c == ' ') {
        return Err(ValidationError::NotAlphabetic { field });
    }
    Ok(value.to_owned())
}

pub fn parse_name(input: &str) -> Result<String, ValidationError> {
    parse_alphabetic("name", input)
}

pub fn parse_purpose(input: &str) -> Result<String, ValidationError> {
    parse_alphabetic("purpose", input)
}

/// Free text that must not be blank.
pub fn parse_required(field: &'static str, input: &str) -> Result<String, ValidationError> {
    let value = input.trim();
    if value.is_empty() {
        return Err(ValidationError::Empty { field });
    }
    Ok(value.to_owned())
}

pub fn parse_address(input: &str) -> Result<String, ValidationError> {
    parse_required("address", input)
}

fn parse_digits(field: &'static str, len: usize, input: &str) -> Result<String, ValidationError> {
    let value = input.trim();
    if value.len() != len || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ValidationError::DigitCount { field, len });
    }
    Ok(value.to_owned())
}

/// Exactly [`NATIONAL_ID_DIGITS`] digits, no dashes.
pub fn parse_national_id(input: &str) -> Result<String, ValidationError> {
    parse_digits("national ID", NATIONAL_ID_DIGITS, input)
}

/// Exactly [`CONTACT_NUMBER_DIGITS`] digits, no spaces.
pub fn parse_contact_number(input: &str) -> Result<String, ValidationError> {
    parse_digits("contact number", CONTACT_NUMBER_DIGITS, input)
}

/// `dd mm yyyy` or `ddmmyyyy`.
///
/// Only digits and spaces are accepted. The spaced form is range-checked
/// field by field; the compact form is accepted as typed.
pub fn parse_date_of_birth(input: &str) -> Result<String, ValidationError> {
    let value = input.trim();
    let format_error = ValidationError::DateFormat {
        min: DATE_OF_BIRTH_MIN_LEN,
        max: DATE_OF_BIRTH_MAX_LEN,
    };
    if !(DATE_OF_BIRTH_MIN_LEN..=DATE_OF_BIRTH_MAX_LEN).contains(&value.len())
        || !value.bytes().all(|b| b.is_ascii_digit() || b == b' ')
    {
        return Err(format_error);
    }

    if value.contains(' ') {
        let parts: Vec<u32> = value
            .split_whitespace()
            .map(u32::from_str)
            .collect::<Result<_, _>>()
            .map_err(|_| ValidationError::DateOutOfRange)?;
        let &[day, month, year] = parts.as_slice() else {
            return Err(ValidationError::DateOutOfRange);
        };
        if !(1..=31).contains(&day)
            || !(1..=12).contains(&month)
            || !(MIN_BIRTH_YEAR..=MAX_BIRTH_YEAR).contains(&year)
        {
            return Err(ValidationError::DateOutOfRange);
        }
    }
    Ok(value.to_owned())
}

/// Non-negative decimal amount.
pub fn parse_amount(input: &str) -> Result<Decimal, ValidationError> {
    match Decimal::from_str(input.trim()) {
        Ok(amount) if amount >= Decimal::ZERO => Ok(amount),
        _ => Err(ValidationError::Amount(input.to_owned())),
    }
}
