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

//! Error types for record encoding, file storage and the bank operations.

use crate::base::CustomerNumber;
use crate::customer::Customer;
use rust_decimal::Decimal;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while encoding or decoding a fixed-size record.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Text does not fit in its fixed field
    #[error("text of {len} bytes exceeds field capacity of {capacity}")]
    TextTooLong { len: usize, capacity: usize },

    /// NUL is the padding byte and cannot appear inside text
    #[error("text contains a NUL byte")]
    TextContainsNul,

    /// Stored text field is not valid UTF-8
    #[error("text field is not valid UTF-8")]
    InvalidUtf8,

    /// Stored loan status byte is not a known status
    #[error("unknown loan status byte {0}")]
    UnknownStatus(u8),

    /// Block handed to the decoder has the wrong size
    #[error("record block is {actual} bytes, expected {expected}")]
    BadLength { expected: usize, actual: usize },
}

/// Errors raised by a [`RecordStore`](crate::store::RecordStore).
#[derive(Error, Debug)]
pub enum StoreError {
    /// The backing file could not be opened, read or written
    #[error("i/o error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The file ends with a partial record
    #[error(
        "{} is corrupt: {trailing} trailing bytes at offset {offset} do not form a {record_size}-byte record",
        .path.display()
    )]
    Corrupt {
        path: PathBuf,
        offset: u64,
        trailing: usize,
        record_size: usize,
    },

    /// A complete block could not be decoded
    #[error("record {index} in {} is unreadable: {source}", .path.display())]
    Decode {
        path: PathBuf,
        index: usize,
        #[source]
        source: CodecError,
    },

    /// Rewrite targeted a position past the last record
    #[error("record index {index} out of bounds (store holds {len} records)")]
    OutOfBounds { index: usize, len: usize },
}

/// Payment rejections. None of these mutate the stored loan.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PaymentError {
    /// Payment is larger than what is still owed
    #[error("payment of {requested} exceeds remaining balance of {remaining}")]
    ExceedsBalance {
        requested: Decimal,
        remaining: Decimal,
    },

    /// Payment amount is negative
    #[error("invalid payment amount {0} (must not be negative)")]
    InvalidAmount(Decimal),
}

/// Errors returned by the customer and loan operations.
#[derive(Error, Debug)]
pub enum BankError {
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A text field does not fit its record layout
    #[error("invalid {field}: {source}")]
    Field {
        field: &'static str,
        #[source]
        source: CodecError,
    },

    /// National ID is already registered
    #[error(
        "a customer with national ID {} is already registered as customer {}",
        .existing.national_id,
        .existing.customer_number
    )]
    DuplicateNationalId { existing: Box<Customer> },

    /// Every customer number has been handed out
    #[error("no customer numbers left to assign")]
    CustomerNumbersExhausted,

    /// Unknown customer number
    #[error("customer {0} not found")]
    CustomerNotFound(CustomerNumber),

    /// Customer already has an approved loan with a balance outstanding
    #[error("customer {0} already has an active loan")]
    ActiveLoanExists(CustomerNumber),

    /// Customer has never applied for a loan
    #[error("no loan found for customer {0}")]
    LoanNotFound(CustomerNumber),

    /// Customer's loans are all rejected or completed
    #[error("customer {0} has no active loan")]
    NoActiveLoan(CustomerNumber),

    /// Requested principal is outside the lending limits
    #[error("loan amount {principal} is outside the allowed range 0 to {max}")]
    PrincipalOutOfRange { principal: Decimal, max: Decimal },

    /// Requested term is outside the lending limits
    #[error("repayment period of {months} months is outside the allowed range 1 to {max}")]
    TermOutOfRange { months: u32, max: u32 },

    /// The configured interest rate cannot be amortized over the term
    #[error("interest rate {rate}% cannot be amortized over {months} months")]
    RateNotAmortizable { rate: Decimal, months: u32 },

    #[error(transparent)]
    Payment(#[from] PaymentError),
}

impl BankError {
    pub(crate) fn field(field: &'static str) -> impl FnOnce(CodecError) -> Self {
        move |source| BankError::Field { field, source }
    }
}

/// Rejections of raw user input before it reaches the repositories.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },

    #[error("{field} may only contain letters and spaces")]
    NotAlphabetic { field: &'static str },

    #[error("{field} must be exactly {len} digits")]
    DigitCount { field: &'static str, len: usize },

    #[error("date of birth must be {min}-{max} characters of digits or spaces")]
    DateFormat { min: usize, max: usize },

    #[error("date of birth has an invalid day, month or year")]
    DateOutOfRange,

    #[error("`{0}` is not a non-negative number")]
    Amount(String),
}
