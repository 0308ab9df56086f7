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

//! # Loanbook
//!
//! This library keeps bank customers and their loans in two files of
//! fixed-size binary records. Records are found by linear scan, appended at
//! the end, and updated by rewriting a single record in place.
//!
//! ## Core Components
//!
//! - [`Bank`]: Entry point owning the customer and loan books
//! - [`CustomerRepository`]: Customer file with national ID uniqueness
//! - [`LoanRepository`]: Loan file with the one-active-loan rule and payments
//! - [`RecordStore`]: Generic sequential file of fixed-size [`Record`]s
//! - [`compute_installment`]: Fixed monthly installment of an amortizing loan
//! - [`BankError`]: Error types for failed operations
//!
//! ## Example
//!
//! ```
//! use loanbook::{Bank, BankConfig, LoanApplication, LoanStatus, NewCustomer};
//! use rust_decimal_macros::dec;
//!
//! let dir = tempfile::tempdir().unwrap();
//! let bank = Bank::open(&BankConfig::new(dir.path())).unwrap();
//!
//! let customer = bank
//!     .register_customer(NewCustomer {
//!         name: "Alice Khan".into(),
//!         date_of_birth: "01 02 1990".into(),
//!         national_id: "3520112345671".into(),
//!         contact_number: "03001234567".into(),
//!         address: "12 Mall Road Lahore".into(),
//!         email: "alice@example.com".into(),
//!     })
//!     .unwrap();
//!
//! let loan = bank
//!     .apply_for_loan(LoanApplication {
//!         customer_number: customer.customer_number,
//!         purpose: "Car".into(),
//!         principal: dec!(100000),
//!         term_months: 12,
//!         credit_score: 720,
//!     })
//!     .unwrap();
//! assert_eq!(loan.status, LoanStatus::Approved);
//! assert_eq!(loan.monthly_installment.round_dp(2), dec!(8560.75));
//!
//! let loan = bank.record_payment(customer.customer_number, dec!(100000)).unwrap();
//! assert_eq!(loan.status, LoanStatus::Completed);
//! ```
//!
//! ## On-disk format
//!
//! Neither file has a header. Each is a plain sequence of 264-byte customer
//! records or 127-byte loan records; see [`codec`] for the field encodings. A file whose length is not a
//! multiple of the record size is reported as corrupt.

pub mod amortization;
mod bank;
mod base;
pub mod codec;
pub mod config;
pub mod customer;
pub mod error;
pub mod loan;
pub mod store;
pub mod validation;

pub use amortization::compute_installment;
pub use bank::Bank;
pub use base::CustomerNumber;
pub use codec::{FixedText, Record};
pub use config::{BankConfig, LoanPolicy};
pub use customer::{Customer, CustomerRepository, NewCustomer};
pub use error::{BankError, CodecError, PaymentError, StoreError, ValidationError};
pub use loan::{Loan, LoanApplication, LoanRepository, LoanStatus};
pub use store::{RecordStore, Scan};
