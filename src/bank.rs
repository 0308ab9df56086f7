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

//! Customer and loan operations over the two record files.
//!
//! The [`Bank`] owns one [`CustomerRepository`] and one [`LoanRepository`]
//! and is the entry point the command line uses for every operation.
//!
//! # Operations
//!
//! - **Register**: Store a customer, enforcing national ID uniqueness.
//! - **Apply**: Decide a loan for a known customer and record it.
//! - **Pay**: Reduce the balance of the customer's active loan in place.
//!
//! # Concurrency
//!
//! Every operation blocks on file I/O. Writes that depend on a prior scan
//! hold the owning store's lock, so a `Bank` shared between threads of one
//! process keeps the uniqueness and one-active-loan rules. Separate
//! processes writing the same files are not coordinated.

use crate::base::CustomerNumber;
use crate::config::BankConfig;
use crate::customer::{Customer, CustomerRepository, NewCustomer};
use crate::error::{BankError, StoreError};
use crate::loan::{Loan, LoanApplication, LoanRepository};
use rust_decimal::Decimal;
use tracing::debug;

/// Customer and loan books.
///
/// # Invariants
///
/// - National IDs are unique across all customers.
/// - A customer has at most one approved loan with a positive balance.
/// - A loan's remaining balance only decreases, and only through payments.
#[derive(Debug)]
pub struct Bank {
    customers: CustomerRepository,
    loans: LoanRepository,
}

impl Bank {
    pub fn new(customers: CustomerRepository, loans: LoanRepository) -> Self {
        Bank { customers, loans }
    }

    /// Opens the record files named by `config`, creating the data
    /// directory if it does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the data directory cannot be created.
    pub fn open(config: &BankConfig) -> Result<Self, BankError> {
        std::fs::create_dir_all(config.data_dir()).map_err(|source| StoreError::Io {
            path: config.data_dir().to_path_buf(),
            source,
        })?;
        debug!(data_dir = %config.data_dir().display(), "opening record files");
        Ok(Bank::new(
            CustomerRepository::open(config.customer_path()),
            LoanRepository::open(config.loan_path(), config.policy.clone()),
        ))
    }

    pub fn customers(&self) -> &CustomerRepository {
        &self.customers
    }

    pub fn loans(&self) -> &LoanRepository {
        &self.loans
    }

    /// Registers a customer. See [`CustomerRepository::register`].
    pub fn register_customer(&self, new_customer: NewCustomer) -> Result<Customer, BankError> {
        self.customers.register(new_customer)
    }

    /// Looks up a customer by number.
    ///
    /// # Errors
    ///
    /// Returns [`BankError::CustomerNotFound`] for an unknown number.
    pub fn customer(&self, number: CustomerNumber) -> Result<Customer, BankError> {
        self.customers
            .find_by_number(number)?
            .ok_or(BankError::CustomerNotFound(number))
    }

    /// Decides and records a loan application for a registered customer.
    ///
    /// # Errors
    ///
    /// - [`BankError::CustomerNotFound`] - No customer has this number.
    /// - Everything [`LoanRepository::apply`] returns.
    pub fn apply_for_loan(&self, application: LoanApplication) -> Result<Loan, BankError> {
        self.customer(application.customer_number)?;
        self.loans.apply(application)
    }

    /// Records a payment. See [`LoanRepository::record_payment`].
    pub fn record_payment(
        &self,
        customer: CustomerNumber,
        amount: Decimal,
    ) -> Result<Loan, BankError> {
        self.loans.record_payment(customer, amount)
    }

    pub fn has_active_loan(&self, customer: CustomerNumber) -> Result<bool, BankError> {
        self.loans.has_active_loan(customer)
    }

    /// All customers, registration order.
    pub fn all_customers(&self) -> Result<Vec<Customer>, BankError> {
        self.customers.all()
    }

    /// All loans, application order.
    pub fn all_loans(&self) -> Result<Vec<Loan>, BankError> {
        self.loans.all()
    }

    pub fn loans_for(&self, customer: CustomerNumber) -> Result<Vec<Loan>, BankError> {
        self.loans.for_customer(customer)
    }
}
