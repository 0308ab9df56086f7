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

//! Loan records and the loan repository.
//!
//! Loans follow a small state machine:
//!
//! ```text
//! application ──score < min──► Rejected
//!      │
//!      └──score >= min──► Approved ──payments reach 0──► Completed
//! ```
//!
//! Rejected applications are still written to the loan file so every
//! decision leaves a record.

use crate::amortization::compute_installment;
use crate::base::CustomerNumber;
use crate::codec::{FieldReader, FieldWriter, FixedText, Record};
use crate::config::LoanPolicy;
use crate::error::{BankError, CodecError, PaymentError};
use crate::store::RecordStore;
use rust_decimal::Decimal;
use serde::ser::{SerializeStruct, Serializer};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use tracing::{debug, info, warn};

pub const PURPOSE_CAPACITY: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LoanStatus {
    Approved,
    Rejected,
    Completed,
}

impl LoanStatus {
    fn to_byte(self) -> u8 {
        match self {
            Self::Approved => 1,
            Self::Rejected => 2,
            Self::Completed => 3,
        }
    }

    fn from_byte(byte: u8) -> Result<Self, CodecError> {
        match byte {
            1 => Ok(Self::Approved),
            2 => Ok(Self::Rejected),
            3 => Ok(Self::Completed),
            other => Err(CodecError::UnknownStatus(other)),
        }
    }
}

impl fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Approved => "Approved",
            Self::Rejected => "Rejected",
            Self::Completed => "Completed",
        })
    }
}

/// A stored loan. Identified by its position in the loan file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Loan {
    pub customer_number: CustomerNumber,
    pub purpose: FixedText<PURPOSE_CAPACITY>,
    pub principal: Decimal,
    pub term_months: u32,
    /// Annual rate in percent.
    pub annual_interest_rate: Decimal,
    pub monthly_installment: Decimal,
    pub remaining_balance: Decimal,
    pub credit_score: u32,
    pub status: LoanStatus,
}

impl Loan {
    /// Places shown for money columns.
    pub const DECIMAL_PRECISION: u32 = 2;

    /// Approved with a balance still owed.
    pub fn is_active(&self) -> bool {
        self.status == LoanStatus::Approved && self.remaining_balance > Decimal::ZERO
    }
}

/// Layout, 127 bytes:
/// `customer u32 | purpose 50 | principal 16 | term u32 | rate 16 |
/// installment 16 | remaining 16 | credit_score u32 | status u8`.
impl Record for Loan {
    const SIZE: usize = 4 + PURPOSE_CAPACITY + 16 + 4 + 16 + 16 + 16 + 4 + 1;

    fn encode(&self, buf: &mut [u8]) {
        let mut writer = FieldWriter::new(buf);
        writer.u32(self.customer_number.0);
        writer.text(&self.purpose);
        writer.decimal(self.principal);
        writer.u32(self.term_months);
        writer.decimal(self.annual_interest_rate);
        writer.decimal(self.monthly_installment);
        writer.decimal(self.remaining_balance);
        writer.u32(self.credit_score);
        writer.u8(self.status.to_byte());
        debug_assert_eq!(writer.finish(), Self::SIZE);
    }

    fn decode(buf: &[u8]) -> Result<Self, CodecError> {
        let mut reader = FieldReader::new(buf, Self::SIZE)?;
        Ok(Self {
            customer_number: CustomerNumber(reader.u32()),
            purpose: reader.text()?,
            principal: reader.decimal(),
            term_months: reader.u32(),
            annual_interest_rate: reader.decimal(),
            monthly_installment: reader.decimal(),
            remaining_balance: reader.decimal(),
            credit_score: reader.u32(),
            status: LoanStatus::from_byte(reader.u8())?,
        })
    }
}

impl Serialize for Loan {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("Loan", 9)?;
        state.serialize_field("customer", &self.customer_number)?;
        state.serialize_field("purpose", &self.purpose)?;
        state.serialize_field("amount", &self.principal.round_dp(Loan::DECIMAL_PRECISION))?;
        state.serialize_field("months", &self.term_months)?;
        state.serialize_field(
            "interest",
            &self.annual_interest_rate.round_dp(Loan::DECIMAL_PRECISION),
        )?;
        state.serialize_field(
            "installment",
            &self.monthly_installment.round_dp(Loan::DECIMAL_PRECISION),
        )?;
        state.serialize_field(
            "remaining",
            &self.remaining_balance.round_dp(Loan::DECIMAL_PRECISION),
        )?;
        state.serialize_field("credit_score", &self.credit_score)?;
        state.serialize_field("status", &self.status)?;
        state.end()
    }
}

/// Loan application input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoanApplication {
    pub customer_number: CustomerNumber,
    pub purpose: String,
    pub principal: Decimal,
    pub term_months: u32,
    pub credit_score: u32,
}

/// Loan file with the one-active-loan rule and in-place payment updates.
#[derive(Debug)]
pub struct LoanRepository {
    store: RecordStore<Loan>,
    policy: LoanPolicy,
}

impl LoanRepository {
    pub fn new(store: RecordStore<Loan>, policy: LoanPolicy) -> Self {
        Self { store, policy }
    }

    pub fn open(path: impl Into<PathBuf>, policy: LoanPolicy) -> Self {
        Self::new(RecordStore::open(path), policy)
    }

    pub fn store(&self) -> &RecordStore<Loan> {
        &self.store
    }

    pub fn policy(&self) -> &LoanPolicy {
        &self.policy
    }

    /// Whether the customer has an approved loan with a balance still owed.
    pub fn has_active_loan(&self, customer: CustomerNumber) -> Result<bool, BankError> {
        Ok(self
            .store
            .find_first(|loan| loan.customer_number == customer && loan.is_active())?
            .is_some())
    }

    /// Decides and records a loan application.
    ///
    /// Scores below the policy minimum are rejected with no installment and
    /// no balance; otherwise the loan is approved with the full principal
    /// outstanding. A zero principal has nothing to repay and is recorded as
    /// [`LoanStatus::Completed`]. The decided loan is appended either way.
    ///
    /// # Errors
    ///
    /// - [`BankError::PrincipalOutOfRange`] - Principal is negative or above the policy limit.
    /// - [`BankError::TermOutOfRange`] - Term is zero or above the policy limit.
    /// - [`BankError::Field`] - Purpose does not fit its record capacity.
    /// - [`BankError::ActiveLoanExists`] - The customer already has an active loan;
    ///   nothing is written.
    /// - [`BankError::RateNotAmortizable`] - The policy rate overflows the
    ///   installment calculation; nothing is written.
    /// - [`BankError::Store`] - The loan file could not be read or written.
    pub fn apply(&self, application: LoanApplication) -> Result<Loan, BankError> {
        let policy = &self.policy;
        let customer = application.customer_number;

        if application.principal < Decimal::ZERO || application.principal > policy.max_principal {
            return Err(BankError::PrincipalOutOfRange {
                principal: application.principal,
                max: policy.max_principal,
            });
        }
        if application.term_months == 0 || application.term_months > policy.max_term_months {
            return Err(BankError::TermOutOfRange {
                months: application.term_months,
                max: policy.max_term_months,
            });
        }
        let purpose = FixedText::new(application.purpose).map_err(BankError::field("purpose"))?;

        let _guard = self.store.lock();
        if self.has_active_loan(customer)? {
            warn!(%customer, "application denied: active loan exists");
            return Err(BankError::ActiveLoanExists(customer));
        }

        let (status, monthly_installment, remaining_balance) =
            if application.credit_score < policy.min_credit_score {
                (LoanStatus::Rejected, Decimal::ZERO, Decimal::ZERO)
            } else if application.principal.is_zero() {
                (LoanStatus::Completed, Decimal::ZERO, Decimal::ZERO)
            } else {
                let installment = compute_installment(
                    application.principal,
                    policy.annual_interest_rate,
                    application.term_months,
                )
                .ok_or(BankError::RateNotAmortizable {
                    rate: policy.annual_interest_rate,
                    months: application.term_months,
                })?;
                (LoanStatus::Approved, installment, application.principal)
            };

        let loan = Loan {
            customer_number: customer,
            purpose,
            principal: application.principal,
            term_months: application.term_months,
            annual_interest_rate: policy.annual_interest_rate,
            monthly_installment,
            remaining_balance,
            credit_score: application.credit_score,
            status,
        };
        self.store.append(&loan)?;

        if loan.status == LoanStatus::Rejected {
            warn!(
                %customer,
                credit_score = loan.credit_score,
                "loan rejected: credit score too low"
            );
        } else if loan.status == LoanStatus::Completed {
            info!(%customer, "zero-principal loan recorded as completed");
        } else {
            info!(
                %customer,
                principal = %loan.principal,
                installment = %loan.monthly_installment.round_dp(Loan::DECIMAL_PRECISION),
                "loan approved"
            );
        }
        Ok(loan)
    }

    /// Applies a payment to the customer's active loan and rewrites it in place.
    ///
    /// A payment of zero changes nothing and returns the loan as stored. When
    /// the balance reaches exactly zero the same rewrite marks the loan
    /// [`LoanStatus::Completed`].
    ///
    /// # Errors
    ///
    /// - [`PaymentError::InvalidAmount`] - Amount is negative.
    /// - [`BankError::LoanNotFound`] - The customer has no loans at all.
    /// - [`BankError::NoActiveLoan`] - The customer's loans are all rejected or completed.
    /// - [`PaymentError::ExceedsBalance`] - Amount is more than the remaining
    ///   balance; nothing is written.
    /// - [`BankError::Store`] - The loan file could not be read or written.
    pub fn record_payment(
        &self,
        customer: CustomerNumber,
        amount: Decimal,
    ) -> Result<Loan, BankError> {
        if amount < Decimal::ZERO {
            return Err(PaymentError::InvalidAmount(amount).into());
        }

        let _guard = self.store.lock();
        let mut has_any = false;
        let found = self.store.find_first(|loan| {
            if loan.customer_number != customer {
                return false;
            }
            has_any = true;
            loan.is_active()
        })?;

        let Some((index, mut loan)) = found else {
            return Err(if has_any {
                BankError::NoActiveLoan(customer)
            } else {
                BankError::LoanNotFound(customer)
            });
        };

        if amount.is_zero() {
            debug!(%customer, "zero payment, loan unchanged");
            return Ok(loan);
        }

        if amount > loan.remaining_balance {
            return Err(PaymentError::ExceedsBalance {
                requested: amount,
                remaining: loan.remaining_balance,
            }
            .into());
        }

        loan.remaining_balance -= amount;
        if loan.remaining_balance.is_zero() {
            loan.status = LoanStatus::Completed;
        }
        self.store.rewrite_at(index, &loan)?;

        info!(
            %customer,
            paid = %amount,
            remaining = %loan.remaining_balance,
            status = %loan.status,
            "payment recorded"
        );
        Ok(loan)
    }

    /// Every loan on file for the customer, oldest first.
    pub fn for_customer(&self, customer: CustomerNumber) -> Result<Vec<Loan>, BankError> {
        let mut loans = Vec::new();
        for loan in self.store.scan()? {
            let loan = loan?;
            if loan.customer_number == customer {
                loans.push(loan);
            }
        }
        Ok(loans)
    }

    /// All loans in application order.
    pub fn all(&self) -> Result<Vec<Loan>, BankError> {
        Ok(self.store.scan()?.collect::<Result<Vec<_>, _>>()?)
    }
}
