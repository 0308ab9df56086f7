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

//! Storage locations and lending policy.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Lending policy applied when a loan application is decided.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoanPolicy {
    /// Annual interest rate in percent, fixed for every loan.
    pub annual_interest_rate: Decimal,
    /// Applications scoring below this are rejected.
    pub min_credit_score: u32,
    pub max_principal: Decimal,
    pub max_term_months: u32,
}

impl Default for LoanPolicy {
    fn default() -> Self {
        Self {
            annual_interest_rate: dec!(5.0),
            min_credit_score: 600,
            max_principal: dec!(999999),
            max_term_months: 60,
        }
    }
}

/// Where the record files live and which policy governs new loans.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BankConfig {
    pub data_dir: PathBuf,
    pub customer_file: String,
    pub loan_file: String,
    pub policy: LoanPolicy,
}

impl BankConfig {
    pub const DEFAULT_CUSTOMER_FILE: &'static str = "customers.dat";
    pub const DEFAULT_LOAN_FILE: &'static str = "loans.dat";

    /// Default file names and policy under `data_dir`.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    pub fn with_policy(mut self, policy: LoanPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn customer_path(&self) -> PathBuf {
        self.data_dir.join(&self.customer_file)
    }

    pub fn loan_path(&self) -> PathBuf {
        self.data_dir.join(&self.loan_file)
    }
}

impl Default for BankConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            customer_file: Self::DEFAULT_CUSTOMER_FILE.to_owned(),
            loan_file: Self::DEFAULT_LOAN_FILE.to_owned(),
            policy: LoanPolicy::default(),
        }
    }
}
