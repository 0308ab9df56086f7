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

//! Fixed monthly installment of an amortizing loan.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Computes the constant monthly payment that repays `principal` with
/// interest over `term_months`.
///
/// `installment = P * r * (1 + r)^n / ((1 + r)^n - 1)` with
/// `r = annual_rate_percent / 1200`.
///
/// A zero rate repays the principal in equal parts. A zero term is not a
/// valid loan; it returns the whole principal rather than dividing by zero.
/// The result keeps full decimal precision; round for display.
///
/// Returns `None` when the rate cannot be amortized: `(1 + r)^n` overflows
/// `Decimal`, or it equals one so the denominator vanishes.
///
/// ```
/// use loanbook::amortization::compute_installment;
/// use rust_decimal_macros::dec;
///
/// let installment = compute_installment(dec!(100000), dec!(5.0), 12).unwrap();
/// assert_eq!(installment.round_dp(2), dec!(8560.75));
///
/// assert_eq!(compute_installment(dec!(1000), dec!(5000), 60), None);
/// ```
pub fn compute_installment(
    principal: Decimal,
    annual_rate_percent: Decimal,
    term_months: u32,
) -> Option<Decimal> {
    if term_months == 0 {
        return Some(principal);
    }

    let monthly_rate = annual_rate_percent.checked_div(dec!(1200))?;
    if monthly_rate.is_zero() {
        return principal.checked_div(Decimal::from(term_months));
    }

    let base = Decimal::ONE.checked_add(monthly_rate)?;
    let mut compound = Decimal::ONE;
    for _ in 0..term_months {
        compound = compound.checked_mul(base)?;
    }

    principal
        .checked_mul(monthly_rate)?
        .checked_mul(compound)?
        .checked_div(compound.checked_sub(Decimal::ONE)?)
}
