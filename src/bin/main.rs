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

use clap::{Parser, Subcommand};
use csv::Writer;
use loanbook::validation;
use loanbook::{
    Bank, BankConfig, BankError, Customer, CustomerNumber, Loan, LoanApplication, NewCustomer,
};
use rust_decimal::Decimal;
use std::io::Write;
use std::path::PathBuf;
use std::process;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// Loanbook - Bank customer and loan records
///
/// Keeps customers and loans in fixed-size record files under the data
/// directory. Results are written to stdout as CSV; diagnostics go to stderr
/// (set RUST_LOG=info for an operation log).
#[derive(Parser, Debug)]
#[command(name = "loanbook")]
#[command(about = "Customer and loan record keeping", long_about = None)]
struct Args {
    /// Directory holding customers.dat and loans.dat
    #[arg(long, value_name = "DIR", env = "LOANBOOK_DATA_DIR", default_value = ".")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Register a new customer
    AddCustomer {
        #[arg(long, value_parser = validation::parse_name)]
        name: String,
        /// Date of birth, `dd mm yyyy` or `ddmmyyyy`
        #[arg(long, value_parser = validation::parse_date_of_birth)]
        dob: String,
        /// National ID (CNIC), 13 digits without dashes
        #[arg(long, value_parser = validation::parse_national_id)]
        national_id: String,
        /// Contact number, 11 digits without spaces
        #[arg(long, value_parser = validation::parse_contact_number)]
        contact: String,
        #[arg(long, value_parser = validation::parse_address)]
        address: String,
        #[arg(long)]
        email: String,
    },
    /// List all customers
    Customers,
    /// Show one customer by number
    Customer { number: u32 },
    /// Apply for a loan
    ApplyLoan {
        #[arg(long)]
        customer: u32,
        #[arg(long, value_parser = validation::parse_purpose)]
        purpose: String,
        /// Loan amount (max 999,999)
        #[arg(long, value_parser = validation::parse_amount)]
        amount: Decimal,
        /// Repayment period in months (max 60)
        #[arg(long)]
        months: u32,
        #[arg(long)]
        credit_score: u32,
    },
    /// List loans, optionally for a single customer
    Loans {
        #[arg(long)]
        customer: Option<u32>,
    },
    /// Record a payment against a customer's active loan (0 cancels)
    Pay {
        #[arg(long)]
        customer: u32,
        #[arg(long, value_parser = validation::parse_amount)]
        amount: Decimal,
    },
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Bank(#[from] BankError),

    #[error("error writing output: {0}")]
    Output(#[from] csv::Error),
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    if let Err(e) = run(args, std::io::stdout()) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Executes one command against the record files, writing its result to `out`.
fn run<W: Write>(args: Args, out: W) -> Result<(), CliError> {
    let bank = Bank::open(&BankConfig::new(args.data_dir))?;

    match args.command {
        Command::AddCustomer {
            name,
            dob,
            national_id,
            contact,
            address,
            email,
        } => {
            let customer = bank.register_customer(NewCustomer {
                name,
                date_of_birth: dob,
                national_id,
                contact_number: contact,
                address,
                email,
            })?;
            write_customers(&[customer], out)?;
        }
        Command::Customers => write_customers(&bank.all_customers()?, out)?,
        Command::Customer { number } => {
            write_customers(&[bank.customer(CustomerNumber(number))?], out)?
        }
        Command::ApplyLoan {
            customer,
            purpose,
            amount,
            months,
            credit_score,
        } => {
            let loan = bank.apply_for_loan(LoanApplication {
                customer_number: CustomerNumber(customer),
                purpose,
                principal: amount,
                term_months: months,
                credit_score,
            })?;
            write_loans(&[loan], out)?;
        }
        Command::Loans { customer } => {
            let loans = match customer {
                Some(number) => bank.loans_for(CustomerNumber(number))?,
                None => bank.all_loans()?,
            };
            write_loans(&loans, out)?;
        }
        Command::Pay { customer, amount } => {
            // Zero is the cancel signal, not a payment.
            if amount.is_zero() {
                eprintln!("Payment cancelled.");
                return Ok(());
            }
            let loan = bank.record_payment(CustomerNumber(customer), amount)?;
            write_loans(&[loan], out)?;
        }
    }

    Ok(())
}

/// Write customers as CSV.
///
/// # CSV Format
///
/// Columns: `customer, name, dob, national_id, contact, address, email`
///
/// # Errors
///
/// Returns a CSV error if writing fails.
pub fn write_customers<W: Write>(customers: &[Customer], writer: W) -> Result<(), csv::Error> {
    let mut wtr = Writer::from_writer(writer);
    for customer in customers {
        wtr.serialize(customer)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write loans as CSV with money rounded to 2 decimal places.
///
/// # CSV Format
///
/// Columns: `customer, purpose, amount, months, interest, installment, remaining, credit_score, status`
///
/// ```csv
/// customer,purpose,amount,months,interest,installment,remaining,credit_score,status
/// 1,Car,100000,12,5.0,8560.75,100000,720,Approved
/// ```
///
/// # Errors
///
/// Returns a CSV error if writing fails.
pub fn write_loans<W: Write>(loans: &[Loan], writer: W) -> Result<(), csv::Error> {
    let mut wtr = Writer::from_writer(writer);
    for loan in loans {
        wtr.serialize(loan)?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use loanbook::LoanStatus;
    use rust_decimal_macros::dec;

    fn args(dir: &std::path::Path, rest: &[&str]) -> Args {
        let mut argv = vec!["loanbook", "--data-dir", dir.to_str().unwrap()];
        argv.extend_from_slice(rest);
        Args::try_parse_from(argv).unwrap()
    }

    fn run_to_string(args: Args) -> Result<String, CliError> {
        let mut output = Vec::new();
        run(args, &mut output)?;
        Ok(String::from_utf8(output).unwrap())
    }

    const ADD_ALICE: &[&str] = &[
        "add-customer",
        "--name",
        "Alice Khan",
        "--dob",
        "01 02 1990",
        "--national-id",
        "3520112345671",
        "--contact",
        "03001234567",
        "--address",
        "12 Mall Road",
        "--email",
        "alice@example.com",
    ];

    #[test]
    fn command_definition_is_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn rejects_malformed_national_id() {
        let mut argv = vec!["loanbook"];
        argv.extend_from_slice(ADD_ALICE);
        let index = argv.iter().position(|a| *a == "3520112345671").unwrap();
        argv[index] = "35201-1234567-1";
        assert!(Args::try_parse_from(argv).is_err());
    }

    #[test]
    fn rejects_negative_payment() {
        let result = Args::try_parse_from(["loanbook", "pay", "--customer", "1", "--amount", "-5"]);
        assert!(result.is_err());
    }

    #[test]
    fn add_customer_prints_assigned_number() {
        let dir = tempfile::tempdir().unwrap();
        let output = run_to_string(args(dir.path(), ADD_ALICE)).unwrap();
        assert!(output.starts_with("customer,name,dob,national_id,contact,address,email\n"));
        assert!(output.contains(
            "1,Alice Khan,01 02 1990,3520112345671,03001234567,12 Mall Road,alice@example.com"
        ));
    }

    #[test]
    fn duplicate_customer_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        run_to_string(args(dir.path(), ADD_ALICE)).unwrap();
        let result = run_to_string(args(dir.path(), ADD_ALICE));
        assert!(matches!(
            result,
            Err(CliError::Bank(BankError::DuplicateNationalId { .. }))
        ));
    }

    #[test]
    fn loan_lifecycle_through_commands() {
        let dir = tempfile::tempdir().unwrap();
        run_to_string(args(dir.path(), ADD_ALICE)).unwrap();

        let output = run_to_string(args(
            dir.path(),
            &[
                "apply-loan",
                "--customer",
                "1",
                "--purpose",
                "Car",
                "--amount",
                "100000",
                "--months",
                "12",
                "--credit-score",
                "720",
            ],
        ))
        .unwrap();
        assert!(output.contains("1,Car,100000,12,5.0,8560.75,100000,720,Approved"));

        let output = run_to_string(args(
            dir.path(),
            &["pay", "--customer", "1", "--amount", "100000"],
        ))
        .unwrap();
        assert!(output.contains(",0,720,Completed"));

        let result = run_to_string(args(
            dir.path(),
            &["pay", "--customer", "1", "--amount", "1"],
        ));
        assert!(matches!(
            result,
            Err(CliError::Bank(BankError::NoActiveLoan(CustomerNumber(1))))
        ));
    }

    #[test]
    fn zero_payment_cancels_without_output() {
        let dir = tempfile::tempdir().unwrap();
        let output = run_to_string(args(
            dir.path(),
            &["pay", "--customer", "1", "--amount", "0"],
        ))
        .unwrap();
        assert!(output.is_empty());
    }

    #[test]
    fn unknown_customer_lookup_fails() {
        let dir = tempfile::tempdir().unwrap();
        let result = run_to_string(args(dir.path(), &["customer", "42"]));
        assert!(matches!(
            result,
            Err(CliError::Bank(BankError::CustomerNotFound(CustomerNumber(42))))
        ));
    }

    #[test]
    fn write_loans_to_csv() {
        let loan = Loan {
            customer_number: CustomerNumber(9),
            purpose: "Home".parse().unwrap(),
            principal: dec!(5000),
            term_months: 6,
            annual_interest_rate: dec!(5.0),
            monthly_installment: Decimal::ZERO,
            remaining_balance: Decimal::ZERO,
            credit_score: 550,
            status: LoanStatus::Rejected,
        };
        let mut output = Vec::new();
        write_loans(&[loan], &mut output).unwrap();

        let output = String::from_utf8(output).unwrap();
        assert_eq!(
            output,
            "customer,purpose,amount,months,interest,installment,remaining,credit_score,status\n\
             9,Home,5000,6,5.0,0,0,550,Rejected\n"
        );
    }
}
