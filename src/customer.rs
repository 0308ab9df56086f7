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

//! Customer records and the customer repository.
//!
//! # Example
//!
//! ```
//! use loanbook::{CustomerNumber, CustomerRepository, NewCustomer};
//!
//! let dir = tempfile::tempdir().unwrap();
//! let customers = CustomerRepository::open(dir.path().join("customers.dat"));
//!
//! let alice = customers
//!     .register(NewCustomer {
//!         name: "Alice Khan".into(),
//!         date_of_birth: "01 02 1990".into(),
//!         national_id: "3520112345671".into(),
//!         contact_number: "03001234567".into(),
//!         address: "12 Mall Road Lahore".into(),
//!         email: "alice@example.com".into(),
//!     })
//!     .unwrap();
//! assert_eq!(alice.customer_number, CustomerNumber(1));
//! ```

use crate::base::CustomerNumber;
use crate::codec::{FieldReader, FieldWriter, FixedText, Record};
use crate::error::{BankError, CodecError};
use crate::store::RecordStore;
use serde::Serialize;
use std::path::PathBuf;
use tracing::{info, warn};

pub const NAME_CAPACITY: usize = 50;
pub const DATE_OF_BIRTH_CAPACITY: usize = 20;
pub const NATIONAL_ID_CAPACITY: usize = 20;
pub const CONTACT_NUMBER_CAPACITY: usize = 20;
pub const ADDRESS_CAPACITY: usize = 100;
pub const EMAIL_CAPACITY: usize = 50;

/// A registered customer. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Customer {
    #[serde(rename = "customer")]
    pub customer_number: CustomerNumber,
    pub name: FixedText<NAME_CAPACITY>,
    #[serde(rename = "dob")]
    pub date_of_birth: FixedText<DATE_OF_BIRTH_CAPACITY>,
    pub national_id: FixedText<NATIONAL_ID_CAPACITY>,
    #[serde(rename = "contact")]
    pub contact_number: FixedText<CONTACT_NUMBER_CAPACITY>,
    pub address: FixedText<ADDRESS_CAPACITY>,
    pub email: FixedText<EMAIL_CAPACITY>,
}

/// Layout, 264 bytes:
/// `number u32 | name 50 | dob 20 | national_id 20 | contact 20 | address 100 | email 50`.
impl Record for Customer {
    const SIZE: usize = 4
        + NAME_CAPACITY
        + DATE_OF_BIRTH_CAPACITY
        + NATIONAL_ID_CAPACITY
        + CONTACT_NUMBER_CAPACITY
        + ADDRESS_CAPACITY
        + EMAIL_CAPACITY;

    fn encode(&self, buf: &mut [u8]) {
        let mut writer = FieldWriter::new(buf);
        writer.u32(self.customer_number.0);
        writer.text(&self.name);
        writer.text(&self.date_of_birth);
        writer.text(&self.national_id);
        writer.text(&self.contact_number);
        writer.text(&self.address);
        writer.text(&self.email);
        debug_assert_eq!(writer.finish(), Self::SIZE);
    }

    fn decode(buf: &[u8]) -> Result<Self, CodecError> {
        let mut reader = FieldReader::new(buf, Self::SIZE)?;
        Ok(Self {
            customer_number: CustomerNumber(reader.u32()),
            name: reader.text()?,
            date_of_birth: reader.text()?,
            national_id: reader.text()?,
            contact_number: reader.text()?,
            address: reader.text()?,
            email: reader.text()?,
        })
    }
}

/// Registration input, already validated for format by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewCustomer {
    pub name: String,
    pub date_of_birth: String,
    pub national_id: String,
    pub contact_number: String,
    pub address: String,
    pub email: String,
}

impl NewCustomer {
    /// Fits every field into its record capacity.
    fn into_customer(self, customer_number: CustomerNumber) -> Result<Customer, BankError> {
        Ok(Customer {
            customer_number,
            name: FixedText::new(self.name).map_err(BankError::field("name"))?,
            date_of_birth: FixedText::new(self.date_of_birth)
                .map_err(BankError::field("date of birth"))?,
            national_id: FixedText::new(self.national_id)
                .map_err(BankError::field("national ID"))?,
            contact_number: FixedText::new(self.contact_number)
                .map_err(BankError::field("contact number"))?,
            address: FixedText::new(self.address).map_err(BankError::field("address"))?,
            email: FixedText::new(self.email).map_err(BankError::field("email"))?,
        })
    }
}

/// Customer file with national ID uniqueness.
#[derive(Debug)]
pub struct CustomerRepository {
    store: RecordStore<Customer>,
}

impl CustomerRepository {
    pub fn new(store: RecordStore<Customer>) -> Self {
        Self { store }
    }

    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self::new(RecordStore::open(path))
    }

    pub fn store(&self) -> &RecordStore<Customer> {
        &self.store
    }

    /// Stores a new customer and returns it with its assigned number.
    ///
    /// The number is one more than the highest number on file. The uniqueness
    /// check and number assignment share one scan.
    ///
    /// # Errors
    ///
    /// - [`BankError::Field`] - A field does not fit its record capacity.
    /// - [`BankError::DuplicateNationalId`] - The national ID is already on
    ///   file; the store is left unchanged.
    /// - [`BankError::Store`] - The customer file could not be read or written.
    pub fn register(&self, new_customer: NewCustomer) -> Result<Customer, BankError> {
        // Number is a placeholder until the scan below.
        let mut customer = new_customer.into_customer(CustomerNumber(0))?;

        let _guard = self.store.lock();
        let mut highest = CustomerNumber(0);
        for existing in self.store.scan()? {
            let existing = existing?;
            if existing.national_id == customer.national_id {
                warn!(
                    national_id = %customer.national_id,
                    existing = %existing.customer_number,
                    "duplicate national ID rejected"
                );
                return Err(BankError::DuplicateNationalId {
                    existing: Box::new(existing),
                });
            }
            highest = highest.max(existing.customer_number);
        }

        customer.customer_number = highest.next().ok_or(BankError::CustomerNumbersExhausted)?;
        self.store.append(&customer)?;
        info!(customer = %customer.customer_number, "registered customer");
        Ok(customer)
    }

    /// Linear search by national ID.
    pub fn find_by_national_id(&self, national_id: &str) -> Result<Option<Customer>, BankError> {
        Ok(self
            .store
            .find_first(|c| c.national_id == national_id)?
            .map(|(_, customer)| customer))
    }

    /// Linear search by customer number.
    pub fn find_by_number(&self, number: CustomerNumber) -> Result<Option<Customer>, BankError> {
        Ok(self
            .store
            .find_first(|c| c.customer_number == number)?
            .map(|(_, customer)| customer))
    }

    /// All customers in registration order.
    pub fn all(&self) -> Result<Vec<Customer>, BankError> {
        Ok(self.store.scan()?.collect::<Result<Vec<_>, _>>()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(number: u32) -> Customer {
        Customer {
            customer_number: CustomerNumber(number),
            name: "Bilal Ahmed".parse().unwrap(),
            date_of_birth: "15081985".parse().unwrap(),
            national_id: "4210198765432".parse().unwrap(),
            contact_number: "03219876543".parse().unwrap(),
            address: "House 4 Street 9 Karachi".parse().unwrap(),
            email: "bilal@example.com".parse().unwrap(),
        }
    }

    #[test]
    fn record_size_matches_layout() {
        assert_eq!(Customer::SIZE, 264);
    }

    #[test]
    fn customer_round_trips() {
        let customer = sample(17);
        let bytes = customer.to_bytes();
        assert_eq!(bytes.len(), Customer::SIZE);
        assert_eq!(Customer::decode(&bytes).unwrap(), customer);
    }

    #[test]
    fn customer_number_leads_the_block() {
        let bytes = sample(0x0102_0304).to_bytes();
        assert_eq!(&bytes[..4], &[4, 3, 2, 1]);
        assert_eq!(&bytes[4..15], b"Bilal Ahmed");
        assert_eq!(bytes[15], 0);
    }

    #[test]
    fn overlong_field_is_named_in_error() {
        let new_customer = NewCustomer {
            address: "x".repeat(ADDRESS_CAPACITY + 1),
            ..NewCustomer::default()
        };
        let error = new_customer.into_customer(CustomerNumber(1)).unwrap_err();
        assert!(matches!(error, BankError::Field { field: "address", .. }));
    }
}
