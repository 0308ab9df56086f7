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

//! Fixed-size binary record encoding.
//!
//! Every record type has a layout of fixed width, so the `n`th record of a
//! file always starts at byte `n * SIZE`. Fields are laid out back to back
//! with no padding between them:
//!
//! | Kind | Width | Encoding |
//! |------|-------|----------|
//! | `u8` | 1 | raw byte |
//! | `u32` | 4 | little-endian |
//! | [`Decimal`] | 16 | [`Decimal::serialize`] |
//! | [`FixedText<N>`] | `N` | UTF-8, NUL-padded to `N` bytes |
//!
//! Text never contains NUL, so the first NUL (or the end of the field) marks
//! the end of the value and decoding recovers exactly the stored text.

use crate::error::CodecError;
use rust_decimal::Decimal;
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A value with a fixed-width binary representation.
pub trait Record: Sized {
    /// Encoded size in bytes.
    const SIZE: usize;

    /// Writes the record into `buf`, which is exactly [`Self::SIZE`] bytes.
    fn encode(&self, buf: &mut [u8]);

    /// Reconstructs a record from a block of [`Self::SIZE`] bytes.
    fn decode(buf: &[u8]) -> Result<Self, CodecError>;

    /// Encodes into a freshly allocated block.
    fn to_bytes(&self) -> Vec<u8> {
        let mut buf = vec![0u8; Self::SIZE];
        self.encode(&mut buf);
        buf
    }
}

/// Text with a maximum encoded length of `N` bytes.
///
/// Construction is the only place capacity is checked, which keeps
/// [`Record::encode`] infallible.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FixedText<const N: usize>(String);

impl<const N: usize> FixedText<N> {
    pub const CAPACITY: usize = N;

    pub fn new(value: impl Into<String>) -> Result<Self, CodecError> {
        let value = value.into();
        if value.len() > N {
            return Err(CodecError::TextTooLong {
                len: value.len(),
                capacity: N,
            });
        }
        if value.contains('\0') {
            return Err(CodecError::TextContainsNul);
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl<const N: usize> AsRef<str> for FixedText<N> {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl<const N: usize> fmt::Display for FixedText<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<const N: usize> FromStr for FixedText<N> {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl<const N: usize> TryFrom<&str> for FixedText<N> {
    type Error = CodecError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl<const N: usize> TryFrom<String> for FixedText<N> {
    type Error = CodecError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl<const N: usize> PartialEq<str> for FixedText<N> {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl<const N: usize> PartialEq<&str> for FixedText<N> {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl<const N: usize> Serialize for FixedText<N> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

/// Sequential field writer over a record block.
pub(crate) struct FieldWriter<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> FieldWriter<'a> {
    pub(crate) fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn put(&mut self, bytes: &[u8]) {
        self.buf[self.pos..self.pos + bytes.len()].copy_from_slice(bytes);
        self.pos += bytes.len();
    }

    pub(crate) fn u8(&mut self, value: u8) {
        self.put(&[value]);
    }

    pub(crate) fn u32(&mut self, value: u32) {
        self.put(&value.to_le_bytes());
    }

    pub(crate) fn decimal(&mut self, value: Decimal) {
        self.put(&value.serialize());
    }

    pub(crate) fn text<const N: usize>(&mut self, value: &FixedText<N>) {
        let bytes = value.as_str().as_bytes();
        let field = &mut self.buf[self.pos..self.pos + N];
        field[..bytes.len()].copy_from_slice(bytes);
        field[bytes.len()..].fill(0);
        self.pos += N;
    }

    /// Number of bytes written so far.
    pub(crate) fn finish(self) -> usize {
        self.pos
    }
}

/// Sequential field reader over a record block.
pub(crate) struct FieldReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> FieldReader<'a> {
    /// Fails with [`CodecError::BadLength`] unless `buf` is exactly `expected` bytes.
    pub(crate) fn new(buf: &'a [u8], expected: usize) -> Result<Self, CodecError> {
        if buf.len() != expected {
            return Err(CodecError::BadLength {
                expected,
                actual: buf.len(),
            });
        }
        Ok(Self { buf, pos: 0 })
    }

    fn take<const W: usize>(&mut self) -> [u8; W] {
        let mut out = [0u8; W];
        out.copy_from_slice(&self.buf[self.pos..self.pos + W]);
        self.pos += W;
        out
    }

    pub(crate) fn u8(&mut self) -> u8 {
        let [value] = self.take::<1>();
        value
    }

    pub(crate) fn u32(&mut self) -> u32 {
        u32::from_le_bytes(self.take::<4>())
    }

    pub(crate) fn decimal(&mut self) -> Decimal {
        Decimal::deserialize(self.take::<16>())
    }

    pub(crate) fn text<const N: usize>(&mut self) -> Result<FixedText<N>, CodecError> {
        let field = &self.buf[self.pos..self.pos + N];
        self.pos += N;
        let end = field.iter().position(|&b| b == 0).unwrap_or(N);
        let text = std::str::from_utf8(&field[..end]).map_err(|_| CodecError::InvalidUtf8)?;
        Ok(FixedText(text.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn fixed_text_rejects_overlong_values() {
        assert_eq!(
            FixedText::<4>::new("hello"),
            Err(CodecError::TextTooLong {
                len: 5,
                capacity: 4
            })
        );
        assert!(FixedText::<5>::new("hello").is_ok());
    }

    #[test]
    fn fixed_text_capacity_counts_bytes_not_chars() {
        // "é" is two bytes in UTF-8.
        assert!(FixedText::<3>::new("éé").is_err());
        assert!(FixedText::<4>::new("éé").is_ok());
    }

    #[test]
    fn fixed_text_rejects_nul() {
        assert_eq!(FixedText::<8>::new("a\0b"), Err(CodecError::TextContainsNul));
    }

    #[test]
    fn text_is_nul_padded() {
        let mut buf = [0xAAu8; 6];
        let mut writer = FieldWriter::new(&mut buf);
        writer.text(&FixedText::<6>::new("abc").unwrap());
        assert_eq!(writer.finish(), 6);
        assert_eq!(buf, *b"abc\0\0\0");
    }

    #[test]
    fn full_width_text_round_trips_without_terminator() {
        let mut buf = [0u8; 4];
        FieldWriter::new(&mut buf).text(&FixedText::<4>::new("abcd").unwrap());
        let mut reader = FieldReader::new(&buf, 4).unwrap();
        assert_eq!(reader.text::<4>().unwrap(), "abcd");
    }

    #[test]
    fn fields_are_read_back_in_order() {
        let mut buf = [0u8; 1 + 4 + 16 + 8];
        let mut writer = FieldWriter::new(&mut buf);
        writer.u8(3);
        writer.u32(0xDEAD_BEEF);
        writer.decimal(dec!(8560.7481));
        writer.text(&FixedText::<8>::new("car").unwrap());
        assert_eq!(writer.finish(), buf.len());

        let mut reader = FieldReader::new(&buf, buf.len()).unwrap();
        assert_eq!(reader.u8(), 3);
        assert_eq!(reader.u32(), 0xDEAD_BEEF);
        assert_eq!(reader.decimal(), dec!(8560.7481));
        assert_eq!(reader.text::<8>().unwrap(), "car");
    }

    #[test]
    fn u32_is_little_endian() {
        let mut buf = [0u8; 4];
        FieldWriter::new(&mut buf).u32(1);
        assert_eq!(buf, [1, 0, 0, 0]);
    }

    #[test]
    fn invalid_utf8_is_reported() {
        let buf = [0xFFu8, 0xFE, 0, 0];
        let mut reader = FieldReader::new(&buf, 4).unwrap();
        assert_eq!(reader.text::<4>(), Err(CodecError::InvalidUtf8));
    }

    #[test]
    fn reader_checks_block_length() {
        let buf = [0u8; 3];
        assert_eq!(
            FieldReader::new(&buf, 4).err(),
            Some(CodecError::BadLength {
                expected: 4,
                actual: 3
            })
        );
    }
}
