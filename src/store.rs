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

//! Sequential file of fixed-size records.
//!
//! A [`RecordStore`] has no header, record count or magic number; the file
//! is just `len * T::SIZE` bytes of encoded records and end-of-file is the
//! only terminator. Files are opened per operation and closed when the
//! handle drops, on every exit path.
//!
//! The only mutations are [`append`](RecordStore::append) and
//! [`rewrite_at`](RecordStore::rewrite_at). Neither changes the position of
//! an existing record, so an index returned by
//! [`find_first`](RecordStore::find_first) stays valid until the file is
//! replaced.

use crate::codec::Record;
use crate::error::StoreError;
use parking_lot::{Mutex, MutexGuard};
use std::fs::{File, OpenOptions};
use std::io::{self, BufReader, ErrorKind, Read, Seek, SeekFrom, Write};
use std::iter::FusedIterator;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Append-only file of `T` records with in-place rewrite.
#[derive(Debug)]
pub struct RecordStore<T> {
    path: PathBuf,
    /// Serializes check-then-write sequences within this process.
    write_lock: Mutex<()>,
    _record: PhantomData<fn() -> T>,
}

impl<T: Record> RecordStore<T> {
    /// Creates a store backed by `path`. The file is not touched until the
    /// first operation; a missing file reads as an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
            _record: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Acquires the store's write lock.
    ///
    /// Callers hold the guard across a scan and the write that depends on it
    /// (uniqueness check then append, find then rewrite). The store's own
    /// methods never take this lock, so reads under the guard are fine.
    pub fn lock(&self) -> MutexGuard<'_, ()> {
        self.write_lock.lock()
    }

    /// Appends one record to the end of the file, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the file cannot be opened or the write
    /// is short.
    pub fn append(&self, record: &T) -> Result<(), StoreError> {
        let block = record.to_bytes();
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|source| self.io_error(source))?;
        file.write_all(&block)
            .and_then(|()| file.flush())
            .map_err(|source| self.io_error(source))?;
        debug!(path = %self.path.display(), bytes = block.len(), "appended record");
        Ok(())
    }

    /// Starts a fresh pass over the records in file order.
    ///
    /// A missing file yields an empty sequence.
    pub fn scan(&self) -> Result<Scan<T>, StoreError> {
        let reader = match File::open(&self.path) {
            Ok(file) => Some(BufReader::new(file)),
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(source) => return Err(self.io_error(source)),
        };
        Ok(Scan {
            path: self.path.clone(),
            reader,
            index: 0,
            block: vec![0u8; T::SIZE],
            _record: PhantomData,
        })
    }

    /// Returns the first record matching `predicate` with its position.
    pub fn find_first<P>(&self, mut predicate: P) -> Result<Option<(usize, T)>, StoreError>
    where
        P: FnMut(&T) -> bool,
    {
        for (index, record) in self.scan()?.enumerate() {
            let record = record?;
            if predicate(&record) {
                return Ok(Some((index, record)));
            }
        }
        Ok(None)
    }

    /// Number of complete records in the file.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Corrupt`] if the file length is not a multiple
    /// of the record size.
    pub fn len(&self) -> Result<usize, StoreError> {
        let bytes = match std::fs::metadata(&self.path) {
            Ok(meta) => meta.len(),
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
            Err(source) => return Err(self.io_error(source)),
        };
        let size = T::SIZE as u64;
        let trailing = bytes % size;
        if trailing != 0 {
            warn!(
                path = %self.path.display(),
                bytes,
                record_size = T::SIZE,
                "store length is not a whole number of records"
            );
            return Err(StoreError::Corrupt {
                path: self.path.clone(),
                offset: bytes - trailing,
                trailing: trailing as usize,
                record_size: T::SIZE,
            });
        }
        Ok((bytes / size) as usize)
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }

    /// Overwrites the record at `index` with `record`.
    ///
    /// The file length never changes.
    ///
    /// # Errors
    ///
    /// - [`StoreError::OutOfBounds`] if `index` is not an existing record.
    /// - [`StoreError::Corrupt`] if the file ends in a partial record.
    /// - [`StoreError::Io`] if the file cannot be opened or written.
    pub fn rewrite_at(&self, index: usize, record: &T) -> Result<(), StoreError> {
        let len = self.len()?;
        if index >= len {
            return Err(StoreError::OutOfBounds { index, len });
        }
        let block = record.to_bytes();
        let mut file = OpenOptions::new()
            .write(true)
            .open(&self.path)
            .map_err(|source| self.io_error(source))?;
        file.seek(SeekFrom::Start((index * T::SIZE) as u64))
            .and_then(|_| file.write_all(&block))
            .and_then(|()| file.flush())
            .map_err(|source| self.io_error(source))?;
        debug!(path = %self.path.display(), index, "rewrote record");
        Ok(())
    }

    fn io_error(&self, source: io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

/// Lazy pass over a [`RecordStore`], one block at a time.
///
/// A trailing partial block produces a single [`StoreError::Corrupt`] and
/// ends the pass. A block that fails to decode produces
/// [`StoreError::Decode`] and the pass continues with the next block.
#[derive(Debug)]
pub struct Scan<T> {
    path: PathBuf,
    reader: Option<BufReader<File>>,
    index: usize,
    block: Vec<u8>,
    _record: PhantomData<fn() -> T>,
}

impl<T: Record> Iterator for Scan<T> {
    type Item = Result<T, StoreError>;

    fn next(&mut self) -> Option<Self::Item> {
        let reader = self.reader.as_mut()?;
        let filled = match fill_block(reader, &mut self.block) {
            Ok(filled) => filled,
            Err(source) => {
                self.reader = None;
                return Some(Err(StoreError::Io {
                    path: self.path.clone(),
                    source,
                }));
            }
        };

        if filled == 0 {
            self.reader = None;
            return None;
        }

        if filled < T::SIZE {
            self.reader = None;
            let offset = (self.index * T::SIZE) as u64;
            warn!(
                path = %self.path.display(),
                offset,
                trailing = filled,
                "partial record at end of store"
            );
            return Some(Err(StoreError::Corrupt {
                path: self.path.clone(),
                offset,
                trailing: filled,
                record_size: T::SIZE,
            }));
        }

        let index = self.index;
        self.index += 1;
        Some(T::decode(&self.block).map_err(|source| StoreError::Decode {
            path: self.path.clone(),
            index,
            source,
        }))
    }
}

impl<T: Record> FusedIterator for Scan<T> {}

/// Reads until `block` is full or the reader is exhausted, returning the
/// number of bytes read.
fn fill_block(reader: &mut impl Read, block: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < block.len() {
        match reader.read(&mut block[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{FieldReader, FieldWriter};
    use crate::error::CodecError;

    #[derive(Debug, Clone, PartialEq)]
    struct Pair(u32, u32);

    impl Record for Pair {
        const SIZE: usize = 8;

        fn encode(&self, buf: &mut [u8]) {
            let mut writer = FieldWriter::new(buf);
            writer.u32(self.0);
            writer.u32(self.1);
        }

        fn decode(buf: &[u8]) -> Result<Self, CodecError> {
            let mut reader = FieldReader::new(buf, Self::SIZE)?;
            Ok(Pair(reader.u32(), reader.u32()))
        }
    }

    fn store() -> (tempfile::TempDir, RecordStore<Pair>) {
        let dir = tempfile::tempdir().unwrap();
        let store = RecordStore::open(dir.path().join("pairs.dat"));
        (dir, store)
    }

    #[test]
    fn fill_block_reports_short_reads() {
        let mut reader: &[u8] = &[1, 2, 3];
        let mut block = [0u8; 8];
        assert_eq!(fill_block(&mut reader, &mut block).unwrap(), 3);
        assert_eq!(fill_block(&mut reader, &mut block).unwrap(), 0);
    }

    #[test]
    fn missing_file_scans_empty() {
        let (_dir, store) = store();
        assert_eq!(store.scan().unwrap().count(), 0);
        assert_eq!(store.len().unwrap(), 0);
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn scan_is_fused_after_end() {
        let (_dir, store) = store();
        store.append(&Pair(1, 1)).unwrap();
        let mut scan = store.scan().unwrap();
        assert!(scan.next().is_some());
        assert!(scan.next().is_none());
        assert!(scan.next().is_none());
    }

    #[test]
    fn find_first_returns_position() {
        let (_dir, store) = store();
        for i in 0..5 {
            store.append(&Pair(i, i * 10)).unwrap();
        }
        let found = store.find_first(|p| p.1 >= 25).unwrap();
        assert_eq!(found, Some((3, Pair(3, 30))));
        assert_eq!(store.find_first(|p| p.0 == 99).unwrap(), None);
    }
}
