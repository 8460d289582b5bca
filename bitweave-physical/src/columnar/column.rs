//! This module defines [Column],
//! which owns the packed codes of one attribute.

use std::mem::size_of;

use crate::{
    columnar::{
        bitvector::BitVector,
        code::{check_code, max_code, Code, Layout, Word},
        column_storage::{BitweavingStorage, ColumnStorage, ScanStatistics},
    },
    error::Error,
    management::bytesized::ByteSized,
    predicate::{CombineOp, Comparator, Normalized, Predicate},
};

/// Append-only column of fixed-width codes
///
/// Bit width and layout are fixed when the column is created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    name: String,
    storage: ColumnStorage,
    /// Whether the column still accepts appends
    closed: bool,
}

impl Column {
    /// Create an empty column.
    ///
    /// # Errors
    /// Returns an error if `layout` cannot hold codes of `bit_width` bits.
    pub fn new(name: impl Into<String>, layout: Layout, bit_width: u8) -> Result<Self, Error> {
        Ok(Self {
            name: name.into(),
            storage: ColumnStorage::new(layout, bit_width)?,
            closed: false,
        })
    }

    /// Create a column from previously packed storage.
    pub(crate) fn from_storage(name: String, storage: ColumnStorage) -> Self {
        Self {
            name,
            storage,
            closed: false,
        }
    }

    /// Name of the column.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Physical layout of the column.
    pub fn layout(&self) -> Layout {
        self.storage.layout()
    }

    /// Number of bits per code.
    pub fn bit_width(&self) -> u8 {
        self.storage.bit_width()
    }

    /// Largest code this column can hold.
    pub fn max_code(&self) -> Code {
        max_code(self.bit_width())
    }

    /// Number of codes in this column.
    pub fn num_rows(&self) -> usize {
        self.storage.num_rows()
    }

    /// Returns true iff the column holds no codes.
    pub fn is_empty(&self) -> bool {
        self.num_rows() == 0
    }

    /// Packed words in storage order.
    pub fn words(&self) -> &[Word] {
        self.storage.words()
    }

    /// Whether the column rejects further appends.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Reject all further appends.
    pub fn close(&mut self) {
        self.closed = true;
    }

    /// Append `codes` to the end of the column.
    ///
    /// Either all codes are appended or none.
    ///
    /// # Errors
    /// Returns an error if the column is closed
    /// or if some code does not fit into the bit width.
    pub fn append(&mut self, codes: &[Code]) -> Result<(), Error> {
        if self.closed {
            return Err(Error::ColumnClosed(self.name.clone()));
        }

        let bit_width = self.bit_width();
        codes
            .iter()
            .try_for_each(|&code| check_code(code, bit_width))?;

        log::debug!(
            "Appending {} codes to column \"{}\" ({}, {} bits)",
            codes.len(),
            self.name,
            self.layout(),
            bit_width
        );

        #[cfg(feature = "check_column_storage")]
        let first_row = self.num_rows();

        self.storage.append(codes);

        #[cfg(feature = "check_column_storage")]
        for (offset, &code) in codes.iter().enumerate() {
            assert_eq!(
                self.storage.code(first_row + offset),
                code,
                "Packed code of row {} does not match the appended code",
                first_row + offset
            );
        }

        Ok(())
    }

    /// Decode the code stored in `row`.
    pub fn code(&self, row: usize) -> Result<Code, Error> {
        if row >= self.num_rows() {
            return Err(Error::IndexOutOfBounds {
                index: row,
                capacity: self.num_rows(),
            });
        }

        Ok(self.storage.code(row))
    }

    /// Iterate over all codes of the column in row order.
    pub fn codes(&self) -> impl Iterator<Item = Code> + '_ {
        (0..self.num_rows()).map(|row| self.storage.code(row))
    }

    /// Evaluate `code comparator constant` for every row
    /// and merge the result into `bitvector` according to `op`.
    pub fn scan(
        &self,
        comparator: Comparator,
        constant: Code,
        bitvector: &mut BitVector,
        op: CombineOp,
    ) -> Result<ScanStatistics, Error> {
        self.scan_predicate(&Predicate::compare(comparator, constant), bitvector, op)
    }

    /// Evaluate `predicate` for every row
    /// and merge the result into `bitvector` according to `op`.
    ///
    /// Bits of rows past the end of the column are cleared for [CombineOp::Set]
    /// and left untouched otherwise.
    ///
    /// # Errors
    /// Returns an error if `bitvector` has fewer bits than the column has rows.
    pub fn scan_predicate(
        &self,
        predicate: &Predicate,
        bitvector: &mut BitVector,
        op: CombineOp,
    ) -> Result<ScanStatistics, Error> {
        let num_rows = self.num_rows();
        if bitvector.capacity() < num_rows {
            return Err(Error::IndexOutOfBounds {
                index: num_rows - 1,
                capacity: bitvector.capacity(),
            });
        }

        let statistics = match predicate.normalize(self.max_code()) {
            Normalized::Constant(value) => {
                bitvector.combine_range(0..num_rows, value, op);
                ScanStatistics::default()
            }
            Normalized::Scan(condition) => self.storage.scan(condition, bitvector, op),
        };

        if op == CombineOp::Set {
            bitvector.combine_range(num_rows..bitvector.capacity(), false, op);
        }

        log::trace!(
            "Scanned column \"{}\" for {predicate} ({op:?}): {} rows, {} words read, {} segments skipped",
            self.name,
            num_rows,
            statistics.words_read,
            statistics.segments_skipped
        );

        Ok(statistics)
    }
}

impl ByteSized for Column {
    fn size_bytes(&self) -> u64 {
        let size_storage = match &self.storage {
            ColumnStorage::HorizontalStorage(storage) => storage.size_bytes(),
            ColumnStorage::VerticalStorage(storage) => storage.size_bytes(),
        };

        size_of::<Self>() as u64 + self.name.capacity() as u64 + size_storage
    }
}
