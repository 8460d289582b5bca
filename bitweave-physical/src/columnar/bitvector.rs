//! This module defines [BitVector],
//! a dense bitmap holding one match bit per row.

use std::{mem::size_of, ops::Range};

use arrow::{
    array::BooleanArray,
    buffer::{BooleanBuffer, Buffer},
};
use bitvec::{order::Lsb0, vec::BitVec};

use crate::{
    columnar::code::{low_bits, Word, WORD_BITS},
    error::Error,
    management::bytesized::ByteSized,
    predicate::CombineOp,
};

/// Dense bitmap with a fixed capacity
///
/// Word `i` of the underlying storage holds the bits of rows `64 * i .. 64 * (i + 1)`,
/// the bit of row `r` being bit `r % 64` of its word.
/// Bits beyond the capacity are always zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitVector {
    bits: BitVec<Word, Lsb0>,
}

impl BitVector {
    /// Create a [BitVector] with `capacity` unset bits.
    pub fn new(capacity: usize) -> Self {
        Self {
            bits: BitVec::repeat(false, capacity),
        }
    }

    /// Create a [BitVector] with `capacity` set bits.
    pub fn full(capacity: usize) -> Self {
        let mut result = Self::new(capacity);
        result.set_all();
        result
    }

    /// Number of bits in this vector.
    pub fn capacity(&self) -> usize {
        self.bits.len()
    }

    /// Number of words backing this vector.
    pub fn len_words(&self) -> usize {
        self.capacity().div_ceil(WORD_BITS)
    }

    /// Number of set bits.
    pub fn count(&self) -> usize {
        self.bits.count_ones()
    }

    fn check_index(&self, index: usize) -> Result<(), Error> {
        if index >= self.capacity() {
            return Err(Error::IndexOutOfBounds {
                index,
                capacity: self.capacity(),
            });
        }

        Ok(())
    }

    /// Return whether the bit at `index` is set.
    pub fn test_bit(&self, index: usize) -> Result<bool, Error> {
        self.check_index(index)?;
        Ok(self.bits[index])
    }

    /// Set the bit at `index` to `value`.
    pub fn set_bit(&mut self, index: usize, value: bool) -> Result<(), Error> {
        self.check_index(index)?;
        self.bits.set(index, value);
        Ok(())
    }

    /// Set every bit.
    pub fn set_all(&mut self) {
        self.bits.fill(true);
    }

    /// Unset every bit.
    pub fn clear(&mut self) {
        self.bits.fill(false);
    }

    /// Complement every bit.
    pub fn negate(&mut self) {
        for index in 0..self.len_words() {
            let valid = self.valid_mask(index);
            let words = self.bits.as_raw_mut_slice();
            words[index] = !words[index] & valid;
        }
    }

    /// Merge `other` into this vector.
    pub fn combine(&mut self, other: &BitVector, op: CombineOp) -> Result<(), Error> {
        if other.capacity() != self.capacity() {
            return Err(Error::LengthMismatch(self.capacity(), other.capacity()));
        }

        let words = self.bits.as_raw_mut_slice();
        for (word, other_word) in words.iter_mut().zip(other.bits.as_raw_slice()) {
            *word = op.apply(*word, *other_word);
        }

        Ok(())
    }

    /// Intersect this vector with `other`.
    pub fn combine_and(&mut self, other: &BitVector) -> Result<(), Error> {
        self.combine(other, CombineOp::And)
    }

    /// Unite this vector with `other`.
    pub fn combine_or(&mut self, other: &BitVector) -> Result<(), Error> {
        self.combine(other, CombineOp::Or)
    }

    /// Return the index of the first set bit at or after `from`.
    pub fn next_set_bit(&self, from: usize) -> Option<usize> {
        self.bits
            .get(from..)
            .and_then(|rest| rest.first_one())
            .map(|offset| from + offset)
    }

    /// Iterate over the indices of the set bits in ascending order.
    pub fn iter_ones(&self) -> impl Iterator<Item = usize> + '_ {
        self.bits.iter_ones()
    }

    /// Raw words of this vector.
    pub fn words(&self) -> &[Word] {
        self.bits.as_raw_slice()
    }

    /// Mask of the bits of word `index` that lie within the capacity.
    pub(crate) fn valid_mask(&self, index: usize) -> Word {
        let start = index * WORD_BITS;
        low_bits(self.capacity().saturating_sub(start))
    }

    /// Return word `index`.
    pub(crate) fn word(&self, index: usize) -> Word {
        self.bits.as_raw_slice()[index]
    }

    /// Merge `bits` into word `index`, touching only the bits selected by `mask`.
    pub(crate) fn combine_word(&mut self, index: usize, bits: Word, mask: Word, op: CombineOp) {
        let mask = mask & self.valid_mask(index);
        let word = &mut self.bits.as_raw_mut_slice()[index];
        let merged = op.apply(*word, bits);
        *word = (*word & !mask) | (merged & mask);
    }

    /// Merge the lowest `len` bits of `bits` into the rows starting at `offset`.
    ///
    /// The rows may span two words.
    pub(crate) fn combine_bits(&mut self, offset: usize, len: usize, bits: Word, op: CombineOp) {
        debug_assert!(len <= WORD_BITS);
        if len == 0 {
            return;
        }

        let bits = bits & low_bits(len);
        let index = offset / WORD_BITS;
        let shift = offset % WORD_BITS;

        self.combine_word(index, bits << shift, low_bits(len) << shift, op);

        if shift + len > WORD_BITS {
            let spill = WORD_BITS - shift;
            self.combine_word(index + 1, bits >> spill, low_bits(len - spill), op);
        }
    }

    /// Merge the same value into every row of `rows`.
    pub(crate) fn combine_range(&mut self, rows: Range<usize>, value: bool, op: CombineOp) {
        let bits = if value { Word::MAX } else { 0 };
        let mut offset = rows.start;

        while offset < rows.end {
            let len = (WORD_BITS - offset % WORD_BITS).min(rows.end - offset);
            self.combine_bits(offset, len, bits, op);
            offset += len;
        }
    }
}

impl From<BitVec<Word, Lsb0>> for BitVector {
    fn from(mut bits: BitVec<Word, Lsb0>) -> Self {
        // Bits past the end may hold arbitrary values
        let len = bits.len();
        if let Some(last) = bits.as_raw_mut_slice().last_mut() {
            let used = len % WORD_BITS;
            if used != 0 {
                *last &= low_bits(used);
            }
        }

        Self { bits }
    }
}

impl From<BitVector> for BitVec<Word, Lsb0> {
    fn from(value: BitVector) -> Self {
        value.bits
    }
}

impl From<&BitVector> for BooleanArray {
    fn from(value: &BitVector) -> Self {
        let buffer = Buffer::from_iter(value.words().iter().flat_map(|word| word.to_le_bytes()));
        BooleanArray::new(BooleanBuffer::new(buffer, 0, value.capacity()), None)
    }
}

impl From<&BooleanArray> for BitVector {
    /// Null entries are treated as unset.
    fn from(value: &BooleanArray) -> Self {
        let mut result = BitVector::new(value.len());
        for (index, entry) in value.iter().enumerate() {
            if entry == Some(true) {
                result.bits.set(index, true);
            }
        }

        result
    }
}

impl ByteSized for BitVector {
    fn size_bytes(&self) -> u64 {
        size_of::<Self>() as u64 + self.bits.capacity() as u64 / 8
    }
}

#[cfg(test)]
mod test {
    use arrow::array::BooleanArray;
    use bitvec::{bitvec, order::Lsb0};

    use super::BitVector;
    use crate::{error::Error, predicate::CombineOp};

    #[test]
    fn bitvector_create() {
        let empty = BitVector::new(130);
        assert_eq!(empty.capacity(), 130);
        assert_eq!(empty.len_words(), 3);
        assert_eq!(empty.count(), 0);

        let full = BitVector::full(130);
        assert_eq!(full.count(), 130);
        assert_eq!(full.words()[2], 0b11);
    }

    #[test]
    fn bitvector_bits() {
        let mut bits = BitVector::new(70);
        bits.set_bit(3, true).unwrap();
        bits.set_bit(69, true).unwrap();
        bits.set_bit(3, false).unwrap();
        bits.set_bit(64, true).unwrap();

        assert!(!bits.test_bit(3).unwrap());
        assert!(bits.test_bit(64).unwrap());
        assert_eq!(bits.count(), 2);
        assert_eq!(bits.iter_ones().collect::<Vec<_>>(), vec![64, 69]);

        assert!(matches!(
            bits.test_bit(70),
            Err(Error::IndexOutOfBounds {
                index: 70,
                capacity: 70
            })
        ));
        assert!(bits.set_bit(100, true).is_err());
    }

    #[test]
    fn bitvector_combine() {
        let mut left = BitVector::new(100);
        let mut right = BitVector::new(100);
        for index in [1, 5, 64, 99] {
            left.set_bit(index, true).unwrap();
        }
        for index in [5, 64, 80] {
            right.set_bit(index, true).unwrap();
        }

        let mut intersection = left.clone();
        intersection.combine_and(&right).unwrap();
        assert_eq!(intersection.iter_ones().collect::<Vec<_>>(), vec![5, 64]);

        let mut union = left.clone();
        union.combine_or(&right).unwrap();
        assert_eq!(
            union.iter_ones().collect::<Vec<_>>(),
            vec![1, 5, 64, 80, 99]
        );

        let other = BitVector::new(99);
        assert!(matches!(
            left.combine_and(&other),
            Err(Error::LengthMismatch(100, 99))
        ));
    }

    #[test]
    fn bitvector_negate_keeps_tail_clear() {
        let mut bits = BitVector::new(67);
        bits.set_bit(66, true).unwrap();
        bits.negate();

        assert_eq!(bits.count(), 66);
        assert_eq!(bits.words()[1], 0b011);
    }

    #[test]
    fn bitvector_combine_bits_across_words() {
        let mut bits = BitVector::new(128);
        bits.combine_bits(60, 8, 0b1011_0111, CombineOp::Set);
        assert_eq!(
            bits.iter_ones().collect::<Vec<_>>(),
            vec![60, 61, 62, 64, 65, 67]
        );

        bits.combine_bits(60, 8, 0b0000_0101, CombineOp::And);
        assert_eq!(bits.iter_ones().collect::<Vec<_>>(), vec![60, 62]);

        bits.combine_range(100..128, true, CombineOp::Or);
        assert_eq!(bits.count(), 30);
    }

    #[test]
    fn bitvector_next_set_bit() {
        let mut bits = BitVector::new(200);
        bits.set_bit(7, true).unwrap();
        bits.set_bit(150, true).unwrap();

        assert_eq!(bits.next_set_bit(0), Some(7));
        assert_eq!(bits.next_set_bit(8), Some(150));
        assert_eq!(bits.next_set_bit(151), None);
        assert_eq!(bits.next_set_bit(500), None);
    }

    #[test]
    fn bitvector_arrow_boundary() {
        let mut bits = BitVector::new(70);
        bits.set_bit(0, true).unwrap();
        bits.set_bit(65, true).unwrap();

        let array = BooleanArray::from(&bits);
        assert_eq!(array.len(), 70);
        assert_eq!(array.true_count(), 2);
        assert!(array.value(65));
        assert!(!array.value(64));

        let restored = BitVector::from(&array);
        assert_eq!(restored, bits);

        let with_nulls = BooleanArray::from(vec![Some(true), None, Some(false), Some(true)]);
        let bits = BitVector::from(&with_nulls);
        assert_eq!(bits.iter_ones().collect::<Vec<_>>(), vec![0, 3]);
    }

    #[test]
    fn bitvector_from_bitvec() {
        let raw = bitvec![u64, Lsb0; 1, 0, 1, 1];
        let bits = BitVector::from(raw);
        assert_eq!(bits.count(), 3);
        assert_eq!(bits.words(), &[0b1101]);
    }
}
