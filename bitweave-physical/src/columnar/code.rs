//! This module defines the representation of codes
//! and the physical [Layout] of a column.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Fixed-width unsigned integer stored in a column
pub type Code = u64;

/// Machine word holding packed codes
pub type Word = u64;

/// Number of bits in a [Word]
pub const WORD_BITS: usize = Word::BITS as usize;

/// Physical packing scheme of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layout {
    /// BitWeaving/H: codes packed side by side, each followed by a delimiter bit
    Horizontal,
    /// BitWeaving/V: codes sliced into one bit-plane word per segment of rows
    Vertical,
}

impl Layout {
    /// Largest bit width a column with this layout can hold.
    pub fn max_bit_width(self) -> u8 {
        match self {
            // The delimiter bit has to fit into the same word
            Layout::Horizontal => (WORD_BITS - 1) as u8,
            Layout::Vertical => WORD_BITS as u8,
        }
    }

    /// Tag used in persisted column files.
    pub(crate) fn tag(self) -> u8 {
        match self {
            Layout::Horizontal => 0,
            Layout::Vertical => 1,
        }
    }

    /// Inverse of [Layout::tag].
    pub(crate) fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(Layout::Horizontal),
            1 => Some(Layout::Vertical),
            _ => None,
        }
    }

    /// Checks whether this layout can store codes of the given width.
    pub fn check_bit_width(self, bit_width: u8) -> Result<(), Error> {
        if bit_width == 0 || usize::from(bit_width) > WORD_BITS {
            return Err(Error::InvalidBitWidth(bit_width));
        }

        if bit_width > self.max_bit_width() {
            return Err(Error::InvalidLayout {
                layout: self,
                bit_width,
            });
        }

        Ok(())
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Layout::Horizontal => write!(f, "BitWeaving/H"),
            Layout::Vertical => write!(f, "BitWeaving/V"),
        }
    }
}

impl FromStr for Layout {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "h" | "horizontal" => Ok(Layout::Horizontal),
            "v" | "vertical" => Ok(Layout::Vertical),
            _ => Err(Error::UnknownLayout(s.to_string())),
        }
    }
}

/// Returns the largest code representable with `bit_width` bits.
pub fn max_code(bit_width: u8) -> Code {
    if usize::from(bit_width) >= WORD_BITS {
        Code::MAX
    } else {
        (1 << bit_width) - 1
    }
}

/// Checks that `code` fits into `bit_width` bits.
pub(crate) fn check_code(code: Code, bit_width: u8) -> Result<(), Error> {
    if code > max_code(bit_width) {
        return Err(Error::OutOfRangeCode { code, bit_width });
    }

    Ok(())
}

/// Mask with the lowest `bits` bits set.
pub(crate) fn low_bits(bits: usize) -> Word {
    if bits >= WORD_BITS {
        Word::MAX
    } else {
        (1 << bits) - 1
    }
}
