//! Error-handling module for the crate

use thiserror::Error;

use crate::columnar::code::{Code, Layout};

/// Error-Collection for all the possible Errors occurring in this crate
#[derive(Error, Debug)]
pub enum Error {
    /// A code does not fit into the bit width of its column
    #[error("Code {code} does not fit into {bit_width} bits")]
    OutOfRangeCode {
        /// The offending code
        code: Code,
        /// Bit width of the column
        bit_width: u8,
    },
    /// Access to a row or bit beyond the capacity of a structure
    #[error("Index {index} is out of bounds for capacity {capacity}")]
    IndexOutOfBounds {
        /// Requested index
        index: usize,
        /// Capacity of the accessed structure
        capacity: usize,
    },
    /// Two bitvectors of different capacity were combined
    #[error("Cannot combine bitvectors of capacity {0} and {1}")]
    LengthMismatch(usize, usize),
    /// A column with the given name does not exist
    #[error("Column \"{0}\" does not exist")]
    ColumnNotFound(String),
    /// A column with the given name already exists
    #[error("Column \"{0}\" already exists")]
    ColumnExists(String),
    /// The column does not accept modifications anymore
    #[error("Column \"{0}\" is closed")]
    ColumnClosed(String),
    /// The requested layout cannot represent codes of the given width
    #[error("Layout {layout} does not support codes of {bit_width} bits")]
    InvalidLayout {
        /// Requested layout
        layout: Layout,
        /// Requested bit width
        bit_width: u8,
    },
    /// The textual form does not name a layout
    #[error("Unknown layout \"{0}\"")]
    UnknownLayout(String),
    /// Bit widths must lie between 1 and the word size
    #[error("Invalid bit width {0}")]
    InvalidBitWidth(u8),
    /// The iterator is not positioned on a row
    #[error("Iterator is not positioned on a row")]
    InvalidIteratorState,
    /// The textual form does not name a supported comparator
    #[error("Comparator \"{0}\" is not supported")]
    UnsupportedComparator(String),
    /// The textual form does not name a combine operation
    #[error("Unknown combine operation \"{0}\"")]
    UnknownCombineOp(String),
    /// A source column has a datatype that cannot be encoded as codes
    #[error("Column \"{column}\" has unsupported type {datatype}")]
    UnsupportedSourceType {
        /// Name of the source column
        column: String,
        /// Name of its datatype
        datatype: String,
    },
    /// Source columns must not contain negative values
    #[error("Column \"{column}\" contains the negative value {value} in row {row}")]
    NegativeValue {
        /// Name of the source column
        column: String,
        /// The offending value
        value: i64,
        /// Row of the value
        row: usize,
    },
    /// Source columns must not contain nulls
    #[error("Column \"{column}\" contains a null value in row {row}")]
    NullValue {
        /// Name of the source column
        column: String,
        /// Row of the null value
        row: usize,
    },
    /// A stored column file could not be decoded
    #[error("Column file \"{file}\" is corrupt: {reason}")]
    CorruptColumnFile {
        /// Path of the file
        file: String,
        /// What was wrong with it
        reason: String,
    },
    /// Error when reading or writing column files
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// Error raised by arrow when building boundary arrays
    #[error(transparent)]
    Arrow(#[from] arrow::error::ArrowError),
}
