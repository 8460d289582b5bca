//! This module defines all the errors that can occur while executing bwv.

use std::path::PathBuf;

use thiserror::Error;

/// Error that occur during execution of the BitWeaving CLI app
#[derive(Error, Debug)]
pub enum CliError {
    /// Error if neither --where nor --query was given
    #[error("no predicate was given, use --where or --query")]
    NoQuery,
    /// Error if an indexed column is missing from the header of the input file
    #[error("input file has no column \"{column}\"")]
    MissingColumn {
        /// Name of the requested column
        column: String,
    },
    /// Error if a value of an indexed column is not an unsigned integer
    #[error("value \"{value}\" in column \"{column}\", row {row} is not an unsigned integer")]
    InvalidValue {
        /// Name of the column
        column: String,
        /// Row of the value, not counting the header
        row: usize,
        /// The offending value
        value: String,
    },
    /// Error while reading a query file
    #[error("unable to parse query file {}: {error}", filename.display())]
    QueryParsing {
        /// Path of the query file
        filename: PathBuf,
        /// Error from json parsing
        error: serde_json::Error,
    },
    /// Error resulting from io operations
    #[error(transparent)]
    IoError(#[from] std::io::Error),
    /// Error while reading the input file
    #[error(transparent)]
    CsvError(#[from] csv::Error),
    /// Error while assembling the input batch
    #[error(transparent)]
    ArrowError(#[from] arrow::error::ArrowError),
    /// Error while formatting the timing report
    #[error(transparent)]
    FormatError(#[from] std::fmt::Error),
    /// Error originating from the BitWeaving library
    #[error(transparent)]
    BitweaveError(#[from] bitweave_physical::error::Error),
}
