//! This module implements the on-disk format of a single column.
//!
//! A column file starts with a fixed header
//!
//! | bytes  | content                           |
//! |--------|-----------------------------------|
//! | 0..4   | magic `BWVC`                      |
//! | 4      | format version                    |
//! | 5      | layout tag                        |
//! | 6      | bit width                         |
//! | 7      | reserved, zero                    |
//! | 8..16  | number of rows (u64, little end.) |
//! | 16..24 | number of words (u64, little end.)|
//!
//! followed by the packed words of the column in storage order,
//! each as a little endian u64.
//! The name of the column is the url-decoded file stem.

use std::{
    fs::File,
    io::{BufWriter, Write},
    mem::size_of,
    path::{Path, PathBuf},
};

use crate::{
    columnar::{
        code::{Layout, Word},
        column::Column,
        column_storage::ColumnStorage,
    },
    error::Error,
};

/// Extension of column files
pub(crate) const COLUMN_FILE_EXTENSION: &str = "bwc";

const MAGIC: &[u8; 4] = b"BWVC";
const FORMAT_VERSION: u8 = 1;
const HEADER_BYTES: usize = 24;
const WORD_BYTES: usize = size_of::<Word>();

/// Path of the file storing the column `name` within `directory`.
pub(crate) fn column_file(directory: &Path, name: &str) -> PathBuf {
    directory.join(format!(
        "{}.{COLUMN_FILE_EXTENSION}",
        urlencoding::encode(name)
    ))
}

/// Returns whether `path` looks like a column file.
pub(crate) fn is_column_file(path: &Path) -> bool {
    path.is_file() && path.extension().is_some_and(|ext| ext == COLUMN_FILE_EXTENSION)
}

fn corrupt(path: &Path, reason: impl Into<String>) -> Error {
    Error::CorruptColumnFile {
        file: path.display().to_string(),
        reason: reason.into(),
    }
}

/// Serialize the header and words of `column`.
fn encode_column(column: &Column) -> Vec<u8> {
    let words = column.words();
    let mut bytes = Vec::with_capacity(HEADER_BYTES + words.len() * WORD_BYTES);

    bytes.extend_from_slice(MAGIC);
    bytes.push(FORMAT_VERSION);
    bytes.push(column.layout().tag());
    bytes.push(column.bit_width());
    bytes.push(0);
    bytes.extend_from_slice(&(column.num_rows() as u64).to_le_bytes());
    bytes.extend_from_slice(&(words.len() as u64).to_le_bytes());

    for word in words {
        bytes.extend_from_slice(&word.to_le_bytes());
    }

    bytes
}

/// Write `column` into `directory`, replacing a previous version.
pub(crate) fn write_column(directory: &Path, column: &Column) -> Result<PathBuf, Error> {
    let path = column_file(directory, column.name());

    let mut writer = BufWriter::new(File::create(&path)?);
    writer.write_all(&encode_column(column))?;
    writer.flush()?;

    log::debug!(
        "Stored column \"{}\" with {} rows in {}",
        column.name(),
        column.num_rows(),
        path.display()
    );

    Ok(path)
}

fn read_u64(bytes: &[u8], offset: usize) -> u64 {
    let mut buffer = [0u8; 8];
    buffer.copy_from_slice(&bytes[offset..offset + 8]);
    u64::from_le_bytes(buffer)
}

/// Decode a column from the contents of the file at `path`.
fn decode_column(path: &Path, bytes: &[u8]) -> Result<Column, Error> {
    let name = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .ok_or_else(|| corrupt(path, "file name is not valid unicode"))?;
    let name = urlencoding::decode(name)
        .map_err(|_| corrupt(path, "file name is not a valid column name"))?
        .into_owned();

    if bytes.len() < HEADER_BYTES {
        return Err(corrupt(path, "file is shorter than the header"));
    }
    if &bytes[0..4] != MAGIC {
        return Err(corrupt(path, "missing magic number"));
    }
    if bytes[4] != FORMAT_VERSION {
        return Err(corrupt(path, format!("unsupported version {}", bytes[4])));
    }

    let layout = Layout::from_tag(bytes[5])
        .ok_or_else(|| corrupt(path, format!("unknown layout tag {}", bytes[5])))?;
    let bit_width = bytes[6];
    layout
        .check_bit_width(bit_width)
        .map_err(|error| corrupt(path, error.to_string()))?;

    let num_rows = usize::try_from(read_u64(bytes, 8))
        .map_err(|_| corrupt(path, "row count exceeds the address space"))?;
    let num_words = usize::try_from(read_u64(bytes, 16))
        .map_err(|_| corrupt(path, "word count exceeds the address space"))?;

    let expected = ColumnStorage::expected_words(layout, bit_width, num_rows)
        .ok_or_else(|| corrupt(path, format!("{num_rows} rows exceed the address space")))?;
    if num_words != expected {
        return Err(corrupt(
            path,
            format!("{num_rows} rows require {expected} words, header states {num_words}"),
        ));
    }

    let payload = &bytes[HEADER_BYTES..];
    let payload_bytes = num_words
        .checked_mul(WORD_BYTES)
        .ok_or_else(|| corrupt(path, "word count exceeds the address space"))?;
    if payload.len() != payload_bytes {
        return Err(corrupt(
            path,
            format!(
                "expected {payload_bytes} bytes of words, found {}",
                payload.len()
            ),
        ));
    }

    let words: Vec<Word> = payload
        .chunks_exact(WORD_BYTES)
        .map(|chunk| read_u64(chunk, 0))
        .collect();

    let storage = ColumnStorage::from_words(layout, bit_width, num_rows, words)
        .ok_or_else(|| corrupt(path, "words contain bits outside of the stored codes"))?;

    Ok(Column::from_storage(name, storage))
}

/// Read the column stored at `path`.
pub(crate) fn read_column(path: &Path) -> Result<Column, Error> {
    let bytes = std::fs::read(path)?;
    let column = decode_column(path, &bytes)?;

    log::debug!(
        "Loaded column \"{}\" ({}, {} bits, {} rows) from {}",
        column.name(),
        column.layout(),
        column.bit_width(),
        column.num_rows(),
        path.display()
    );

    Ok(column)
}
