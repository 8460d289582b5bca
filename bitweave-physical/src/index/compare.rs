//! This module implements the Compare entry points,
//! which run sequences of scans against the columns of a [BwTable].

use arrow::array::BooleanArray;
use serde::{Deserialize, Serialize};

use crate::{
    columnar::{bitvector::BitVector, code::Code, ScanStatistics},
    error::Error,
    predicate::{CombineOp, Comparator, Predicate},
    tabular::table::BwTable,
};

/// One scan of a [CompareOptions] batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompareOptionsUnit {
    /// Predicate evaluated on each code
    pub predicate: Predicate,
    /// How the result is merged with the rows selected so far
    #[serde(default)]
    pub combine_op: CombineOp,
}

impl CompareOptionsUnit {
    /// Create a unit comparing codes against a constant.
    pub fn new(comparator: Comparator, constant: Code, combine_op: CombineOp) -> Self {
        Self {
            predicate: Predicate::compare(comparator, constant),
            combine_op,
        }
    }
}

/// Sequence of scans on one column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompareOptions {
    /// Name of the scanned column
    pub column: String,
    /// Scans in the order they are applied
    pub units: Vec<CompareOptionsUnit>,
}

impl CompareOptions {
    /// Create options without any scans for `column`.
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            units: Vec::new(),
        }
    }

    /// Append a scan.
    pub fn with_unit(mut self, unit: CompareOptionsUnit) -> Self {
        self.units.push(unit);
        self
    }
}

/// Evaluate a single comparison on `column`.
pub fn compare(
    table: &BwTable,
    column: &str,
    comparator: Comparator,
    constant: Code,
    combine_op: CombineOp,
) -> Result<BooleanArray, Error> {
    let options = CompareOptions::new(column).with_unit(CompareOptionsUnit::new(
        comparator, constant, combine_op,
    ));

    compare_batch(table, &[options])
}

/// Apply all scans of `options` in order to a bitvector with no rows selected
/// and return the rows selected in the end.
pub fn compare_batch(table: &BwTable, options: &[CompareOptions]) -> Result<BooleanArray, Error> {
    let mut bitvector = table.create_bitvector();
    compare_into(table, options, &mut bitvector)?;

    Ok(BooleanArray::from(&bitvector))
}

/// Apply all scans of `options` in order to `bitvector`.
///
/// On error the content of `bitvector` is unspecified.
pub fn compare_into(
    table: &BwTable,
    options: &[CompareOptions],
    bitvector: &mut BitVector,
) -> Result<ScanStatistics, Error> {
    let mut statistics = ScanStatistics::default();

    for option in options {
        let column = table.column(&option.column)?;

        for unit in &option.units {
            statistics.merge(column.scan_predicate(&unit.predicate, bitvector, unit.combine_op)?);
        }
    }

    log::debug!(
        "Compared {} columns: {} of {} rows selected, {} words read, {} segments skipped",
        options.len(),
        bitvector.count(),
        bitvector.capacity(),
        statistics.words_read,
        statistics.segments_skipped
    );

    Ok(statistics)
}
