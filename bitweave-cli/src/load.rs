//! Reading the indexed columns of a CSV file into an Arrow record batch

use std::{path::Path, sync::Arc};

use arrow::{
    array::{ArrayRef, UInt64Array},
    record_batch::RecordBatch,
};
use bitweave_physical::index::ColumnIndexUnit;

use crate::error::CliError;

/// Wrap the values of one column into an Arrow array.
fn codes_array(values: Vec<u64>) -> ArrayRef {
    Arc::new(UInt64Array::from(values))
}

/// Read the columns named in `units` from the CSV file at `path`.
///
/// The first line of the file is expected to contain the column names.
pub(crate) fn load_csv(path: &Path, units: &[ColumnIndexUnit]) -> Result<RecordBatch, CliError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)?;

    let headers = reader.headers()?.clone();
    let positions = units
        .iter()
        .map(|unit| {
            headers
                .iter()
                .position(|header| header == unit.name)
                .ok_or_else(|| CliError::MissingColumn {
                    column: unit.name.clone(),
                })
        })
        .collect::<Result<Vec<usize>, CliError>>()?;

    let mut values: Vec<Vec<u64>> = vec![Vec::new(); units.len()];
    for (row, record) in reader.records().enumerate() {
        let record = record?;

        for ((unit, &position), column) in units.iter().zip(&positions).zip(values.iter_mut()) {
            let field = record.get(position).unwrap_or_default();
            let value = field.parse::<u64>().map_err(|_| CliError::InvalidValue {
                column: unit.name.clone(),
                row,
                value: field.to_string(),
            })?;

            column.push(value);
        }
    }

    log::info!(
        "Loaded {} rows of {} columns from {}",
        values.first().map_or(0, Vec::len),
        units.len(),
        path.display()
    );

    let columns = units
        .iter()
        .zip(values)
        .map(|(unit, column)| (unit.name.as_str(), codes_array(column)));

    Ok(RecordBatch::try_from_iter(columns)?)
}
