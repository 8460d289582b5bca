//! This module materializes columns of an Arrow [RecordBatch] as BitWeaving columns.

use arrow::{
    array::{Array, AsArray},
    datatypes::{
        ArrowPrimitiveType, DataType, Int16Type, Int32Type, Int64Type, Int8Type, UInt16Type,
        UInt32Type, UInt64Type, UInt8Type,
    },
    record_batch::RecordBatch,
};
use serde::{Deserialize, Serialize};

use crate::{
    columnar::{
        code::{Code, Layout},
        column::Column,
    },
    config::LayoutPolicy,
    error::Error,
    tabular::table::BwTable,
};

/// Request to index one column of a record batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnIndexUnit {
    /// Name of the source column, which is also used for the index column
    pub name: String,
    /// Number of bits per code
    pub bit_width: u8,
    /// Layout of the index column, chosen by the [LayoutPolicy] if absent
    #[serde(default)]
    pub layout: Option<Layout>,
}

impl ColumnIndexUnit {
    /// Index column `name` with codes of `bit_width` bits.
    pub fn new(name: impl Into<String>, bit_width: u8) -> Self {
        Self {
            name: name.into(),
            bit_width,
            layout: None,
        }
    }

    /// Use `layout` instead of the one chosen by the [LayoutPolicy].
    pub fn with_layout(mut self, layout: Layout) -> Self {
        self.layout = Some(layout);
        self
    }
}

fn unsigned_codes<T>(column: &str, array: &dyn Array) -> Result<Vec<Code>, Error>
where
    T: ArrowPrimitiveType,
    T::Native: Into<Code>,
{
    array
        .as_primitive::<T>()
        .iter()
        .enumerate()
        .map(|(row, value)| match value {
            Some(value) => Ok(value.into()),
            None => Err(Error::NullValue {
                column: column.to_string(),
                row,
            }),
        })
        .collect()
}

fn signed_codes<T>(column: &str, array: &dyn Array) -> Result<Vec<Code>, Error>
where
    T: ArrowPrimitiveType,
    T::Native: Into<i64>,
{
    array
        .as_primitive::<T>()
        .iter()
        .enumerate()
        .map(|(row, value)| {
            let value: i64 = value
                .ok_or_else(|| Error::NullValue {
                    column: column.to_string(),
                    row,
                })?
                .into();

            Code::try_from(value).map_err(|_| Error::NegativeValue {
                column: column.to_string(),
                value,
                row,
            })
        })
        .collect()
}

fn boolean_codes(column: &str, array: &dyn Array) -> Result<Vec<Code>, Error> {
    array
        .as_boolean()
        .iter()
        .enumerate()
        .map(|(row, value)| match value {
            Some(value) => Ok(Code::from(value)),
            None => Err(Error::NullValue {
                column: column.to_string(),
                row,
            }),
        })
        .collect()
}

/// Decode the values of an Arrow array into codes.
fn decode_codes(column: &str, array: &dyn Array) -> Result<Vec<Code>, Error> {
    match array.data_type() {
        DataType::Boolean => boolean_codes(column, array),
        DataType::UInt8 => unsigned_codes::<UInt8Type>(column, array),
        DataType::UInt16 => unsigned_codes::<UInt16Type>(column, array),
        DataType::UInt32 => unsigned_codes::<UInt32Type>(column, array),
        DataType::UInt64 => unsigned_codes::<UInt64Type>(column, array),
        DataType::Int8 => signed_codes::<Int8Type>(column, array),
        DataType::Int16 => signed_codes::<Int16Type>(column, array),
        DataType::Int32 => signed_codes::<Int32Type>(column, array),
        DataType::Int64 => signed_codes::<Int64Type>(column, array),
        other => Err(Error::UnsupportedSourceType {
            column: column.to_string(),
            datatype: other.to_string(),
        }),
    }
}

/// Build an in-memory table holding a BitWeaving column for each unit.
pub fn build_index(
    batch: &RecordBatch,
    units: &[ColumnIndexUnit],
    policy: &LayoutPolicy,
) -> Result<BwTable, Error> {
    let mut table = BwTable::in_memory();
    build_index_into(&mut table, batch, units, policy)?;
    Ok(table)
}

/// Add a BitWeaving column for each unit to `table`.
///
/// All columns are decoded before the first one is added,
/// so on error `table` is left unchanged.
pub fn build_index_into(
    table: &mut BwTable,
    batch: &RecordBatch,
    units: &[ColumnIndexUnit],
    policy: &LayoutPolicy,
) -> Result<(), Error> {
    let mut columns: Vec<Column> = Vec::with_capacity(units.len());

    for unit in units {
        if table.column(&unit.name).is_ok() || columns.iter().any(|c| c.name() == unit.name) {
            return Err(Error::ColumnExists(unit.name.clone()));
        }

        let source = batch
            .column_by_name(&unit.name)
            .ok_or_else(|| Error::ColumnNotFound(unit.name.clone()))?;
        let codes = decode_codes(&unit.name, source.as_ref())?;

        let layout = unit.layout.unwrap_or_else(|| policy.choose(unit.bit_width));
        let mut column = Column::new(unit.name.as_str(), layout, unit.bit_width)?;
        column.append(&codes)?;

        log::debug!(
            "Indexed column \"{}\": {} rows as {layout} with {} bits",
            unit.name,
            codes.len(),
            unit.bit_width
        );

        columns.push(column);
    }

    for column in columns {
        table.insert_column(column)?;
    }

    Ok(())
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use arrow::{
        array::{
            Array, ArrayRef, BooleanArray, Float64Array, Int32Array, UInt16Array, UInt8Array,
        },
        record_batch::RecordBatch,
    };
    use test_log::test;

    use super::{build_index, build_index_into, ColumnIndexUnit};
    use crate::{columnar::code::Layout, config::LayoutPolicy, error::Error};

    fn batch(columns: Vec<(&str, ArrayRef)>) -> RecordBatch {
        RecordBatch::try_from_iter(columns).unwrap()
    }

    fn array(values: impl Array + 'static) -> ArrayRef {
        Arc::new(values)
    }

    #[test]
    fn build_supported_types() {
        let source = batch(vec![
            ("small", array(UInt8Array::from(vec![1, 2, 3]))),
            ("wide", array(UInt16Array::from(vec![1000, 0, 4095]))),
            ("signed", array(Int32Array::from(vec![5, 0, 7]))),
            ("flag", array(BooleanArray::from(vec![true, false, true]))),
        ]);

        let units = vec![
            ColumnIndexUnit::new("small", 2),
            ColumnIndexUnit::new("wide", 12),
            ColumnIndexUnit::new("signed", 3).with_layout(Layout::Vertical),
            ColumnIndexUnit::new("flag", 1),
        ];
        let table = build_index(&source, &units, &LayoutPolicy::default()).unwrap();

        assert_eq!(table.num_rows(), 3);
        assert_eq!(table.column("small").unwrap().layout(), Layout::Horizontal);
        assert_eq!(table.column("wide").unwrap().layout(), Layout::Vertical);
        assert_eq!(table.column("signed").unwrap().layout(), Layout::Vertical);
        assert_eq!(
            table.column("wide").unwrap().codes().collect::<Vec<_>>(),
            vec![1000, 0, 4095]
        );
        assert_eq!(
            table.column("flag").unwrap().codes().collect::<Vec<_>>(),
            vec![1, 0, 1]
        );
    }

    #[test]
    fn build_failures() {
        let source = batch(vec![
            ("values", array(UInt8Array::from(vec![1, 200]))),
            ("nulls", array(UInt8Array::from(vec![Some(1), None]))),
            ("negative", array(Int32Array::from(vec![1, -4]))),
            ("float", array(Float64Array::from(vec![1.0, 2.0]))),
        ]);
        let policy = LayoutPolicy::default();

        let result = build_index(&source, &[ColumnIndexUnit::new("values", 4)], &policy);
        assert!(matches!(
            result,
            Err(Error::OutOfRangeCode {
                code: 200,
                bit_width: 4
            })
        ));

        let result = build_index(&source, &[ColumnIndexUnit::new("nulls", 4)], &policy);
        assert!(matches!(result, Err(Error::NullValue { row: 1, .. })));

        let result = build_index(&source, &[ColumnIndexUnit::new("negative", 4)], &policy);
        assert!(matches!(
            result,
            Err(Error::NegativeValue {
                value: -4,
                row: 1,
                ..
            })
        ));

        let result = build_index(&source, &[ColumnIndexUnit::new("float", 4)], &policy);
        assert!(matches!(result, Err(Error::UnsupportedSourceType { .. })));

        let result = build_index(&source, &[ColumnIndexUnit::new("missing", 4)], &policy);
        assert!(matches!(result, Err(Error::ColumnNotFound(_))));

        let result = build_index(
            &source,
            &[
                ColumnIndexUnit::new("values", 8),
                ColumnIndexUnit::new("values", 8),
            ],
            &policy,
        );
        assert!(matches!(result, Err(Error::ColumnExists(_))));
    }

    #[test]
    fn failed_build_leaves_table_unchanged() {
        let source = batch(vec![
            ("good", array(UInt8Array::from(vec![1, 2]))),
            ("bad", array(UInt8Array::from(vec![1, 255]))),
        ]);

        let mut table = crate::tabular::table::BwTable::in_memory();
        let result = build_index_into(
            &mut table,
            &source,
            &[ColumnIndexUnit::new("good", 2), ColumnIndexUnit::new("bad", 2)],
            &LayoutPolicy::default(),
        );

        assert!(result.is_err());
        assert_eq!(table.num_columns(), 0);
    }
}
