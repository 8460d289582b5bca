//! This module defines [BwTable],
//! a named collection of BitWeaving columns.

use std::{
    fs,
    mem::size_of,
    path::{Path, PathBuf},
};

use hashbrown::HashMap;

use crate::{
    columnar::{
        bitvector::BitVector,
        code::{Code, Layout},
        column::Column,
        iterator::BitVectorIterator,
    },
    config::TableOptions,
    error::Error,
    management::bytesized::ByteSized,
};

use super::persist::{is_column_file, read_column, write_column};

/// Collection of columns that may be stored in a directory
#[derive(Debug)]
pub struct BwTable {
    /// Directory holding the column files
    path: PathBuf,
    options: TableOptions,

    /// Columns by name
    columns: HashMap<String, Column>,
    /// Column names in the order in which they were added
    order: Vec<String>,
}

impl BwTable {
    /// Create a new table stored in the directory `path`.
    ///
    /// Nothing is read from disk until [BwTable::open] is called.
    pub fn new(path: impl Into<PathBuf>, options: TableOptions) -> Self {
        Self {
            path: path.into(),
            options,
            columns: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Create a table that is only kept in memory.
    pub fn in_memory() -> Self {
        Self::new(PathBuf::new(), TableOptions::default())
    }

    /// Directory of the table.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Options the table was created with.
    pub fn options(&self) -> &TableOptions {
        &self.options
    }

    /// Prepare the directory of the table and load the columns stored in it.
    ///
    /// Columns stored on disk are added in the order of their file names.
    pub fn open(&mut self) -> Result<(), Error> {
        if self.options.in_memory {
            log::info!("Opened in-memory table");
            return Ok(());
        }

        fs::create_dir_all(&self.path)?;

        let mut files = Vec::new();
        for entry in fs::read_dir(&self.path)? {
            let path = entry?.path();
            if is_column_file(&path) {
                files.push(path);
            }
        }
        files.sort();

        if self.options.delete_existing_files {
            for file in &files {
                fs::remove_file(file)?;
            }

            log::info!(
                "Opened table in {}, deleted {} column files",
                self.path.display(),
                files.len()
            );
            return Ok(());
        }

        for file in &files {
            self.insert_column(read_column(file)?)?;
        }

        log::info!(
            "Opened table in {} with {} columns",
            self.path.display(),
            files.len()
        );

        Ok(())
    }

    /// Store every column and reject further appends.
    pub fn close(&mut self) -> Result<(), Error> {
        if !self.options.in_memory {
            fs::create_dir_all(&self.path)?;

            for name in &self.order {
                if let Some(column) = self.columns.get(name) {
                    write_column(&self.path, column)?;
                }
            }
        }

        for column in self.columns.values_mut() {
            column.close();
        }

        if self.options.in_memory {
            log::info!("Closed in-memory table");
        } else {
            log::info!(
                "Closed table in {}, stored {} columns",
                self.path.display(),
                self.order.len()
            );
        }

        Ok(())
    }

    /// Create a new empty column.
    pub fn add_column(&mut self, name: &str, layout: Layout, bit_width: u8) -> Result<(), Error> {
        if self.columns.contains_key(name) {
            return Err(Error::ColumnExists(name.to_string()));
        }

        let column = Column::new(name, layout, bit_width)?;
        log::debug!("Created column \"{name}\" ({layout}, {bit_width} bits)");
        self.insert_column(column)
    }

    /// Add an already filled column.
    pub fn insert_column(&mut self, column: Column) -> Result<(), Error> {
        let name = column.name().to_string();
        if self.columns.contains_key(&name) {
            return Err(Error::ColumnExists(name));
        }

        self.order.push(name.clone());
        self.columns.insert(name, column);

        Ok(())
    }

    /// Append codes to the column `name`.
    pub fn append_to_column(&mut self, name: &str, codes: &[Code]) -> Result<(), Error> {
        self.column_mut(name)?.append(codes)
    }

    /// Return the column `name`.
    pub fn column(&self, name: &str) -> Result<&Column, Error> {
        self.columns
            .get(name)
            .ok_or_else(|| Error::ColumnNotFound(name.to_string()))
    }

    /// Return the column `name` for modification.
    pub fn column_mut(&mut self, name: &str) -> Result<&mut Column, Error> {
        self.columns
            .get_mut(name)
            .ok_or_else(|| Error::ColumnNotFound(name.to_string()))
    }

    /// Names of all columns in the order they were added.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Number of columns.
    pub fn num_columns(&self) -> usize {
        self.order.len()
    }

    /// Largest number of rows of any column.
    pub fn num_rows(&self) -> usize {
        self.columns
            .values()
            .map(Column::num_rows)
            .max()
            .unwrap_or(0)
    }

    /// Create an empty bitvector with one bit per row of this table.
    pub fn create_bitvector(&self) -> BitVector {
        BitVector::new(self.num_rows())
    }

    /// Create an iterator over the rows selected by `bitvector`.
    pub fn create_iterator<'a>(&self, bitvector: &'a BitVector) -> BitVectorIterator<'a> {
        BitVectorIterator::new(bitvector)
    }
}

impl ByteSized for BwTable {
    fn size_bytes(&self) -> u64 {
        let size_columns: u64 = self
            .columns
            .iter()
            .map(|(name, column)| name.capacity() as u64 + column.size_bytes())
            .sum();
        let size_order: u64 = self
            .order
            .iter()
            .map(|name| (size_of::<String>() + name.capacity()) as u64)
            .sum();

        size_of::<Self>() as u64 + size_columns + size_order
    }
}

#[cfg(test)]
mod test {
    use test_log::test;

    use super::BwTable;
    use crate::{
        columnar::code::Layout,
        config::TableOptions,
        error::Error,
        management::bytesized::ByteSized,
        predicate::{CombineOp, Comparator},
    };

    #[test]
    fn table_columns() {
        let mut table = BwTable::in_memory();
        table.open().unwrap();

        table.add_column("a", Layout::Horizontal, 6).unwrap();
        table.add_column("b", Layout::Vertical, 12).unwrap();
        assert!(matches!(
            table.add_column("a", Layout::Vertical, 3),
            Err(Error::ColumnExists(_))
        ));

        table.append_to_column("a", &[1, 2, 3]).unwrap();
        table.append_to_column("b", &[4000, 17]).unwrap();

        assert_eq!(table.column_names().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(table.num_rows(), 3);
        assert_eq!(table.create_bitvector().capacity(), 3);
        assert!(table.size_bytes() > 0);

        assert!(matches!(
            table.append_to_column("c", &[1]),
            Err(Error::ColumnNotFound(_))
        ));
        assert!(matches!(table.column("c"), Err(Error::ColumnNotFound(_))));
    }

    #[test]
    fn table_iterator() {
        let mut table = BwTable::in_memory();
        table.add_column("a", Layout::Vertical, 4).unwrap();
        table.append_to_column("a", &[5, 1, 5, 9]).unwrap();

        let mut bits = table.create_bitvector();
        table
            .column("a")
            .unwrap()
            .scan(Comparator::Equal, 5, &mut bits, CombineOp::Set)
            .unwrap();

        let rows: Vec<usize> = table.create_iterator(&bits).collect();
        assert_eq!(rows, vec![0, 2]);
    }

    #[test]
    fn close_rejects_appends() {
        let mut table = BwTable::in_memory();
        table.add_column("a", Layout::Horizontal, 2).unwrap();
        table.close().unwrap();

        assert!(matches!(
            table.append_to_column("a", &[1]),
            Err(Error::ColumnClosed(_))
        ));
    }

    #[test]
    fn in_memory_tables_stay_in_memory() {
        let directory = tempfile::tempdir().unwrap();
        let path = directory.path().join("table");

        let mut table = BwTable::new(&path, TableOptions::default());
        table.open().unwrap();
        table.add_column("a", Layout::Horizontal, 2).unwrap();
        table.close().unwrap();

        assert!(!path.exists());
    }

    #[test]
    fn persistent_table_round_trip() {
        let directory = tempfile::tempdir().unwrap();
        let path = directory.path().join("table");
        let codes: Vec<u64> = (0..500).map(|row| (row * 31) % 1000).collect();

        let mut table = BwTable::new(&path, TableOptions::persistent());
        table.open().unwrap();
        table.add_column("wide", Layout::Vertical, 10).unwrap();
        table.add_column("narrow", Layout::Horizontal, 3).unwrap();
        table.append_to_column("wide", &codes).unwrap();
        table.append_to_column("narrow", &[1, 2, 3]).unwrap();
        table.close().unwrap();

        let mut reopened = BwTable::new(&path, TableOptions::persistent());
        reopened.open().unwrap();
        assert_eq!(reopened.num_columns(), 2);
        assert_eq!(reopened.num_rows(), 500);

        let wide = reopened.column("wide").unwrap();
        assert_eq!(wide.layout(), Layout::Vertical);
        assert_eq!(wide.codes().collect::<Vec<_>>(), codes);

        // Reopened columns accept appends again
        reopened.append_to_column("narrow", &[7]).unwrap();
        assert_eq!(reopened.column("narrow").unwrap().code(3).unwrap(), 7);

        let mut cleared = BwTable::new(
            &path,
            TableOptions {
                in_memory: false,
                delete_existing_files: true,
            },
        );
        cleared.open().unwrap();
        assert_eq!(cleared.num_columns(), 0);
        assert_eq!(std::fs::read_dir(&path).unwrap().count(), 0);
    }
}
