//! Column-ordered tables backed by CSV artifacts
//!
//! The first record is the header and cell order is the authoritative
//! column order; an empty cell is the null representation.

use std::path::Path;

use crate::error::Result;

use super::create_artifact;

/// In-memory table of string cells with named, ordered columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataTable {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl DataTable {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, row: Vec<String>) {
        debug_assert_eq!(row.len(), self.columns.len());
        self.rows.push(row);
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Every cell of a column, in row order; empty when the column is absent.
    pub fn column_values(&self, name: &str) -> Vec<&str> {
        match self.column_index(name) {
            Some(index) => self.rows.iter().map(|row| row[index].as_str()).collect(),
            None => Vec::new(),
        }
    }

    /// First non-null cell of a column. The empty string is the null
    /// representation in CSV artifacts.
    pub fn first_non_null(&self, name: &str) -> Option<&str> {
        let index = self.column_index(name)?;
        self.rows
            .iter()
            .map(|row| row[index].as_str())
            .find(|cell| !cell.is_empty())
    }

    /// Rename a column; absent columns are left alone.
    pub fn rename_column(&mut self, from: &str, to: &str) {
        if let Some(index) = self.column_index(from) {
            self.columns[index] = to.to_string();
        }
    }

    /// Set (or append) a column holding one constant value on every row,
    /// overwriting any value already present under that name.
    pub fn set_constant_column(&mut self, name: &str, value: &str) {
        match self.column_index(name) {
            Some(index) => {
                for row in &mut self.rows {
                    row[index] = value.to_string();
                }
            }
            None => {
                self.columns.push(name.to_string());
                for row in &mut self.rows {
                    row.push(value.to_string());
                }
            }
        }
    }

    /// Replace every empty or whitespace-only cell with `token`.
    pub fn replace_blank_cells(&mut self, token: &str) {
        for row in &mut self.rows {
            for cell in row {
                if cell.trim().is_empty() {
                    *cell = token.to_string();
                }
            }
        }
    }

    /// Read a CSV artifact; the first record is the header.
    pub fn read_csv(path: &Path) -> Result<Self> {
        let mut reader = csv::Reader::from_path(path)?;
        let columns = reader
            .headers()?
            .iter()
            .map(str::to_string)
            .collect::<Vec<_>>();
        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(str::to_string).collect());
        }
        Ok(Self { columns, rows })
    }

    /// Write as a new CSV artifact; an existing file is a Conflict.
    pub fn write_csv_new(&self, path: &Path) -> Result<()> {
        let file = create_artifact(path)?;
        let mut writer = csv::Writer::from_writer(file);
        writer.write_record(&self.columns)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        Ok(())
    }
}
