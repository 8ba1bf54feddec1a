//! Tabular dataset
//!
//! An ordered column list plus rows of values. Every row has exactly one
//! value per column.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::value::{ColumnType, Value};
use crate::constants::RESERVED_COLUMN_PREFIX;
use crate::errors::{DataCacheError, Result};

/// Homogeneous table of payload values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Dataset {
    /// Empty dataset with the given columns
    pub fn new<I, S>(columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        validate_columns(&columns)?;
        Ok(Self { columns, rows: Vec::new() })
    }

    /// Dataset with columns and rows, validated together
    pub fn with_rows<I, S>(columns: I, rows: Vec<Vec<Value>>) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut dataset = Self::new(columns)?;
        for row in rows {
            dataset.push_row(row)?;
        }
        Ok(dataset)
    }

    /// Append a row; its length must match the column list
    pub fn push_row(&mut self, row: Vec<Value>) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(DataCacheError::InvalidInput(format!(
                "row {} has {} values but the dataset has {} columns",
                self.rows.len(),
                row.len(),
                self.columns.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    /// Re-check every invariant
    ///
    /// Needed for values built through `Deserialize`, which bypasses the
    /// constructors. Also rejects a column mixing booleans or timestamps with
    /// any other kind of value; those could not be read back unchanged.
    pub fn validate(&self) -> Result<()> {
        validate_columns(&self.columns)?;
        if let Some((index, row)) =
            self.rows.iter().enumerate().find(|(_, row)| row.len() != self.columns.len())
        {
            return Err(DataCacheError::InvalidInput(format!(
                "row {index} has {} values but the dataset has {} columns",
                row.len(),
                self.columns.len()
            )));
        }

        for (index, column) in self.columns.iter().enumerate() {
            let types = self.column_types(index);
            if types.len() > 1 && types.iter().any(|ty| !ty.is_native()) {
                let names: Vec<String> = types.iter().map(ToString::to_string).collect();
                return Err(DataCacheError::InvalidInput(format!(
                    "column '{column}' mixes {} values",
                    names.join(", ")
                )));
            }
        }
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Vec<Value>> {
        self.rows
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Values of one column, top to bottom
    pub fn column(&self, name: &str) -> Option<impl Iterator<Item = &Value> + '_> {
        let index = self.column_index(name)?;
        Some(self.rows.iter().map(move |row| &row[index]))
    }

    /// Single cell by row number and column name
    pub fn value(&self, row: usize, column: &str) -> Option<&Value> {
        let index = self.column_index(column)?;
        self.rows.get(row).map(|r| &r[index])
    }

    /// Distinct types of the non-null values in a column, in order of first
    /// appearance
    pub fn column_types(&self, index: usize) -> Vec<ColumnType> {
        let mut types = Vec::new();
        for ty in self.rows.iter().filter_map(|row| row.get(index)?.column_type()) {
            if !types.contains(&ty) {
                types.push(ty);
            }
        }
        types
    }

    /// Declared type for each column
    ///
    /// `None` for a column that is null in every row or that mixes integers,
    /// reals, text and blobs. SQLite applies no conversion to such a column,
    /// so each value keeps its own storage class.
    pub fn inferred_types(&self) -> Vec<Option<ColumnType>> {
        (0..self.columns.len())
            .map(|index| match self.column_types(index).as_slice() {
                [single] => Some(*single),
                _ => None,
            })
            .collect()
    }
}

/// Payload column names must be non-empty, unique, free of `"` and NUL, and
/// must not use the reserved prefix.
fn validate_columns(columns: &[String]) -> Result<()> {
    if columns.is_empty() {
        return Err(DataCacheError::InvalidInput("dataset needs at least one column".into()));
    }

    let mut seen = HashSet::with_capacity(columns.len());
    for column in columns {
        if column.is_empty() {
            return Err(DataCacheError::InvalidInput("column name must not be empty".into()));
        }
        if column.starts_with(RESERVED_COLUMN_PREFIX) {
            return Err(DataCacheError::InvalidInput(format!(
                "column '{column}' uses the reserved prefix {RESERVED_COLUMN_PREFIX}"
            )));
        }
        if column.contains('"') || column.contains('\0') {
            return Err(DataCacheError::InvalidInput(format!(
                "column {column:?} contains a quote or NUL character"
            )));
        }
        // SQLite column names are case-insensitive
        if !seen.insert(column.to_ascii_lowercase()) {
            return Err(DataCacheError::InvalidInput(format!("duplicate column '{column}'")));
        }
    }
    Ok(())
}
