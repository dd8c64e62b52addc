//! Schema difference calculator
//!
//! Compares one table of the new database against the same table in the old
//! database. Only additions are detected: tables or columns that exist only
//! in the old database are never reported, and columns are compared by name
//! alone, so type, nullability or default changes go unnoticed.

use std::collections::BTreeSet;

use crate::schema::types::{TableLookup, TableSnapshot};

/// What the old database lacks for one table
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableDiff {
    InSync,
    /// The table does not exist in the old database
    MissingTable,
    /// Column names present in new but not in old, sorted lexically
    MissingColumns(Vec<String>),
}

impl TableDiff {
    /// Diff a table of the new database against its old counterpart
    pub fn compute(new_table: &TableSnapshot, old_table: &TableLookup) -> Self {
        let Some(old_table) = old_table.as_snapshot() else {
            return TableDiff::MissingTable;
        };

        let missing: BTreeSet<&String> = new_table
            .columns
            .keys()
            .filter(|name| !old_table.has_column(name))
            .collect();

        if missing.is_empty() {
            TableDiff::InSync
        } else {
            TableDiff::MissingColumns(missing.into_iter().cloned().collect())
        }
    }

    pub fn is_in_sync(&self) -> bool {
        matches!(self, TableDiff::InSync)
    }
}
