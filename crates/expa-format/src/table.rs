//! Tables and table files.

use expa_common::types::EntryValue;

use crate::structure::Structure;

/// One decoded table row: one value per structure field, in field order.
pub type Row = Vec<EntryValue>;

/// A named table: a row layout plus its rows.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    /// Table name, as stored in the container.
    pub name: String,
    /// Row layout.
    pub structure: Structure,
    /// Decoded rows.
    pub rows: Vec<Row>,
}

impl Table {
    /// Creates a table.
    pub fn new(name: impl Into<String>, structure: Structure, rows: Vec<Row>) -> Self {
        Self {
            name: name.into(),
            structure,
            rows,
        }
    }

    /// Number of rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// The logical content of one EXPA file.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TableFile {
    /// Tables in container order.
    pub tables: Vec<Table>,
}

impl TableFile {
    /// Creates a table file.
    pub fn new(tables: Vec<Table>) -> Self {
        Self { tables }
    }

    /// Looks up a table by name.
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name == name)
    }
}
