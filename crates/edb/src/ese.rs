//! The consumed ESE reader surface.
//!
//! Mailbox extraction only needs tables, named columns, records, and
//! long-value streams. These traits mirror that minimal surface so any ESE
//! page reader can be wrapped; [`MemoryDatabase`] is an in-memory
//! implementation used by the tests and by tooling that synthesizes
//! mailboxes.

use std::collections::HashMap;

/// One row of a table.
pub trait EseRecord {
    /// Raw column bytes, `None` when the cell is NULL.
    fn raw(&self, column: usize) -> Option<Vec<u8>>;

    /// Whether the column stores a long-value reference rather than inline
    /// bytes.
    fn is_long_value(&self, column: usize) -> bool;

    /// Materialized long-value stream for the column.
    fn long_value(&self, column: usize) -> Option<Vec<u8>>;
}

/// One table with named columns.
pub trait EseTable {
    fn column_names(&self) -> Vec<String>;
    fn record_count(&self) -> usize;
    fn record(&self, index: usize) -> Option<Box<dyn EseRecord + '_>>;
}

/// A read-only, page-cached database.
pub trait EseDatabase {
    fn table_names(&self) -> Vec<String>;
    fn table(&self, name: &str) -> Option<&dyn EseTable>;
}

/// Case-preserving column-name → index lookup for one table.
#[derive(Clone, Debug, Default)]
pub struct ColumnMap {
    columns: HashMap<String, usize>,
}

impl ColumnMap {
    pub fn for_table(table: &dyn EseTable) -> Self {
        let columns = table
            .column_names()
            .into_iter()
            .enumerate()
            .map(|(index, name)| (name, index))
            .collect();
        Self { columns }
    }

    pub fn get(&self, name: &str) -> Option<usize> {
        self.columns.get(name).copied()
    }
}

/// In-memory ESE database for tests and synthetic mailboxes.
#[derive(Default)]
pub struct MemoryDatabase {
    tables: Vec<(String, MemoryTable)>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_table(&mut self, name: &str, table: MemoryTable) {
        self.tables.push((name.into(), table));
    }
}

impl EseDatabase for MemoryDatabase {
    fn table_names(&self) -> Vec<String> {
        self.tables.iter().map(|(name, _)| name.clone()).collect()
    }

    fn table(&self, name: &str) -> Option<&dyn EseTable> {
        self.tables
            .iter()
            .find(|(table_name, _)| table_name == name)
            .map(|(_, table)| table as &dyn EseTable)
    }
}

/// A cell value in a [`MemoryTable`].
#[derive(Clone, Debug)]
pub enum MemoryValue {
    Null,
    Inline(Vec<u8>),
    /// A long-value stream: `raw` returns a 4-byte reference, `long_value`
    /// the payload.
    LongValue(Vec<u8>),
}

pub struct MemoryTable {
    columns: Vec<String>,
    rows: Vec<Vec<MemoryValue>>,
}

impl MemoryTable {
    pub fn new(columns: &[&str]) -> Self {
        Self {
            columns: columns.iter().map(|name| (*name).into()).collect(),
            rows: Vec::new(),
        }
    }

    /// Append a row of `(column, value)` cells; unnamed columns are NULL.
    pub fn push_row(&mut self, cells: &[(&str, MemoryValue)]) {
        let mut row = vec![MemoryValue::Null; self.columns.len()];
        for (name, value) in cells {
            if let Some(index) = self.columns.iter().position(|column| column == name) {
                row[index] = value.clone();
            }
        }
        self.rows.push(row);
    }
}

impl EseTable for MemoryTable {
    fn column_names(&self) -> Vec<String> {
        self.columns.clone()
    }

    fn record_count(&self) -> usize {
        self.rows.len()
    }

    fn record(&self, index: usize) -> Option<Box<dyn EseRecord + '_>> {
        self.rows
            .get(index)
            .map(|row| Box::new(MemoryRecord { row }) as Box<dyn EseRecord>)
    }
}

struct MemoryRecord<'a> {
    row: &'a [MemoryValue],
}

impl EseRecord for MemoryRecord<'_> {
    fn raw(&self, column: usize) -> Option<Vec<u8>> {
        match self.row.get(column)? {
            MemoryValue::Null => None,
            MemoryValue::Inline(bytes) => Some(bytes.clone()),
            MemoryValue::LongValue(bytes) => {
                Some((bytes.len() as u32).to_le_bytes().to_vec())
            }
        }
    }

    fn is_long_value(&self, column: usize) -> bool {
        matches!(self.row.get(column), Some(MemoryValue::LongValue(_)))
    }

    fn long_value(&self, column: usize) -> Option<Vec<u8>> {
        match self.row.get(column)? {
            MemoryValue::LongValue(bytes) => Some(bytes.clone()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_map() {
        let table = MemoryTable::new(&["MessageDocumentId", "Subject"]);
        let map = ColumnMap::for_table(&table);
        assert_eq!(map.get("Subject"), Some(1));
        assert_eq!(map.get("Missing"), None);
    }

    #[test]
    fn test_memory_record_values() {
        let mut table = MemoryTable::new(&["A", "B", "C"]);
        table.push_row(&[
            ("A", MemoryValue::Inline(vec![1, 2])),
            ("C", MemoryValue::LongValue(vec![9; 100])),
        ]);

        let record = table.record(0).unwrap();
        assert_eq!(record.raw(0), Some(vec![1, 2]));
        assert_eq!(record.raw(1), None);
        assert!(!record.is_long_value(0));
        assert!(record.is_long_value(2));
        // The raw cell of a long value is a 4-byte reference.
        assert_eq!(record.raw(2).unwrap().len(), 4);
        assert_eq!(record.long_value(2).unwrap().len(), 100);
    }
}
