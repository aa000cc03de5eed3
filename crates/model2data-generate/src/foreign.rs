use std::collections::{BTreeMap, BTreeSet};

use model2data_core::{ColumnRef, FkLookup, Reference, SchemaCatalog};

use crate::generators::GeneratedValue;

/// Retained column values of generated tables, row-aligned per table.
///
/// `values(table, column)[i]` is the value row `i` of `table` received, so a
/// single sampled row index can be used for every retained column of that
/// table.
#[derive(Debug, Clone, Default)]
pub struct ValuePools {
    pools: BTreeMap<ColumnRef, Vec<GeneratedValue>>,
    rows: BTreeMap<String, usize>,
}

impl ValuePools {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the retained columns of a freshly generated table.
    pub fn ingest_table(
        &mut self,
        table: &str,
        columns: &[String],
        rows: &[Vec<GeneratedValue>],
        retain: &BTreeSet<ColumnRef>,
    ) {
        for (index, column) in columns.iter().enumerate() {
            let key = ColumnRef::new(table, column);
            if !retain.contains(&key) {
                continue;
            }
            let values = rows
                .iter()
                .map(|row| row.get(index).cloned().unwrap_or(GeneratedValue::Null))
                .collect();
            self.pools.insert(key, values);
        }
        self.rows.insert(table.to_string(), rows.len());
    }

    pub fn values(&self, table: &str, column: &str) -> Option<&[GeneratedValue]> {
        self.pools
            .get(&ColumnRef::new(table, column))
            .map(Vec::as_slice)
    }

    /// Value of one parent row, if that column was retained.
    pub fn value_at(&self, table: &str, column: &str, row: usize) -> Option<&GeneratedValue> {
        self.values(table, column).and_then(|values| values.get(row))
    }

    /// Rows generated for `table`, if it has been generated.
    pub fn row_count(&self, table: &str) -> Option<usize> {
        self.rows.get(table).copied()
    }

    pub fn contains(&self, table: &str, column: &str) -> bool {
        self.pools.contains_key(&ColumnRef::new(table, column))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ColumnRef, &[GeneratedValue])> {
        self.pools
            .iter()
            .map(|(key, values)| (key, values.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.pools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }
}

/// Columns whose values must outlive their table: primary-key-like columns
/// and every foreign-key or attribute-reference target.
pub fn retained_columns(
    catalog: &SchemaCatalog,
    fk_lookup: &FkLookup,
    attribute_refs: &[Reference],
) -> BTreeSet<ColumnRef> {
    let mut retained = BTreeSet::new();
    for table in &catalog.tables {
        for column in &table.columns {
            if column.is_primary_key_like() {
                retained.insert(ColumnRef::new(&table.name, &column.name));
            }
        }
    }
    for (_, parent) in fk_lookup.iter() {
        retained.insert(parent.clone());
    }
    for reference in attribute_refs {
        retained.insert(ColumnRef::new(
            &reference.target_table,
            &reference.target_column,
        ));
    }
    retained
}
