use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::settings::ColumnSettings;

/// A column declared inside a `Table` block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ColumnDef {
    pub name: String,
    /// Free-form type token as written (`integer`, `varchar(255)`, ...).
    pub data_type: String,
    pub settings: ColumnSettings,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            settings: ColumnSettings::new(),
        }
    }

    pub fn with_settings(mut self, settings: ColumnSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Primary-key marker in the settings, or a column literally named `id`.
    pub fn is_primary_key_like(&self) -> bool {
        self.settings.is_primary_key() || self.name.eq_ignore_ascii_case("id")
    }
}

/// A table with its columns in source order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TableDef {
    /// Normalized identifier.
    pub name: String,
    pub columns: Vec<ColumnDef>,
}

impl TableDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
        }
    }

    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|column| column.name == name)
    }

    /// Append a column unless one with the same name exists.
    pub fn push_column(&mut self, column: ColumnDef) -> bool {
        if self.column(&column.name).is_some() {
            return false;
        }
        self.columns.push(column);
        true
    }
}

/// `Enum` block: a named list of labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct EnumDef {
    pub name: String,
    pub labels: Vec<String>,
}

/// A child -> parent link between two columns.
///
/// `source_*` is always the referencing (child) side, whichever symbol the
/// schema text used.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct Reference {
    pub source_table: String,
    pub source_column: String,
    pub target_table: String,
    pub target_column: String,
}

impl Reference {
    pub fn new(
        source_table: impl Into<String>,
        source_column: impl Into<String>,
        target_table: impl Into<String>,
        target_column: impl Into<String>,
    ) -> Self {
        Self {
            source_table: source_table.into(),
            source_column: source_column.into(),
            target_table: target_table.into(),
            target_column: target_column.into(),
        }
    }

    pub fn is_self_reference(&self) -> bool {
        self.source_table == self.target_table
    }
}

/// Ordered table catalog produced by the parser.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SchemaCatalog {
    pub tables: Vec<TableDef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub enums: Vec<EnumDef>,
}

impl SchemaCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table(&self, name: &str) -> Option<&TableDef> {
        self.tables.iter().find(|table| table.name == name)
    }

    pub fn enum_def(&self, name: &str) -> Option<&EnumDef> {
        self.enums
            .iter()
            .find(|enum_def| enum_def.name.eq_ignore_ascii_case(name))
    }

    /// Insert a table, replacing an earlier definition with the same name in place.
    ///
    /// Returns `true` when an existing definition was replaced.
    pub fn upsert_table(&mut self, table: TableDef) -> bool {
        match self.tables.iter_mut().find(|existing| existing.name == table.name) {
            Some(existing) => {
                *existing = table;
                true
            }
            None => {
                self.tables.push(table);
                false
            }
        }
    }

    /// `(name, table)` pairs in source order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &TableDef)> {
        self.tables.iter().map(|table| (table.name.as_str(), table))
    }

    pub fn table_names(&self) -> Vec<&str> {
        self.tables.iter().map(|table| table.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

/// Parser output: the catalog plus every reference in source order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ParsedSchema {
    pub catalog: SchemaCatalog,
    pub references: Vec<Reference>,
}
