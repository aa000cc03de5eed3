//! Schema model and analysis for model2data.
//!
//! This crate parses DBML-style schema text into a table catalog, classifies
//! references into foreign keys and attribute links, and derives a
//! parents-first generation order.

pub mod error;
pub mod graph;
pub mod identifier;
pub mod parser;
pub mod relationships;
pub mod schema;
pub mod settings;

pub use error::{Error, Result};
pub use graph::{
    DependencyEdge, DependencyOrder, DependencySummary, order_tables, order_tables_with_attributes,
};
pub use identifier::{FALLBACK_IDENTIFIER, normalize_identifier, strip_quotes};
pub use parser::{parse_schema, parse_schema_file};
pub use relationships::{
    ClassifiedReferences, ColumnRef, FkLookup, build_fk_lookup, classify_references,
};
pub use schema::{ColumnDef, EnumDef, ParsedSchema, Reference, SchemaCatalog, TableDef};
pub use settings::{ColumnSetting, ColumnSettings};
