use std::collections::BTreeMap;
use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::schema::{Reference, SchemaCatalog};

/// `table.column` address.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema)]
pub struct ColumnRef {
    pub table: String,
    pub column: String,
}

impl ColumnRef {
    pub fn new(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            column: column.into(),
        }
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.table, self.column)
    }
}

/// References split by what the target column looks like.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedReferences {
    /// Target is primary-key-like: drives referential sampling.
    pub fk_refs: Vec<Reference>,
    /// Everything else: the child mirrors a parent attribute.
    pub attribute_refs: Vec<Reference>,
    /// Subset of `attribute_refs` whose target table or column does not exist.
    pub unresolved: Vec<Reference>,
}

/// Partition references into foreign keys and attribute references.
///
/// A reference is a foreign key when its target column carries a primary-key
/// setting or is named `id` (any case). Unresolvable targets fall back to the
/// attribute side and are listed in `unresolved`. Relative order is kept in
/// both partitions.
pub fn classify_references(catalog: &SchemaCatalog, refs: &[Reference]) -> ClassifiedReferences {
    let mut classified = ClassifiedReferences::default();

    for reference in refs {
        let target = catalog
            .table(&reference.target_table)
            .and_then(|table| table.column(&reference.target_column));

        match target {
            Some(column) if column.is_primary_key_like() => {
                classified.fk_refs.push(reference.clone());
            }
            Some(_) => {
                classified.attribute_refs.push(reference.clone());
            }
            None => {
                warn!(
                    source = %format!("{}.{}", reference.source_table, reference.source_column),
                    target = %format!("{}.{}", reference.target_table, reference.target_column),
                    "reference target not found, treating as attribute reference"
                );
                classified.attribute_refs.push(reference.clone());
                classified.unresolved.push(reference.clone());
            }
        }
    }

    debug!(
        fk_refs = classified.fk_refs.len(),
        attribute_refs = classified.attribute_refs.len(),
        unresolved = classified.unresolved.len(),
        "references classified"
    );
    classified
}

/// Child column -> parent column for every foreign key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FkLookup {
    entries: BTreeMap<ColumnRef, ColumnRef>,
}

impl FkLookup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a link, returning the parent it replaced.
    pub fn insert(&mut self, child: ColumnRef, parent: ColumnRef) -> Option<ColumnRef> {
        self.entries.insert(child, parent)
    }

    pub fn get(&self, table: &str, column: &str) -> Option<&ColumnRef> {
        self.entries.get(&ColumnRef::new(table, column))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ColumnRef, &ColumnRef)> {
        self.entries.iter()
    }

    /// Whether any foreign key points at `table.column`.
    pub fn is_target(&self, table: &str, column: &str) -> bool {
        self.entries
            .values()
            .any(|parent| parent.table == table && parent.column == column)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Build the child -> parent lookup; a later reference for the same child
/// column replaces the earlier one.
pub fn build_fk_lookup(fk_refs: &[Reference]) -> FkLookup {
    let mut lookup = FkLookup::new();
    for reference in fk_refs {
        let child = ColumnRef::new(&reference.source_table, &reference.source_column);
        let parent = ColumnRef::new(&reference.target_table, &reference.target_column);
        if let Some(previous) = lookup.insert(child.clone(), parent.clone())
            && previous != parent
        {
            debug!(child = %child, previous = %previous, parent = %parent, "foreign key target overridden");
        }
    }
    lookup
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ColumnDef, TableDef};
    use crate::settings::ColumnSetting;

    fn catalog() -> SchemaCatalog {
        let mut users = TableDef::new("users");
        users.push_column(
            ColumnDef::new("user_key", "integer")
                .with_settings([ColumnSetting::PrimaryKey].into_iter().collect()),
        );
        users.push_column(ColumnDef::new("email", "varchar"));

        let mut orders = TableDef::new("orders");
        orders.push_column(ColumnDef::new("ID", "integer"));
        orders.push_column(ColumnDef::new("user_key", "integer"));
        orders.push_column(ColumnDef::new("email", "varchar"));

        let mut items = TableDef::new("items");
        items.push_column(ColumnDef::new("order_id", "integer"));

        SchemaCatalog {
            tables: vec![users, orders, items],
            enums: Vec::new(),
        }
    }

    #[test]
    fn pk_setting_makes_a_foreign_key() {
        let refs = vec![Reference::new("orders", "user_key", "users", "user_key")];
        let classified = classify_references(&catalog(), &refs);
        assert_eq!(classified.fk_refs, refs);
        assert!(classified.attribute_refs.is_empty());
    }

    #[test]
    fn id_name_makes_a_foreign_key_case_insensitively() {
        let refs = vec![Reference::new("items", "order_id", "orders", "ID")];
        let classified = classify_references(&catalog(), &refs);
        assert_eq!(classified.fk_refs, refs);
    }

    #[test]
    fn other_targets_are_attribute_refs() {
        let refs = vec![Reference::new("orders", "email", "users", "email")];
        let classified = classify_references(&catalog(), &refs);
        assert!(classified.fk_refs.is_empty());
        assert_eq!(classified.attribute_refs, refs);
        assert!(classified.unresolved.is_empty());
    }

    #[test]
    fn unresolved_targets_fall_back_to_attribute_refs() {
        let refs = vec![
            Reference::new("orders", "user_key", "ghosts", "id"),
            Reference::new("orders", "user_key", "users", "missing"),
        ];
        let classified = classify_references(&catalog(), &refs);
        assert!(classified.fk_refs.is_empty());
        assert_eq!(classified.attribute_refs, refs);
        assert_eq!(classified.unresolved, refs);
    }

    #[test]
    fn classification_is_an_ordered_partition() {
        let refs = vec![
            Reference::new("orders", "email", "users", "email"),
            Reference::new("orders", "user_key", "users", "user_key"),
            Reference::new("items", "order_id", "orders", "ID"),
            Reference::new("items", "order_id", "nowhere", "x"),
        ];
        let classified = classify_references(&catalog(), &refs);
        assert_eq!(classified.fk_refs, vec![refs[1].clone(), refs[2].clone()]);
        assert_eq!(classified.attribute_refs, vec![refs[0].clone(), refs[3].clone()]);
        assert_eq!(
            classified.fk_refs.len() + classified.attribute_refs.len(),
            refs.len()
        );
        assert!(
            classified
                .fk_refs
                .iter()
                .all(|fk| !classified.attribute_refs.contains(fk))
        );
    }

    #[test]
    fn lookup_keeps_last_reference_per_child_column() {
        let refs = vec![
            Reference::new("orders", "user_key", "users", "user_key"),
            Reference::new("orders", "user_key", "accounts", "id"),
            Reference::new("items", "order_id", "orders", "ID"),
        ];
        let lookup = build_fk_lookup(&refs);
        assert_eq!(lookup.len(), 2);
        assert_eq!(
            lookup.get("orders", "user_key"),
            Some(&ColumnRef::new("accounts", "id"))
        );
        assert_eq!(
            lookup.get("items", "order_id"),
            Some(&ColumnRef::new("orders", "ID"))
        );
        assert!(lookup.is_target("orders", "ID"));
        assert!(!lookup.is_target("users", "user_key"));
    }
}
