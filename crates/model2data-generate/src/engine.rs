use std::collections::{BTreeMap, BTreeSet};
use std::time::Instant;

use model2data_core::{
    ColumnRef, DependencyOrder, FkLookup, Reference, SchemaCatalog, TableDef,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use tracing::{debug, info};

use crate::errors::{GenerationError, Result};
use crate::foreign::{ValuePools, retained_columns};
use crate::generators::primitives::{fallback_for_type, unique_for_type};
use crate::generators::semantic::TextHint;
use crate::generators::{ColumnType, GeneratedValue, TypeCategory};
use crate::model::{GenerateOptions, GenerationIssue, GenerationReport, TableReport};

/// Rows generated for one table; every row is aligned with `columns`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneratedTable {
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<GeneratedValue>>,
}

impl GeneratedTable {
    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|name| name == column)
    }

    pub fn value(&self, row: usize, column: &str) -> Option<&GeneratedValue> {
        let index = self.column_index(column)?;
        self.rows.get(row).and_then(|values| values.get(index))
    }

    /// Every row's value for `column`, in row order.
    pub fn column_values(&self, column: &str) -> Option<Vec<&GeneratedValue>> {
        let index = self.column_index(column)?;
        Some(self.rows.iter().filter_map(|row| row.get(index)).collect())
    }

    /// One row as a column -> value mapping.
    pub fn row_map(&self, row: usize) -> Option<BTreeMap<&str, &GeneratedValue>> {
        let values = self.rows.get(row)?;
        Some(
            self.columns
                .iter()
                .map(String::as_str)
                .zip(values.iter())
                .collect(),
        )
    }
}

/// Generated tables in generation order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Dataset {
    pub tables: Vec<GeneratedTable>,
}

impl Dataset {
    pub fn table(&self, name: &str) -> Option<&GeneratedTable> {
        self.tables.iter().find(|table| table.name == name)
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

/// Result of a generation run.
#[derive(Debug, Clone)]
pub struct GenerationResult {
    pub dataset: Dataset,
    pub pools: ValuePools,
    pub report: GenerationReport,
}

/// Entry point for generating a dataset from an ordered catalog.
#[derive(Debug, Clone)]
pub struct GenerationEngine {
    options: GenerateOptions,
}

impl GenerationEngine {
    pub fn new(options: GenerateOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &GenerateOptions {
        &self.options
    }

    /// Generate `options.rows` rows for every table of `order`, parents first.
    ///
    /// A single `ChaCha8Rng` seeded from `options.seed` drives every random
    /// choice, so identical inputs give identical datasets.
    pub fn run(
        &self,
        catalog: &SchemaCatalog,
        fk_lookup: &FkLookup,
        attribute_refs: &[Reference],
        order: &DependencyOrder,
    ) -> Result<GenerationResult> {
        self.options.validate()?;

        let start = Instant::now();
        let mut rng = ChaCha8Rng::seed_from_u64(self.options.seed);
        let retain = retained_columns(catalog, fk_lookup, attribute_refs);
        let attribute_lookup = build_attribute_lookup(attribute_refs, fk_lookup);
        let mut pools = ValuePools::new();
        let mut dataset = Dataset::default();
        let mut report = GenerationReport::new(&self.options);
        report.removed_edges = order.removed_edges.clone();

        info!(
            tables = order.order.len(),
            rows = self.options.rows,
            seed = self.options.seed,
            "generation started"
        );

        for table_name in &order.order {
            let table = catalog
                .table(table_name)
                .ok_or_else(|| GenerationError::UnknownTable(table_name.clone()))?;
            let table_start = Instant::now();
            info!(table = %table.name, rows = self.options.rows, "generating table");

            let plan = TablePlan::new(table, catalog, fk_lookup, &attribute_lookup, order);
            let rows = generate_table(&plan, &pools, &self.options, &mut rng, &mut report);

            pools.ingest_table(&plan.name, &plan.columns, &rows, &retain);
            report.tables.push(TableReport {
                table: plan.name.clone(),
                rows_requested: self.options.rows,
                rows_generated: rows.len() as u64,
                columns: plan.columns.len(),
            });

            info!(
                table = %plan.name,
                rows_generated = rows.len(),
                duration_ms = table_start.elapsed().as_millis() as u64,
                "table generated"
            );

            dataset.tables.push(GeneratedTable {
                name: plan.name,
                columns: plan.columns,
                rows,
            });
        }

        info!(
            tables = dataset.len(),
            warnings = report.warnings.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "generation completed"
        );

        Ok(GenerationResult {
            dataset,
            pools,
            report,
        })
    }
}

/// Run the engine once with `options`.
pub fn generate(
    catalog: &SchemaCatalog,
    fk_lookup: &FkLookup,
    attribute_refs: &[Reference],
    order: &DependencyOrder,
    options: &GenerateOptions,
) -> Result<GenerationResult> {
    GenerationEngine::new(options.clone()).run(catalog, fk_lookup, attribute_refs, order)
}

/// How a single column gets its value.
#[derive(Debug, Clone)]
enum ColumnSource {
    /// Sampled from a parent table's pool.
    ForeignKey { parent: ColumnRef, removed: bool },
    /// Sampled from earlier rows of the same table; `target` is the referenced column.
    SelfReference { target: Option<usize> },
    /// Copied from the parent row chosen for this row.
    Attribute {
        parent: ColumnRef,
        fallback: ColumnType,
    },
    Unique(ColumnType),
    Synthesized {
        column_type: ColumnType,
        hint: Option<TextHint>,
    },
}

#[derive(Debug)]
struct TablePlan {
    name: String,
    columns: Vec<String>,
    sources: Vec<ColumnSource>,
}

impl TablePlan {
    fn new(
        table: &TableDef,
        catalog: &SchemaCatalog,
        fk_lookup: &FkLookup,
        attribute_lookup: &BTreeMap<ColumnRef, ColumnRef>,
        order: &DependencyOrder,
    ) -> Self {
        let columns: Vec<String> = table.columns.iter().map(|c| c.name.clone()).collect();
        let sources = table
            .columns
            .iter()
            .map(|column| {
                let column_type = ColumnType::resolve(&column.data_type, catalog);
                let key = ColumnRef::new(&table.name, &column.name);

                if let Some(parent) = fk_lookup.get(&table.name, &column.name) {
                    if parent.table == table.name {
                        let target = columns.iter().position(|name| *name == parent.column);
                        return ColumnSource::SelfReference { target };
                    }
                    return ColumnSource::ForeignKey {
                        parent: parent.clone(),
                        removed: order.is_removed(&parent.table, &table.name),
                    };
                }
                if let Some(parent) = attribute_lookup.get(&key) {
                    return ColumnSource::Attribute {
                        parent: parent.clone(),
                        fallback: column_type,
                    };
                }
                if column.is_primary_key_like() || column.settings.is_unique() {
                    return ColumnSource::Unique(column_type);
                }
                let hint = match column_type.category {
                    TypeCategory::Text => TextHint::for_column(&column.name),
                    _ => None,
                };
                ColumnSource::Synthesized { column_type, hint }
            })
            .collect();

        Self {
            name: table.name.clone(),
            columns,
            sources,
        }
    }
}

/// Child column -> mirrored parent column; foreign keys take precedence.
fn build_attribute_lookup(
    attribute_refs: &[Reference],
    fk_lookup: &FkLookup,
) -> BTreeMap<ColumnRef, ColumnRef> {
    let mut lookup = BTreeMap::new();
    for reference in attribute_refs {
        if fk_lookup
            .get(&reference.source_table, &reference.source_column)
            .is_some()
        {
            debug!(
                table = %reference.source_table,
                column = %reference.source_column,
                "column is also a foreign key, ignoring attribute reference"
            );
            continue;
        }
        lookup.insert(
            ColumnRef::new(&reference.source_table, &reference.source_column),
            ColumnRef::new(&reference.target_table, &reference.target_column),
        );
    }
    lookup
}

fn generate_table(
    plan: &TablePlan,
    pools: &ValuePools,
    options: &GenerateOptions,
    rng: &mut ChaCha8Rng,
    report: &mut GenerationReport,
) -> Vec<Vec<GeneratedValue>> {
    let mut rows: Vec<Vec<GeneratedValue>> = Vec::with_capacity(options.rows as usize);
    let mut reported = BTreeSet::new();

    for (index, source) in plan.sources.iter().enumerate() {
        if let ColumnSource::Unique(column_type) = source
            && let Some(capacity) = column_type.unique_capacity()
            && options.rows > capacity
        {
            report.record_warning(
                GenerationIssue::warning(
                    "unique_exhausted",
                    format!(
                        "'{}.{}' ({}) holds {capacity} distinct values, {} rows requested; values repeat",
                        plan.name, plan.columns[index], column_type.base, options.rows
                    ),
                )
                .for_column(&plan.name, &plan.columns[index]),
            );
        }
    }

    for row_index in 0..options.rows {
        let mut row = vec![GeneratedValue::Null; plan.columns.len()];
        let mut parent_rows: BTreeMap<&str, usize> = BTreeMap::new();

        for (index, source) in plan.sources.iter().enumerate() {
            match source {
                ColumnSource::ForeignKey { parent, removed } => {
                    let values = pools
                        .values(&parent.table, &parent.column)
                        .filter(|values| !*removed && !values.is_empty());
                    match values {
                        Some(values) => {
                            let picked = rng.random_range(0..values.len());
                            parent_rows.entry(parent.table.as_str()).or_insert(picked);
                            row[index] = values[picked].clone();
                        }
                        None => {
                            if reported.insert(("missing_parent_pool", index)) {
                                report.record_warning(
                                    GenerationIssue::warning(
                                        "missing_parent_pool",
                                        format!(
                                            "no generated values for {parent}; '{}.{}' left null",
                                            plan.name, plan.columns[index]
                                        ),
                                    )
                                    .for_column(&plan.name, &plan.columns[index]),
                                );
                            }
                        }
                    }
                }
                ColumnSource::SelfReference { target } => {
                    let Some(target) = *target else {
                        if reported.insert(("missing_parent_pool", index)) {
                            report.record_warning(
                                GenerationIssue::warning(
                                    "missing_parent_pool",
                                    format!(
                                        "self reference of '{}.{}' targets an unknown column",
                                        plan.name, plan.columns[index]
                                    ),
                                )
                                .for_column(&plan.name, &plan.columns[index]),
                            );
                        }
                        continue;
                    };
                    if row_index > 0 && !rng.random_bool(options.self_ref_null_rate) {
                        let picked = rng.random_range(0..rows.len());
                        row[index] = rows[picked][target].clone();
                    }
                }
                _ => {}
            }
        }

        for (index, source) in plan.sources.iter().enumerate() {
            row[index] = match source {
                ColumnSource::Attribute { parent, fallback } => {
                    let values = pools
                        .values(&parent.table, &parent.column)
                        .filter(|values| parent.table != plan.name && !values.is_empty());
                    match values {
                        Some(values) => {
                            let picked = *parent_rows
                                .entry(parent.table.as_str())
                                .or_insert_with(|| rng.random_range(0..values.len()));
                            values.get(picked).cloned().unwrap_or(GeneratedValue::Null)
                        }
                        None => {
                            if reported.insert(("attribute_fallback", index)) {
                                report.record_warning(
                                    GenerationIssue::warning(
                                        "attribute_fallback",
                                        format!(
                                            "no generated values for {parent}; '{}.{}' synthesized from its type",
                                            plan.name, plan.columns[index]
                                        ),
                                    )
                                    .for_column(&plan.name, &plan.columns[index]),
                                );
                            }
                            fallback_for_type(fallback, None, options.base_date, rng)
                        }
                    }
                }
                ColumnSource::Unique(column_type) => unique_for_type(
                    column_type,
                    &plan.columns[index],
                    row_index,
                    options.base_date,
                ),
                ColumnSource::Synthesized { column_type, hint } => {
                    let text = hint.map(|hint| hint.generate(rng));
                    fallback_for_type(column_type, text, options.base_date, rng)
                }
                ColumnSource::ForeignKey { .. } | ColumnSource::SelfReference { .. } => {
                    continue;
                }
            };
        }

        rows.push(row);
    }

    rows
}
