use std::path::Path;

use model2data_core::{
    ClassifiedReferences, DependencyOrder, FkLookup, ParsedSchema, build_fk_lookup,
    classify_references, order_tables_with_attributes, parse_schema, parse_schema_file,
};
use tracing::info;

use crate::engine::{GenerationEngine, GenerationResult};
use crate::errors::Result;
use crate::model::GenerateOptions;

/// Everything derived from one schema text, plus the generated data.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub schema: ParsedSchema,
    pub classified: ClassifiedReferences,
    pub fk_lookup: FkLookup,
    pub order: DependencyOrder,
    pub result: GenerationResult,
}

/// Parse, classify, order and generate in one pass.
pub fn generate_from_text(text: &str, options: &GenerateOptions) -> Result<PipelineOutput> {
    let schema = parse_schema(text)?;
    run_pipeline(schema, options)
}

/// Read a schema file, then run [`generate_from_text`]'s pipeline on it.
pub fn generate_from_file(path: &Path, options: &GenerateOptions) -> Result<PipelineOutput> {
    let schema = parse_schema_file(path)?;
    run_pipeline(schema, options)
}

fn run_pipeline(schema: ParsedSchema, options: &GenerateOptions) -> Result<PipelineOutput> {
    let classified = classify_references(&schema.catalog, &schema.references);
    let fk_lookup = build_fk_lookup(&classified.fk_refs);
    let order =
        order_tables_with_attributes(&schema.catalog, &fk_lookup, &classified.attribute_refs);

    info!(
        tables = order.order.len(),
        foreign_keys = fk_lookup.len(),
        attribute_refs = classified.attribute_refs.len(),
        removed_edges = order.removed_edges.len(),
        unordered_attribute_links = order.unordered_attribute_edges.len(),
        "generation plan resolved"
    );

    let result = GenerationEngine::new(options.clone()).run(
        &schema.catalog,
        &fk_lookup,
        &classified.attribute_refs,
        &order,
    )?;

    Ok(PipelineOutput {
        schema,
        classified,
        fk_lookup,
        order,
        result,
    })
}
