//! Seeded synthetic data generation for model2data.
//!
//! This crate walks a dependency-ordered schema catalog and produces a
//! referentially consistent in-memory dataset, plus CSV rendering of the
//! generated tables.

pub mod engine;
pub mod errors;
pub mod foreign;
pub mod generators;
pub mod model;
pub mod output;
pub mod pipeline;

pub use engine::{Dataset, GeneratedTable, GenerationEngine, GenerationResult, generate};
pub use errors::{GenerationError, Result};
pub use foreign::ValuePools;
pub use generators::GeneratedValue;
pub use model::{GenerateOptions, GenerationIssue, GenerationReport, TableReport};
pub use pipeline::{PipelineOutput, generate_from_file, generate_from_text};
