use std::collections::BTreeMap;

use chrono::NaiveDate;
use model2data_core::DependencyEdge;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::errors::{GenerationError, Result};

/// Options for the generation engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateOptions {
    /// Rows produced for every table.
    pub rows: u64,
    /// Seed for the single random source of a run.
    pub seed: u64,
    /// Share of self-referencing foreign keys left null after the first row.
    pub self_ref_null_rate: f64,
    /// Anchor for generated dates, times and timestamps.
    pub base_date: NaiveDate,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            rows: 100,
            seed: 42,
            self_ref_null_rate: 0.2,
            base_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default(),
        }
    }
}

impl GenerateOptions {
    pub fn with_rows(mut self, rows: u64) -> Self {
        self.rows = rows;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.self_ref_null_rate) {
            return Err(GenerationError::InvalidOptions(format!(
                "self_ref_null_rate must be within [0, 1], got {}",
                self.self_ref_null_rate
            )));
        }
        Ok(())
    }
}

/// Summary of a generated table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableReport {
    pub table: String,
    pub rows_requested: u64,
    pub rows_generated: u64,
    pub columns: usize,
}

/// Structured generation issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationIssue {
    pub level: String,
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
}

impl GenerationIssue {
    pub fn warning(code: &str, message: String) -> Self {
        Self {
            level: "warning".to_string(),
            code: code.to_string(),
            message,
            table: None,
            column: None,
        }
    }

    pub fn for_column(mut self, table: &str, column: &str) -> Self {
        self.table = Some(table.to_string());
        self.column = Some(column.to_string());
        self
    }
}

/// Report for a generation run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationReport {
    pub seed: u64,
    pub rows_per_table: u64,
    pub tables: Vec<TableReport>,
    /// Foreign-key edges dropped to make the table graph acyclic.
    pub removed_edges: Vec<DependencyEdge>,
    pub warnings_by_code: BTreeMap<String, u64>,
    pub warnings: Vec<GenerationIssue>,
}

impl GenerationReport {
    pub fn new(options: &GenerateOptions) -> Self {
        Self {
            seed: options.seed,
            rows_per_table: options.rows,
            ..Self::default()
        }
    }

    pub fn record_warning(&mut self, issue: GenerationIssue) {
        warn!(
            code = %issue.code,
            table = issue.table.as_deref().unwrap_or(""),
            column = issue.column.as_deref().unwrap_or(""),
            message = %issue.message
        );
        *self.warnings_by_code.entry(issue.code.clone()).or_insert(0) += 1;
        self.warnings.push(issue);
    }

    pub fn warnings_for(&self, code: &str) -> impl Iterator<Item = &GenerationIssue> {
        self.warnings.iter().filter(move |issue| issue.code == code)
    }

    pub fn table(&self, name: &str) -> Option<&TableReport> {
        self.tables.iter().find(|table| table.table == name)
    }
}
