use std::fs::{OpenOptions, create_dir_all, remove_dir_all};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use model2data_generate::output::csv::write_table_csv;
use model2data_generate::{Dataset, GenerationError, GenerationReport};
use serde::Serialize;
use tracing::{info, warn};

use crate::CliError;

/// Paths of one generated project.
#[derive(Debug, Clone)]
pub struct ProjectPaths {
    pub root: PathBuf,
    pub seeds_dir: PathBuf,
    pub report_path: PathBuf,
}

impl ProjectPaths {
    pub fn new(out_dir: &Path, name: &str) -> Self {
        let root = out_dir.join(format!("dbt_{name}"));
        let seeds_dir = root.join("seeds").join("raw");
        let report_path = root.join("generation_report.json");
        Self {
            root,
            seeds_dir,
            report_path,
        }
    }

    pub fn seed_path(&self, table: &str) -> PathBuf {
        self.seeds_dir.join(format!("{table}.csv"))
    }

    /// Create the directory tree. An existing project is replaced only when
    /// `force` is set.
    pub fn prepare(&self, force: bool) -> Result<(), CliError> {
        if self.root.exists() {
            if !force {
                return Err(CliError::ProjectExists(self.root.clone()));
            }
            warn!(path = %self.root.display(), "replacing existing project directory");
            remove_dir_all(&self.root)?;
        }
        create_dir_all(&self.seeds_dir)?;
        Ok(())
    }
}

/// Metadata written next to the seeds.
#[derive(Debug, Serialize)]
pub struct ProjectReport<'a> {
    pub run_id: String,
    pub project: &'a str,
    pub source: String,
    pub generated_at: String,
    pub table_order: Vec<&'a str>,
    pub generation: &'a GenerationReport,
}

impl<'a> ProjectReport<'a> {
    pub fn new(
        project: &'a str,
        source: &Path,
        generated_at: DateTime<Utc>,
        dataset: &'a Dataset,
        report: &'a GenerationReport,
    ) -> Self {
        Self {
            run_id: uuid::Uuid::new_v4().to_string(),
            project,
            source: source.display().to_string(),
            generated_at: generated_at.to_rfc3339(),
            table_order: dataset.table_names(),
            generation: report,
        }
    }
}

/// Write one `<table>.csv` seed per generated table; returns total bytes.
pub fn write_seeds(paths: &ProjectPaths, dataset: &Dataset) -> Result<u64, CliError> {
    let mut total = 0;
    for table in &dataset.tables {
        let path = paths.seed_path(&table.name);
        let bytes = write_table_csv(&path, table).map_err(GenerationError::from)?;
        info!(table = %table.name, path = %path.display(), bytes, "seed written");
        total += bytes;
    }
    Ok(total)
}

pub fn write_report(paths: &ProjectPaths, report: &ProjectReport<'_>) -> Result<(), CliError> {
    write_json_atomic(&paths.report_path, report)
}

fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), CliError> {
    let data = serde_json::to_vec_pretty(value)?;
    let file_name = path
        .file_name()
        .ok_or_else(|| CliError::InvalidArgs(format!("invalid output path {}", path.display())))?;
    let tmp_path = path.with_file_name(format!("{}.tmp", file_name.to_string_lossy()));

    let mut file = OpenOptions::new()
        .create(true)
        .truncate(true)
        .write(true)
        .open(&tmp_path)?;
    file.write_all(&data)?;
    file.sync_all()?;
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use model2data_generate::{GenerateOptions, generate_from_text};

    fn temp_out_dir() -> PathBuf {
        let mut dir = std::env::temp_dir();
        dir.push(format!("model2data_cli_{}", uuid::Uuid::new_v4()));
        create_dir_all(&dir).expect("create temp dir");
        dir
    }

    #[test]
    fn lays_out_project_paths() {
        let paths = ProjectPaths::new(Path::new("/tmp/out"), "shop");
        assert_eq!(paths.root, Path::new("/tmp/out/dbt_shop"));
        assert_eq!(paths.seeds_dir, Path::new("/tmp/out/dbt_shop/seeds/raw"));
        assert_eq!(
            paths.seed_path("users"),
            Path::new("/tmp/out/dbt_shop/seeds/raw/users.csv")
        );
        assert_eq!(
            paths.report_path,
            Path::new("/tmp/out/dbt_shop/generation_report.json")
        );
    }

    #[test]
    fn existing_project_requires_force() {
        let out = temp_out_dir();
        let paths = ProjectPaths::new(&out, "demo");
        paths.prepare(false).expect("first prepare");
        std::fs::write(paths.seed_path("stale"), "id\n1\n").expect("write stale seed");

        let err = paths.prepare(false).expect_err("second prepare");
        assert!(matches!(err, CliError::ProjectExists(ref root) if *root == paths.root));
        assert!(err.to_string().contains("already exists"));

        paths.prepare(true).expect("forced prepare");
        assert!(paths.seeds_dir.exists());
        assert!(!paths.seed_path("stale").exists());

        remove_dir_all(&out).ok();
    }

    #[test]
    fn writes_seeds_and_report() {
        let out = temp_out_dir();
        let paths = ProjectPaths::new(&out, "demo");
        paths.prepare(false).expect("prepare");

        let output = generate_from_text(
            "Table users {\n  id int [pk]\n  name varchar\n}\n",
            &GenerateOptions::default().with_rows(10),
        )
        .expect("generate");
        let dataset = &output.result.dataset;

        let bytes = write_seeds(&paths, dataset).expect("write seeds");
        assert!(bytes > 0);
        let seed = std::fs::read_to_string(paths.seed_path("users")).expect("read seed");
        assert_eq!(seed.lines().next(), Some("id,name"));
        assert_eq!(seed.lines().count(), 11);

        let report = ProjectReport::new(
            "demo",
            Path::new("demo.dbml"),
            Utc::now(),
            dataset,
            &output.result.report,
        );
        write_report(&paths, &report).expect("write report");
        let json: serde_json::Value = serde_json::from_slice(
            &std::fs::read(&paths.report_path).expect("read report"),
        )
        .expect("parse report");
        assert_eq!(json["project"], "demo");
        assert_eq!(json["table_order"], serde_json::json!(["users"]));
        assert_eq!(json["generation"]["rows_per_table"], 10);

        remove_dir_all(&out).ok();
    }
}
