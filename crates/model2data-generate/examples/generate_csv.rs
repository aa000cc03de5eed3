use std::env;
use std::path::PathBuf;

use model2data_generate::output::csv::write_table_csv;
use model2data_generate::{GenerateOptions, generate_from_file};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut args = env::args().skip(1);
    let mut schema_path: Option<PathBuf> = None;
    let mut out_dir = PathBuf::from("out");
    let mut options = GenerateOptions::default();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--out" => out_dir = args.next().map(PathBuf::from).ok_or("missing --out value")?,
            "--rows" => options.rows = args.next().ok_or("missing --rows value")?.parse()?,
            "--seed" => options.seed = args.next().ok_or("missing --seed value")?.parse()?,
            _ => {
                if schema_path.is_none() {
                    schema_path = Some(PathBuf::from(arg));
                } else {
                    return Err("unexpected argument".into());
                }
            }
        }
    }

    let schema_path = schema_path.ok_or("missing schema path")?;
    let output = generate_from_file(&schema_path, &options)?;

    std::fs::create_dir_all(&out_dir)?;
    for table in &output.result.dataset.tables {
        let path = out_dir.join(format!("{}.csv", table.name));
        let bytes = write_table_csv(&path, table)?;
        println!("{} rows={} bytes={bytes}", path.display(), table.rows.len());
    }
    Ok(())
}
