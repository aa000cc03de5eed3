use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

const USERS: &str = "Table users {\n  id int [pk]\n  name varchar\n  email varchar\n}\n";

fn temp_dir() -> PathBuf {
    let mut dir = std::env::temp_dir();
    dir.push(format!("model2data_cli_test_{}", uuid::Uuid::new_v4()));
    fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

fn write_schema(dir: &Path, name: &str, text: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, text).expect("write schema");
    path
}

fn model2data(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_model2data"))
        .args(args)
        .args(["--out", dir.to_str().expect("utf8 temp dir")])
        .output()
        .expect("run model2data")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn writes_seeds_and_report_for_each_table() {
    let dir = temp_dir();
    let schema = write_schema(&dir, "test.dbml", USERS);

    let output = model2data(&dir, &["--file", schema.to_str().expect("path"), "--rows", "12"]);
    assert!(output.status.success(), "{}", stdout(&output));

    let project = dir.join("dbt_test");
    let seed = fs::read_to_string(project.join("seeds/raw/users.csv")).expect("seed");
    assert_eq!(seed.lines().next(), Some("id,name,email"));
    assert_eq!(seed.lines().count(), 13);
    assert!(project.join("generation_report.json").exists());

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn same_seed_gives_identical_seed_files() {
    let dir = temp_dir();
    let schema = write_schema(&dir, "test.dbml", USERS);
    let schema = schema.to_str().expect("path");

    for name in ["run1", "run2"] {
        let output = model2data(
            &dir,
            &["--file", schema, "--rows", "10", "--seed", "42", "--name", name],
        );
        assert!(output.status.success(), "{}", stdout(&output));
    }

    let first = fs::read(dir.join("dbt_run1/seeds/raw/users.csv")).expect("run1");
    let second = fs::read(dir.join("dbt_run2/seeds/raw/users.csv")).expect("run2");
    assert_eq!(first, second);

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn existing_project_needs_force() {
    let dir = temp_dir();
    let schema = write_schema(&dir, "test.dbml", USERS);
    let args = ["--file", schema.to_str().expect("path"), "--rows", "10"];

    assert!(model2data(&dir, &args).status.success());

    let second = model2data(&dir, &args);
    assert_eq!(second.status.code(), Some(1));
    assert!(stdout(&second).contains("already exists"));

    let mut forced = args.to_vec();
    forced.push("--force");
    assert!(model2data(&dir, &forced).status.success());

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn empty_schema_reports_no_tables() {
    let dir = temp_dir();
    let schema = write_schema(&dir, "empty.dbml", "");

    let output = model2data(&dir, &["--file", schema.to_str().expect("path"), "--rows", "10"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stdout(&output).contains("No tables found"));
    assert!(!dir.join("dbt_empty").exists());

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn rejects_bad_input() {
    let dir = temp_dir();
    let schema = write_schema(&dir, "test.dbml", USERS);

    let too_few = model2data(&dir, &["--file", schema.to_str().expect("path"), "--rows", "5"]);
    assert!(!too_few.status.success());

    let missing = dir.join("nonexistent.dbml");
    let output = model2data(&dir, &["--file", missing.to_str().expect("path"), "--rows", "10"]);
    assert!(!output.status.success());
    assert!(stdout(&output).contains("File not found"));

    fs::remove_dir_all(&dir).ok();
}
