use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::tempdir;

fn repo_path(relative: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .join(relative)
}

fn system_file() -> PathBuf {
    repo_path("crates/tabgrid-io/tests/data/system.json")
}

#[test]
fn tabgrid_export_writes_table_set() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("tables");
    let mut cmd = Command::cargo_bin("tabgrid").unwrap();
    cmd.args([
        "export",
        "--system",
        system_file().to_str().unwrap(),
        "--scenario",
        repo_path("crates/tabgrid-io/tests/data/scenario.toml")
            .to_str()
            .unwrap(),
        "-o",
        out.to_str().unwrap(),
    ])
    .assert()
    .success()
    .stdout(predicate::str::contains("Exported scenario 'reference' (year 2035)"))
    .stdout(predicate::str::contains("storage.csv"))
    .stdout(predicate::str::contains("skipped: No storage devices found"));

    for table in ["bus.csv", "load.csv", "branch.csv", "dc_branch.csv", "gen.csv"] {
        assert!(out.join(table).exists(), "missing {table}");
    }
    assert!(out.join("timeseries_pointers.json").exists());
    assert!(!out.join("storage.csv").exists());
}

#[test]
fn tabgrid_export_rejects_non_sienna_output() {
    let dir = tempdir().unwrap();
    let scenario = dir.path().join("scenario.toml");
    fs::write(
        &scenario,
        "name = \"p\"\noutput_folder = \"out\"\n\n[output_config]\nmodel = \"plexos\"\n",
    )
    .unwrap();
    let mut cmd = Command::cargo_bin("tabgrid").unwrap();
    cmd.args([
        "export",
        "--system",
        system_file().to_str().unwrap(),
        "--scenario",
        scenario.to_str().unwrap(),
    ])
    .assert()
    .failure()
    .stderr(predicate::str::contains("It should be type of sienna"));
    assert!(!dir.path().join("out").exists());
}

#[test]
fn tabgrid_inspect_reports_counts() {
    let mut cmd = Command::cargo_bin("tabgrid").unwrap();
    cmd.args(["inspect", "--system", system_file().to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("System: two_bus"))
        .stdout(predicate::str::contains("ThermalStandard"));
}

#[test]
fn tabgrid_inspect_json() {
    let output = Command::cargo_bin("tabgrid")
        .unwrap()
        .args([
            "inspect",
            "--system",
            system_file().to_str().unwrap(),
            "--format",
            "json",
        ])
        .output()
        .unwrap();
    assert!(output.status.success());
    let summary: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(summary["name"], "two_bus");
    assert_eq!(summary["components"], 8);
    assert_eq!(summary["per_kind"]["ACBus"], 2);
    assert_eq!(summary["time_series"], 1);
}

#[test]
fn tabgrid_completions_to_file() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("completions").join("tabgrid.bash");
    Command::cargo_bin("tabgrid")
        .unwrap()
        .args(["completions", "bash", "-o", out.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote Bash completion"));
    assert!(fs::read_to_string(out).unwrap().contains("tabgrid"));
}
