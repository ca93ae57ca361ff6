use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

use stand_dynamics::{
    io::{read_census_csv, write_census_csv},
    models::CensusRow,
};

const PARAMETERS: &str = r#"
[regions.north.growth.Pinus]
r1 = 0.02
r2 = 0.004
r3 = 0.0
r4 = 0.0
r5 = 0.0
r6 = 0.0
r7 = 0.0
r8 = 0.0

[regions.north.mortality.Pinus]
m1 = -2.2
m2 = 0.0
m3 = 0.0
m4 = 0.0
m5 = 0.0
m6 = 0.0
m7 = 0.0
m8 = 0.0

[regions.north.recruitment.Pinus]
z1 = 30.0
z2 = -0.01
z3 = 0.0
z4 = 0.0
z5 = 0.0
z6 = 0.0
z7 = 0.0
z8 = 0.0
ze = 2.0
"#;

/// Write per-tree measurements; the 2.0 cm tree is below the smallest class.
fn create_trees_csv(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("trees.csv");
    std::fs::write(
        &path,
        "species,dbh\nPinus,5.5\nPinus,6.1\nPinus,8.8\nPinus,12.3\nQuercus,7.4\nQuercus,2.0\n",
    )
    .unwrap();
    path
}

fn create_census_csv(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("census.csv");
    let rows = vec![
        CensusRow::new("Pinus", 6, 40),
        CensusRow::new("Pinus", 8, 25),
        CensusRow::new("Pinus", 10, 12),
        CensusRow::new("Quercus", 6, 8),
        CensusRow::new("Quercus", 8, 3),
        CensusRow::new("Quercus", 10, 0),
    ];
    write_census_csv(&rows, &path).unwrap();
    path
}

fn create_parameters(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("params.toml");
    std::fs::write(&path, PARAMETERS).unwrap();
    path
}

fn cmd() -> Command {
    Command::cargo_bin("stand-dynamics").unwrap()
}

// --- Ranges subcommand ---

#[test]
fn test_ranges_default() {
    cmd()
        .arg("ranges")
        .assert()
        .success()
        .stdout(predicate::str::contains("Diameter Classes"))
        .stdout(predicate::str::contains("100"));
}

#[test]
fn test_ranges_zero_spacing() {
    cmd()
        .args(["ranges", "--spacing", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("spacing must be positive"));
}

// --- Classify subcommand ---

#[test]
fn test_classify_writes_census() {
    let dir = TempDir::new().unwrap();
    let trees = create_trees_csv(&dir);
    let output = dir.path().join("classified.csv");

    cmd()
        .args([
            "classify",
            "--input",
            trees.to_str().unwrap(),
            "--area",
            "400",
            "--output",
            output.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Classified Census"))
        .stdout(predicate::str::contains("Unclassified Records"))
        .stdout(predicate::str::contains("Success:"));

    let rows = read_census_csv(&output).unwrap();
    assert_eq!(rows.iter().map(|r| r.stem_count).sum::<u64>(), 5);
    // two species, every class from 6 to 100
    assert_eq!(rows.len(), 2 * 48);
}

#[test]
fn test_classify_to_json() {
    let dir = TempDir::new().unwrap();
    let trees = create_trees_csv(&dir);
    let output = dir.path().join("classified.json");

    cmd()
        .args([
            "classify",
            "--input",
            trees.to_str().unwrap(),
            "--area",
            "400",
            "--output",
            output.to_str().unwrap(),
            "--pretty",
        ])
        .assert()
        .success();

    let content = std::fs::read_to_string(&output).unwrap();
    assert!(content.contains("\"diameter_class\""));
}

#[test]
fn test_classify_requires_area() {
    let dir = TempDir::new().unwrap();
    let trees = create_trees_csv(&dir);

    cmd()
        .args(["classify", "--input", trees.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Stand area is required"));
}

// --- Stats subcommand ---

#[test]
fn test_stats_success() {
    let dir = TempDir::new().unwrap();
    let census = create_census_csv(&dir);

    cmd()
        .args(["stats", "--input", census.to_str().unwrap(), "--area", "600"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Stand Summary"))
        .stdout(predicate::str::contains("Species Diversity (H1)"))
        .stdout(predicate::str::contains("Diameter Distribution"));
}

#[test]
fn test_stats_without_histogram() {
    let dir = TempDir::new().unwrap();
    let census = create_census_csv(&dir);

    cmd()
        .args([
            "stats",
            "--input",
            census.to_str().unwrap(),
            "--area",
            "600",
            "--no-distribution",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Stand Summary"))
        .stdout(predicate::str::contains("Diameter Distribution").not());
}

#[test]
fn test_stats_unsupported_format() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("census.xlsx");
    std::fs::write(&path, "not a workbook").unwrap();

    cmd()
        .args(["stats", "--input", path.to_str().unwrap(), "--area", "600"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unsupported input format"));
}

// --- Project subcommand ---

#[test]
fn test_project_skips_species_without_coefficients() {
    let dir = TempDir::new().unwrap();
    let census = create_census_csv(&dir);
    let params = create_parameters(&dir);
    let output = dir.path().join("next.csv");

    cmd()
        .args([
            "project",
            "--input",
            census.to_str().unwrap(),
            "--area",
            "600",
            "--parameters",
            params.to_str().unwrap(),
            "--region",
            "north",
            "--slope",
            "15",
            "--mat",
            "7.5",
            "--map",
            "520",
            "--output",
            output.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Transition Step"))
        .stdout(predicate::str::contains("skipped (no growth)"))
        .stdout(predicate::str::contains("Projected Census"));

    let rows = read_census_csv(&output).unwrap();
    assert_eq!(rows.len(), 3);
    assert!(rows.iter().all(|r| r.species == "Pinus"));
}

#[test]
fn test_project_missing_policy_fail() {
    let dir = TempDir::new().unwrap();
    let census = create_census_csv(&dir);
    let params = create_parameters(&dir);

    cmd()
        .args([
            "project",
            "--input",
            census.to_str().unwrap(),
            "--area",
            "600",
            "--parameters",
            params.to_str().unwrap(),
            "--region",
            "north",
            "--missing",
            "fail",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "Missing growth parameters for species 'Quercus'",
        ));
}

#[test]
fn test_project_unknown_region() {
    let dir = TempDir::new().unwrap();
    let census = create_census_csv(&dir);
    let params = create_parameters(&dir);

    cmd()
        .args([
            "project",
            "--input",
            census.to_str().unwrap(),
            "--area",
            "600",
            "--parameters",
            params.to_str().unwrap(),
            "--region",
            "south",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown region: 'south'"));
}

#[test]
fn test_project_from_config_file() {
    let dir = TempDir::new().unwrap();
    let trees = create_trees_csv(&dir);
    create_parameters(&dir);
    let config = dir.path().join("run.toml");
    std::fs::write(
        &config,
        r#"
stand_area = 400.0
region = "north"
parameters = "params.toml"
missing_parameters = "skip"

[environment]
slope = 15.0
mean_annual_temperature = 7.5
mean_annual_precipitation = 520.0
"#,
    )
    .unwrap();
    let report = dir.path().join("report.json");

    cmd()
        .args([
            "project",
            "--input",
            trees.to_str().unwrap(),
            "--raw",
            "--config",
            config.to_str().unwrap(),
            "--report",
            report.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("one period"));

    let content = std::fs::read_to_string(&report).unwrap();
    assert!(content.contains("\"outcomes\""));
    assert!(content.contains("\"covariates\""));
}

#[test]
fn test_project_is_a_single_period() {
    let dir = TempDir::new().unwrap();
    let census = create_census_csv(&dir);
    let params = create_parameters(&dir);

    cmd()
        .args([
            "project",
            "--input",
            census.to_str().unwrap(),
            "--area",
            "600",
            "--parameters",
            params.to_str().unwrap(),
            "--region",
            "north",
            "--steps",
            "2",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--steps"));
}

#[test]
fn test_project_requires_parameters() {
    let dir = TempDir::new().unwrap();
    let census = create_census_csv(&dir);

    cmd()
        .args([
            "project",
            "--input",
            census.to_str().unwrap(),
            "--area",
            "600",
            "--region",
            "north",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No parameter file"));
}

#[test]
fn test_project_invalid_area() {
    let dir = TempDir::new().unwrap();
    let census = create_census_csv(&dir);
    let params = create_parameters(&dir);

    cmd()
        .args([
            "project",
            "--input",
            census.to_str().unwrap(),
            "--area=-5",
            "--parameters",
            params.to_str().unwrap(),
            "--region",
            "north",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Stand area must be positive"));
}

// --- Error cases ---

#[test]
fn test_missing_file() {
    cmd()
        .args(["stats", "--input", "nonexistent.csv", "--area", "600"])
        .assert()
        .failure();
}

#[test]
fn test_no_subcommand() {
    cmd().assert().failure();
}

#[test]
fn test_missing_input_flag() {
    cmd().args(["stats", "--area", "600"]).assert().failure();
}

// --- Help and version ---

#[test]
fn test_help_flag() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Stand Dynamics"));
}

#[test]
fn test_version_flag() {
    cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("stand-dynamics"));
}
