//! End-to-end tests for the pindrift binary
//!
//! Covers:
//! - `pindrift check` - text and JSON reports, review policy and exit codes
//! - `pindrift satisfies` - single-line evaluation
//! - `pindrift completions`

use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

// ============================================================================
// Test Helpers
// ============================================================================

const ALIGNED: &str = "\
# docs build
sphinx==1.5.5  # sphinx.filter: >=1.3, <1.6
numpydoc
";

const DRIFTED: &str = "\
sphinx>=1.5.5  # sphinx.filter: >=1.3, <1.6
";

/// Create a temporary directory holding a manifest
fn create_manifest(content: &str) -> (TempDir, String) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("requirements.txt");
    fs::write(&path, content).unwrap();
    (temp_dir, path.to_str().unwrap().to_string())
}

fn pindrift() -> assert_cmd::Command {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("pindrift");
    cmd.env_remove("PINDRIFT_FORMAT")
        .env_remove("PINDRIFT_FAIL_ON_DRIFT")
        .env_remove("PINDRIFT_PARALLEL_THRESHOLD")
        .env_remove("RUST_LOG");
    cmd
}

// ============================================================================
// pindrift check
// ============================================================================

#[test]
fn test_check_aligned_manifest() {
    let (_dir, path) = create_manifest(ALIGNED);

    pindrift()
        .arg("check")
        .arg(&path)
        .args(["--candidate", "sphinx=1.5.5"])
        .assert()
        .success()
        .stdout(predicate::str::contains("drift: aligned"))
        .stdout(predicate::str::contains("(unconstrained)"))
        .stdout(predicate::str::contains(
            "2 entries: 1 aligned, 0 drifted, 1 no-annotation",
        ));
}

#[test]
fn test_check_drifted_manifest_fails() {
    let (_dir, path) = create_manifest(DRIFTED);

    pindrift()
        .arg("check")
        .arg(&path)
        .assert()
        .failure()
        .stdout(predicate::str::contains("effective [1.5.5, *) not within [1.3, 1.6)"))
        .stderr(predicate::str::contains("needs review (1 drifted, 0 malformed)"));
}

#[test]
fn test_check_no_fail_flag() {
    let (_dir, path) = create_manifest(DRIFTED);

    pindrift()
        .arg("check")
        .arg(&path)
        .arg("--no-fail")
        .assert()
        .success();
}

#[test]
fn test_check_respects_config_policy() {
    let (dir, path) = create_manifest(DRIFTED);
    fs::write(
        dir.path().join("pindrift.toml"),
        "[report]\nfail_on_drift = false\n",
    )
    .unwrap();

    pindrift().arg("check").arg(&path).assert().success();
}

#[test]
fn test_check_verbose_reports_default_config() {
    let (_dir, path) = create_manifest(ALIGNED);

    pindrift()
        .arg("-v")
        .arg("check")
        .arg(&path)
        .assert()
        .success()
        .stderr(predicate::str::contains("using defaults"));
}

#[test]
fn test_check_verbose_reports_found_config() {
    let (dir, path) = create_manifest(ALIGNED);
    fs::write(dir.path().join("pindrift.toml"), "[engine]
parallel_threshold = 8
").unwrap();

    pindrift()
        .arg("-v")
        .arg("check")
        .arg(&path)
        .assert()
        .success()
        .stderr(predicate::str::contains("using configuration from"));
}

#[test]
fn test_check_malformed_line_fails() {
    let (_dir, path) = create_manifest("sphinx =>1.0\nnumpy>=1.20\n");

    pindrift()
        .arg("check")
        .arg(&path)
        .assert()
        .failure()
        .stdout(predicate::str::contains("error[malformed-requirement]"))
        .stderr(predicate::str::contains("1 malformed"));
}

#[test]
fn test_check_json_output() {
    let (_dir, path) = create_manifest(ALIGNED);

    let output = pindrift()
        .arg("check")
        .arg(&path)
        .arg("--json")
        .args(["-c", "sphinx=1.6"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["summary"]["total"], 2);
    assert_eq!(json["summary"]["unsatisfied"], 1);
    assert_eq!(json["entries"][0]["line"], 2);
    assert_eq!(json["entries"][0]["outcome"]["satisfied"], false);
}

#[test]
fn test_check_invalid_candidate() {
    let (_dir, path) = create_manifest(ALIGNED);

    pindrift()
        .arg("check")
        .arg(&path)
        .args(["-c", "sphinx"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("expected NAME=VERSION"));
}

#[test]
fn test_check_missing_manifest() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("absent.txt");

    pindrift()
        .arg("check")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read manifest"));
}

// ============================================================================
// pindrift satisfies
// ============================================================================

#[test]
fn test_satisfies_compatible_release() {
    pindrift()
        .args(["satisfies", "numpy~=1.5.1", "1.5.9"])
        .assert()
        .success()
        .stdout(predicate::str::contains("numpy 1.5.9: satisfied (drift: no-annotation)"));
}

#[test]
fn test_satisfies_rejects_next_minor() {
    pindrift()
        .args(["satisfies", "numpy~=1.5.1", "1.6.0"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("not satisfied"));
}

#[test]
fn test_satisfies_version_flag_still_works() {
    pindrift()
        .args(["satisfies", "--version"])
        .assert()
        .success()
        .stdout(predicate::str::contains("pindrift"));
}

#[test]
fn test_satisfies_reports_annotation_warning() {
    pindrift()
        .args(["satisfies", "sphinx>=1.3  # sphinx.filter: >=1.3", "1.4"])
        .assert()
        .success()
        .stderr(predicate::str::contains("warning: Malformed annotation"));
}

// ============================================================================
// pindrift completions
// ============================================================================

#[test]
fn test_completions_bash() {
    pindrift()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("pindrift"));
}
