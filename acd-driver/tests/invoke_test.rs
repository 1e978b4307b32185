// SPDX-License-Identifier: Apache-2.0

use std::process::Command;

use pretty_assertions::assert_eq;

const REFERENCE_6: &str = "8804800184148111";
const SHARED_CASCADE_8: &str = "FF30CE44FDB8FDB8FF30CE44FDB8FDB8FF30FF30CCCCCCCCFF30CE44CCCCCCCC";
const THREE_LUT_8: &str = "e0c083030e0c3830f0e0c3830f0e3c38e1c3870f1e3c78f0f1e3c78f1f3e7cf8";

fn run_driver(args: &[&str]) -> std::process::Output {
    let command_path = env!("CARGO_BIN_EXE_acd-driver");
    Command::new(command_path)
        .args(args)
        .output()
        .expect("Failed to run acd-driver")
}

fn stdout_of_success(args: &[&str]) -> String {
    let output = run_driver(args);
    assert!(
        output.status.success(),
        "stdout: {}\nstderr: {}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).to_string()
}

#[test]
fn test_version_subcommand() {
    let stdout = stdout_of_success(&["version"]);
    assert_eq!(stdout.trim(), env!("CARGO_PKG_VERSION"));
}

#[test]
fn test_multiplicity_reports_natural_and_searched() {
    let stdout = stdout_of_success(&["multiplicity", REFERENCE_6, "--free_set_size=3"]);
    assert!(stdout.contains("natural multiplicity: 8"), "{stdout}");
    assert!(stdout.contains("searched multiplicity: 5"), "{stdout}");

    let stdout = stdout_of_success(&[
        "multiplicity",
        REFERENCE_6,
        "--free_set_size=3",
        "--offset=2",
        "--json=true",
    ]);
    let report: serde_json::Value = serde_json::from_str(stdout.trim()).unwrap();
    assert_eq!(report["natural"], 8);
    assert_eq!(report["searched"], 5);
    assert_eq!(report["free_set"][0], 0);
    assert_eq!(report["free_set"][1], 1);
}

#[test]
fn test_multiplicity_late_arriving_infeasible() {
    let stdout = stdout_of_success(&[
        "multiplicity",
        REFERENCE_6,
        "--free_set_size=2",
        "--late=0,1,2",
        "--json=true",
    ]);
    let report: serde_json::Value = serde_json::from_str(stdout.trim()).unwrap();
    assert!(report["searched"].is_null());
}

#[test]
fn test_acd66_writes_network_json() {
    let temp_dir = tempfile::tempdir().unwrap();
    let json_path = temp_dir.path().join("ntk.json");
    let stdout = stdout_of_success(&[
        "acd66",
        SHARED_CASCADE_8,
        "--output_json",
        json_path.to_str().unwrap(),
    ]);
    assert!(stdout.contains("decomposable: true"), "{stdout}");
    assert!(stdout.contains("luts: 2"), "{stdout}");
    let network: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&json_path).unwrap()).unwrap();
    assert_eq!(network["num_inputs"], 8);
    assert_eq!(network["nodes"].as_array().unwrap().len(), 2);
}

#[test]
fn test_acd66_rejects_and_acd666_accepts() {
    let stdout = stdout_of_success(&["acd66", THREE_LUT_8]);
    assert_eq!(stdout.trim(), "decomposable: false");
    let stdout = stdout_of_success(&["acd666", THREE_LUT_8, "--json=true"]);
    let report: serde_json::Value = serde_json::from_str(stdout.trim()).unwrap();
    assert_eq!(report["decomposable"], true);
    assert_eq!(report["status"], 0);
    assert_eq!(report["num_luts"], 3);
}

#[test]
fn test_decompose_with_config_file() {
    let temp_dir = tempfile::tempdir().unwrap();
    let config_path = temp_dir.path().join("acd.toml");
    std::fs::write(&config_path, "[acd]\nlut_size = 4\n").unwrap();
    let stdout = stdout_of_success(&[
        "--config",
        config_path.to_str().unwrap(),
        "decompose",
        REFERENCE_6,
        "--json=true",
    ]);
    let report: serde_json::Value = serde_json::from_str(stdout.trim()).unwrap();
    assert_eq!(report["decomposable"], true);
    assert_eq!(report["free_set"].as_array().unwrap().len(), 2);
    assert_eq!(report["multiplicity"], 4);
}

#[test]
fn test_decompose_fixed_free_set_respects_lut_size() {
    // The best three-input free set has multiplicity 5, so the top LUT needs
    // 3 + 3 inputs.
    let args = |lut_size: &'static str| {
        [
            "decompose",
            REFERENCE_6,
            "--free_set_size=3",
            lut_size,
            "--json=true",
        ]
    };
    let stdout = stdout_of_success(&args("--lut_size=5"));
    let report: serde_json::Value = serde_json::from_str(stdout.trim()).unwrap();
    assert_eq!(report["decomposable"], false);
    assert!(report["multiplicity"].is_null());

    let stdout = stdout_of_success(&args("--lut_size=6"));
    let report: serde_json::Value = serde_json::from_str(stdout.trim()).unwrap();
    assert_eq!(report["decomposable"], true);
    assert_eq!(report["multiplicity"], 5);
    assert_eq!(report["top_lut_inputs"], 6);
    assert_eq!(report["max_bound_set_inputs"], 3);
}

#[test]
fn test_batch_from_file() {
    let temp_dir = tempfile::tempdir().unwrap();
    let input_path = temp_dir.path().join("functions.txt");
    std::fs::write(
        &input_path,
        format!("# two functions\n{SHARED_CASCADE_8}\n{THREE_LUT_8}\n"),
    )
    .unwrap();
    let stdout = stdout_of_success(&[
        "batch",
        input_path.to_str().unwrap(),
        "--engine=acd66",
        "--threads=2",
    ]);
    let lines: Vec<serde_json::Value> = stdout
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["index"], 0);
    assert_eq!(lines[0]["decomposable"], true);
    assert_eq!(lines[1]["decomposable"], false);
}

#[test]
fn test_batch_random_is_reproducible() {
    let args = ["batch", "--random=6", "--num_vars=7", "--seed=3"];
    let first = stdout_of_success(&args);
    let second = stdout_of_success(&args);
    assert_eq!(first, second);
    assert_eq!(first.lines().count(), 6);
}

#[test]
fn test_bad_truth_table_reports_error() {
    let output = run_driver(&["acd66", "xyz"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("acd66"), "{stderr}");
}
