//! Runs the `gini-dashboard` binary against the bundled dataset.

use std::process::{Command, Output};

const DATA: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../../data/gini_south_africa.csv");

fn dashboard_with(data: &str, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_gini-dashboard"))
        .env_remove("GINI_DATASET")
        .env("RUST_LOG", "off")
        .arg("--data")
        .arg(data)
        .args(args)
        .output()
        .unwrap()
}

fn dashboard(args: &[&str]) -> Output {
    dashboard_with(DATA, args)
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn test_every_page_renders() {
    for page in ["business", "understanding", "preparation", "modeling", "evaluation"] {
        let output = dashboard(&[page]);
        assert!(output.status.success(), "{page}: {}", stderr(&output));
        assert!(!stdout(&output).is_empty(), "{page}: empty output");
    }
}

#[test]
fn test_modeling_table() {
    let output = dashboard(&["modeling", "--alpha", "0.4", "--horizon", "3"]);
    assert!(output.status.success(), "{}", stderr(&output));
    let text = stdout(&output);
    assert!(text.contains("Calculation table"));
    assert!(text.contains("α:       0.40"));
    assert!(text.contains("Forecast for the next 3 years"));
    assert!(text.contains("2025"));
}

#[test]
fn test_evaluation_json() {
    let output = dashboard(&["evaluation", "--format", "json"]);
    assert!(output.status.success(), "{}", stderr(&output));
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["page"], "evaluation");

    let report = &json["report"];
    let mape = report["evaluation"]["mape"].as_f64().unwrap();
    assert!(mape > 0.0 && mape < 5.0);
    assert_eq!(report["evaluation"]["band"], "very_good");
    assert_eq!(
        report["modeling"]["forecast"]["out_of_sample"]
            .as_array()
            .unwrap()
            .len(),
        5
    );
}

#[test]
fn test_requests_are_independent() {
    let first = dashboard(&["modeling", "--alpha", "0.2", "--format", "json"]);
    let second = dashboard(&["modeling", "--alpha", "0.8", "--format", "json"]);
    let again = dashboard(&["modeling", "--alpha", "0.2", "--format", "json"]);
    assert_eq!(first.stdout, again.stdout);
    assert_ne!(first.stdout, second.stdout);
}

#[test]
fn test_invalid_alpha_exits_with_message() {
    let output = dashboard(&["modeling", "--alpha", "1.0"]);
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("Invalid parameter"));
    assert!(stdout(&output).is_empty());
}

#[test]
fn test_invalid_horizon_exits_with_message() {
    let output = dashboard(&["evaluation", "--horizon", "0"]);
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("horizon"));
}

#[test]
fn test_missing_dataset_is_fatal() {
    let output = dashboard_with("/nonexistent/gini.csv", &["business"]);
    assert_eq!(output.status.code(), Some(3));
    assert!(stderr(&output).contains("Cannot load the dataset"));
}

#[test]
fn test_missing_target_column_is_fatal() {
    let output = dashboard(&["--target", "palma_ratio", "understanding"]);
    assert_eq!(output.status.code(), Some(3));
    assert!(stderr(&output).contains("palma_ratio"));
}
