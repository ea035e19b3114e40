//! Integration tests for the schema reconciliation pipeline
//!
//! These drive the full two-stage flow with a scripted mock oracle and
//! temporary artifact directories, plus CLI-level startup checks.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use tempfile::TempDir;

use schemamap::llm::client::mock::MockLlmClient;
use schemamap::pipeline::Pipeline;
use schemamap::store::MappingStore;

fn write_fixtures(dir: &TempDir) -> (PathBuf, PathBuf, PathBuf) {
    let vendor_schema = dir.path().join("vendor_schema.csv");
    fs::write(&vendor_schema, "Field Name,Sample\nCUST_NM,Acme\naddr1,1 Main St\n").unwrap();

    let target_schema = dir.path().join("target_schema.csv");
    fs::write(
        &target_schema,
        "Field Name,Business Definition\ncustomer_name,Full legal name\naddress_line_1,Street address\n",
    )
    .unwrap();

    let source = dir.path().join("vendor.csv");
    fs::write(&source, "cust_nm,addr1\nAcme,1 Main St\n").unwrap();

    (vendor_schema, target_schema, source)
}

// =============================================================================
// End-to-end pipeline
// =============================================================================

#[tokio::test]
async fn test_end_to_end_mapping_and_transform() {
    let dir = TempDir::new().unwrap();
    let (vendor_schema, target_schema, source) = write_fixtures(&dir);

    let llm = Arc::new(MockLlmClient::with_texts(vec![
        r#"{"cust_nm": "customer_name"}"#,
        r#"{"addr1": "address_line_1"}"#,
    ]));
    let store = MappingStore::new(dir.path());
    let mut pipeline = Pipeline::new(llm.clone(), store);

    let output = pipeline
        .run("vendor_a", &vendor_schema, &target_schema, &source)
        .await
        .expect("pipeline should complete");

    // Exactly one oracle call per vendor field, in order
    assert_eq!(llm.call_count(), 2);

    // Mapping artifact: header + one row per matched field
    let mapping_csv = fs::read_to_string(dir.path().join("vendor_a_mappings.csv")).unwrap();
    let lines: Vec<_> = mapping_csv.lines().collect();
    assert_eq!(lines[0], "vendor_field,target_field");
    assert_eq!(lines.len(), 3);
    assert!(lines.contains(&"cust_nm,customer_name"));
    assert!(lines.contains(&"addr1,address_line_1"));

    // Transformed output: renamed header, verbatim values
    let out_csv = fs::read_to_string(&output).unwrap();
    assert_eq!(out_csv, "customer_name,address_line_1\nAcme,1 Main St\n");
}

#[tokio::test]
async fn test_vendor_schema_normalization_flows_through() {
    // The vendor schema file says "CUST_NM" but the matcher must be asked
    // about the normalized "cust_nm".
    let dir = TempDir::new().unwrap();
    let (vendor_schema, target_schema, _source) = write_fixtures(&dir);

    let llm = Arc::new(MockLlmClient::with_texts(vec![
        r#"{"cust_nm": "customer_name"}"#,
        r#"{"addr1": "address_line_1"}"#,
    ]));
    let store = MappingStore::new(dir.path());
    let mut pipeline = Pipeline::new(llm, store);

    let artifact = pipeline
        .run_mapping_only("vendor_a", &vendor_schema, &target_schema)
        .await
        .unwrap();

    let mapping_csv = fs::read_to_string(&artifact).unwrap();
    assert!(mapping_csv.contains("cust_nm,customer_name"));
    assert!(!mapping_csv.contains("CUST_NM"));
}

#[tokio::test]
async fn test_partial_failure_still_reaches_transform() {
    let dir = TempDir::new().unwrap();
    let (vendor_schema, target_schema, source) = write_fixtures(&dir);

    // One field resolves, one oracle reply is garbage
    let llm = Arc::new(MockLlmClient::with_texts(vec![
        r#"{"cust_nm": "customer_name"}"#,
        "not json at all",
    ]));
    let store = MappingStore::new(dir.path());
    let mut pipeline = Pipeline::new(llm, store);

    let output = pipeline
        .run("vendor_a", &vendor_schema, &target_schema, &source)
        .await
        .expect("one resolved field is enough to transform");

    // n - k entries in the artifact
    let mapping_csv = fs::read_to_string(dir.path().join("vendor_a_mappings.csv")).unwrap();
    assert_eq!(mapping_csv.lines().count(), 2);

    // Unmatched field passes through under its original name
    let out_csv = fs::read_to_string(&output).unwrap();
    assert_eq!(out_csv, "customer_name,addr1\nAcme,1 Main St\n");
}

#[tokio::test]
async fn test_rerun_overwrites_mapping_artifact() {
    let dir = TempDir::new().unwrap();
    let (vendor_schema, target_schema, _source) = write_fixtures(&dir);

    let store = MappingStore::new(dir.path());
    let llm = Arc::new(MockLlmClient::with_texts(vec![
        r#"{"cust_nm": "customer_name"}"#,
        r#"{"addr1": "address_line_1"}"#,
    ]));
    let mut pipeline = Pipeline::new(llm, store);
    pipeline
        .run_mapping_only("vendor_a", &vendor_schema, &target_schema)
        .await
        .unwrap();

    // Re-run where only one field resolves; last write wins, no history
    let store = MappingStore::new(dir.path());
    let llm = Arc::new(MockLlmClient::with_texts(vec![r#"{"cust_nm": "customer_name"}"#, "junk"]));
    let mut pipeline = Pipeline::new(llm, store);
    pipeline
        .run_mapping_only("vendor_a", &vendor_schema, &target_schema)
        .await
        .unwrap();

    let mapping_csv = fs::read_to_string(dir.path().join("vendor_a_mappings.csv")).unwrap();
    assert_eq!(mapping_csv.lines().count(), 2);
}

#[tokio::test]
async fn test_transform_without_mapping_stage_fails_cleanly() {
    let dir = TempDir::new().unwrap();
    let (_vendor_schema, _target_schema, source) = write_fixtures(&dir);

    let llm = Arc::new(MockLlmClient::new(vec![]));
    let store = MappingStore::new(dir.path());
    let pipeline = Pipeline::new(llm, store);

    let result = pipeline.run_transform_only("vendor_a", &source);
    assert!(result.is_err());
    let msg = format!("{:#}", result.unwrap_err());
    assert!(msg.contains("vendor_a"), "diagnostic names the missing artifact: {msg}");
    assert!(!dir.path().join("vendor_a_transformed.csv").exists());
}

#[tokio::test]
async fn test_transform_missing_source_fails_cleanly() {
    let dir = TempDir::new().unwrap();
    let (vendor_schema, target_schema, _source) = write_fixtures(&dir);

    let llm = Arc::new(MockLlmClient::with_texts(vec![
        r#"{"cust_nm": "customer_name"}"#,
        r#"{"addr1": "address_line_1"}"#,
    ]));
    let store = MappingStore::new(dir.path());
    let mut pipeline = Pipeline::new(llm, store);
    pipeline
        .run_mapping_only("vendor_a", &vendor_schema, &target_schema)
        .await
        .unwrap();

    let missing = dir.path().join("nope.csv");
    let result = pipeline.run_transform_only("vendor_a", &missing);
    assert!(result.is_err());
    assert!(!dir.path().join("vendor_a_transformed.csv").exists());
}

// =============================================================================
// CLI startup behavior
// =============================================================================

#[test]
fn test_missing_credential_is_fatal_at_startup() {
    use assert_cmd::Command;
    use predicates::prelude::*;

    let dir = TempDir::new().unwrap();
    let (vendor_schema, target_schema, source) = write_fixtures(&dir);

    // Config points at an env var guaranteed to be unset
    let config_path = dir.path().join("config.yml");
    fs::write(
        &config_path,
        "llm:\n  api-key-env: SCHEMAMAP_TEST_ABSENT_KEY\nstorage:\n  artifact-dir: .\n",
    )
    .unwrap();

    Command::cargo_bin("schemamap")
        .unwrap()
        .env_remove("SCHEMAMAP_TEST_ABSENT_KEY")
        .current_dir(dir.path())
        .args([
            "--config",
            config_path.to_str().unwrap(),
            "run",
            "--vendor",
            "vendor_a",
            "--vendor-schema",
            vendor_schema.to_str().unwrap(),
            "--target-schema",
            target_schema.to_str().unwrap(),
            "--source",
            source.to_str().unwrap(),
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("SCHEMAMAP_TEST_ABSENT_KEY"));

    // No stage executed: no artifacts written
    assert!(!dir.path().join("vendor_a_mappings.csv").exists());
    assert!(!dir.path().join("vendor_a_transformed.csv").exists());
}

#[test]
fn test_mappings_listing_with_no_artifacts() {
    use assert_cmd::Command;
    use predicates::prelude::*;

    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("config.yml");
    fs::write(&config_path, "storage:\n  artifact-dir: .\n").unwrap();

    Command::cargo_bin("schemamap")
        .unwrap()
        .current_dir(dir.path())
        .args(["--config", config_path.to_str().unwrap(), "mappings"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No mapping artifacts found"));
}
