use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Helper to create a Command for the tables binary
#[allow(deprecated)]
fn tables() -> Command {
    Command::cargo_bin("tables").expect("Failed to find tables binary")
}

/// Writes `content` into `dir/name` and returns the path as a string.
fn write(dir: &TempDir, name: &str, content: &str) -> String {
    let path: PathBuf = dir.path().join(name);
    fs::write(&path, content).expect("Failed to write fixture");
    path.to_string_lossy().into_owned()
}

const SCHEMA_JSON: &str = r#"{
  "fields": [
    {"name": "id", "type": "integer"},
    {"name": "name", "type": "string"}
  ],
  "primaryKey": "id"
}"#;

const SCHEMA_YAML: &str = "fields:
  - name: id
    type: integer
  - name: name
    type: string
primaryKey: id
";

// ============================================================================
// check command tests
// ============================================================================

#[test]
fn test_check_valid_schema() {
    let dir = TempDir::new().unwrap();
    let schema = write(&dir, "schema.yml", SCHEMA_YAML);
    tables()
        .arg("check")
        .arg(&schema)
        .assert()
        .success()
        .stdout(predicate::str::contains("Schema is valid"))
        .stdout(predicate::str::contains("Format:       Yaml"))
        .stdout(predicate::str::contains("id (integer)"))
        .stdout(predicate::str::contains("Primary Key:  id"));
}

#[test]
fn test_check_toml_schema() {
    let dir = TempDir::new().unwrap();
    let schema = write(&dir, "schema.toml", "[[fields]]\nname = \"code\"\ntype = \"string\"\n");
    tables()
        .arg("check")
        .arg(&schema)
        .assert()
        .success()
        .stdout(predicate::str::contains("code (string)"));
}

#[test]
fn test_check_invalid_schema() {
    let dir = TempDir::new().unwrap();
    let schema = write(
        &dir,
        "schema.json",
        r#"{"fields": [{"name": "id", "type": "integer"}], "primaryKey": "missing"}"#,
    );
    tables()
        .arg("check")
        .arg(&schema)
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::contains("schema-error"));
}

#[test]
fn test_check_json_output() {
    let dir = TempDir::new().unwrap();
    let schema = write(&dir, "schema.json", SCHEMA_JSON);
    tables()
        .arg("check")
        .arg(&schema)
        .arg("--format")
        .arg("json")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"valid\": true"));
}

#[test]
fn test_check_missing_file() {
    tables()
        .arg("check")
        .arg("nonexistent.yml")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn test_check_unsupported_format() {
    let dir = TempDir::new().unwrap();
    let schema = write(&dir, "schema.xml", "<schema/>");
    tables()
        .arg("check")
        .arg(&schema)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unsupported file format"));
}

// ============================================================================
// validate command tests
// ============================================================================

#[test]
fn test_validate_valid_table() {
    let dir = TempDir::new().unwrap();
    let schema = write(&dir, "schema.json", SCHEMA_JSON);
    let data = write(&dir, "table.csv", "id,name\n1,english\n2,中国人\n");
    tables()
        .args(["validate", &data, "--schema", &schema])
        .assert()
        .success()
        .stdout(predicate::str::contains("Validation PASSED"))
        .stdout(predicate::str::contains("Rows checked:   2"));
}

#[test]
fn test_validate_invalid_table() {
    let dir = TempDir::new().unwrap();
    let schema = write(&dir, "schema.json", SCHEMA_JSON);
    let data = write(&dir, "table.csv", "id,name\n1,english\nx,german\n1,french,extra\n");
    tables()
        .args(["validate", &data, "--schema", &schema])
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::contains("Validation FAILED"))
        .stdout(predicate::str::contains("type-error"))
        .stdout(predicate::str::contains("extra-cell"))
        .stdout(predicate::str::contains("primary-key"));
}

#[test]
fn test_validate_json_output() {
    let dir = TempDir::new().unwrap();
    let schema = write(&dir, "schema.json", SCHEMA_JSON);
    let data = write(&dir, "table.csv", "id,name\n1,a\n1,b\n");
    let output = tables()
        .args(["validate", &data, "--schema", &schema, "--format", "json"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["valid"], false);
    assert_eq!(report["tasks"][0]["errors"][0]["type"], "primary-key");
    assert_eq!(report["tasks"][0]["errors"][0]["rowPosition"], 3);
    assert_eq!(report["tasks"][0]["errors"][0]["tags"], serde_json::json!(["#table", "#row"]));
}

#[test]
fn test_validate_skip_errors() {
    let dir = TempDir::new().unwrap();
    let schema = write(&dir, "schema.json", SCHEMA_JSON);
    let data = write(&dir, "table.csv", "id,name\n1,a\n1,b\n");
    tables()
        .args(["validate", &data, "--schema", &schema, "--skip-errors", "primary-key,blank-row"])
        .assert()
        .success();
}

#[test]
fn test_validate_limit_errors() {
    let dir = TempDir::new().unwrap();
    let schema = write(&dir, "schema.json", SCHEMA_JSON);
    let data = write(&dir, "table.csv", "id,name\nx,a\ny,b\nz,c\n");
    tables()
        .args(["validate", &data, "--schema", &schema, "--limit-errors", "1"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("reached error limit: 1"));
}

#[test]
fn test_validate_header_case() {
    let dir = TempDir::new().unwrap();
    let schema = write(&dir, "schema.json", SCHEMA_JSON);
    let data = write(&dir, "table.csv", "ID,Name\n1,a\n");
    tables()
        .args(["validate", &data, "--schema", &schema])
        .assert()
        .failure()
        .stdout(predicate::str::contains("incorrect-label"));
    tables()
        .args(["validate", &data, "--schema", &schema, "--header-case", "false"])
        .assert()
        .success();
}

#[test]
fn test_validate_schema_sync() {
    let dir = TempDir::new().unwrap();
    let schema = write(&dir, "schema.json", SCHEMA_JSON);
    let data = write(&dir, "table.csv", "name,id\na,1\nb,2\n");
    tables()
        .args(["validate", &data, "--schema", &schema, "--schema-sync"])
        .assert()
        .success();
}

#[test]
fn test_validate_with_dialect() {
    let dir = TempDir::new().unwrap();
    let schema = write(&dir, "schema.json", SCHEMA_JSON);
    let dialect = write(&dir, "dialect.yml", "headerRows: [2]\ncommentChar: \"#\"\n");
    let data = write(&dir, "table.csv", "exported,today\nid,name\n# note,\n1,a\nx,b\n");
    let output = tables()
        .args(["validate", &data, "--schema", &schema, "--dialect", &dialect, "--format", "json"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["tasks"][0]["labels"], serde_json::json!(["id", "name"]));
    assert_eq!(report["tasks"][0]["errors"][0]["type"], "type-error");
    assert_eq!(report["tasks"][0]["errors"][0]["rowPosition"], 5);
}

#[test]
fn test_validate_header_case_overrides_dialect() {
    let dir = TempDir::new().unwrap();
    let schema = write(&dir, "schema.json", SCHEMA_JSON);
    let dialect = write(&dir, "dialect.json", r#"{"headerCase": false}"#);
    let data = write(&dir, "table.csv", "ID,Name\n1,a\n");
    tables()
        .args(["validate", &data, "--schema", &schema, "--dialect", &dialect])
        .assert()
        .success();
    tables()
        .args(["validate", &data, "--schema", &schema, "--dialect", &dialect, "--header-case", "true"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("incorrect-label"));
}

#[test]
fn test_validate_missing_dialect() {
    let dir = TempDir::new().unwrap();
    let schema = write(&dir, "schema.json", SCHEMA_JSON);
    let data = write(&dir, "table.csv", "id,name\n1,a\n");
    tables()
        .args(["validate", &data, "--schema", &schema, "--dialect", "nonexistent.yml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse dialect file"));
}

#[test]
fn test_validate_with_checklist() {
    let dir = TempDir::new().unwrap();
    let schema = write(&dir, "schema.json", SCHEMA_JSON);
    let checklist = write(
        &dir,
        "checklist.yml",
        "checks:\n  - type: forbidden-value\n    fieldName: name\n    values: [bad]\n",
    );
    let data = write(&dir, "table.csv", "id,name\n1,good\n2,bad\n");
    tables()
        .args(["validate", &data, "--schema", &schema, "--checklist", &checklist])
        .assert()
        .failure()
        .stdout(predicate::str::contains("forbidden-value"));
}

#[test]
fn test_validate_missing_schema() {
    let dir = TempDir::new().unwrap();
    let data = write(&dir, "table.csv", "id\n1\n");
    tables()
        .args(["validate", &data, "--schema", "nonexistent.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse schema file"));
}

#[test]
fn test_validate_missing_data() {
    let dir = TempDir::new().unwrap();
    let schema = write(&dir, "schema.json", SCHEMA_JSON);
    tables()
        .args(["validate", "nonexistent.csv", "--schema", &schema])
        .assert()
        .failure()
        .stdout(predicate::str::contains("source-error"));
}

#[test]
fn test_help_lists_commands() {
    tables()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("validate"))
        .stdout(predicate::str::contains("check"));
}
