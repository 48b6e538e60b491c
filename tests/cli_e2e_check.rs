//! End-to-end tests for the `check` command.

use assert_cmd::cargo::cargo_bin_cmd;
use assert_fs::prelude::*;
use predicates::prelude::*;

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_check_reports_summary() {
    let temp = assert_fs::TempDir::new().unwrap();
    let recipe = temp.child("tippecanoe.yaml");
    recipe
        .write_str(
            r#"
- package:
    name: git

- package:
    name: build-essential

- execute:
    command: make
    cwd: /tmp/tippecanoe
"#,
        )
        .unwrap();

    let mut cmd = cargo_bin_cmd!("provisor");
    cmd.arg("check")
        .arg(recipe.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Recipe 'tippecanoe' loaded successfully"))
        .stdout(predicate::str::contains("Steps: 3"))
        .stdout(predicate::str::contains("2 package"))
        .stdout(predicate::str::contains("1 execute"));
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_check_json_output() {
    let temp = assert_fs::TempDir::new().unwrap();
    let recipe = temp.child("database.yaml");
    recipe
        .write_str(
            "- script:\n    user: postgres\n    code: psql {{ db_host_args }} -c \"CREATE USER {{ db_user }}\"\n",
        )
        .unwrap();

    let mut cmd = cargo_bin_cmd!("provisor");
    let output = cmd
        .arg("check")
        .arg("--json")
        .arg(recipe.path())
        .assert()
        .success();

    let stdout = String::from_utf8(output.get_output().stdout.clone()).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(parsed[0]["recipe"], "database");
    assert_eq!(parsed[0]["steps"], 1);
    let vars: Vec<&str> = parsed[0]["variables"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap())
        .collect();
    assert_eq!(vars, vec!["db_host_args", "db_user"]);
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_check_rejects_unknown_step() {
    let temp = assert_fs::TempDir::new().unwrap();
    let recipe = temp.child("bad.yaml");
    recipe.write_str("- frobnicate:\n    target: all\n").unwrap();

    let mut cmd = cargo_bin_cmd!("provisor");
    cmd.arg("check")
        .arg(recipe.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load recipe"));
}
