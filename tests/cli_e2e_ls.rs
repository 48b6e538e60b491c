//! End-to-end tests for the `ls` command.

use assert_cmd::cargo::cargo_bin_cmd;
use assert_fs::prelude::*;
use predicates::prelude::*;

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_ls_lists_steps_with_guards() {
    let temp = assert_fs::TempDir::new().unwrap();
    let recipe = temp.child("mapbox-upload.yaml");
    recipe
        .write_str(
            r#"
- package:
    name: npm

- execute:
    command: npm install -g
    cwd: /tmp/mapbox-upload
    not_if:
      output_of: npm list -g mapbox-upload | cut -d@ -f 2
      equals: "4.2.0"
    creates: /usr/local/lib/node_modules/mapbox-upload/bin/upload.js
"#,
        )
        .unwrap();

    let mut cmd = cargo_bin_cmd!("provisor");
    cmd.arg("ls")
        .arg(recipe.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("mapbox-upload:"))
        .stdout(predicate::str::contains("1. package"))
        .stdout(predicate::str::contains("2. execute"))
        .stdout(predicate::str::contains("unless at 4.2.0"))
        .stdout(predicate::str::contains(
            "creates /usr/local/lib/node_modules/mapbox-upload/bin/upload.js",
        ));
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_ls_missing_recipe_fails() {
    let mut cmd = cargo_bin_cmd!("provisor");
    cmd.arg("ls").arg("/nonexistent.yaml").assert().failure();
}
