//! End-to-end tests for the `render` command.

use assert_cmd::cargo::cargo_bin_cmd;
use assert_fs::prelude::*;
use predicates::prelude::*;

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_render_env_file_to_stdout() {
    let temp = assert_fs::TempDir::new().unwrap();
    let recipe = temp.child("collector.yaml");
    recipe
        .write_str(
            r#"
- env_file:
    path: /etc/openaddr-collector.conf
    vars:
      - name: DATABASE_URL
        value: "{{ database_url }}"
      - name: AWS_ACCESS_KEY_ID
        value: "{{ aws_access_id }}"
"#,
        )
        .unwrap();
    let bag = temp.child("bag.yaml");
    bag.write_str(
        "db_user: u\ndb_pass: p\ndb_host: db.example.com\ndb_name: oa\naws_access_id: AKIA1\n",
    )
    .unwrap();

    let mut cmd = cargo_bin_cmd!("provisor");
    cmd.arg("render")
        .arg(recipe.path())
        .arg("--bag")
        .arg(bag.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("--- /etc/openaddr-collector.conf"))
        .stdout(predicate::str::contains(
            "DATABASE_URL=postgres://u:p@db.example.com/oa?sslmode=require\nAWS_ACCESS_KEY_ID=AKIA1\n",
        ));
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_render_writes_artifacts_to_directory() {
    let temp = assert_fs::TempDir::new().unwrap();
    let recipe = temp.child("crontab.yaml");
    recipe
        .write_str(
            r#"
- logrotate:
    name: openaddr_crontab-collect-extracts
    log: /var/log/openaddr_crontab/collect-extracts.log

- cron:
    name: openaddr_crontab-cleanup-tempdir
    schedule: "0 0 * * *"
    user: ubuntu
    comment: Clean up week-old contents of /tmp
    command: find /tmp -depth -user ubuntu -mtime +7 -delete
"#,
        )
        .unwrap();

    let out = temp.child("out");
    let mut cmd = cargo_bin_cmd!("provisor");
    cmd.arg("render")
        .arg(recipe.path())
        .arg("--output")
        .arg(out.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("2 artifacts"));

    out.child("etc/logrotate.d/openaddr_crontab-collect-extracts")
        .assert(predicate::str::contains("\trotate 4\n"));
    out.child("etc/cron.d/openaddr_crontab-cleanup-tempdir")
        .assert(predicate::str::starts_with(
            "PATH=/usr/local/sbin:/usr/local/bin:/sbin:/bin:/usr/sbin:/usr/bin\n",
        ))
        .assert(predicate::str::contains(
            "0 0\t* * *\tubuntu\tfind /tmp -depth -user ubuntu -mtime +7 -delete\n",
        ));
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_render_bad_cron_schedule_fails() {
    let temp = assert_fs::TempDir::new().unwrap();
    let recipe = temp.child("broken.yaml");
    recipe
        .write_str(
            "- cron:\n    name: nope\n    schedule: \"0 0 * *\"\n    user: ubuntu\n    command: \"true\"\n",
        )
        .unwrap();

    let mut cmd = cargo_bin_cmd!("provisor");
    cmd.arg("render")
        .arg(recipe.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("5 fields"));
}
