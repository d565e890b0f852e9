//! End-to-end tests for the `musubi` binary.

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn write_descriptor(dir: &Path, name: &str, body: &str) {
    let project_dir = dir.join(name);
    fs::create_dir_all(&project_dir).expect("create project dir");
    fs::write(project_dir.join("project.yml"), body).expect("write descriptor");
}

fn sample_tree() -> TempDir {
    let tmp = TempDir::new().expect("tempdir");
    fs::write(
        tmp.path().join("project.yml"),
        concat!(
            "musubi_version: \"1.0.0\"\n",
            "name: krass\n",
            "files:\n",
            "  - src/krass.c\n",
            "  - tests/basic.c\n",
            "include_dirs:\n",
            "  - src\n",
            "debug_dir: tests/bin\n",
            "c_std: c99\n",
            "cpp_std: c++11\n",
            "dependencies:\n",
            "  - krink\n",
            "  - name: krinktest\n",
            "    optional: true\n",
        ),
    )
    .expect("write root descriptor");
    write_descriptor(
        tmp.path(),
        "krink",
        concat!(
            "musubi_version: \"1.0.0\"\n",
            "name: krink\n",
            "files:\n",
            "  - src/krink.c\n",
            "  - tests/shader.c\n",
            "defines:\n",
            "  KR_FULL_RGBA_FONTS: ~\n",
            "debug_dir: tests/bin\n",
            "library:\n",
            "  drop_debug_dir: true\n",
            "  excludes:\n",
            "    - tests/shader.c\n",
        ),
    );
    write_descriptor(
        tmp.path(),
        "krinktest",
        concat!(
            "musubi_version: \"1.0.0\"\n",
            "name: krinktest\n",
            "files:\n",
            "  - tests/harness.c\n",
        ),
    );
    tmp
}

fn musubi() -> Command {
    Command::cargo_bin("musubi").expect("binary built")
}

#[test]
fn flatten_prints_the_merged_build_description() {
    let tmp = sample_tree();
    musubi()
        .current_dir(tmp.path())
        .assert()
        .success()
        .stdout(
            predicate::str::contains("project krass")
                .and(predicate::str::contains("src/krink.c"))
                .and(predicate::str::contains("c_std c99"))
                .and(predicate::str::contains("-DKR_FULL_RGBA_FONTS"))
                .and(predicate::str::contains("tests/shader.c").not())
                .and(predicate::str::contains("tests/harness.c").not()),
        );
}

#[test]
fn include_optional_pulls_in_the_testing_project() {
    let tmp = sample_tree();
    musubi()
        .current_dir(tmp.path())
        .arg("--include-optional")
        .assert()
        .success()
        .stdout(predicate::str::contains("tests/harness.c"));
}

#[test]
fn emit_writes_the_description_to_a_file() {
    let tmp = sample_tree();
    musubi()
        .current_dir(tmp.path())
        .args(["emit", "build.txt"])
        .assert()
        .success();
    let written = fs::read_to_string(tmp.path().join("build.txt")).expect("read output");
    assert!(written.contains("project krass"));
}

#[test]
fn emit_json_produces_structured_output() {
    let tmp = sample_tree();
    musubi()
        .current_dir(tmp.path())
        .args(["emit", "build.json", "--json"])
        .assert()
        .success();
    let written = fs::read_to_string(tmp.path().join("build.json")).expect("read output");
    let value: serde_json::Value = serde_json::from_str(&written).expect("valid json");
    assert_eq!(value["project"], "krass");
    assert_eq!(value["c_std"], "c99");
}

#[test]
fn graph_shows_the_dependency_tree() {
    let tmp = sample_tree();
    musubi()
        .current_dir(tmp.path())
        .arg("graph")
        .assert()
        .success()
        .stdout(predicate::str::contains("krass\n  krink"));
}

#[test]
fn missing_dependency_fails_without_partial_output() {
    let tmp = TempDir::new().expect("tempdir");
    fs::write(
        tmp.path().join("project.yml"),
        concat!(
            "musubi_version: \"1.0.0\"\n",
            "name: krass\n",
            "dependencies:\n",
            "  - ghost\n",
        ),
    )
    .expect("write root descriptor");
    musubi()
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stdout(predicate::str::is_empty());
}

#[test]
fn strict_standards_flag_rejects_conflicts() {
    let tmp = TempDir::new().expect("tempdir");
    fs::write(
        tmp.path().join("project.yml"),
        concat!(
            "musubi_version: \"1.0.0\"\n",
            "name: krass\n",
            "c_std: c99\n",
            "dependencies:\n",
            "  - krink\n",
        ),
    )
    .expect("write root descriptor");
    write_descriptor(
        tmp.path(),
        "krink",
        "musubi_version: \"1.0.0\"\nname: krink\nc_std: c11\n",
    );

    musubi()
        .current_dir(tmp.path())
        .arg("--strict-standards")
        .assert()
        .failure();
    musubi().current_dir(tmp.path()).assert().success();
}
