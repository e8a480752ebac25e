// CLI behavior against a suite directory on disk.
// Requires: assert_cmd, predicates, tempfile crates in [dev-dependencies]

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::{prelude::PredicateBooleanExt, str::contains};
use tempfile::TempDir;

fn write(root: &Path, rel: &str, contents: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn suite_dir() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "s/README.md", "Suite s");
    write(
        dir.path(),
        "s/a/b.spec.yaml",
        r#"
description: File ab
tests:
  - path: c
    params:
      - name: x
        values: [1, 2]
  - path: d
    skip: not ready
"#,
    );
    write(
        dir.path(),
        "s/f.spec.yaml",
        "description: File f\ntests:\n  - path: g\n",
    );
    dir
}

fn suitetree(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("suitetree").unwrap();
    cmd.arg("--root").arg(dir.path());
    cmd
}

#[test]
fn cli_lists_collapsed_queries() {
    let dir = suite_dir();
    suitetree(&dir)
        .args(["list", "s:*"])
        .assert()
        .success()
        .stdout("s:a,*\ns:f,*\n");
}

#[test]
fn cli_list_honors_expand_flags() {
    let dir = suite_dir();
    suitetree(&dir)
        .args(["--expand", "s:a,b:c:x=1", "list", "s:*"])
        .assert()
        .success()
        .stdout("s:a,b:c:x=1\ns:a,b:c:x=2;*\ns:a,b:d,*\ns:f,*\n");
}

#[test]
fn cli_reads_expand_config() {
    let dir = suite_dir();
    write(dir.path(), "list.yaml", "fully_expand: ['s:f:*']\n");
    suitetree(&dir)
        .arg("--config")
        .arg(dir.path().join("list.yaml"))
        .args(["list", "s:*"])
        .assert()
        .success()
        .stdout("s:a,*\ns:f:g:\n");
}

#[test]
fn cli_prints_tree_with_descriptions() {
    let dir = suite_dir();
    suitetree(&dir)
        .args(["tree", "s:a,b:*"])
        .assert()
        .success()
        .stdout(contains("| \"File ab\"").and(contains("> \"x=2\" => s:a,b:c:x=2")));
}

#[test]
fn cli_runs_leaves() {
    let dir = suite_dir();
    suitetree(&dir)
        .args(["leaves", "s:a,b:*"])
        .assert()
        .success()
        .stdout(
            contains("pass s:a,b:c:x=1")
                .and(contains("pass s:a,b:c:x=2"))
                .and(contains("skip s:a,b:d: (not ready)")),
        );
}

#[test]
fn cli_reports_miette_diagnostics_on_error() {
    let dir = suite_dir();
    suitetree(&dir)
        .args(["list", "s:a,b"])
        .assert()
        .failure()
        .stderr(contains("suitetree::query").and(contains("help:")));

    suitetree(&dir)
        .args(["list", "s:zzz,*"])
        .assert()
        .failure()
        .stderr(contains("suitetree::tree::nothing_matched"));
}
