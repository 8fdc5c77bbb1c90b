//! Offline end-to-end tests for the upsync binary.
//!
//! These exercise manifest discovery, source selection, and the error/exit
//! code contract through the real CLI. Nothing here touches the network:
//! network-dependent paths (listing fetch + retry) are covered by unit tests
//! against injectable policies.

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;
use tempfile::TempDir;

const MANIFEST: &str = r#"
[sources.linux-vanilla]
directory = "linux/vanilla"
extension = "bbki"

[sources.linux-vanilla.listing]
kind = "page"
url = "https://www.kernel.org/pub/linux/kernel/v6.x/"
pattern = 'linux-([0-9][0-9.]*)\.tar\.xz'
url-template = "https://www.kernel.org/pub/linux/kernel/v6.x/linux-{version}.tar.xz"

[sources.wireless-regdb]
directory = "linux-addon/wireless-regdb"
extension = "bbki"

[sources.wireless-regdb.listing]
kind = "github-releases"
owner = "wtarreau"
repo = "wireless-regdb"
"#;

fn repo_with_manifest(content: &str) -> TempDir {
    let temp = TempDir::new().unwrap();
    std::fs::write(temp.path().join("upsync.toml"), content).unwrap();
    temp
}

fn upsync(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("upsync").unwrap();
    cmd.current_dir(dir);
    cmd
}

#[test]
fn list_shows_configured_sources() {
    let repo = repo_with_manifest(MANIFEST);

    upsync(repo.path())
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("linux-vanilla"))
        .stdout(predicate::str::contains("linux/vanilla/*.bbki"))
        .stdout(predicate::str::contains(
            "github releases wtarreau/wireless-regdb",
        ));
}

#[test]
fn list_with_empty_manifest_reports_no_sources() {
    let repo = repo_with_manifest("");

    upsync(repo.path())
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("no sources configured"));
}

#[test]
fn manifest_is_found_from_a_nested_directory() {
    let repo = repo_with_manifest(MANIFEST);
    let nested = repo.path().join("linux/vanilla");
    std::fs::create_dir_all(&nested).unwrap();

    upsync(&nested)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("linux-vanilla"));
}

#[test]
fn explicit_manifest_path_overrides_discovery() {
    let repo = repo_with_manifest(MANIFEST);
    let elsewhere = TempDir::new().unwrap();

    upsync(elsewhere.path())
        .arg("list")
        .arg("--manifest-path")
        .arg(repo.path().join("upsync.toml"))
        .assert()
        .success()
        .stdout(predicate::str::contains("linux-vanilla"));
}

#[test]
fn missing_manifest_exits_with_structural_status() {
    let empty = TempDir::new().unwrap();

    upsync(empty.path())
        .arg("list")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("upsync.toml not found"));
}

#[test]
fn unknown_source_exits_with_structural_status() {
    let repo = repo_with_manifest(MANIFEST);

    upsync(repo.path())
        .arg("sync")
        .arg("no-such-source")
        .assert()
        .code(2)
        .stderr(predicate::str::contains(
            "source 'no-such-source' is not defined",
        ));
}

#[test]
fn broken_manifest_syntax_exits_with_structural_status() {
    let repo = repo_with_manifest("sources = \"not a table\"");

    upsync(repo.path())
        .arg("list")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("invalid manifest file syntax"));
}

#[test]
fn pattern_without_capture_group_is_rejected_at_load() {
    let repo = repo_with_manifest(&MANIFEST.replace(
        r"linux-([0-9][0-9.]*)\.tar\.xz",
        "linux-latest",
    ));

    upsync(repo.path())
        .arg("list")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("invalid listing pattern"));
}
