use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const REPOSITORY: &str = r#"{
    "communities": [
        {"id": 1, "handle": "123456789/1", "name": "Science", "collections": [2]}
    ],
    "collections": [
        {"id": 2, "handle": "123456789/2", "name": "Physics", "items": [3, 4]}
    ],
    "items": [
        {"id": 3, "handle": "123456789/3", "owning_collection": 2, "bundles": [5],
         "metadata": [{"field": {"schema": "dc", "element": "title"}, "value": "First"}]},
        {"id": 4, "handle": "123456789/4", "owning_collection": 2,
         "metadata": [{"field": {"schema": "dc", "element": "title"}, "value": "Second"}]}
    ],
    "bundles": [
        {"id": 5, "name": "ORIGINAL", "bitstreams": [6]}
    ],
    "bitstreams": [
        {"id": 6, "name": "a.pdf", "mimeType": "application/pdf", "size": 100,
         "internalId": "abc", "checksum": "00ff", "checksumAlgorithm": "MD5"}
    ],
    "epeople": [{"id": 7, "email": "admin@example.org"}],
    "groups": [{"id": 8, "name": "Anonymous"}]
}"#;

struct Env {
    dir: TempDir,
    repo: PathBuf,
}

impl Env {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let repo = dir.path().join("repository.json");
        fs::write(&repo, REPOSITORY).unwrap();
        Self { dir, repo }
    }

    /// The binary, isolated from the user's config and environment.
    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("dsbulk").unwrap();
        cmd.env("DSBULK_HOME", self.dir.path())
            .env_remove("DSBULK_REPO")
            .env_remove("RUST_LOG")
            .env("NO_COLOR", "1");
        cmd
    }

    fn with_repo(&self) -> Command {
        let mut cmd = self.cmd();
        cmd.arg("--repo").arg(&self.repo);
        cmd
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }
}

fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap()
}

#[test]
fn help_exits_zero_and_lists_keys() {
    let env = Env::new();
    env.cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Available keys:"))
        .stdout(predicate::str::contains("checksumAlgorithm"));

    env.cmd()
        .args(["list", "-h"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--include"))
        .stdout(predicate::str::contains("BITSTREAM"));
}

#[test]
fn no_command_prints_help() {
    let env = Env::new();
    env.cmd()
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage: dsbulk"));
}

#[test]
fn list_items_as_txt() {
    let env = Env::new();
    env.with_repo()
        .args(["list", "-r", "123456789/2", "-t", "item"])
        .assert()
        .success()
        .stdout(
            "object=ITEM.3 handle=123456789/3 parent=COLLECTION.2 name=First\n\
             object=ITEM.4 handle=123456789/4 parent=COLLECTION.2 name=Second\n",
        );
}

#[test]
fn list_bitstreams_as_tsv_with_upward_keys() {
    let env = Env::new();
    env.with_repo()
        .args([
            "list",
            "-r",
            "community.1",
            "-t",
            "bitstream",
            "-f",
            "tsv",
            "-i",
            "name, size, BUNDLE.name, COLLECTION.name",
        ])
        .assert()
        .success()
        .stdout("name\tsize\tBUNDLE.name\tCOLLECTION.name\na.pdf\t100\tORIGINAL\tPhysics\n");
}

#[test]
fn community_root_collections_have_it_as_up() {
    let env = Env::new();
    env.with_repo()
        .args(["list", "-r", "community.1", "-t", "collection", "-i", "object,up"])
        .assert()
        .success()
        .stdout("object=COLLECTION.2 up=COMMUNITY.1\n");
}

#[test]
fn repository_from_environment() {
    let env = Env::new();
    env.cmd()
        .env("DSBULK_REPO", &env.repo)
        .args(["list", "-r", "item.4", "-i", "id,dc.title"])
        .assert()
        .success()
        .stdout("id=4 dc.title=Second\n");
}

#[test]
fn config_supplies_defaults() {
    let env = Env::new();
    fs::write(
        env.path("config.json"),
        format!(
            r#"{{"repository": {:?}, "format": "TSV", "include": "id"}}"#,
            env.repo.display().to_string()
        ),
    )
    .unwrap();
    env.cmd()
        .args(["list", "-r", "collection.2", "-t", "item"])
        .assert()
        .success()
        .stdout("id\n3\n4\n");
}

#[test]
fn argument_errors_exit_one_with_usage() {
    let env = Env::new();
    env.with_repo()
        .args(["list", "-r", "bitstream.6", "-t", "collection"])
        .assert()
        .code(1)
        .stdout("")
        .stderr(predicate::str::contains("cannot list COLLECTION targets"))
        .stderr(predicate::str::contains("Usage: dsbulk"));

    env.with_repo()
        .args(["list", "-t", "item"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("missing --root"));

    env.with_repo()
        .args(["list", "-r", "collection.2", "-f", "csv"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("unknown format"));
}

#[test]
fn unknown_flags_exit_one() {
    let env = Env::new();
    env.with_repo().args(["list", "--bogus"]).assert().code(1);
}

#[test]
fn missing_repository_exits_one_without_usage() {
    let env = Env::new();
    env.cmd()
        .arg("--repo")
        .arg(env.path("missing.json"))
        .args(["list", "-r", "collection.2"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("does not exist"))
        .stderr(predicate::str::contains("Usage:").not());
}

#[test]
fn metadata_edit_persists() {
    let env = Env::new();
    env.with_repo()
        .args([
            "metadata",
            "-r",
            "collection.2",
            "-t",
            "item",
            "-e",
            "admin@example.org",
            "-m",
            "dc.title=Renamed",
            "-i",
            "id",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "id=3 before:dc.title=First after:dc.title=Renamed changed=true result=ok",
        ))
        .stderr(predicate::str::contains("Updated dc.title on 2 of 2 items"));

    env.with_repo()
        .args(["list", "-r", "collection.2", "-t", "item", "-i", "name"])
        .assert()
        .success()
        .stdout("name=Renamed\nname=Renamed\n");
}

#[test]
fn metadata_dry_run_leaves_file_alone() {
    let env = Env::new();
    let original = read(&env.repo);
    env.with_repo()
        .args([
            "metadata",
            "-r",
            "item.3",
            "-e",
            "admin@example.org",
            "-m",
            "dc.title=Renamed",
            "--dry-run",
        ])
        .assert()
        .success()
        .stderr(predicate::str::contains("Dry run"));
    assert_eq!(read(&env.repo), original);
}

#[test]
fn metadata_requires_known_eperson() {
    let env = Env::new();
    env.with_repo()
        .args(["metadata", "-r", "item.3", "-e", "who@nowhere", "-m", "dc.title=x"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("unknown e-person"));
}

#[test]
fn policy_add_and_remove() {
    let env = Env::new();
    let base = [
        "policy",
        "-r",
        "item.3",
        "-e",
        "admin@example.org",
        "-a",
        "read",
        "-w",
        "Anonymous",
        "-i",
        "object",
    ];
    env.with_repo()
        .args(base)
        .arg("--add")
        .assert()
        .success()
        .stdout(
            "object=ITEM.3 before:policies=[] after:policies=[READ:GROUP:Anonymous] changed=true result=ok\n",
        );
    assert!(read(&env.repo).contains(r#""action": "READ""#));

    env.with_repo()
        .args(base)
        .arg("--remove")
        .assert()
        .success()
        .stdout(predicate::str::contains("after:policies=[] changed=true"));
}

#[test]
fn replace_bitstream_content() {
    let env = Env::new();
    let source = env.path("hello.txt");
    fs::write(&source, "hello").unwrap();

    env.with_repo()
        .args(["replace", "-r", "item.3", "-t", "bitstream", "-e", "admin@example.org", "-i", "name,size,mimeType"])
        .arg("-F")
        .arg(&source)
        .assert()
        .success()
        .stdout(predicate::str::starts_with(
            "name=a.pdf size=5 mimeType=text/plain before:checksum=00ff after:checksum=2cf24dba",
        ))
        .stdout(predicate::str::ends_with("result=ok\n"));

    let stored = read(&env.repo);
    assert!(stored.contains("SHA-256"));
    let assets: Vec<_> = fs::read_dir(env.path("assetstore")).unwrap().collect();
    assert_eq!(assets.len(), 1);
}

#[test]
fn replace_rejects_non_bitstream_targets() {
    let env = Env::new();
    let source = env.path("hello.txt");
    fs::write(&source, "hello").unwrap();
    env.with_repo()
        .args(["replace", "-r", "item.3", "-e", "admin@example.org"])
        .arg("-F")
        .arg(&source)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("replace works on BITSTREAM targets"));
}
