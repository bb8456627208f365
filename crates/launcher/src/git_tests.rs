// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crib_config::SourceSpec;
use std::process::Command as StdCommand;

fn spec(repo: &str, workdir: &Path, use_local: bool) -> SourceSpec {
    SourceSpec {
        repo: repo.to_string(),
        branch: "main".to_string(),
        workdir: workdir.to_path_buf(),
        src_subfolder: None,
        file_to_run: "job.rs".to_string(),
        entry_point: None,
        use_local,
    }
}

/// Create a local origin repository with one committed file.
fn init_origin(dir: &Path) {
    let git = |args: &[&str]| {
        let status = StdCommand::new("git")
            .arg("-C")
            .arg(dir)
            .args(args)
            .status()
            .unwrap();
        assert!(status.success(), "git {:?} failed", args);
    };

    std::fs::create_dir_all(dir).unwrap();
    let status = StdCommand::new("git")
        .args(["-c", "init.defaultBranch=main", "init"])
        .arg(dir)
        .status()
        .unwrap();
    assert!(status.success());

    std::fs::write(dir.join("job.rs"), "fn main() {}\n").unwrap();
    git(&["add", "job.rs"]);
    git(&[
        "-c",
        "user.email=ci@example.com",
        "-c",
        "user.name=ci",
        "commit",
        "-m",
        "seed",
    ]);
}

#[yare::parameterized(
    https          = { "https://example.com/team/jobs.git", "jobs" },
    trailing_slash = { "https://example.com/team/jobs/",    "jobs" },
    bare_name      = { "jobs",                              "jobs" },
    local_path     = { "/srv/git/jobs.git",                 "jobs" },
)]
fn repo_name_is_the_last_segment(url: &str, expected: &str) {
    let source = GitSource::from_spec(&spec(url, Path::new("/tmp"), false));
    assert_eq!(source.repo_name(), expected);
}

#[tokio::test]
async fn fresh_clone_materializes_the_tree() {
    let origin = tempfile::tempdir().unwrap();
    init_origin(origin.path());
    let workdir = tempfile::tempdir().unwrap();

    let source = GitSource::from_spec(&spec(
        &origin.path().display().to_string(),
        workdir.path(),
        false,
    ));
    let checkout = source.checkout().await.unwrap();

    assert!(checkout.join(".git").exists());
    assert!(checkout.join("job.rs").exists());
}

#[tokio::test]
async fn existing_checkout_is_updated_to_the_remote_head() {
    let origin = tempfile::tempdir().unwrap();
    init_origin(origin.path());
    let workdir = tempfile::tempdir().unwrap();
    let origin_url = origin.path().display().to_string();

    let source = GitSource::from_spec(&spec(&origin_url, workdir.path(), false));
    source.checkout().await.unwrap();

    // Advance the origin, then check out again.
    std::fs::write(origin.path().join("second.rs"), "fn run() {}\n").unwrap();
    let status = StdCommand::new("git")
        .arg("-C")
        .arg(origin.path())
        .args([
            "-c",
            "user.email=ci@example.com",
            "-c",
            "user.name=ci",
            "add",
            "second.rs",
        ])
        .status()
        .unwrap();
    assert!(status.success());
    let status = StdCommand::new("git")
        .arg("-C")
        .arg(origin.path())
        .args([
            "-c",
            "user.email=ci@example.com",
            "-c",
            "user.name=ci",
            "commit",
            "-m",
            "second",
        ])
        .status()
        .unwrap();
    assert!(status.success());

    let checkout = source.checkout().await.unwrap();
    assert!(checkout.join("second.rs").exists());
}

#[tokio::test]
async fn use_local_skips_the_network_but_requires_a_checkout() {
    let origin = tempfile::tempdir().unwrap();
    init_origin(origin.path());
    let workdir = tempfile::tempdir().unwrap();
    let origin_url = origin.path().display().to_string();

    // Nothing checked out yet: offline mode has nothing to use.
    let offline = GitSource::from_spec(&spec(&origin_url, workdir.path(), true));
    let err = offline.checkout().await.unwrap_err();
    assert!(matches!(err, LaunchError::Checkout(_)), "{err}");

    // After a clone, offline mode returns the existing tree untouched.
    let online = GitSource::from_spec(&spec(&origin_url, workdir.path(), false));
    online.checkout().await.unwrap();
    let checkout = offline.checkout().await.unwrap();
    assert!(checkout.join("job.rs").exists());
}

#[tokio::test]
async fn mismatched_remote_is_refused() {
    let origin = tempfile::tempdir().unwrap();
    init_origin(origin.path());
    let workdir = tempfile::tempdir().unwrap();

    let source = GitSource::from_spec(&spec(
        &origin.path().display().to_string(),
        workdir.path(),
        false,
    ));
    source.checkout().await.unwrap();

    // Same workdir, same repo name, different remote.
    let other = tempfile::tempdir().unwrap();
    let other_url = format!("{}/{}", other.path().display(), origin.path().file_name().unwrap().to_string_lossy());
    let impostor = GitSource::from_spec(&spec(&other_url, workdir.path(), false));

    let err = impostor.checkout().await.unwrap_err();
    assert!(matches!(err, LaunchError::Checkout(_)), "{err}");
    assert!(err.to_string().contains("expects"), "{err}");
}
