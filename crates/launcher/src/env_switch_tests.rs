// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde_json::json;
use std::os::unix::fs::PermissionsExt;

#[test]
fn config_file_holds_the_resolved_tree_and_disappears_after_use() {
    let root = json!({"harness": {"interface": "127.0.0.1", "port": 3000}});

    let file = write_config_file(&root).unwrap();
    let path = file.path().to_path_buf();

    let written: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(written, root);

    drop(file);
    assert!(!path.exists());
}

#[test]
fn named_env_delegates_through_the_manager() {
    // Manager stub that never runs the argv; its exit code proves the
    // delegation happened.
    let dir = tempfile::tempdir().unwrap();
    let script = dir.path().join("stub-mamba");
    std::fs::write(&script, "#!/bin/sh\nexit 5\n").unwrap();
    std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

    let config = json!({
        "env": {"name": "jobs-py311"},
        "source": {
            "repo": "unused",
            "branch": "main",
            "workdir": "/tmp",
            "file-to-run": "job.rs",
        },
    });

    let code =
        EnvSwitchingLauncher::launch_with(config, &EnvManager::with_program(script)).unwrap();
    assert_eq!(code, 5);
}

#[test]
fn env_section_without_a_name_is_rejected() {
    let err = EnvSwitchingLauncher::launch(json!({"env": {}})).unwrap_err();
    assert!(
        matches!(
            err,
            LaunchError::Config(crib_config::ConfigError::MissingEnvName)
        ),
        "{err}"
    );
}

#[test]
fn no_env_section_falls_through_to_the_repo_launcher() {
    // Without a source section the repo launcher rejects the config,
    // proving the fall-through happened in the current environment.
    let err = EnvSwitchingLauncher::launch(json!({})).unwrap_err();
    assert!(
        matches!(
            err,
            LaunchError::Config(crib_config::ConfigError::MissingSource)
        ),
        "{err}"
    );
}
