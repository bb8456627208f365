// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[tokio::test]
async fn successful_command_returns_its_output() {
    let mut cmd = Command::new("echo");
    cmd.arg("hello");

    let output = run_with_timeout(cmd, Duration::from_secs(5), "echo")
        .await
        .unwrap();
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "hello");
}

#[tokio::test]
async fn timeout_expiry_is_a_descriptive_error() {
    let mut cmd = Command::new("sleep");
    cmd.arg("10");

    let err = run_with_timeout(cmd, Duration::from_millis(100), "sleep test")
        .await
        .unwrap_err();
    assert!(err.contains("timed out"), "{err}");
    assert!(err.contains("sleep test"), "{err}");
}

#[tokio::test]
async fn missing_binary_is_a_descriptive_error() {
    let cmd = Command::new("definitely-not-a-real-binary");

    let err = run_with_timeout(cmd, Duration::from_secs(1), "ghost")
        .await
        .unwrap_err();
    assert!(err.contains("ghost"), "{err}");
    assert!(err.contains("failed"), "{err}");
}

#[test]
fn exit_code_of_normal_exit() {
    let status = std::process::Command::new("sh")
        .args(["-c", "exit 4"])
        .status()
        .unwrap();
    assert_eq!(exit_code_of(status), 4);
}

#[test]
fn exit_code_of_signaled_process_uses_the_shell_convention() {
    let status = std::process::Command::new("sh")
        .args(["-c", "kill -9 $$"])
        .status()
        .unwrap();
    assert_eq!(exit_code_of(status), 137);
}
