// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::subprocess::exit_code_of;
use crib_scan::scan_source;

fn entry_named<'a>(report: &'a ScanReport, name: &str) -> &'a EntryPoint {
    report
        .entry_points
        .iter()
        .find(|ep| ep.name == name)
        .unwrap()
}

#[test]
fn driver_for_a_function_calls_it_and_exits_with_its_code() {
    let report = scan_source("fn run() -> i32 { 2 }").unwrap();
    let src = Path::new("/checkout/job.rs");

    let driver = driver_source(entry_named(&report, "run"), &report, src);
    assert!(driver.contains(r#"include!("/checkout/job.rs")"#), "{driver}");
    // No main in the target: included at the crate root, called directly.
    assert!(driver.contains("run()"), "{driver}");
    assert!(!driver.contains("mod job"), "{driver}");
    assert!(driver.contains("std::process::exit"), "{driver}");
}

#[test]
fn driver_for_a_callable_type_prefers_its_constructor() {
    let source = r#"
pub struct Job;
impl Job {
    pub fn new() -> Self { Job }
    pub fn call(&mut self) -> i32 { 0 }
}
"#;
    let report = scan_source(source).unwrap();
    let driver = driver_source(entry_named(&report, "Job"), &report, Path::new("/j.rs"));
    assert!(driver.contains("Job::new().call()"), "{driver}");
}

#[test]
fn driver_isolates_a_target_that_has_its_own_main() {
    let report = scan_source("fn main() {}
pub fn run() -> i32 { 0 }").unwrap();
    let driver = driver_source(entry_named(&report, "run"), &report, Path::new("/j.rs"));
    assert!(driver.contains("mod job"), "{driver}");
    assert!(driver.contains("job::run()"), "{driver}");
}

#[test]
fn driver_for_a_callable_type_without_new_uses_default() {
    let source = r#"
pub struct Job;
impl Job {
    pub fn call(&mut self) -> i32 { 0 }
}
"#;
    let report = scan_source(source).unwrap();
    let driver = driver_source(entry_named(&report, "Job"), &report, Path::new("/j.rs"));
    assert!(driver.contains("Job::default().call()"), "{driver}");
}

#[tokio::test]
async fn cradle_shaped_entries_are_not_wrappable() {
    let source = r#"
pub struct A;
impl Cradle for A {
    fn run(&mut self, _handle: &mut CradleHandle) -> i32 { 0 }
}
"#;
    let report = scan_source(source).unwrap();
    let build = tempfile::tempdir().unwrap();

    let err = compile_entry(
        Path::new("/j.rs"),
        entry_named(&report, "A"),
        &report,
        build.path(),
        Path::new("/"),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, LaunchError::Unwrappable { .. }), "{err}");
}

#[tokio::test]
async fn main_entries_compile_directly_and_run() {
    let work = tempfile::tempdir().unwrap();
    let src = work.path().join("job.rs");
    std::fs::write(&src, "fn main() {\n    std::process::exit(3);\n}\n").unwrap();

    let report = scan_source(&std::fs::read_to_string(&src).unwrap()).unwrap();
    let build = tempfile::tempdir().unwrap();
    let binary = compile_entry(
        &src,
        entry_named(&report, "main"),
        &report,
        build.path(),
        work.path(),
    )
    .await
    .unwrap();

    let status = std::process::Command::new(&binary).status().unwrap();
    assert_eq!(exit_code_of(status), 3);
}

#[tokio::test]
async fn function_entries_compile_through_the_generated_driver() {
    let work = tempfile::tempdir().unwrap();
    let src = work.path().join("job.rs");
    std::fs::write(&src, "pub fn run() -> i32 {\n    2\n}\n").unwrap();

    let report = scan_source(&std::fs::read_to_string(&src).unwrap()).unwrap();
    let build = tempfile::tempdir().unwrap();
    let binary = compile_entry(
        &src,
        entry_named(&report, "run"),
        &report,
        build.path(),
        work.path(),
    )
    .await
    .unwrap();

    let status = std::process::Command::new(&binary).status().unwrap();
    assert_eq!(exit_code_of(status), 2);
}

#[tokio::test]
async fn compile_failure_surfaces_the_compiler_message() {
    let work = tempfile::tempdir().unwrap();
    let src = work.path().join("job.rs");
    std::fs::write(&src, "pub fn run() -> NotAType {\n    0\n}\n").unwrap();

    let report = scan_source(&std::fs::read_to_string(&src).unwrap()).unwrap();
    let build = tempfile::tempdir().unwrap();
    let err = compile_entry(
        &src,
        entry_named(&report, "run"),
        &report,
        build.path(),
        work.path(),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, LaunchError::Compile { .. }), "{err}");
}
