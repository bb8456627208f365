// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crib_core::CradleFn;
use serde_json::json;

fn config_for_port(port: u16) -> ResolvedConfig {
    ResolvedConfig::new(json!({
        "harness": {"interface": "127.0.0.1", "port": port},
    }))
    .unwrap()
}

#[test]
fn harness_construction_creates_both_channels() {
    let harness = ProcessHarness::new(config_for_port(4710));
    assert!(harness.is_ok());
}

#[test]
fn occupied_port_fails_before_any_spawn() {
    let holder = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = holder.local_addr().unwrap().port();

    let harness = ProcessHarness::new(config_for_port(port)).unwrap();
    let job = Box::new(CradleFn::new(|_: &mut crib_core::CradleHandle| -> () {
        panic!("the job must never run when binding fails");
    }));

    let err = harness.run(job).unwrap_err();
    assert!(matches!(err, HarnessError::Bind { .. }), "{err}");
}
