// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use axum::extract::State;
use crib_core::{command_channel, status_channel, CommandReceiver, StatusSender};
use nix::unistd::Pid;
use serde_json::{json, Value};

/// Ctx wrapped around a real throwaway process (`sleep`), plus the child
/// ends of both channels so tests can stand in for the cradle.
struct Fixture {
    ctx: Arc<ControlCtx>,
    child_commands: CommandReceiver,
    child_status: StatusSender,
    _process: std::process::Child,
}

impl Fixture {
    fn live() -> Self {
        let process = std::process::Command::new("sleep")
            .arg("30")
            .spawn()
            .unwrap();
        Self::around(process)
    }

    fn dead() -> Self {
        let process = std::process::Command::new("true").spawn().unwrap();
        let fixture = Self::around(process);
        fixture.ctx.child.wait();
        fixture
    }

    fn around(process: std::process::Child) -> Self {
        let (command_tx, command_rx) = command_channel().unwrap();
        let (status_tx, status_rx) = status_channel().unwrap();

        let child = Arc::new(ChildProcess::from_pid(Pid::from_raw(process.id() as i32)));
        let ctx = Arc::new(ControlCtx {
            child,
            commands: command_tx,
            status: Mutex::new(StatusCache {
                rx: status_rx,
                last: None,
            }),
        });

        Self {
            ctx,
            child_commands: command_rx,
            child_status: status_tx,
            _process: process,
        }
    }
}

impl Drop for Fixture {
    fn drop(&mut self) {
        let _ = self.ctx.child.kill();
        self.ctx.child.wait();
    }
}

async fn body_of(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn command_verbs_enqueue_in_request_order() {
    let fixture = Fixture::live();

    let responses = [
        start(State(Arc::clone(&fixture.ctx))).await,
        pause(State(Arc::clone(&fixture.ctx))).await,
        resume(State(Arc::clone(&fixture.ctx))).await,
        stop(State(Arc::clone(&fixture.ctx))).await,
    ];
    for response in responses {
        let body = body_of(response).await;
        assert_eq!(body["status"], json!("SENT"));
        assert_eq!(body["target-process"], json!(fixture.ctx.child.pid()));
    }

    let seen: Vec<Command> = std::iter::from_fn(|| fixture.child_commands.poll().unwrap())
        .map(|m| m.cmd)
        .collect();
    assert_eq!(
        seen,
        vec![Command::Start, Command::Pause, Command::Resume, Command::Stop]
    );
}

#[tokio::test]
async fn commands_to_a_dead_child_return_an_error_envelope() {
    let fixture = Fixture::dead();

    let response = start(State(Arc::clone(&fixture.ctx))).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = body_of(response).await;
    assert_eq!(body["status"], json!("ERROR"));
    assert!(body["error"].as_str().unwrap().contains("not alive"));
}

#[tokio::test]
async fn data_delivers_the_parsed_body_as_config() {
    let fixture = Fixture::live();

    let response = data(
        State(Arc::clone(&fixture.ctx)),
        Bytes::from_static(br#"{"foo": 42}"#),
    )
    .await;
    assert_eq!(body_of(response).await["command"], json!("CONFIG"));

    let msg = fixture.child_commands.poll().unwrap().unwrap();
    assert_eq!(msg.cmd, Command::Config);
    assert_eq!(msg.data, json!({"foo": 42}));
}

#[tokio::test]
async fn data_with_an_unparsable_body_is_rejected() {
    let fixture = Fixture::live();

    let response = data(State(Arc::clone(&fixture.ctx)), Bytes::from_static(b"nope{")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_of(response).await;
    assert_eq!(body["status"], json!("ERROR"));
    // Nothing reached the channel.
    assert!(fixture.child_commands.poll().unwrap().is_none());
}

#[tokio::test]
async fn status_returns_the_newest_value_and_remembers_it() {
    let fixture = Fixture::live();

    for i in 1..=3 {
        fixture.child_status.publish(&json!({"ii": i})).unwrap();
    }

    let first = body_of(status(State(Arc::clone(&fixture.ctx))).await).await;
    assert_eq!(first["process-status"], json!({"ii": 3}));

    // No new publishes: the cached value is served again.
    let second = body_of(status(State(Arc::clone(&fixture.ctx))).await).await;
    assert_eq!(second["process-status"], json!({"ii": 3}));
}

#[tokio::test]
async fn status_before_any_publish_is_an_empty_object() {
    let fixture = Fixture::live();
    let body = body_of(status(State(Arc::clone(&fixture.ctx))).await).await;
    assert_eq!(body["process-status"], json!({}));
}

#[tokio::test]
async fn kill_terminates_the_child_and_answers_with_the_envelope() {
    let fixture = Fixture::live();

    let response = kill(State(Arc::clone(&fixture.ctx))).await;
    let body = body_of(response).await;
    assert_eq!(body["status"], json!("SENT"));
    assert_eq!(body["command"], json!("KILL"));

    assert_eq!(fixture.ctx.child.wait(), 137);
    assert!(!fixture.ctx.child.alive());
}

#[tokio::test]
async fn hb_on_a_dead_child_mentions_not_alive() {
    let fixture = Fixture::dead();

    let response = hb(State(Arc::clone(&fixture.ctx))).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = body_of(response).await;
    assert!(body["error"].as_str().unwrap().contains("not alive"));
}

#[tokio::test]
async fn hb_on_a_live_child_reports_the_pid() {
    let fixture = Fixture::live();

    let body = body_of(hb(State(Arc::clone(&fixture.ctx))).await).await;
    assert_eq!(body["status"], json!(true));
    assert_eq!(body["process"]["pid"], json!(fixture.ctx.child.pid()));
}

#[tokio::test]
async fn unknown_routes_get_the_uniform_404() {
    let response = not_found("/no/such/route".parse::<Uri>().unwrap()).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = body_of(response).await;
    assert_eq!(body, json!({"detail": "Route not found: /no/such/route"}));
}

async fn boom() -> &'static str {
    panic!("handler blew up")
}

#[tokio::test]
async fn a_panicking_handler_collapses_to_the_500_envelope() {
    use tower::ServiceExt;

    // Same layer the control router installs, around a route that panics.
    let app = axum::Router::new()
        .route("/boom", get(boom))
        .layer(panic_envelope_layer());

    let response = app
        .oneshot(
            axum::http::Request::builder()
                .uri("/boom")
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = body_of(response).await;
    let detail = body["detail"].as_str().unwrap();
    assert!(detail.starts_with("An internal error occurred:"), "{detail}");
    assert!(detail.contains("handler blew up"), "{detail}");
}
