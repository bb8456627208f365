// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The HTTP control surface.
//!
//! All command verbs are idempotent GETs; `/data` POSTs a JSON payload.
//! Handlers never reach into the child: they write the command channel,
//! drain the status channel, and probe liveness through the child handle.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Json;
use parking_lot::Mutex;
use serde_json::Value;
use tower_http::catch_panic::CatchPanicLayer;
use tracing::warn;

use crib_core::{Command, CommandMsg, CommandSender, StatusReceiver};

use crate::child::ChildProcess;
use crate::envelope::{CommandEnvelope, ErrorBody, HeartbeatEnvelope, StatusEnvelope};
use crate::heartbeat;

/// Shared harness context for all request handlers.
pub(crate) struct ControlCtx {
    pub child: Arc<ChildProcess>,
    pub commands: CommandSender,
    pub status: Mutex<StatusCache>,
}

/// Last-known status plus the channel it is drained from.
///
/// Owned by the supervising loop only; the child never reads status.
pub(crate) struct StatusCache {
    pub rx: StatusReceiver,
    pub last: Option<Value>,
}

/// Build the control router.
pub(crate) fn control_router(ctx: Arc<ControlCtx>) -> axum::Router {
    axum::Router::new()
        .route("/hb", get(hb))
        .route("/start", get(start))
        .route("/stop", get(stop))
        .route("/pause", get(pause))
        .route("/resume", get(resume))
        .route("/kill", get(kill))
        .route("/status", get(status))
        .route("/data", post(data))
        .fallback(not_found)
        .layer(panic_envelope_layer())
        .with_state(ctx)
}

type PanicHandler = fn(Box<dyn std::any::Any + Send + 'static>) -> Response;

/// Anything that escapes a handler collapses to the uniform 500 envelope
/// instead of aborting the connection.
pub(crate) fn panic_envelope_layer() -> CatchPanicLayer<PanicHandler> {
    CatchPanicLayer::custom(handle_panic as PanicHandler)
}

fn handle_panic(err: Box<dyn std::any::Any + Send + 'static>) -> Response {
    let detail = if let Some(message) = err.downcast_ref::<String>() {
        message.clone()
    } else if let Some(message) = err.downcast_ref::<&str>() {
        (*message).to_string()
    } else {
        "unknown panic".to_string()
    };

    tracing::error!(detail = %detail, "handler panicked");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorBody::internal(detail)),
    )
        .into_response()
}

async fn hb(State(ctx): State<Arc<ControlCtx>>) -> Response {
    if !ctx.child.alive() {
        return not_alive(&ctx, Command::Heartbeat);
    }

    match heartbeat::snapshot(ctx.child.pid()).await {
        Some(snapshot) => Json(HeartbeatEnvelope::new(snapshot)).into_response(),
        // Exited between the liveness probe and the sample.
        None => not_alive(&ctx, Command::Heartbeat),
    }
}

async fn start(State(ctx): State<Arc<ControlCtx>>) -> Response {
    enqueue(&ctx, CommandMsg::new(Command::Start))
}

async fn stop(State(ctx): State<Arc<ControlCtx>>) -> Response {
    enqueue(&ctx, CommandMsg::new(Command::Stop))
}

async fn pause(State(ctx): State<Arc<ControlCtx>>) -> Response {
    enqueue(&ctx, CommandMsg::new(Command::Pause))
}

async fn resume(State(ctx): State<Arc<ControlCtx>>) -> Response {
    enqueue(&ctx, CommandMsg::new(Command::Resume))
}

/// POST body parsed as JSON and delivered as a CONFIG command.
async fn data(State(ctx): State<Arc<ControlCtx>>, body: Bytes) -> Response {
    let payload: Value = if body.is_empty() {
        Value::Object(serde_json::Map::new())
    } else {
        match serde_json::from_slice(&body) {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, "rejecting /data body that does not parse");
                return (
                    StatusCode::BAD_REQUEST,
                    Json(CommandEnvelope::error(
                        Command::Config,
                        ctx.child.pid(),
                        format!("Failed to parse json body: {e}"),
                    )),
                )
                    .into_response();
            }
        }
    };

    enqueue(&ctx, CommandMsg::with_data(Command::Config, payload))
}

/// OS-kill the child immediately. Bypasses the command channel entirely.
async fn kill(State(ctx): State<Arc<ControlCtx>>) -> Response {
    warn!(pid = ctx.child.pid(), "received KILL from control surface");

    match ctx.child.kill() {
        Ok(()) => {
            warn!(pid = ctx.child.pid(), "killed managed process");
            Json(CommandEnvelope::sent(Command::Kill, ctx.child.pid())).into_response()
        }
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorBody::internal(e)),
        )
            .into_response(),
    }
}

/// Drain pending status values, keep the newest, return it.
async fn status(State(ctx): State<Arc<ControlCtx>>) -> Response {
    let mut cache = ctx.status.lock();
    match cache.rx.drain() {
        Ok(Some(latest)) => cache.last = Some(latest),
        Ok(None) => {}
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorBody::internal(e)),
            )
                .into_response();
        }
    }

    let last = cache
        .last
        .clone()
        .unwrap_or_else(|| Value::Object(serde_json::Map::new()));
    Json(StatusEnvelope::new(last, ctx.child.pid())).into_response()
}

async fn not_found(uri: Uri) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorBody::not_found(uri.path())),
    )
        .into_response()
}

/// Push one command record; shared by every command verb.
fn enqueue(ctx: &ControlCtx, msg: CommandMsg) -> Response {
    if !ctx.child.alive() {
        return not_alive(ctx, msg.cmd);
    }

    match ctx.commands.send(&msg) {
        Ok(()) => Json(CommandEnvelope::sent(msg.cmd, ctx.child.pid())).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(CommandEnvelope::error(
                msg.cmd,
                ctx.child.pid(),
                e.to_string(),
            )),
        )
            .into_response(),
    }
}

fn not_alive(ctx: &ControlCtx, cmd: Command) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(CommandEnvelope::error(
            cmd,
            ctx.child.pid(),
            "Launched process is not alive",
        )),
    )
        .into_response()
}

#[cfg(test)]
#[path = "http_tests.rs"]
mod tests;
