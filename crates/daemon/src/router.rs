// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP routing: one POST endpoint per `Service.Method`, JSON in and
//! out. Service failures are folded into the response `error` field at
//! HTTP 200; only transport-level problems surface as HTTP errors.

use crate::protocol::{
    Ack, HostBody, HostListBody, LicenceListBody, LicenceListRequest, LogItemRequest, LogRequest,
    NmsBody, Reply, RunnerBody, RunnerDeleteRequest, RunnerFailedRequest, RunnerFinishRequest,
    RunnerGetRequest, RunnerListBody, RunnerStartRequest, ScriptBody, StageBody, StageRequest,
    UploadFileBody, UploadFileRequest,
};
use crate::services::{HostService, LicenceService, RunnerService};
use avian_core::{HostSpec, LicenceServerBatch, RunnerSpec};
use avian_remote::Shell;
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use std::sync::Arc;
use std::time::Duration;

/// Bounded request handling; the RPC bodies are small and the work is
/// store-local, so anything slower than this is stuck.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

pub struct AppState<S: Shell> {
    pub runners: RunnerService<S>,
    pub hosts: HostService<S>,
    pub licences: LicenceService,
}

pub fn router<S: Shell>(state: Arc<AppState<S>>) -> Router {
    Router::new()
        .route("/api/RunnerService.Apply", post(runner_apply::<S>))
        .route("/api/RunnerService.List", post(runner_list::<S>))
        .route("/api/RunnerService.Get", post(runner_get::<S>))
        .route("/api/RunnerService.Delete", post(runner_delete::<S>))
        .route("/api/RunnerService.Script", post(runner_script::<S>))
        .route("/api/RunnerService.Start", post(runner_start::<S>))
        .route("/api/RunnerService.Heartbeat", post(runner_heartbeat::<S>))
        .route("/api/RunnerService.Finish", post(runner_finish::<S>))
        .route("/api/RunnerService.Failed", post(runner_failed::<S>))
        .route("/api/RunnerService.StartStage", post(start_stage::<S>))
        .route("/api/RunnerService.FinishStage", post(finish_stage::<S>))
        .route("/api/RunnerService.FailedStage", post(failed_stage::<S>))
        .route("/api/RunnerService.LogItem", post(log_item::<S>))
        .route("/api/RunnerService.LogDebug", post(log_debug::<S>))
        .route("/api/RunnerService.LogInfo", post(log_info::<S>))
        .route("/api/RunnerService.LogError", post(log_error::<S>))
        .route("/api/RunnerService.UploadFile", post(upload_file::<S>))
        .route("/api/HostService.Apply", post(host_apply::<S>))
        .route("/api/HostService.List", post(host_list::<S>))
        .route("/api/LicenceService.Apply", post(nms_apply::<S>))
        .route("/api/LicenceService.List", post(nms_list::<S>))
        .route("/api/LicenceService.ListLicences", post(nms_licences::<S>))
        .layer(middleware::from_fn(request_timeout))
        .with_state(state)
}

async fn request_timeout(req: Request, next: Next) -> Response {
    match tokio::time::timeout(REQUEST_TIMEOUT, next.run(req)).await {
        Ok(response) => response,
        Err(_) => (StatusCode::REQUEST_TIMEOUT, "request timed out").into_response(),
    }
}

// --- runner service ---

async fn runner_apply<S: Shell>(
    State(app): State<Arc<AppState<S>>>,
    Json(req): Json<RunnerSpec>,
) -> Json<Reply<RunnerBody>> {
    Json(Reply::from_result(
        app.runners
            .apply(req)
            .await
            .map(|runner| RunnerBody { runner }),
    ))
}

async fn runner_list<S: Shell>(State(app): State<Arc<AppState<S>>>) -> Json<Reply<RunnerListBody>> {
    Json(Reply::from_result(
        app.runners.list().map(|runners| RunnerListBody { runners }),
    ))
}

async fn runner_get<S: Shell>(
    State(app): State<Arc<AppState<S>>>,
    Json(req): Json<RunnerGetRequest>,
) -> Json<Reply<RunnerBody>> {
    Json(Reply::from_result(
        app.runners.get(&req.name).map(|runner| RunnerBody { runner }),
    ))
}

async fn runner_delete<S: Shell>(
    State(app): State<Arc<AppState<S>>>,
    Json(req): Json<RunnerDeleteRequest>,
) -> Json<Reply<Ack>> {
    Json(Reply::from_result(
        app.runners.delete(&req.name, req.force).map(|_| Ack::default()),
    ))
}

async fn runner_script<S: Shell>(
    State(app): State<Arc<AppState<S>>>,
    Json(req): Json<RunnerGetRequest>,
) -> Json<Reply<ScriptBody>> {
    Json(Reply::from_result(
        app.runners.script(&req.name).map(|script| ScriptBody { script }),
    ))
}

async fn runner_start<S: Shell>(
    State(app): State<Arc<AppState<S>>>,
    Json(req): Json<RunnerStartRequest>,
) -> Json<Reply<Ack>> {
    Json(Reply::from_result(
        app.runners.start(req.id, req.case_id).map(|_| Ack::default()),
    ))
}

async fn runner_heartbeat<S: Shell>(
    State(app): State<Arc<AppState<S>>>,
    Json(req): Json<RunnerStartRequest>,
) -> Json<Reply<Ack>> {
    Json(Reply::from_result(app.runners.heartbeat(req.id).map(|_| Ack::default())))
}

async fn runner_finish<S: Shell>(
    State(app): State<Arc<AppState<S>>>,
    Json(req): Json<RunnerFinishRequest>,
) -> Json<Reply<Ack>> {
    Json(Reply::from_result(
        app.runners.finish(req.id).await.map(|_| Ack::default()),
    ))
}

async fn runner_failed<S: Shell>(
    State(app): State<Arc<AppState<S>>>,
    Json(req): Json<RunnerFailedRequest>,
) -> Json<Reply<Ack>> {
    Json(Reply::from_result(
        app.runners
            .failed(req.id, &req.exception)
            .await
            .map(|_| Ack::default()),
    ))
}

async fn start_stage<S: Shell>(
    State(app): State<Arc<AppState<S>>>,
    Json(req): Json<StageRequest>,
) -> Json<Reply<StageBody>> {
    Json(Reply::from_result(
        app.runners.start_stage(req.stage_id).map(|stage| StageBody { stage }),
    ))
}

async fn finish_stage<S: Shell>(
    State(app): State<Arc<AppState<S>>>,
    Json(req): Json<StageRequest>,
) -> Json<Reply<StageBody>> {
    Json(Reply::from_result(
        app.runners
            .finish_stage(req.stage_id)
            .map(|stage| StageBody { stage }),
    ))
}

async fn failed_stage<S: Shell>(
    State(app): State<Arc<AppState<S>>>,
    Json(req): Json<StageRequest>,
) -> Json<Reply<StageBody>> {
    Json(Reply::from_result(
        app.runners
            .failed_stage(req.stage_id)
            .map(|stage| StageBody { stage }),
    ))
}

async fn log_item<S: Shell>(
    State(app): State<Arc<AppState<S>>>,
    Json(req): Json<LogItemRequest>,
) -> Json<Reply<Ack>> {
    Json(Reply::from_result(app.runners.log_item(req).map(|_| Ack::default())))
}

async fn log_debug<S: Shell>(
    State(app): State<Arc<AppState<S>>>,
    Json(req): Json<LogRequest>,
) -> Json<Reply<Ack>> {
    Json(Reply::from_result(
        app.runners.log_message("debug", req).map(|_| Ack::default()),
    ))
}

async fn log_info<S: Shell>(
    State(app): State<Arc<AppState<S>>>,
    Json(req): Json<LogRequest>,
) -> Json<Reply<Ack>> {
    Json(Reply::from_result(
        app.runners.log_message("info", req).map(|_| Ack::default()),
    ))
}

async fn log_error<S: Shell>(
    State(app): State<Arc<AppState<S>>>,
    Json(req): Json<LogRequest>,
) -> Json<Reply<Ack>> {
    Json(Reply::from_result(
        app.runners.log_message("error", req).map(|_| Ack::default()),
    ))
}

async fn upload_file<S: Shell>(
    State(app): State<Arc<AppState<S>>>,
    Json(req): Json<UploadFileRequest>,
) -> Json<Reply<UploadFileBody>> {
    Json(Reply::from_result(
        app.runners
            .upload_file(&req.name, &req.content)
            .await
            .map(|path| UploadFileBody { path }),
    ))
}

// --- host service ---

async fn host_apply<S: Shell>(
    State(app): State<Arc<AppState<S>>>,
    Json(req): Json<HostSpec>,
) -> Json<Reply<HostBody>> {
    Json(Reply::from_result(
        app.hosts.apply(req).await.map(|server| HostBody { server }),
    ))
}

async fn host_list<S: Shell>(State(app): State<Arc<AppState<S>>>) -> Json<Reply<HostListBody>> {
    Json(Reply::from_result(
        app.hosts.list().map(|servers| HostListBody { servers }),
    ))
}

// --- licence service ---

async fn nms_apply<S: Shell>(
    State(app): State<Arc<AppState<S>>>,
    Json(req): Json<LicenceServerBatch>,
) -> Json<Reply<NmsBody>> {
    Json(Reply::from_result(app.licences.apply(req).map(|nms| NmsBody { nms })))
}

async fn nms_list<S: Shell>(State(app): State<Arc<AppState<S>>>) -> Json<Reply<NmsBody>> {
    Json(Reply::from_result(app.licences.list().map(|nms| NmsBody { nms })))
}

async fn nms_licences<S: Shell>(
    State(app): State<Arc<AppState<S>>>,
    Json(req): Json<LicenceListRequest>,
) -> Json<Reply<LicenceListBody>> {
    Json(Reply::from_result(
        app.licences
            .list_licences(req.nms_id)
            .map(|licences| LicenceListBody { licences }),
    ))
}

#[cfg(test)]
#[path = "router_tests.rs"]
mod tests;
