//! Local HTTP command surface.
//!
//! Binds to loopback only; this is a control socket for the popup/CLI, not
//! a public service. Every response body is JSON with camelCase keys.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::error::SweepError;
use crate::optout::TabId;
use crate::scheduler::ProtectionScheduler;
use crate::service::SweepService;

pub struct ApiState {
    pub service: Arc<SweepService>,
    pub scheduler: Arc<ProtectionScheduler>,
}

#[derive(Deserialize)]
struct DomainRequest {
    domain: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct OptOutRequest {
    tab_id: i64,
}

pub fn router(service: Arc<SweepService>, scheduler: Arc<ProtectionScheduler>) -> Router {
    let state = Arc::new(ApiState { service, scheduler });
    Router::new()
        .route("/api/state", get(get_state))
        .route("/api/clean", post(clean_now))
        .route("/api/protection/toggle", post(toggle_protection))
        .route("/api/allowlist", post(add_allow).delete(remove_allow))
        .route("/api/denylist", post(add_deny).delete(remove_deny))
        .route("/api/optout", post(opt_out))
        .route("/api/tier/upgrade", post(upgrade_tier))
        .with_state(state)
}

pub async fn start_api_server(
    service: Arc<SweepService>,
    scheduler: Arc<ProtectionScheduler>,
    port: u16,
) {
    let app = router(service, scheduler);
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    info!("Command API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}

fn error_response(err: SweepError) -> Response {
    let status = match &err {
        SweepError::InvalidDomain { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        SweepError::ListConflict { .. } => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let body = match &err {
        SweepError::ListConflict { list, .. } => json!({
            "error": err.to_string(),
            "list": list.as_str(),
        }),
        _ => json!({ "error": err.to_string() }),
    };
    (status, Json(body)).into_response()
}

async fn get_state(State(state): State<Arc<ApiState>>) -> Response {
    match state.service.state().await {
        Ok(view) => Json(view).into_response(),
        Err(e) => error_response(e),
    }
}

async fn clean_now(State(state): State<Arc<ApiState>>) -> Response {
    match state.service.clean_now().await {
        Ok(report) => Json(report).into_response(),
        Err(e) => error_response(e),
    }
}

async fn toggle_protection(State(state): State<Arc<ApiState>>) -> Response {
    match state.scheduler.toggle().await {
        Ok(run_state) => Json(json!({ "state": run_state })).into_response(),
        Err(e) => error_response(e),
    }
}

async fn add_allow(
    State(state): State<Arc<ApiState>>,
    Json(req): Json<DomainRequest>,
) -> Response {
    match state.service.add_allow(&req.domain).await {
        Ok(list) => Json(json!({ "allowList": list })).into_response(),
        Err(e) => error_response(e),
    }
}

async fn remove_allow(
    State(state): State<Arc<ApiState>>,
    Json(req): Json<DomainRequest>,
) -> Response {
    match state.service.remove_allow(&req.domain).await {
        Ok(list) => Json(json!({ "allowList": list })).into_response(),
        Err(e) => error_response(e),
    }
}

async fn add_deny(State(state): State<Arc<ApiState>>, Json(req): Json<DomainRequest>) -> Response {
    match state.service.add_deny(&req.domain).await {
        Ok(list) => Json(json!({ "denyList": list })).into_response(),
        Err(e) => error_response(e),
    }
}

async fn remove_deny(
    State(state): State<Arc<ApiState>>,
    Json(req): Json<DomainRequest>,
) -> Response {
    match state.service.remove_deny(&req.domain).await {
        Ok(list) => Json(json!({ "denyList": list })).into_response(),
        Err(e) => error_response(e),
    }
}

async fn opt_out(State(state): State<Arc<ApiState>>, Json(req): Json<OptOutRequest>) -> Response {
    let outcome = state.service.opt_out(TabId(req.tab_id)).await;
    Json(outcome).into_response()
}

async fn upgrade_tier(State(state): State<Arc<ApiState>>) -> Response {
    match state.service.upgrade_tier().await {
        Ok(run_state) => Json(json!({ "state": run_state })).into_response(),
        Err(e) => error_response(e),
    }
}
