//! `/api/cluster`: operator-facing aggregate instance state and manual scale.

use crate::domain::InstanceStatus;
use crate::error::{OrchestratorError, Result};
use crate::server::state::AppState;
use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct InstanceView {
    pub instance_id: String,
    pub model: String,
    pub status: String,
    pub ip: Option<String>,
    pub launched_at: i64,
    pub last_request_at: i64,
}

/// Per-model aggregate shown in `GET /api/cluster` (SPEC_FULL.md §6).
#[derive(Debug, Serialize)]
pub struct ModelClusterView {
    pub name: String,
    pub instance_type: String,
    pub idle_timeout: i64,
    pub status: &'static str,
    pub ready_count: usize,
    pub starting_count: usize,
    pub instance_count: usize,
}

/// `GET /api/cluster`: every configured model with its aggregated instance
/// status, plus the live (non-terminated) instances across every model.
/// This is the one place an unfiltered `list_instances` call is intentional
/// (SPEC_FULL.md §9's note on the unfiltered-listing open question).
pub async fn cluster_state(state: web::Data<AppState>) -> Result<HttpResponse> {
    let configs = state.store.list_model_configs().await?;
    let instances = state
        .store
        .list_instances(crate::store::InstanceFilter::default())
        .await?;

    let live: Vec<_> = instances
        .iter()
        .filter(|i| i.status != InstanceStatus::Terminated)
        .collect();

    let models: Vec<ModelClusterView> = configs
        .into_iter()
        .map(|cfg| {
            let for_model: Vec<_> = live.iter().filter(|i| i.model == cfg.name).collect();
            let ready_count = for_model.iter().filter(|i| i.status == InstanceStatus::Ready).count();
            let starting_count = for_model
                .iter()
                .filter(|i| matches!(i.status, InstanceStatus::Starting | InstanceStatus::Draining))
                .count();
            let status = if ready_count > 0 {
                "ready"
            } else if starting_count > 0 {
                "warming"
            } else {
                "cold"
            };
            ModelClusterView {
                name: cfg.name,
                instance_type: cfg.instance_type,
                idle_timeout: cfg.idle_timeout_secs(),
                status,
                ready_count,
                starting_count,
                instance_count: for_model.len(),
            }
        })
        .collect();

    let instance_views: Vec<InstanceView> = live
        .into_iter()
        .map(|i| InstanceView {
            instance_id: i.instance_id.clone(),
            model: i.model.clone(),
            status: i.status.to_string(),
            ip: i.ip.clone(),
            launched_at: i.launched_at,
            last_request_at: i.last_request_at,
        })
        .collect();

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "models": models,
        "instances": instance_views,
    })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScaleAction {
    Up,
    Down,
}

#[derive(Debug, Deserialize)]
pub struct ScaleRequest {
    pub model: String,
    pub action: ScaleAction,
}

/// `POST /api/cluster/scale`: manually trigger a cold start or a forced
/// reap, awaiting the outcome (unlike the router's fire-and-forget
/// `triggerScaleUp`, an operator issuing this call wants to know whether it
/// actually worked).
pub async fn scale(state: web::Data<AppState>, body: web::Json<ScaleRequest>) -> Result<HttpResponse> {
    if body.model.is_empty() {
        return Err(OrchestratorError::InvalidInput("model must not be empty".to_string()));
    }

    match body.action {
        ScaleAction::Up => {
            let instance = state.orchestrator.scale_up(&body.model).await?;
            Ok(HttpResponse::Ok().json(serde_json::json!({
                "ok": true,
                "model": body.model,
                "action": "up",
                "instance": InstanceView {
                    instance_id: instance.instance_id,
                    model: instance.model,
                    status: instance.status.to_string(),
                    ip: instance.ip,
                    launched_at: instance.launched_at,
                    last_request_at: instance.last_request_at,
                },
            })))
        }
        ScaleAction::Down => {
            let reaped = state.orchestrator.scale_down_model(&body.model).await?;
            Ok(HttpResponse::Ok().json(serde_json::json!({
                "ok": true,
                "model": body.model,
                "action": "down",
                "reaped": reaped,
            })))
        }
    }
}

/// Registers the `/api/cluster` scope.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/cluster")
            .route("", web::get().to(cluster_state))
            .route("/scale", web::post().to(scale)),
    );
}
