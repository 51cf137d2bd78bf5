//! `/v1/*`: the OpenAI-compatible surface proxied to the actual worker.

use crate::error::{OrchestratorError, Result};
use crate::router::RouteOutcome;
use crate::server::state::AppState;
use actix_web::{HttpRequest, HttpResponse, web};
use serde_json::Value;
use std::time::{SystemTime, UNIX_EPOCH};

fn now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before unix epoch")
        .as_secs() as i64
}

/// `GET /v1/models`: every configured model, OpenAI's `list` shape.
pub async fn list_models(state: web::Data<AppState>) -> Result<HttpResponse> {
    let configs = state.router.list_models().await?;
    let data: Vec<Value> = configs
        .into_iter()
        .map(|c| serde_json::json!({ "id": c.name, "object": "model", "owned_by": "diogenes" }))
        .collect();
    Ok(HttpResponse::Ok().json(serde_json::json!({ "object": "list", "data": data })))
}

/// `POST /v1/chat/completions` and `POST /v1/completions`: resolve the
/// target model, proxy the body verbatim to the worker, or 503 while it
/// cold-starts (SPEC_FULL.md §4.3).
pub async fn proxy(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Bytes,
) -> Result<HttpResponse> {
    let payload: Value = serde_json::from_slice(&body)
        .map_err(|_| OrchestratorError::InvalidInput("request body must be JSON".to_string()))?;
    let model = payload
        .get("model")
        .and_then(Value::as_str)
        .ok_or_else(|| OrchestratorError::InvalidInput("missing \"model\" field".to_string()))?;

    let outcome = state.router.route(model).await?;
    let instance = match outcome {
        RouteOutcome::Ready(instance) => instance,
        RouteOutcome::ColdStarting => return Err(OrchestratorError::ColdStart),
    };
    let ip = instance
        .ip
        .as_ref()
        .ok_or_else(|| OrchestratorError::UpstreamUnavailable("instance has no address yet".to_string()))?;

    state.router.touch(&instance.instance_id, now()).await?;

    let worker_port = state.config.orchestrator.worker_port;
    let path = req.path();
    let url = format!("http://{ip}:{worker_port}{path}");

    let upstream = state
        .proxy_client
        .post(&url)
        .header("content-type", "application/json")
        .body(body.to_vec())
        .send()
        .await
        .map_err(|e| OrchestratorError::UpstreamUnavailable(e.to_string()))?;

    let status = actix_web::http::StatusCode::from_u16(upstream.status().as_u16())
        .unwrap_or(actix_web::http::StatusCode::BAD_GATEWAY);
    let upstream_body = upstream
        .bytes()
        .await
        .map_err(|e| OrchestratorError::UpstreamUnavailable(e.to_string()))?;

    Ok(HttpResponse::build(status)
        .content_type("application/json")
        .body(upstream_body))
}

/// Registers the `/v1` scope.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/v1")
            .route("/models", web::get().to(list_models))
            .route("/chat/completions", web::post().to(proxy))
            .route("/completions", web::post().to(proxy)),
    );
}
