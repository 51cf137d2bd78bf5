//! `/api/models`: operator seeding surface for `ModelConfig` (SPEC_FULL.md
//! §10.5), supplementing the out-of-scope CLI seeding script.

use crate::domain::ModelConfig;
use crate::error::{OrchestratorError, Result};
use crate::server::state::AppState;
use actix_web::{HttpResponse, web};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct PutModelRequest {
    pub name: String,
    pub instance_type: String,
    #[serde(default)]
    pub vllm_args: String,
    pub idle_timeout: Option<i64>,
}

/// `POST /api/models`: create or replace a model's configuration.
pub async fn put_model(state: web::Data<AppState>, body: web::Json<PutModelRequest>) -> Result<HttpResponse> {
    if body.name.is_empty() || body.instance_type.is_empty() {
        return Err(OrchestratorError::InvalidInput(
            "name and instance_type must not be empty".to_string(),
        ));
    }
    let config = ModelConfig {
        name: body.name.clone(),
        instance_type: body.instance_type.clone(),
        vllm_args: body.vllm_args.clone(),
        idle_timeout: body.idle_timeout,
    };
    state.store.put_model_config(config.clone()).await?;
    Ok(HttpResponse::Ok().json(config))
}

/// `GET /api/models`: every configured model, full record (unlike
/// `/v1/models`, which only exposes the OpenAI-shaped id).
pub async fn list_models(state: web::Data<AppState>) -> Result<HttpResponse> {
    let configs = state.store.list_model_configs().await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "models": configs })))
}

/// Registers the `/api/models` scope.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/models")
            .route("", web::post().to(put_model))
            .route("", web::get().to(list_models)),
    );
}
