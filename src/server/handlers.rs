//! Handlers with no natural home in `routes/` — just the liveness probe.

use actix_web::HttpResponse;
use serde_json::json;

/// `GET /health`. Always 200; this reports the control plane process is up,
/// not that any model is ready (see `GET /v1/models` / `/api/cluster` for
/// per-model state).
pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
