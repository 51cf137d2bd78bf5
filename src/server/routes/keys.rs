//! `/api/keys`: bearer API key lifecycle for the authenticated caller.

use crate::auth::ApiKeyPrincipal;
use crate::error::{OrchestratorError, Result};
use crate::server::state::AppState;
use actix_web::{HttpMessage, HttpRequest, HttpResponse, web};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

fn now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before unix epoch")
        .as_secs() as i64
}

fn principal(req: &HttpRequest) -> Result<ApiKeyPrincipal> {
    req.extensions()
        .get::<ApiKeyPrincipal>()
        .cloned()
        .ok_or(OrchestratorError::Unauthorized)
}

#[derive(Debug, Deserialize)]
pub struct CreateKeyRequest {
    /// Human-friendly label for the issued key.
    #[serde(default)]
    pub name: String,
}

/// Metadata-only view of a key: no raw token, ever (SPEC_FULL.md §4.4).
#[derive(Debug, Serialize)]
pub struct KeyView {
    pub key_id: String,
    pub name: String,
    pub created_at: i64,
    pub last_used_at: i64,
}

#[derive(Debug, Serialize)]
pub struct CreateKeyResponse {
    /// The raw bearer token. Shown exactly once; never recoverable after.
    pub key: String,
    #[serde(flatten)]
    pub view: KeyView,
}

/// `POST /api/keys`: mint a key owned by the caller's own authenticated
/// identity (a key can only ever create more keys for itself).
pub async fn create_key(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<CreateKeyRequest>,
) -> Result<HttpResponse> {
    let owner = principal(&req)?;
    let name = if body.name.is_empty() { "unnamed" } else { &body.name };
    let issued = state.auth.create_key(&owner.email, name, now()).await?;
    Ok(HttpResponse::Created().json(CreateKeyResponse {
        key: issued.token,
        view: KeyView {
            key_id: issued.record.key_hash,
            name: issued.record.name,
            created_at: issued.record.created_at,
            last_used_at: issued.record.last_used_at,
        },
    }))
}

/// `GET /api/keys`: every key owned by the caller, newest first.
pub async fn list_keys(state: web::Data<AppState>, req: HttpRequest) -> Result<HttpResponse> {
    let owner = principal(&req)?;
    let keys = state.auth.list_keys(&owner.email).await?;
    let views: Vec<KeyView> = keys
        .into_iter()
        .map(|k| KeyView {
            key_id: k.key_hash,
            name: k.name,
            created_at: k.created_at,
            last_used_at: k.last_used_at,
        })
        .collect();
    Ok(HttpResponse::Ok().json(serde_json::json!({ "keys": views })))
}

/// `DELETE /api/keys/{key_id}`: revoke, if owned by the caller.
pub async fn delete_key(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let owner = principal(&req)?;
    state.auth.delete_key(&owner.email, &path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "deleted": true })))
}

/// Registers the `/api/keys` scope.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/keys")
            .route("", web::post().to(create_key))
            .route("", web::get().to(list_keys))
            .route("/{key_id}", web::delete().to(delete_key)),
    );
}
