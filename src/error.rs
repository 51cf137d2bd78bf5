//! Error handling for the control plane
//!
//! This module defines the single error type used throughout the orchestrator,
//! router, auth and storage layers, and its HTTP rendering.

#![allow(dead_code)]

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde::Serialize;
use thiserror::Error;

/// Result type alias used throughout the crate
pub type Result<T> = std::result::Result<T, OrchestratorError>;

/// Error taxonomy for the control plane (see spec error handling design).
#[derive(Error, Debug)]
pub enum OrchestratorError {
    /// Missing model, malformed scale action, empty required field.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Missing/bad bearer, unknown key, wrong prefix.
    #[error("unauthorized")]
    Unauthorized,

    /// Unknown HTTP route.
    #[error("not found: {0}")]
    NotFound(String),

    /// `scaleUp`/cluster operations against a model with no `ModelConfig`.
    #[error("unknown model: {0}")]
    UnknownModel(String),

    /// No ready instance; scale-up has been triggered.
    #[error("model is cold-starting")]
    ColdStart,

    /// Transport failure proxying to the worker.
    #[error("upstream inference server unavailable: {0}")]
    UpstreamUnavailable(String),

    /// `compute.launch` or the health gate failed; slot was terminated.
    #[error("provisioning failed: {0}")]
    ProvisioningFailure(String),

    /// State store transport failure.
    #[error("storage error: {0}")]
    Storage(String),

    /// Configuration errors (startup, file parsing).
    #[error("configuration error: {0}")]
    Config(String),

    /// Catch-all for errors converted from lower-level crates via `anyhow`.
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<sea_orm::DbErr> for OrchestratorError {
    fn from(e: sea_orm::DbErr) -> Self {
        OrchestratorError::Storage(e.to_string())
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    message: String,
    #[serde(rename = "type")]
    kind: &'static str,
}

impl OrchestratorError {
    /// The OpenAI-style error `type` field for this error.
    fn openai_type(&self) -> &'static str {
        match self {
            OrchestratorError::InvalidInput(_) => "invalid_request_error",
            OrchestratorError::Unauthorized => "unauthorized",
            OrchestratorError::NotFound(_) => "not_found",
            OrchestratorError::UnknownModel(_) => "invalid_request_error",
            OrchestratorError::ColdStart => "service_unavailable",
            OrchestratorError::UpstreamUnavailable(_) => "bad_gateway",
            OrchestratorError::ProvisioningFailure(_) => "internal_error",
            OrchestratorError::Storage(_) => "internal_error",
            OrchestratorError::Config(_) => "internal_error",
            OrchestratorError::Internal(_) => "internal_error",
        }
    }

    /// Client-facing message. Storage/internal failures are not leaked verbatim.
    fn public_message(&self) -> String {
        match self {
            OrchestratorError::ColdStart => "Model is cold-starting. Retry shortly.".to_string(),
            OrchestratorError::Storage(_) | OrchestratorError::Internal(_) => {
                "An internal error occurred".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl ResponseError for OrchestratorError {
    fn status_code(&self) -> StatusCode {
        match self {
            OrchestratorError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            OrchestratorError::Unauthorized => StatusCode::UNAUTHORIZED,
            OrchestratorError::NotFound(_) => StatusCode::NOT_FOUND,
            OrchestratorError::UnknownModel(_) => StatusCode::BAD_REQUEST,
            OrchestratorError::ColdStart => StatusCode::SERVICE_UNAVAILABLE,
            OrchestratorError::UpstreamUnavailable(_) => StatusCode::BAD_GATEWAY,
            OrchestratorError::ProvisioningFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
            OrchestratorError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            OrchestratorError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            OrchestratorError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut builder = HttpResponse::build(self.status_code());
        if matches!(self, OrchestratorError::ColdStart) {
            builder.insert_header(("Retry-After", "10"));
        }
        builder.json(ErrorBody {
            error: ErrorDetail {
                message: self.public_message(),
                kind: self.openai_type(),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cold_start_renders_retry_after() {
        let err = OrchestratorError::ColdStart;
        let resp = err.error_response();
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            resp.headers().get("Retry-After").unwrap(),
            "10"
        );
    }

    #[test]
    fn storage_errors_do_not_leak_detail() {
        let err = OrchestratorError::Storage("connection refused to 10.0.0.1:5432".to_string());
        assert_eq!(err.public_message(), "An internal error occurred");
    }
}
