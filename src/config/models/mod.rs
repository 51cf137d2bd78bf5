//! Configuration data models.

pub mod orchestrator;
pub mod server;
pub mod store;

pub use orchestrator::OrchestratorConfigModel;
pub use server::{CorsConfig, ServerConfig};
pub use store::StoreConfig;

/// Default bind host.
pub fn default_host() -> String {
    "0.0.0.0".to_string()
}

/// Default bind port.
pub fn default_port() -> u16 {
    8000
}

/// Default request timeout, seconds.
pub fn default_timeout() -> u64 {
    30
}

/// Default maximum request body size, bytes.
pub fn default_max_body_size() -> usize {
    10 * 1024 * 1024
}
