//! Binary entrypoint: initializes logging and runs the control plane.

use diogenes::compute::local::LocalComputeBackend;
use diogenes::server::builder::run_server;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::Level;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_thread_ids(false)
        .init();

    let _ = dotenvy::dotenv();

    let target_ip = std::env::var("DIOGENES_WORKER_IP").unwrap_or_else(|_| "127.0.0.1".to_string());
    let compute = Arc::new(LocalComputeBackend::new(target_ip));

    match run_server(compute).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
