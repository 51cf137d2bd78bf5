//! A `ComputeBackend` that never actually provisions anything: every
//! "launch" just points at an already-running worker on the local machine.
//!
//! A real deployment swaps this for whatever actually turns instance_type
//! into a running node (EC2, bare metal, Kubernetes); this crate owns only
//! the `launch`/`terminate` contract, not an implementation of it. Useful
//! as the default wiring for local development and demos.

use crate::compute::{ComputeBackend, LaunchedNode};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};

/// Points every launch at `target_ip`, as if a worker were already up
/// there. Terminate is a no-op; nothing was actually provisioned.
pub struct LocalComputeBackend {
    target_ip: String,
    next_id: AtomicU64,
}

impl LocalComputeBackend {
    /// Every launch resolves to `target_ip` (e.g. `"127.0.0.1"` for a
    /// worker started by hand on the same machine).
    pub fn new(target_ip: impl Into<String>) -> Self {
        Self {
            target_ip: target_ip.into(),
            next_id: AtomicU64::new(1),
        }
    }
}

#[async_trait]
impl ComputeBackend for LocalComputeBackend {
    async fn launch(&self, _instance_type: &str, _vllm_args: &str) -> Result<LaunchedNode> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        Ok(LaunchedNode {
            provider_instance_id: format!("local-{id}"),
            ip: self.target_ip.clone(),
        })
    }

    async fn terminate(&self, _provider_instance_id: &str) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn launch_always_points_at_the_configured_target() {
        let backend = LocalComputeBackend::new("127.0.0.1");
        let a = backend.launch("g5.xlarge", "").await.unwrap();
        let b = backend.launch("g5.xlarge", "").await.unwrap();
        assert_eq!(a.ip, "127.0.0.1");
        assert_ne!(a.provider_instance_id, b.provider_instance_id);
    }
}
