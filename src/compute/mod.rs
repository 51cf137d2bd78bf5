//! The compute backend contract: the external provisioner of GPU nodes.
//!
//! Out of scope per SPEC_FULL.md §1: this crate implements only the seam,
//! `launch`/`terminate`, the same way `core::providers::Provider` is the
//! seam for an upstream LLM API in the teacher crate this one is modeled on.

pub mod local;

use crate::error::Result;
use async_trait::async_trait;

/// The result of a successful `launch`: the backend's node id and the
/// network address the router/orchestrator can reach it at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchedNode {
    /// The compute backend's own identifier for the node.
    pub provider_instance_id: String,
    /// Network address reachable from the router process.
    pub ip: String,
}

/// External provider of GPU compute nodes. Not managed by this crate beyond
/// `launch`/`terminate` and health polling against the node it returns.
#[async_trait]
pub trait ComputeBackend: Send + Sync {
    /// Provision a node for `instance_type` running `vllm_args`. May take
    /// minutes; the caller does not hold any lock while awaiting this.
    async fn launch(&self, instance_type: &str, vllm_args: &str) -> Result<LaunchedNode>;

    /// Tear down a previously launched node. Idempotent: terminating an
    /// already-gone node must not be treated as an error by callers.
    async fn terminate(&self, provider_instance_id: &str) -> Result<()>;
}

#[cfg(test)]
mockall::mock! {
    /// Mockall-generated mock used by orchestrator unit tests.
    pub ComputeBackend {}

    #[async_trait]
    impl ComputeBackend for ComputeBackend {
        async fn launch(&self, instance_type: &str, vllm_args: &str) -> Result<LaunchedNode>;
        async fn terminate(&self, provider_instance_id: &str) -> Result<()>;
    }
}
