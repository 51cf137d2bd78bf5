//! Orchestrator tuning knobs, surfaced through config instead of hardcoded
//! so operators can tighten the health-gate budget for small clusters.

use crate::orchestrator::OrchestratorSettings;
use serde::{Deserialize, Serialize};

/// Config-file mirror of [`OrchestratorSettings`], plus the background
/// reap interval (which lives in [`crate::monitoring`], not the orchestrator
/// itself).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfigModel {
    /// See [`OrchestratorSettings::poll_health_timeout_secs`].
    #[serde(default = "default_poll_health_timeout_secs")]
    pub poll_health_timeout_secs: u64,
    /// See [`OrchestratorSettings::poll_health_interval_secs`].
    #[serde(default = "default_poll_health_interval_secs")]
    pub poll_health_interval_secs: u64,
    /// See [`OrchestratorSettings::probe_timeout_secs`].
    #[serde(default = "default_probe_timeout_secs")]
    pub probe_timeout_secs: u64,
    /// See [`OrchestratorSettings::worker_port`].
    #[serde(default = "default_worker_port")]
    pub worker_port: u16,
    /// Interval between `scaleDown` sweeps, seconds.
    #[serde(default = "default_reap_interval_secs")]
    pub reap_interval_secs: u64,
}

impl Default for OrchestratorConfigModel {
    fn default() -> Self {
        Self {
            poll_health_timeout_secs: default_poll_health_timeout_secs(),
            poll_health_interval_secs: default_poll_health_interval_secs(),
            probe_timeout_secs: default_probe_timeout_secs(),
            worker_port: default_worker_port(),
            reap_interval_secs: default_reap_interval_secs(),
        }
    }
}

impl OrchestratorConfigModel {
    /// Project out the subset [`crate::orchestrator::Orchestrator`] needs.
    pub fn settings(&self) -> OrchestratorSettings {
        OrchestratorSettings {
            poll_health_timeout_secs: self.poll_health_timeout_secs,
            poll_health_interval_secs: self.poll_health_interval_secs,
            probe_timeout_secs: self.probe_timeout_secs,
            worker_port: self.worker_port,
        }
    }
}

fn default_poll_health_timeout_secs() -> u64 {
    crate::orchestrator::DEFAULT_POLL_HEALTH_TIMEOUT_SECS
}

fn default_poll_health_interval_secs() -> u64 {
    crate::orchestrator::DEFAULT_POLL_HEALTH_INTERVAL_SECS
}

fn default_probe_timeout_secs() -> u64 {
    crate::orchestrator::DEFAULT_PROBE_TIMEOUT_SECS
}

fn default_worker_port() -> u16 {
    crate::orchestrator::DEFAULT_WORKER_PORT
}

fn default_reap_interval_secs() -> u64 {
    30
}
