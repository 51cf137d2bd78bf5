//! Core data model: `ModelConfig`, `Instance`, `InstanceStatus`, `ApiKey`.
//!
//! These are explicit record types, not the loose key/value maps the control
//! plane this crate is modeled on uses internally — see DESIGN.md for why.

use serde::{Deserialize, Serialize};

/// Default idle timeout (seconds) applied when a `ModelConfig` omits one.
pub const DEFAULT_IDLE_TIMEOUT_SECS: i64 = 300;

/// Static per-model configuration, written out-of-band by operators (or via
/// the `/api/models` seeding surface, see SPEC_FULL.md §10.5).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModelConfig {
    /// Logical model identifier, used verbatim in API requests. Primary key.
    pub name: String,
    /// Opaque string handed to the compute backend.
    pub instance_type: String,
    /// Opaque string passed to the worker bootstrap.
    pub vllm_args: String,
    /// Seconds; falls back to [`DEFAULT_IDLE_TIMEOUT_SECS`] if absent.
    pub idle_timeout: Option<i64>,
}

impl ModelConfig {
    /// Effective idle timeout, applying the documented default.
    pub fn idle_timeout_secs(&self) -> i64 {
        match self.idle_timeout {
            Some(t) if t > 0 => t,
            _ => DEFAULT_IDLE_TIMEOUT_SECS,
        }
    }

    /// The slot id an `Instance` for this model is keyed under.
    pub fn slot_id(&self) -> String {
        slot_id(&self.name)
    }
}

/// The stable slot identifier `"model#<name>"` for a given model name.
pub fn slot_id(model: &str) -> String {
    format!("model#{model}")
}

/// Instance lifecycle state (see state machine in SPEC_FULL.md §4.2).
///
/// Preserved as a tagged enum in-process; serialized to its lowercase string
/// form only at the store boundary for schema compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstanceStatus {
    /// Claimed, compute provisioning or health polling in progress.
    Starting,
    /// Healthy and proxy-eligible.
    Ready,
    /// Reap in progress; intent published before `compute.terminate`.
    Draining,
    /// Terminal tombstone; deleted by the next `scaleUp` for the same model.
    Terminated,
}

impl InstanceStatus {
    /// Parse the store's string form, defaulting unrecognized values to
    /// `Terminated` so a corrupt row never blocks a slot forever.
    pub fn parse(s: &str) -> Self {
        match s {
            "starting" => InstanceStatus::Starting,
            "ready" => InstanceStatus::Ready,
            "draining" => InstanceStatus::Draining,
            _ => InstanceStatus::Terminated,
        }
    }

    /// The store's string form.
    pub fn as_str(&self) -> &'static str {
        match self {
            InstanceStatus::Starting => "starting",
            InstanceStatus::Ready => "ready",
            InstanceStatus::Draining => "draining",
            InstanceStatus::Terminated => "terminated",
        }
    }
}

impl std::fmt::Display for InstanceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Exactly one record per model while that model is warming or ready, plus
/// transient terminated tombstones.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instance {
    /// The stable slot identifier `"model#<name>"`. Primary key.
    pub instance_id: String,
    /// Back-reference to `ModelConfig.name`.
    pub model: String,
    /// Current lifecycle state.
    pub status: InstanceStatus,
    /// The compute backend's node identifier. Absent until `launch` returns.
    #[serde(default)]
    pub provider_instance_id: Option<String>,
    /// Network address reachable from the router process. Absent until
    /// `launch` returns.
    #[serde(default)]
    pub ip: Option<String>,
    /// Mirrored from config, for observability only.
    pub instance_type: String,
    /// Epoch seconds.
    pub launched_at: i64,
    /// Epoch seconds. Equal to `launched_at` until the first proxied request.
    pub last_request_at: i64,
}

impl Instance {
    /// Build the placeholder row for a fresh claim (step 4 of `scaleUp`).
    pub fn claim_placeholder(model: &str, instance_type: &str, now: i64) -> Self {
        Self {
            instance_id: slot_id(model),
            model: model.to_string(),
            status: InstanceStatus::Starting,
            provider_instance_id: None,
            ip: None,
            instance_type: instance_type.to_string(),
            launched_at: now,
            last_request_at: now,
        }
    }

    /// `now - last_request_at`, falling back to `launched_at` and then `0`
    /// when `last_request_at` is unset (SPEC_FULL.md §4.2, `scaleDown`).
    pub fn idle_seconds(&self, now: i64) -> i64 {
        let reference = if self.last_request_at > 0 {
            self.last_request_at
        } else if self.launched_at > 0 {
            self.launched_at
        } else {
            return 0;
        };
        (now - reference).max(0)
    }
}

/// Owner identity + hash of a bearer token; the raw token is never stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiKey {
    /// Hex SHA-256 of the raw token. Primary key.
    pub key_hash: String,
    /// Owner identity.
    pub email: String,
    /// Human-friendly label.
    pub name: String,
    /// Epoch seconds.
    pub created_at: i64,
    /// Epoch seconds; updated on every successful validation.
    pub last_used_at: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_id_is_stable() {
        assert_eq!(slot_id("Qwen/Qwen3-32B"), "model#Qwen/Qwen3-32B");
    }

    #[test]
    fn idle_timeout_falls_back_to_default() {
        let cfg = ModelConfig {
            name: "m".to_string(),
            instance_type: "g5.xlarge".to_string(),
            vllm_args: String::new(),
            idle_timeout: None,
        };
        assert_eq!(cfg.idle_timeout_secs(), DEFAULT_IDLE_TIMEOUT_SECS);

        let cfg = ModelConfig {
            idle_timeout: Some(0),
            ..cfg
        };
        assert_eq!(cfg.idle_timeout_secs(), DEFAULT_IDLE_TIMEOUT_SECS);
    }

    #[test]
    fn idle_seconds_falls_back_to_launched_at() {
        let inst = Instance {
            instance_id: "model#m".to_string(),
            model: "m".to_string(),
            status: InstanceStatus::Ready,
            provider_instance_id: Some("p-1".to_string()),
            ip: Some("10.0.0.1".to_string()),
            instance_type: "g5.xlarge".to_string(),
            launched_at: 100,
            last_request_at: 0,
        };
        assert_eq!(inst.idle_seconds(150), 50);
    }

    #[test]
    fn instance_status_round_trips_through_its_string_form() {
        for status in [
            InstanceStatus::Starting,
            InstanceStatus::Ready,
            InstanceStatus::Draining,
            InstanceStatus::Terminated,
        ] {
            assert_eq!(InstanceStatus::parse(status.as_str()), status);
        }
    }
}
