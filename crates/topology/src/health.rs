//! Health gate - externally driven readiness for monitored resources
//!
//! The gate never probes anything itself. An external prober reports
//! per-check observations; the gate folds them into a tri-state status and
//! hands the planner a consistent point-in-time snapshot. A hard dependency
//! on an unmonitored resource is satisfied as soon as the resource exists.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::registry::Registry;
use crate::resource::{ResourceId, ResourceSpec};

/// Tri-state readiness of a monitored resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Ready,
    Pending,
    Failed,
}

/// A single probe observation reported by the external prober
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeOutcome {
    Up,
    Down,
}

#[derive(Debug, Clone)]
struct CheckState {
    monitors: ResourceId,
    failure_threshold: u32,
    consecutive_failures: u32,
    status: HealthStatus,
}

/// Status store for every declared health check.
///
/// The write path is external (probe observations); the read path is the
/// planner, which takes one [`HealthSnapshot`] per `plan()` call so
/// concurrent external updates cannot tear a single planning pass.
#[derive(Debug, Clone, Default)]
pub struct HealthGate {
    checks: BTreeMap<ResourceId, CheckState>,
}

impl HealthGate {
    /// Build a gate with one pending entry per declared health check
    pub fn from_registry(registry: &Registry) -> Self {
        let mut checks = BTreeMap::new();
        for node in registry.all() {
            if let ResourceSpec::HealthCheck(check) = &node.spec {
                checks.insert(
                    node.id.clone(),
                    CheckState {
                        monitors: check.monitors.clone(),
                        failure_threshold: check.failure_threshold.max(1),
                        consecutive_failures: 0,
                        status: HealthStatus::Pending,
                    },
                );
            }
        }
        Self { checks }
    }

    /// Record a probe observation for `check_id`.
    ///
    /// Once the failure threshold is reached the check is terminally failed
    /// for the current planning cycle: later observations are ignored until
    /// [`HealthGate::reset`].
    pub fn observe(&mut self, check_id: &ResourceId, outcome: ProbeOutcome) -> Result<()> {
        let state = self
            .checks
            .get_mut(check_id)
            .ok_or_else(|| Error::UnknownResource(check_id.clone()))?;

        if state.status == HealthStatus::Failed {
            return Ok(());
        }

        match outcome {
            ProbeOutcome::Up => {
                state.consecutive_failures = 0;
                state.status = HealthStatus::Ready;
            }
            ProbeOutcome::Down => {
                state.consecutive_failures += 1;
                state.status = if state.consecutive_failures >= state.failure_threshold {
                    HealthStatus::Failed
                } else {
                    HealthStatus::Pending
                };
            }
        }
        Ok(())
    }

    /// Clear a check back to pending; the next planning cycle can then
    /// observe recovery
    pub fn reset(&mut self, check_id: &ResourceId) -> Result<()> {
        let state = self
            .checks
            .get_mut(check_id)
            .ok_or_else(|| Error::UnknownResource(check_id.clone()))?;
        state.consecutive_failures = 0;
        state.status = HealthStatus::Pending;
        Ok(())
    }

    /// Current status of a single check
    pub fn status(&self, check_id: &ResourceId) -> Option<HealthStatus> {
        self.checks.get(check_id).map(|state| state.status)
    }

    /// Point-in-time view of per-resource health.
    ///
    /// When several checks monitor the same resource the worst status wins.
    pub fn snapshot(&self) -> HealthSnapshot {
        let mut statuses: BTreeMap<ResourceId, HealthStatus> = BTreeMap::new();
        for state in self.checks.values() {
            statuses
                .entry(state.monitors.clone())
                .and_modify(|status| *status = worst(*status, state.status))
                .or_insert(state.status);
        }
        HealthSnapshot { statuses }
    }
}

fn worst(a: HealthStatus, b: HealthStatus) -> HealthStatus {
    use HealthStatus::{Failed, Pending, Ready};
    match (a, b) {
        (Failed, _) | (_, Failed) => Failed,
        (Pending, _) | (_, Pending) => Pending,
        (Ready, Ready) => Ready,
    }
}

/// Immutable per-resource health view used for one whole planning pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HealthSnapshot {
    statuses: BTreeMap<ResourceId, HealthStatus>,
}

impl HealthSnapshot {
    /// Readiness of a dependency target. Unmonitored resources are ready
    /// by construction.
    pub fn status_of(&self, resource_id: &ResourceId) -> HealthStatus {
        self.statuses
            .get(resource_id)
            .copied()
            .unwrap_or(HealthStatus::Ready)
    }

    /// Whether a hard dependency on `resource_id` is satisfied
    pub fn is_satisfied(&self, resource_id: &ResourceId) -> bool {
        self.status_of(resource_id) == HealthStatus::Ready
    }

    /// Monitored resources whose checks have terminally failed
    pub fn failed(&self) -> impl Iterator<Item = &ResourceId> {
        self.statuses
            .iter()
            .filter(|&(_, &status)| status == HealthStatus::Failed)
            .map(|(id, _)| id)
    }
}
