//! Health-check contract model.
//!
//! Mirrors how the platform turns consecutive probe results into a service
//! status for a declared [`HealthCheckPolicy`]. Nothing is probed here;
//! callers feed results in.

use std::time::Duration;

use serde::Serialize;
use tracing::{debug, warn};

use linestack_core::HealthCheckPolicy;

/// Result of a single health probe against the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeResult {
    /// `GET <path>` returned 2xx within the timeout.
    Healthy,
    /// Non-2xx response.
    Unhealthy,
    /// No response within the timeout.
    TimedOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
    Unknown,
}

/// Tracks consecutive probe results for a service.
#[derive(Debug)]
pub struct HealthTracker {
    status: HealthStatus,
    consecutive_failures: u32,
    consecutive_successes: u32,
    unhealthy_threshold: u32,
    healthy_threshold: u32,
    interval: Duration,
}

impl HealthTracker {
    pub fn new(policy: &HealthCheckPolicy) -> Self {
        Self {
            status: HealthStatus::Unknown,
            consecutive_failures: 0,
            consecutive_successes: 0,
            unhealthy_threshold: policy.unhealthy_threshold,
            healthy_threshold: policy.healthy_threshold,
            interval: Duration::from_secs(policy.interval_secs),
        }
    }

    /// Record a probe result and return the new status.
    pub fn record(&mut self, result: ProbeResult) -> HealthStatus {
        match result {
            ProbeResult::Healthy => {
                self.consecutive_failures = 0;
                self.consecutive_successes += 1;

                if self.consecutive_successes >= self.healthy_threshold {
                    if self.status != HealthStatus::Healthy {
                        debug!(
                            successes = self.consecutive_successes,
                            "service marked healthy"
                        );
                    }
                    self.status = HealthStatus::Healthy;
                }
            }
            ProbeResult::Unhealthy | ProbeResult::TimedOut => {
                self.consecutive_successes = 0;
                self.consecutive_failures += 1;

                if self.consecutive_failures >= self.unhealthy_threshold {
                    if self.status != HealthStatus::Unhealthy {
                        warn!(
                            failures = self.consecutive_failures,
                            threshold = self.unhealthy_threshold,
                            "service marked unhealthy"
                        );
                    }
                    self.status = HealthStatus::Unhealthy;
                }
            }
        }

        self.status
    }

    pub fn status(&self) -> HealthStatus {
        self.status
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub fn consecutive_successes(&self) -> u32 {
        self.consecutive_successes
    }

    /// Shortest time from the first failure to an unhealthy status.
    pub fn time_to_unhealthy(&self) -> Duration {
        self.interval * self.unhealthy_threshold
    }

    /// Shortest time from the first success to a healthy status.
    pub fn time_to_healthy(&self) -> Duration {
        self.interval * self.healthy_threshold
    }
}
