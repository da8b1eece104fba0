//! Point-in-time outcome of a single service check

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Immutable result of one health check.
///
/// A fresh `Status` is produced by every call to [`Service::status`](super::Service::status);
/// nothing mutates it afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Status {
    name: String,
    healthy: bool,
    essential: bool,
    latency: Option<f64>,
    error: Option<String>,
}

/// Serialized form of a [`Status`] with a fixed key set.
///
/// Absent latency or error values serialize as `null`, never as missing keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusSummary {
    pub name: String,
    pub health: bool,
    pub essential: bool,
    pub latency: Option<f64>,
    pub error: Option<String>,
}

impl Status {
    pub fn new(
        name: impl Into<String>,
        healthy: bool,
        essential: bool,
        latency: Option<f64>,
        error: Option<String>,
    ) -> Self {
        Self {
            name: name.into(),
            healthy,
            essential,
            latency,
            error,
        }
    }

    pub fn healthy(name: impl Into<String>, essential: bool, latency_ms: f64) -> Self {
        Self::new(name, true, essential, Some(latency_ms), None)
    }

    pub fn unhealthy(
        name: impl Into<String>,
        essential: bool,
        latency_ms: Option<f64>,
        error: impl Into<String>,
    ) -> Self {
        Self::new(name, false, essential, latency_ms, Some(error.into()))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_healthy(&self) -> bool {
        self.healthy
    }

    pub fn is_essential(&self) -> bool {
        self.essential
    }

    /// Check duration in milliseconds, if it was measured.
    pub fn latency(&self) -> Option<f64> {
        self.latency
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn summary(&self) -> StatusSummary {
        StatusSummary {
            name: self.name.clone(),
            health: self.healthy,
            essential: self.essential,
            latency: self.latency,
            error: self.error.clone(),
        }
    }
}

impl StatusSummary {
    pub fn to_value(&self) -> Value {
        json!({
            "name": self.name,
            "health": self.health,
            "essential": self.essential,
            "latency": self.latency,
            "error": self.error,
        })
    }
}

impl From<StatusSummary> for Status {
    fn from(summary: StatusSummary) -> Self {
        Self::new(
            summary.name,
            summary.health,
            summary.essential,
            summary.latency,
            summary.error,
        )
    }
}
