//! Host resource checks backed by `sysinfo`

use super::service::elapsed_ms;
use super::{Service, Status};
use parking_lot::Mutex;
use std::time::Instant;
use sysinfo::System;

/// Reports unhealthy when host memory usage climbs above a threshold.
pub struct MemoryService {
    name: String,
    max_usage_percent: f64,
    essential: bool,
    system: Mutex<System>,
}

impl MemoryService {
    pub fn new(name: impl Into<String>, max_usage_percent: f64) -> Self {
        Self {
            name: name.into(),
            max_usage_percent,
            essential: true,
            system: Mutex::new(System::new()),
        }
    }

    pub fn essential(mut self, essential: bool) -> Self {
        self.essential = essential;
        self
    }

    pub fn max_usage_percent(&self) -> f64 {
        self.max_usage_percent
    }
}

impl Service for MemoryService {
    fn name(&self) -> &str {
        &self.name
    }

    fn status(&self) -> Status {
        let start = Instant::now();

        let (used, total) = {
            let mut system = self.system.lock();
            system.refresh_memory();
            (system.used_memory(), system.total_memory())
        };

        let latency = elapsed_ms(start);

        match check_memory_usage(used, total, self.max_usage_percent) {
            Ok(_) => Status::healthy(self.name.clone(), self.essential, latency),
            Err(error) => {
                tracing::warn!(service = %self.name, error = %error, "memory check failed");
                Status::unhealthy(self.name.clone(), self.essential, Some(latency), error)
            }
        }
    }
}

fn check_memory_usage(used: u64, total: u64, max_usage_percent: f64) -> Result<f64, String> {
    if total == 0 {
        return Err("total memory reported as zero".to_string());
    }

    let usage = used as f64 / total as f64 * 100.0;

    if usage > max_usage_percent {
        Err(format!(
            "memory usage {:.1}% exceeds threshold {:.1}%",
            usage, max_usage_percent
        ))
    } else {
        Ok(usage)
    }
}
