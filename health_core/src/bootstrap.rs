//! Default service registrations for the bundled server

use crate::config::AppConfig;
use crate::health::{CallableService, Health, MemoryService};
use chrono::{DateTime, Utc};
use std::time::Duration;
use sysinfo::System;
use tracing::info;

pub const RUNTIME_GROUP: &str = "runtime";

/// Configured hostname, else the OS hostname, else `localhost`.
pub fn resolve_hostname(configured: &str) -> String {
    let configured = configured.trim();
    if !configured.is_empty() {
        return configured.to_string();
    }

    System::host_name().unwrap_or_else(|| "localhost".to_string())
}

/// Registry with the checks every deployment gets.
///
/// Applications register their own dependencies on top of these.
pub fn build_health(config: &AppConfig, startup: DateTime<Utc>) -> Health {
    let mut health = Health::new(
        config.application.name.clone(),
        resolve_hostname(&config.application.hostname),
        config.application.version.clone(),
        startup,
    );

    let mut config_check = {
        let config = config.clone();
        CallableService::new("config", move || {
            config.validate()?;
            Ok(())
        })
    };
    if config.checks.timeout_ms > 0 {
        config_check = config_check.with_timeout(Duration::from_millis(config.checks.timeout_ms));
    }
    health.add_service(RUNTIME_GROUP, config_check);

    health.add_service(
        RUNTIME_GROUP,
        MemoryService::new("memory", config.checks.memory_threshold_percent).essential(false),
    );

    info!(
        "Registered {} default health checks for {}",
        health.service_count(),
        health.name()
    );

    health
}
