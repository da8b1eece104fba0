//! Application-wide registry of grouped services

use super::{Service, Status, Summary};
use chrono::{DateTime, TimeZone, Utc};
use futures_util::future::join_all;
use std::fmt;
use std::sync::Arc;
use tracing::{error, info};

struct ServiceGroup {
    name: String,
    services: Vec<Arc<dyn Service>>,
}

/// Holds the application identity and every registered service.
///
/// Services are registered during start-up. Afterwards the registry is only
/// read: each call to [`Health::status`] runs all checks and returns an
/// independent [`Summary`].
pub struct Health {
    name: String,
    hostname: String,
    version: String,
    startup: DateTime<Utc>,
    service_groups: Vec<ServiceGroup>,
}

impl Health {
    pub fn new<Tz: TimeZone>(
        name: impl Into<String>,
        hostname: impl Into<String>,
        version: impl Into<String>,
        startup: DateTime<Tz>,
    ) -> Self {
        Self {
            name: name.into(),
            hostname: hostname.into(),
            version: version.into(),
            startup: startup.with_timezone(&Utc),
            service_groups: Vec::new(),
        }
    }

    /// Append a service to `group`, creating the group on first use.
    pub fn add_service<S: Service + 'static>(&mut self, group: &str, service: S) {
        self.add_shared_service(group, Arc::new(service));
    }

    pub fn add_shared_service(&mut self, group: &str, service: Arc<dyn Service>) {
        match self.service_groups.iter_mut().find(|g| g.name == group) {
            Some(existing) => existing.services.push(service),
            None => self.service_groups.push(ServiceGroup {
                name: group.to_string(),
                services: vec![service],
            }),
        }
    }

    pub fn with_service<S: Service + 'static>(mut self, group: &str, service: S) -> Self {
        self.add_service(group, service);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn startup(&self) -> DateTime<Utc> {
        self.startup
    }

    pub fn group_names(&self) -> impl Iterator<Item = &str> {
        self.service_groups.iter().map(|g| g.name.as_str())
    }

    pub fn service_count(&self) -> usize {
        self.service_groups.iter().map(|g| g.services.len()).sum()
    }

    /// Run every check one after another, in registration order.
    pub fn status(&self) -> Summary {
        self.run_sequential(None)
    }

    /// Like [`Health::status`], but only checks the services of `group`.
    ///
    /// The summary holds no groups when `group` was never registered.
    pub fn group_status(&self, group: &str) -> Summary {
        self.run_sequential(Some(group))
    }

    /// Run every check on the blocking thread pool at the same time.
    ///
    /// Total time is bounded by the slowest check rather than the sum of all
    /// of them. Results keep registration order regardless of which check
    /// finishes first.
    pub async fn status_concurrent(&self) -> Summary {
        self.run_concurrent(None).await
    }

    pub async fn group_status_concurrent(&self, group: &str) -> Summary {
        self.run_concurrent(Some(group)).await
    }

    fn selected<'a>(&'a self, only: Option<&'a str>) -> impl Iterator<Item = &'a ServiceGroup> {
        self.service_groups
            .iter()
            .filter(move |group| only.map_or(true, |name| group.name == name))
    }

    fn run_sequential(&self, only: Option<&str>) -> Summary {
        let groups: Vec<(String, Vec<Status>)> = self
            .selected(only)
            .map(|group| {
                let statuses: Vec<Status> =
                    group.services.iter().map(|service| service.status()).collect();
                (group.name.clone(), statuses)
            })
            .collect();

        self.snapshot(groups)
    }

    async fn run_concurrent(&self, only: Option<&str>) -> Summary {
        let groups = join_all(self.selected(only).map(|group| async move {
            let checks = group.services.iter().map(|service| {
                let service = Arc::clone(service);
                async move {
                    let name = service.name().to_string();
                    match tokio::task::spawn_blocking(move || service.status()).await {
                        Ok(status) => status,
                        Err(e) => {
                            error!(service = %name, error = %e, "health check task failed");
                            Status::unhealthy(name, true, None, format!("check task failed: {}", e))
                        }
                    }
                }
            });

            (group.name.clone(), join_all(checks).await)
        }))
        .await;

        self.snapshot(groups)
    }

    fn snapshot(&self, groups: Vec<(String, Vec<Status>)>) -> Summary {
        let checked: usize = groups.iter().map(|(_, statuses)| statuses.len()).sum();

        let summary = Summary::new(
            self.name.clone(),
            self.hostname.clone(),
            self.version.clone(),
            groups,
            self.startup,
            Utc::now(),
        );

        info!(
            application = %self.name,
            services = checked,
            healthy = summary.is_healthy(false),
            essential_healthy = summary.is_healthy(true),
            "health snapshot completed"
        );

        summary
    }
}

impl fmt::Debug for Health {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let groups: Vec<(&str, Vec<&str>)> = self
            .service_groups
            .iter()
            .map(|g| (g.name.as_str(), g.services.iter().map(|s| s.name()).collect()))
            .collect();

        f.debug_struct("Health")
            .field("name", &self.name)
            .field("hostname", &self.hostname)
            .field("version", &self.version)
            .field("startup", &self.startup)
            .field("service_groups", &groups)
            .finish()
    }
}
