//! Immutable health snapshot and report rendering

use super::{Status, StatusSummary};
use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use serde::{Serialize, Serializer};
use serde_json::{json, Map, Value};
use tracing::warn;

const APPLICATION_KEY: &str = "application";
const HEALTH_KEY: &str = "health";

/// Check results of every registered service, captured at one point in time.
#[derive(Debug, Clone)]
pub struct Summary {
    name: String,
    hostname: String,
    version: String,
    service_groups: Vec<(String, Vec<Status>)>,
    startup: DateTime<Utc>,
    current: DateTime<Utc>,
}

impl Summary {
    /// Both timestamps are normalized to UTC. Entries sharing a group name
    /// are merged into the first occurrence, keeping their order.
    pub fn new<S, C>(
        name: impl Into<String>,
        hostname: impl Into<String>,
        version: impl Into<String>,
        service_groups: Vec<(String, Vec<Status>)>,
        startup: DateTime<S>,
        current: DateTime<C>,
    ) -> Self
    where
        S: TimeZone,
        C: TimeZone,
    {
        let mut merged: Vec<(String, Vec<Status>)> = Vec::with_capacity(service_groups.len());
        for (group, statuses) in service_groups {
            match merged.iter_mut().find(|(name, _)| *name == group) {
                Some((_, existing)) => existing.extend(statuses),
                None => merged.push((group, statuses)),
            }
        }

        Self {
            name: name.into(),
            hostname: hostname.into(),
            version: version.into(),
            service_groups: merged,
            startup: startup.with_timezone(&Utc),
            current: current.with_timezone(&Utc),
        }
    }

    /// Application name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    /// Running application version.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Deployment time as ISO-8601 with an explicit offset.
    pub fn startup(&self) -> String {
        format_timestamp(&self.startup)
    }

    /// Snapshot time as ISO-8601 with an explicit offset.
    pub fn datetime(&self) -> String {
        format_timestamp(&self.current)
    }

    pub fn startup_time(&self) -> DateTime<Utc> {
        self.startup
    }

    pub fn current_time(&self) -> DateTime<Utc> {
        self.current
    }

    /// Time since startup, e.g. `"1 day, 12:00:00"` or `"0 days, 00:05:30"`.
    pub fn uptime(&self) -> String {
        format_uptime(self.current.signed_duration_since(self.startup).num_seconds())
    }

    pub fn group_names(&self) -> impl Iterator<Item = &str> {
        self.service_groups.iter().map(|(name, _)| name.as_str())
    }

    /// Serialized statuses of every group, keyed by group name.
    ///
    /// With `essential_only`, non-essential services are dropped. A group left
    /// without services is still present as an empty list.
    pub fn groups(&self, essential_only: bool) -> Map<String, Value> {
        self.service_groups
            .iter()
            .map(|(name, statuses)| (name.clone(), group_value(statuses, essential_only)))
            .collect()
    }

    /// Serialized statuses of one group. Unknown groups yield an empty list.
    pub fn group(&self, name: &str, essential_only: bool) -> Vec<StatusSummary> {
        self.statuses(name)
            .map(|statuses| group_summary(statuses, essential_only))
            .unwrap_or_default()
    }

    pub fn statuses(&self, group: &str) -> Option<&[Status]> {
        self.service_groups
            .iter()
            .find(|(name, _)| name == group)
            .map(|(_, statuses)| statuses.as_slice())
    }

    /// True when every considered service is healthy.
    ///
    /// With `essential_only`, non-essential failures are ignored. No services
    /// at all counts as healthy.
    pub fn is_healthy(&self, essential_only: bool) -> bool {
        self.service_groups
            .iter()
            .all(|(_, statuses)| is_group_healthy(statuses, essential_only))
    }

    /// Full report: `application`, `health`, then one key per group.
    ///
    /// Group keys share the top level with `application` and `health`, so a
    /// group carrying either name replaces that block.
    pub fn summary(&self) -> Value {
        let mut report = Map::new();

        report.insert(
            APPLICATION_KEY.to_string(),
            json!({
                "name": self.name,
                "hostname": self.hostname,
                "version": self.version,
                "startup": self.startup(),
                "uptime": self.uptime(),
                "datetime": self.datetime(),
            }),
        );
        report.insert(HEALTH_KEY.to_string(), Value::Object(Map::new()));

        for (group, statuses) in &self.service_groups {
            if group == APPLICATION_KEY || group == HEALTH_KEY {
                warn!(group = %group, "group name collides with a fixed report key");
            }

            match report.get_mut(HEALTH_KEY) {
                Some(Value::Object(health)) => {
                    health.insert(group.clone(), Value::Bool(is_group_healthy(statuses, false)));
                }
                _ => warn!(
                    group = %group,
                    "health block was replaced by a group, dropping this group's verdict"
                ),
            }

            report.insert(group.clone(), group_value(statuses, false));
        }

        Value::Object(report)
    }
}

impl Serialize for Summary {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.summary().serialize(serializer)
    }
}

fn considered(status: &Status, essential_only: bool) -> bool {
    !essential_only || status.is_essential()
}

fn group_summary(statuses: &[Status], essential_only: bool) -> Vec<StatusSummary> {
    statuses
        .iter()
        .filter(|status| considered(status, essential_only))
        .map(Status::summary)
        .collect()
}

fn group_value(statuses: &[Status], essential_only: bool) -> Value {
    Value::Array(
        group_summary(statuses, essential_only)
            .iter()
            .map(StatusSummary::to_value)
            .collect(),
    )
}

fn is_group_healthy(statuses: &[Status], essential_only: bool) -> bool {
    statuses
        .iter()
        .filter(|status| considered(status, essential_only))
        .all(Status::is_healthy)
}

fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Secs, false)
}

fn format_uptime(seconds: i64) -> String {
    let seconds = seconds.unsigned_abs();
    let days = seconds / 86_400;
    let hours = seconds % 86_400 / 3_600;
    let minutes = seconds % 3_600 / 60;
    let secs = seconds % 60;

    let unit = if days == 1 { "day" } else { "days" };

    format!("{} {}, {:02}:{:02}:{:02}", days, unit, hours, minutes, secs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, FixedOffset};

    #[test]
    fn test_uptime_formatting() {
        assert_eq!(format_uptime(0), "0 days, 00:00:00");
        assert_eq!(format_uptime(59), "0 days, 00:00:59");
        assert_eq!(format_uptime(3_661), "0 days, 01:01:01");
        assert_eq!(format_uptime(86_400), "1 day, 00:00:00");
        assert_eq!(format_uptime(3 * 86_400 + 5), "3 days, 00:00:05");
    }

    #[test]
    fn test_uptime_ignores_direction() {
        assert_eq!(format_uptime(-3_600), "0 days, 01:00:00");
    }

    #[test]
    fn test_timestamps_normalized_to_utc() {
        let offset = FixedOffset::east_opt(2 * 3_600).unwrap();
        let startup = offset.with_ymd_and_hms(2024, 5, 1, 14, 0, 0).unwrap();
        let current = startup + Duration::minutes(90);

        let summary = Summary::new("app", "host", "1.0.0", Vec::new(), startup, current);

        assert_eq!(summary.startup(), "2024-05-01T12:00:00+00:00");
        assert_eq!(summary.datetime(), "2024-05-01T13:30:00+00:00");
        assert_eq!(summary.uptime(), "0 days, 01:30:00");
    }

    #[test]
    fn test_duplicate_group_entries_merge() {
        let now = Utc::now();
        let summary = Summary::new(
            "app",
            "host",
            "1.0.0",
            vec![
                ("cache".to_string(), vec![Status::healthy("redis", true, 1.0)]),
                ("cache".to_string(), vec![Status::healthy("memcached", true, 2.0)]),
            ],
            now,
            now,
        );

        let names: Vec<String> = summary.group("cache", false).into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["redis", "memcached"]);
        assert_eq!(summary.group_names().count(), 1);
    }

    #[test]
    fn test_group_named_health_replaces_block() {
        let now = Utc::now();
        let summary = Summary::new(
            "app",
            "host",
            "1.0.0",
            vec![
                ("health".to_string(), vec![Status::healthy("self", true, 0.5)]),
                ("db".to_string(), vec![Status::unhealthy("postgres", true, None, "down")]),
            ],
            now,
            now,
        );

        let report = summary.summary();
        assert!(report["health"].is_array());
        assert_eq!(report["health"].as_array().unwrap().len(), 1);
        assert_eq!(report["health"][0]["name"], "self");
        assert_eq!(report["db"][0]["name"], "postgres");
        assert!(!summary.is_healthy(true));
    }

    #[test]
    fn test_serialize_matches_summary() {
        let now = Utc::now();
        let summary = Summary::new(
            "app",
            "host",
            "1.0.0",
            vec![("db".to_string(), vec![Status::healthy("postgres", true, 0.2)])],
            now,
            now,
        );

        assert_eq!(serde_json::to_value(&summary).unwrap(), summary.summary());
    }
}
