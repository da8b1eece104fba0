use anyhow::{bail, Context};
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use chrono::{Duration, Utc};
use health_core::{create_app, AppState, CallableService, Health, Service, Status, StatusSummary};
use tower::ServiceExt;

fn callbacks_health() -> Health {
    let startup = Utc::now() - Duration::hours(1);
    let mut health = Health::new("local", "localhost", "1.2.3", startup);

    health.add_service("callbacks", CallableService::new("healthy-callback", || Ok(())));
    health.add_service(
        "callbacks",
        CallableService::new("failing-callback", || {
            Err(anyhow::anyhow!("Forced")).context("calling upstream")
        })
        .essential(false),
    );

    health
}

#[test]
fn test_essential_and_overall_verdicts() {
    let health = callbacks_health();

    assert!(!health.status().is_healthy(false));
    assert!(health.status().is_healthy(true));
}

#[test]
fn test_full_report_shape() {
    let report = callbacks_health().status().summary();

    let keys: Vec<&str> = report.as_object().unwrap().keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["application", "health", "callbacks"]);

    let application = &report["application"];
    assert_eq!(application["name"], "local");
    assert_eq!(application["hostname"], "localhost");
    assert_eq!(application["version"], "1.2.3");
    assert_eq!(application["uptime"], "0 days, 01:00:00");
    assert!(application["startup"].as_str().unwrap().ends_with("+00:00"));
    assert!(application["datetime"].as_str().unwrap().ends_with("+00:00"));

    assert_eq!(report["health"], serde_json::json!({"callbacks": false}));

    let healthy = &report["callbacks"][0];
    assert_eq!(healthy["health"], true);
    assert!(healthy["error"].is_null());
    assert!(healthy["latency"].as_f64().unwrap() >= 0.0);

    let failing = &report["callbacks"][1];
    assert_eq!(failing["health"], false);
    assert_eq!(failing["essential"], false);
    let error = failing["error"].as_str().unwrap();
    assert!(error.starts_with("calling upstream"));
    assert!(error.contains("Forced"));
}

#[test]
fn test_report_entries_read_back_as_statuses() {
    let summary = callbacks_health().status();

    for entry in summary.summary()["callbacks"].as_array().unwrap() {
        let decoded: StatusSummary = serde_json::from_value(entry.clone()).unwrap();
        let status = Status::from(decoded.clone());
        assert_eq!(status.summary(), decoded);
    }
}

#[test]
fn test_trait_objects_can_be_shared() {
    let shared: std::sync::Arc<dyn Service> =
        std::sync::Arc::new(CallableService::new("shared", || bail!("down")));

    let mut health = Health::new("local", "localhost", "1.2.3", Utc::now());
    health.add_shared_service("first", shared.clone());
    health.add_shared_service("second", shared);

    let summary = health.status();
    assert_eq!(summary.group("first", false)[0].name, "shared");
    assert_eq!(summary.group("second", false)[0].name, "shared");
    assert!(!summary.is_healthy(true));
}

#[tokio::test]
async fn test_report_served_over_http() {
    let app = create_app(AppState::new(callbacks_health()).with_concurrent_checks(true));

    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

    assert_eq!(body["health"]["callbacks"], false);
    assert_eq!(body["callbacks"][0]["name"], "healthy-callback");
    assert_eq!(body["callbacks"][1]["name"], "failing-callback");
}
