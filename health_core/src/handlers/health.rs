//! Health report handlers

use crate::{
    error::{HealthError, Result},
    health::Summary,
    AppState,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Default, Deserialize)]
pub struct GroupQuery {
    #[serde(default)]
    pub essential: bool,
}

/// Run the checks of one group, or of all groups, off the async workers.
///
/// Checks are synchronous and may block, so the sequential path runs on the
/// blocking pool as well.
async fn snapshot(state: &AppState, group: Option<String>) -> Result<Summary> {
    if state.concurrent_checks {
        return Ok(match group {
            Some(group) => state.health.group_status_concurrent(&group).await,
            None => state.health.status_concurrent().await,
        });
    }

    let health = Arc::clone(&state.health);
    tokio::task::spawn_blocking(move || match group {
        Some(group) => health.group_status(&group),
        None => health.status(),
    })
    .await
    .map_err(|e| HealthError::Other(anyhow::anyhow!("health check task failed: {}", e)))
}

/// Full report. 503 when an essential service is down.
pub async fn handle_health(State(state): State<AppState>) -> Result<impl IntoResponse> {
    info!("GET /health - Running health checks");

    let summary = snapshot(&state, None).await?;

    let status_code = if summary.is_healthy(true) {
        if !summary.is_healthy(false) {
            warn!("Non-essential services are unhealthy");
        }
        StatusCode::OK
    } else {
        warn!("Essential services are unhealthy");
        StatusCode::SERVICE_UNAVAILABLE
    };

    Ok((status_code, Json(summary.summary())))
}

pub async fn handle_group_health(
    State(state): State<AppState>,
    Path(group): Path<String>,
    Query(params): Query<GroupQuery>,
) -> Result<impl IntoResponse> {
    info!("GET /health/{} - essential only: {}", group, params.essential);

    let summary = snapshot(&state, Some(group.clone())).await?;

    if summary.statuses(&group).is_none() {
        return Err(HealthError::GroupNotFound(group));
    }

    Ok(Json(summary.group(&group, params.essential)))
}

pub async fn handle_liveness() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "status": "alive",
            "timestamp": chrono::Utc::now().timestamp()
        })),
    )
}
