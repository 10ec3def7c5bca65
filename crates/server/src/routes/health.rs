use axum::{extract::State, response::Json as ResponseJson};
use utils::response::ApiResponse;

use crate::service::{HealthReport, TopologyService};

pub async fn health_check(
    State(service): State<TopologyService>,
) -> ResponseJson<ApiResponse<HealthReport>> {
    let report = service.health().await;
    if !report.violations.is_empty() {
        tracing::warn!(
            violations = report.violations.len(),
            "topology store failed its invariant checks"
        );
    }
    ResponseJson(ApiResponse::success(report))
}
