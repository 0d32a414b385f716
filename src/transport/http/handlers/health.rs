use crate::transport::http::types::{AppState, HealthStatus};
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy (storage reachable)", body = HealthStatus),
        (status = 503, description = "Service is unhealthy (storage unreachable)", body = HealthStatus)
    )
)]
pub async fn healthcheck_handler(State(state): State<AppState>) -> (StatusCode, Json<HealthStatus>) {
    match state.gateway.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthStatus {
                status: "ok".to_string(),
                error: None,
            }),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(HealthStatus {
                status: "unhealthy".to_string(),
                error: Some(format!("Storage ping failed: {}", e)),
            }),
        ),
    }
}
