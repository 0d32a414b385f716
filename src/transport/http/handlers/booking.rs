use crate::app::error::GatewayError;
use crate::storage::Collection;
use crate::transport::http::error::ApiError;
use crate::transport::http::types::{AppState, MessageBody};
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::Value as JsonValue;
use tracing::{info, warn};

#[utoipa::path(
    post,
    path = "/api/booking",
    request_body = BookingBody,
    responses(
        (status = 201, description = "Booking stored", body = MessageBody),
        (status = 400, description = "Missing or malformed fields", body = ErrorBody),
        (status = 500, description = "Storage failure", body = ErrorBody)
    )
)]
pub async fn submit_booking_handler(
    State(state): State<AppState>,
    request: Result<Json<JsonValue>, JsonRejection>,
) -> Result<(StatusCode, Json<MessageBody>), ApiError> {
    let Json(payload) = request?;

    match state.gateway.insert(Collection::Bookings, &payload).await {
        Ok(doc) => {
            info!(id = ?doc.get("_id"), "booking received");
            Ok((StatusCode::CREATED, Json(MessageBody::new("Booking successful"))))
        }
        Err(GatewayError::Validation(e)) => {
            warn!(fields = ?e.fields(), "booking rejected");
            Err(ApiError::BadRequest(
                "Please fill all required fields correctly".to_string(),
            ))
        }
        Err(GatewayError::Storage(e)) => {
            warn!(error = %e, "failed to store booking");
            Err(ApiError::Internal("Failed to book call".to_string()))
        }
    }
}
