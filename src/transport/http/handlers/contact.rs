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
    path = "/api/contact",
    request_body = ContactMessageBody,
    responses(
        (status = 201, description = "Message stored", body = MessageBody),
        (status = 400, description = "Missing or malformed fields", body = ErrorBody),
        (status = 500, description = "Storage failure", body = ErrorBody)
    )
)]
pub async fn submit_contact_handler(
    State(state): State<AppState>,
    request: Result<Json<JsonValue>, JsonRejection>,
) -> Result<(StatusCode, Json<MessageBody>), ApiError> {
    let Json(payload) = request?;

    match state
        .gateway
        .insert(Collection::ContactMessages, &payload)
        .await
    {
        Ok(doc) => {
            info!(id = ?doc.get("_id"), "contact message received");
            Ok((
                StatusCode::CREATED,
                Json(MessageBody::new("Message sent successfully")),
            ))
        }
        Err(GatewayError::Validation(e)) => {
            warn!(fields = ?e.fields(), "contact message rejected");
            Err(ApiError::BadRequest(
                "Please fill all required fields".to_string(),
            ))
        }
        Err(GatewayError::Storage(e)) => {
            warn!(error = %e, "failed to store contact message");
            Err(ApiError::Internal("Failed to send message".to_string()))
        }
    }
}
