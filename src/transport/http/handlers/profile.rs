use crate::app::error::GatewayError;
use crate::domain::is_profile_complete;
use crate::storage::{Collection, Filter};
use crate::transport::http::error::ApiError;
use crate::transport::http::types::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;
use serde_json::Value as JsonValue;
use tracing::info;

pub const COMPLETENESS_FIELD: &str = "isProfileComplete";

#[utoipa::path(
    post,
    path = "/api/profile",
    request_body = ProfileBody,
    responses(
        (status = 200, description = "Stored profile"),
        (status = 400, description = "Missing user id, username taken, or invalid fields", body = ErrorBody),
        (status = 500, description = "Storage failure", body = ErrorBody)
    )
)]
pub async fn upsert_profile_handler(
    State(state): State<AppState>,
    request: Result<Json<JsonValue>, JsonRejection>,
) -> Result<Json<JsonValue>, ApiError> {
    let Json(mut payload) = request?;

    let auth0_id = match payload.get("auth0Id").and_then(JsonValue::as_str) {
        Some(id) if !id.trim().is_empty() => id.to_string(),
        _ => return Err(ApiError::BadRequest("User ID is required".to_string())),
    };

    // Not atomic with the write below; two callers racing for one username can both pass.
    if let Some(username) = payload.get("username").and_then(JsonValue::as_str) {
        let taken = state
            .gateway
            .find_one(
                Collection::Users,
                &Filter::new()
                    .eq("username", username)
                    .ne("auth0Id", auth0_id.as_str()),
            )
            .await
            .map_err(|e| ApiError::Internal(e.to_string()))?;
        if taken.is_some() {
            return Err(ApiError::BadRequest("Username is already taken".to_string()));
        }
    }

    // Upserts merge into the stored record, so completeness is judged on the merged result.
    let key = Filter::new().eq("auth0Id", auth0_id.as_str());
    let mut merged = state
        .gateway
        .find_one(Collection::Users, &key)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
        .unwrap_or_default();
    if let Some(fields) = payload.as_object() {
        for (k, v) in fields {
            merged.insert(k.clone(), v.clone());
        }
    }
    let complete = is_profile_complete(&JsonValue::Object(merged));
    payload[COMPLETENESS_FIELD] = JsonValue::Bool(complete);

    match state.gateway.upsert(Collection::Users, &key, &payload).await {
        Ok(doc) => {
            info!(auth0_id = %auth0_id, complete, "profile saved");
            Ok(Json(JsonValue::Object(doc)))
        }
        Err(GatewayError::Validation(e)) => Err(ApiError::InvalidFields(e.messages())),
        Err(GatewayError::Storage(e)) => Err(ApiError::Internal(e.to_string())),
    }
}

#[utoipa::path(
    get,
    path = "/api/profile/{auth0Id}",
    params(
        ("auth0Id" = String, Path, description = "Identity key")
    ),
    responses(
        (status = 200, description = "Stored profile, or {} when none exists"),
        (status = 500, description = "Storage failure", body = ErrorBody)
    )
)]
pub async fn fetch_profile_handler(
    State(state): State<AppState>,
    Path(auth0_id): Path<String>,
) -> Result<Json<JsonValue>, ApiError> {
    let doc = state
        .gateway
        .find_one(Collection::Users, &Filter::new().eq("auth0Id", auth0_id))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    Ok(Json(JsonValue::Object(doc.unwrap_or_default())))
}
