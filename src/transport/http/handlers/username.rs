use crate::storage::{Collection, Filter};
use crate::transport::http::error::ApiError;
use crate::transport::http::types::{AppState, UsernameAvailability, UsernameQuery};
use axum::extract::{Path, Query, State};
use axum::Json;
use serde_json::Value as JsonValue;

#[utoipa::path(
    get,
    path = "/api/check-username/{username}",
    params(
        ("username" = String, Path, description = "Username to check"),
        UsernameQuery
    ),
    responses(
        (status = 200, description = "Availability", body = UsernameAvailability),
        (status = 500, description = "Storage failure", body = ErrorBody)
    )
)]
pub async fn check_username_handler(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Query(query): Query<UsernameQuery>,
) -> Result<Json<UsernameAvailability>, ApiError> {
    let existing = state
        .gateway
        .find_one(Collection::Users, &Filter::new().eq("username", username))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    let current_user = match (&existing, query.auth0_id.as_deref()) {
        (Some(doc), Some(auth0_id)) => {
            doc.get("auth0Id").and_then(JsonValue::as_str) == Some(auth0_id)
        }
        _ => false,
    };

    Ok(Json(UsernameAvailability {
        available: existing.is_none(),
        current_user,
    }))
}
