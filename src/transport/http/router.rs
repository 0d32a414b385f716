use crate::transport::http::error::{ErrorBody, ErrorMessage};
use crate::transport::http::handlers::{booking, contact, health, profile, username};
use crate::transport::http::types::{
    AppState, BookingBody, ContactMessageBody, HealthStatus, MessageBody, ProfileBody,
    UsernameAvailability,
};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        health::healthcheck_handler,
        contact::submit_contact_handler,
        booking::submit_booking_handler,
        username::check_username_handler,
        profile::upsert_profile_handler,
        profile::fetch_profile_handler
    ),
    components(schemas(
        ContactMessageBody,
        BookingBody,
        ProfileBody,
        MessageBody,
        UsernameAvailability,
        HealthStatus,
        ErrorBody,
        ErrorMessage
    ))
)]
pub struct ApiDoc;

/// API routes only, without docs or middleware.
pub fn create_router(app_state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::healthcheck_handler))
        .route("/api/contact", post(contact::submit_contact_handler))
        .route("/api/booking", post(booking::submit_booking_handler))
        .route(
            "/api/check-username/:username",
            get(username::check_username_handler),
        )
        .route("/api/profile", post(profile::upsert_profile_handler))
        .route("/api/profile/:auth0_id", get(profile::fetch_profile_handler))
        .with_state(app_state)
}

/// The full application: routes, Swagger UI, CORS and request tracing.
pub fn app(app_state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    create_router(app_state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
