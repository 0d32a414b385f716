pub mod error;
pub mod router;
pub mod types;
pub mod handlers {
    pub mod booking;
    pub mod contact;
    pub mod health;
    pub mod profile;
    pub mod username;
}

pub use error::{ApiError, ErrorBody, ErrorMessage};
pub use router::{app, create_router, ApiDoc};
pub use types::AppState;
