pub mod app;
pub mod domain;
pub mod infra;
pub mod storage;
pub mod transport;

// Convenience re-exports (keeps call-sites clean)
pub use app::gateway::PersistenceGateway;
pub use domain::{is_profile_complete, is_six_digit_postal_code, is_ten_digit_phone};
pub use infra::config::Config;
pub use storage::{Collection, DocumentStore, Filter, MemoryDocumentStore, PgDocumentStore};
