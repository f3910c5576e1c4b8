//! Resman Server: the axum HTTP surface over the hierarchy, listing,
//! import and account services.

pub mod config;
pub mod error;
pub mod extract;
pub mod rate_limit;
pub mod routes;
pub mod state;

pub use config::ServerConfig;
pub use error::ApiError;
pub use routes::build_router;
pub use state::{AppState, AppStore};
