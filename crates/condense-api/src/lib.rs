//! Condense API crate - axum HTTP server and route handlers.
//!
//! Exposes text and file summarization, stored summary retrieval, and a
//! health check, plus the static frontend page.

pub mod error;
pub mod handlers;
pub mod rate_limit;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::{create_router, start_server};
pub use state::AppState;
