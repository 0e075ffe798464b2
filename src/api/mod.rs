//! HTTP API module.
//!
//! Routes, handlers, shared state and the error surface for the service.

mod error;
mod handlers;
mod routes;
mod state;

pub use error::{ApiError, ApiResult, ErrorResponse};
pub use routes::create_router;
pub use state::AppState;
