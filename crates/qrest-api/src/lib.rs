//! # QRest API
//!
//! HTTP handlers, extractors, middleware, and routing for the QRest menu platform.

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod router;
pub mod state;

pub use error::{expose_internal_errors, ApiError, ApiResult};
pub use router::create_router;
pub use state::{AppState, ServerInfo};
