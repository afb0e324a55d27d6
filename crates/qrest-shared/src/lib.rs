//! # QRest Shared
//!
//! Shared configuration, pagination types, utilities, and telemetry for the
//! QRest menu platform.

pub mod constants;
pub mod types;
pub mod utils;
pub mod telemetry;
pub mod config;
pub mod error;

pub use types::*;
pub use error::AppError;
