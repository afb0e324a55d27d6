//! # QRest Infrastructure
//!
//! Adapters for the core ports: PostgreSQL repositories, Redis rate
//! limiting, the language model client and QR rendering.

pub mod ai;
pub mod cache;
pub mod database;
pub mod qr;

pub use ai::OpenAiClient;
pub use cache::{create_redis_pool, RedisRateLimitStore};
pub use database::*;
pub use qr::QrCodeRenderer;
