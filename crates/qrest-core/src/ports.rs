//! Non-database ports: language model provider, QR renderer, rate-limit store

use async_trait::async_trait;

use crate::domain::QrStyle;
use crate::error::DomainError;

/// Which configured model a request should run on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelTier {
    Default,
    Advanced,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub prompt: String,
    pub tier: ModelTier,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Ask the provider for a JSON object response.
    pub json_response: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub content: String,
    pub tokens_used: i64,
    pub model: String,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AiProvider: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<Completion, DomainError>;
}

#[cfg_attr(test, mockall::automock)]
pub trait QrRenderer: Send + Sync {
    fn render_png(&self, data: &str, width: u32, style: &QrStyle) -> Result<Vec<u8>, DomainError>;
    fn render_svg(&self, data: &str, width: u32, style: &QrStyle) -> Result<String, DomainError>;
}

/// Counter state after one hit in a fixed window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitHit {
    pub count: u64,
    pub ttl_secs: u64,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RateLimitStore: Send + Sync {
    async fn hit(&self, key: &str, window_secs: u64) -> Result<RateLimitHit, DomainError>;
}
