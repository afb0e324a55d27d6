//! User repository trait (port)

use async_trait::async_trait;
use uuid::Uuid;

use qrest_shared::Pagination;

use crate::domain::User;
use crate::error::DomainError;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<User>, DomainError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DomainError>;
    async fn update(&self, user: &User) -> Result<User, DomainError>;
    async fn delete(&self, id: &Uuid) -> Result<bool, DomainError>;
    /// Newest first; `search` matches email or name, case-insensitive.
    async fn list(
        &self,
        search: Option<String>,
        page: Pagination,
    ) -> Result<(Vec<User>, i64), DomainError>;
    async fn count(&self) -> Result<i64, DomainError>;
}
