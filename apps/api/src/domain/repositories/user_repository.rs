use async_trait::async_trait;
use serde::Deserialize;
use uuid::Uuid;

use super::errors::RepositoryResult;
use super::pagination::{Page, PageRequest};
use crate::domain::user::{Email, User, UserRole};

/// Columns a user listing can be sorted by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserSortField {
    #[default]
    Username,
    Email,
    FullName,
    Role,
    CreatedAt,
}

/// Repository trait for User persistence
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Create a new user; fails with `Duplicate` on username or email clash
    async fn create(&self, user: &User) -> RepositoryResult<()>;

    /// Overwrite an existing user
    async fn update(&self, user: &User) -> RepositoryResult<()>;

    /// Remove a user permanently
    async fn delete(&self, id: Uuid) -> RepositoryResult<()>;

    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<User>>;

    async fn find_by_username(&self, username: &str) -> RepositoryResult<Option<User>>;

    async fn find_by_email(&self, email: &Email) -> RepositoryResult<Option<User>>;

    async fn exists_by_username(&self, username: &str) -> RepositoryResult<bool>;

    async fn exists_by_email(&self, email: &Email) -> RepositoryResult<bool>;

    /// One page of users, optionally restricted to a role
    async fn find_page(
        &self,
        role: Option<UserRole>,
        request: &PageRequest<UserSortField>,
    ) -> RepositoryResult<Page<User>>;
}
