/// Persistence contracts
///
/// The auth subsystem never caches rows; every call goes to the store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::AppError;

mod memory;
mod postgres;

pub use memory::{InMemoryRefreshTokenStore, InMemoryUserStore};
pub use postgres::{PgRefreshTokenStore, PgUserStore};

/// A persisted refresh token row, keyed by its own value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshTokenRecord {
    pub token: String,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
}

/// Result of a conditional revoke
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevokeOutcome {
    Applied,
    AlreadyRevoked,
    NotFound,
}

#[async_trait]
pub trait RefreshTokenStore: Send + Sync {
    /// Persist a new, unrevoked token
    async fn insert(
        &self,
        token: &str,
        user_id: Uuid,
        created_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AppError>;

    async fn find_by_token(&self, token: &str) -> Result<Option<RefreshTokenRecord>, AppError>;

    /// Set `revoked_at` only if it is still null. Must be atomic per row.
    async fn mark_revoked(
        &self,
        token: &str,
        revoked_at: DateTime<Utc>,
    ) -> Result<RevokeOutcome, AppError>;
}

/// What login needs to know about an account
#[derive(Clone)]
pub struct UserCredentials {
    pub id: Uuid,
    pub email: String,
    pub hashed_password: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserCredentials>, AppError>;
}
