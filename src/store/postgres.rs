use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{RefreshTokenRecord, RefreshTokenStore, RevokeOutcome, UserCredentials, UserStore};
use crate::error::AppError;

/// `refresh_tokens` table backed store
#[derive(Clone)]
pub struct PgRefreshTokenStore {
    pool: PgPool,
}

impl PgRefreshTokenStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RefreshTokenStore for PgRefreshTokenStore {
    async fn insert(
        &self,
        token: &str,
        user_id: Uuid,
        created_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO refresh_tokens (token, user_id, created_at, updated_at, expires_at, revoked_at)
            VALUES ($1, $2, $3, $3, $4, NULL)
            "#,
        )
        .bind(token)
        .bind(user_id)
        .bind(created_at)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<RefreshTokenRecord>, AppError> {
        let row = sqlx::query_as::<_, (String, Uuid, DateTime<Utc>, DateTime<Utc>, Option<DateTime<Utc>>)>(
            r#"
            SELECT token, user_id, created_at, expires_at, revoked_at
            FROM refresh_tokens
            WHERE token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(
            |(token, user_id, created_at, expires_at, revoked_at)| RefreshTokenRecord {
                token,
                user_id,
                created_at,
                expires_at,
                revoked_at,
            },
        ))
    }

    async fn mark_revoked(
        &self,
        token: &str,
        revoked_at: DateTime<Utc>,
    ) -> Result<RevokeOutcome, AppError> {
        // One statement: the conditional update and the existence probe see the same snapshot
        let (found, applied) = sqlx::query_as::<_, (bool, bool)>(
            r#"
            WITH updated AS (
                UPDATE refresh_tokens
                SET revoked_at = $1, updated_at = $1
                WHERE token = $2 AND revoked_at IS NULL
                RETURNING token
            )
            SELECT
                EXISTS (SELECT 1 FROM refresh_tokens WHERE token = $2),
                EXISTS (SELECT 1 FROM updated)
            "#,
        )
        .bind(revoked_at)
        .bind(token)
        .fetch_one(&self.pool)
        .await?;

        Ok(match (found, applied) {
            (_, true) => RevokeOutcome::Applied,
            (true, false) => RevokeOutcome::AlreadyRevoked,
            (false, false) => RevokeOutcome::NotFound,
        })
    }
}

/// `users` table backed lookup
#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserCredentials>, AppError> {
        let row = sqlx::query_as::<_, (Uuid, String, String, DateTime<Utc>, DateTime<Utc>)>(
            "SELECT id, email, hashed_password, created_at, updated_at FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(
            |(id, email, hashed_password, created_at, updated_at)| UserCredentials {
                id,
                email,
                hashed_password,
                created_at,
                updated_at,
            },
        ))
    }
}
