/// Refresh Token Management
///
/// Refresh tokens are:
/// - 32 bytes from the OS random source, hex-encoded to 64 characters
/// - Persisted as-is, keyed by their own value
/// - Valid for every refresh until revoked or expired (no rotation on use)
/// - Looked up in the store on every validation, never cached

use chrono::{DateTime, Duration, Utc};
use rand::rngs::OsRng;
use rand::RngCore;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{AppError, RefreshTokenError};
use crate::store::{RefreshTokenStore, RevokeOutcome};

/// Random bytes per token before hex encoding
pub const REFRESH_TOKEN_BYTES: usize = 32;

pub const DEFAULT_REFRESH_TOKEN_TTL_DAYS: i64 = 60;

/// Generate a new opaque refresh token
///
/// # Errors
/// Returns an internal error if the OS random source is unavailable.
/// Never falls back to a weaker generator.
pub fn generate_refresh_token() -> Result<String, AppError> {
    let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| AppError::Internal(format!("Random source unavailable: {}", e)))?;
    Ok(hex::encode(bytes))
}

/// Issues, validates and revokes refresh tokens against a token store
pub struct RefreshTokenManager {
    store: Arc<dyn RefreshTokenStore>,
    ttl: Duration,
}

impl RefreshTokenManager {
    pub fn new(store: Arc<dyn RefreshTokenStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    pub async fn issue(&self, user_id: Uuid) -> Result<String, AppError> {
        self.issue_at(user_id, Utc::now()).await
    }

    /// Create and persist a token for `user_id`, expiring `ttl` after `now`
    ///
    /// A user may hold any number of live tokens at once.
    pub async fn issue_at(&self, user_id: Uuid, now: DateTime<Utc>) -> Result<String, AppError> {
        let expires_at = now.checked_add_signed(self.ttl).ok_or_else(|| {
            AppError::Internal("Refresh token expiry is out of range".to_string())
        })?;

        let token = generate_refresh_token()?;
        self.store.insert(&token, user_id, now, expires_at).await?;

        tracing::debug!(user_id = %user_id, "Refresh token issued");
        Ok(token)
    }

    pub async fn validate(&self, token: &str) -> Result<Uuid, AppError> {
        self.validate_at(token, Utc::now()).await
    }

    /// Resolve `token` to its user
    ///
    /// Revocation is checked before expiry, so a revoked token reports
    /// `Revoked` even after it would also have expired.
    pub async fn validate_at(&self, token: &str, now: DateTime<Utc>) -> Result<Uuid, AppError> {
        let record = match self.store.find_by_token(token).await? {
            Some(record) => record,
            None => {
                tracing::warn!("Refresh token not found");
                return Err(RefreshTokenError::NotFound.into());
            }
        };

        if let Some(revoked_at) = record.revoked_at {
            tracing::warn!(
                user_id = %record.user_id,
                revoked_at = %revoked_at,
                "Attempt to use revoked refresh token"
            );
            return Err(RefreshTokenError::Revoked.into());
        }

        if now > record.expires_at {
            tracing::info!(user_id = %record.user_id, "Refresh token expired");
            return Err(RefreshTokenError::Expired.into());
        }

        Ok(record.user_id)
    }

    pub async fn revoke(&self, token: &str) -> Result<RevokeOutcome, AppError> {
        self.revoke_at(token, Utc::now()).await
    }

    /// Mark `token` revoked if it is not already
    ///
    /// Revoking twice, or revoking an unknown token, is not an error; the
    /// outcome says which case applied. Only store failures are `Err`.
    pub async fn revoke_at(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<RevokeOutcome, AppError> {
        let outcome = self.store.mark_revoked(token, now).await?;
        match outcome {
            RevokeOutcome::Applied => tracing::info!("Refresh token revoked"),
            RevokeOutcome::AlreadyRevoked => tracing::debug!("Refresh token was already revoked"),
            RevokeOutcome::NotFound => tracing::debug!("Revoke requested for unknown refresh token"),
        }
        Ok(outcome)
    }
}
