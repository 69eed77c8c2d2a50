use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use super::{RefreshTokenRecord, RefreshTokenStore, RevokeOutcome, UserCredentials, UserStore};
use crate::error::{AppError, DatabaseError};

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, AppError> {
    mutex
        .lock()
        .map_err(|_| AppError::Internal("In-memory store lock poisoned".to_string()))
}

/// Process-local refresh token table
#[derive(Default)]
pub struct InMemoryRefreshTokenStore {
    rows: Mutex<HashMap<String, RefreshTokenRecord>>,
}

impl InMemoryRefreshTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.lock().map(|rows| rows.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl RefreshTokenStore for InMemoryRefreshTokenStore {
    async fn insert(
        &self,
        token: &str,
        user_id: Uuid,
        created_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let mut rows = lock(&self.rows)?;
        if rows.contains_key(token) {
            return Err(DatabaseError::UniqueConstraintViolation(
                "refresh token already exists".to_string(),
            )
            .into());
        }
        rows.insert(
            token.to_string(),
            RefreshTokenRecord {
                token: token.to_string(),
                user_id,
                created_at,
                expires_at,
                revoked_at: None,
            },
        );
        Ok(())
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<RefreshTokenRecord>, AppError> {
        Ok(lock(&self.rows)?.get(token).cloned())
    }

    async fn mark_revoked(
        &self,
        token: &str,
        revoked_at: DateTime<Utc>,
    ) -> Result<RevokeOutcome, AppError> {
        let mut rows = lock(&self.rows)?;
        let outcome = match rows.get_mut(token) {
            None => RevokeOutcome::NotFound,
            Some(row) if row.revoked_at.is_some() => RevokeOutcome::AlreadyRevoked,
            Some(row) => {
                row.revoked_at = Some(revoked_at);
                RevokeOutcome::Applied
            }
        };
        Ok(outcome)
    }
}

/// Process-local user table keyed by email
#[derive(Default)]
pub struct InMemoryUserStore {
    users: Mutex<HashMap<String, UserCredentials>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an account with an already-hashed password
    pub fn insert(&self, user: UserCredentials) -> Result<(), AppError> {
        let mut users = lock(&self.users)?;
        if users.contains_key(&user.email) {
            return Err(DatabaseError::UniqueConstraintViolation(
                "email already registered".to_string(),
            )
            .into());
        }
        users.insert(user.email.clone(), user);
        Ok(())
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserCredentials>, AppError> {
        Ok(lock(&self.users)?.get(email).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[tokio::test]
    async fn test_revoke_is_set_once() {
        let store = InMemoryRefreshTokenStore::new();
        let now = Utc::now();
        store
            .insert("abc", Uuid::new_v4(), now, now + Duration::days(60))
            .await
            .unwrap();

        let first = now + Duration::days(1);
        let second = now + Duration::days(2);
        assert_eq!(store.mark_revoked("abc", first).await.unwrap(), RevokeOutcome::Applied);
        assert_eq!(
            store.mark_revoked("abc", second).await.unwrap(),
            RevokeOutcome::AlreadyRevoked
        );

        let row = store.find_by_token("abc").await.unwrap().unwrap();
        assert_eq!(row.revoked_at, Some(first));
    }

    #[tokio::test]
    async fn test_revoke_unknown_token() {
        let store = InMemoryRefreshTokenStore::new();
        assert_eq!(
            store.mark_revoked("missing", Utc::now()).await.unwrap(),
            RevokeOutcome::NotFound
        );
    }

    #[tokio::test]
    async fn test_duplicate_token_is_rejected() {
        let store = InMemoryRefreshTokenStore::new();
        let now = Utc::now();
        let user_id = Uuid::new_v4();
        store.insert("abc", user_id, now, now).await.unwrap();

        let result = store.insert("abc", user_id, now, now).await;
        assert!(matches!(
            result,
            Err(AppError::Database(DatabaseError::UniqueConstraintViolation(_)))
        ));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_user_lookup_by_email() {
        let store = InMemoryUserStore::new();
        let now = Utc::now();
        let id = Uuid::new_v4();
        store
            .insert(UserCredentials {
                id,
                email: "walt@breakingbad.com".to_string(),
                hashed_password: "$2b$12$hash".to_string(),
                created_at: now,
                updated_at: now,
            })
            .unwrap();

        let found = store.find_by_email("walt@breakingbad.com").await.unwrap();
        assert_eq!(found.map(|u| u.id), Some(id));
        assert!(store.find_by_email("jesse@breakingbad.com").await.unwrap().is_none());
    }
}
