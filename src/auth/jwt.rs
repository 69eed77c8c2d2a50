/// Access Token Issuing and Validation
///
/// Access tokens are stateless HS256 JWTs. They are never stored, so the only
/// way one stops working is by reaching its expiry.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, Secret};
use uuid::Uuid;

use crate::auth::claims::{Claims, TOKEN_ISSUER};
use crate::error::{AppError, SessionTokenError};

/// Sign a new access token for `user_id` with `secret`
///
/// # Errors
/// Returns an internal error if encoding fails
pub fn issue_access_token(user_id: Uuid, secret: &[u8], ttl: Duration) -> Result<String, AppError> {
    issue_with_key(user_id, &EncodingKey::from_secret(secret), ttl, Utc::now())
}

/// Verify `token` against `secret` and return the user id it was issued for
///
/// # Errors
/// Any bad signature, wrong issuer, expiry, malformed structure or
/// non-UUID subject is an authentication error
pub fn validate_access_token(token: &str, secret: &[u8]) -> Result<Uuid, AppError> {
    validate_with_key(token, &DecodingKey::from_secret(secret), Utc::now())
}

fn issue_with_key(
    user_id: Uuid,
    key: &EncodingKey,
    ttl: Duration,
    now: DateTime<Utc>,
) -> Result<String, AppError> {
    let claims = Claims::new(user_id, now, ttl);

    encode(&Header::new(Algorithm::HS256), &claims, key)
        .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))
}

fn validate_with_key(token: &str, key: &DecodingKey, now: DateTime<Utc>) -> Result<Uuid, AppError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[TOKEN_ISSUER]);
    validation.set_required_spec_claims(&["exp", "iss", "sub"]);
    // Expiry is checked below against the caller's clock with no leeway
    validation.validate_exp = false;
    validation.leeway = 0;

    let claims = decode::<Claims>(token, key, &validation)
        .map(|data| data.claims)
        .map_err(|e| {
            let kind = match e.kind() {
                ErrorKind::InvalidSignature => SessionTokenError::BadSignature,
                ErrorKind::InvalidIssuer => SessionTokenError::InvalidIssuer,
                ErrorKind::ExpiredSignature => SessionTokenError::Expired,
                _ => SessionTokenError::Malformed,
            };
            tracing::debug!(reason = %kind, "Access token rejected");
            kind
        })?;

    if claims.is_expired_at(now) {
        return Err(SessionTokenError::Expired.into());
    }

    Ok(claims.user_id()?)
}

/// Issues and validates access tokens with keys derived once from the
/// process signing secret.
pub struct SessionTokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl SessionTokenIssuer {
    pub fn new(secret: &Secret<String>, ttl: Duration) -> Self {
        let bytes = secret.expose_secret().as_bytes();
        Self {
            encoding: EncodingKey::from_secret(bytes),
            decoding: DecodingKey::from_secret(bytes),
            ttl,
        }
    }

    pub fn issue(&self, user_id: Uuid) -> Result<String, AppError> {
        self.issue_at(user_id, Utc::now())
    }

    pub fn issue_at(&self, user_id: Uuid, now: DateTime<Utc>) -> Result<String, AppError> {
        issue_with_key(user_id, &self.encoding, self.ttl, now)
    }

    pub fn validate(&self, token: &str) -> Result<Uuid, AppError> {
        self.validate_at(token, Utc::now())
    }

    pub fn validate_at(&self, token: &str, now: DateTime<Utc>) -> Result<Uuid, AppError> {
        validate_with_key(token, &self.decoding, now)
    }
}
