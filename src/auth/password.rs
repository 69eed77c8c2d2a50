/// Password Hashing and Verification
///
/// Passwords are stored as bcrypt hashes with a fixed cost factor. Every
/// verification failure, including a malformed stored hash or an unknown
/// account, surfaces as the same `InvalidCredentials` error.

use bcrypt::{hash, verify};
use lazy_static::lazy_static;

use crate::error::{AppError, AuthError};

pub const PASSWORD_HASH_COST: u32 = 12;

lazy_static! {
    /// Verified against when no account matches, so a miss costs a full bcrypt round
    static ref DUMMY_HASH: Option<String> =
        hash("chirpy-dummy-password", PASSWORD_HASH_COST).ok();
}

/// Hash a password using bcrypt
///
/// # Errors
/// Returns an internal error if bcrypt fails (e.g. no entropy for the salt)
pub fn hash_password(password: &str) -> Result<String, AppError> {
    hash(password, PASSWORD_HASH_COST)
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
}

/// Verify a password against its stored hash
///
/// # Errors
/// `AuthError::InvalidCredentials` when the password does not match or the
/// stored hash cannot be parsed
pub fn verify_password(password: &str, password_hash: &str) -> Result<(), AppError> {
    match verify(password, password_hash) {
        Ok(true) => Ok(()),
        Ok(false) => Err(AuthError::InvalidCredentials.into()),
        Err(e) => {
            tracing::warn!(error = %e, "Stored password hash could not be parsed");
            // A parse failure returns in microseconds; pay for a full round anyway
            burn_dummy_verification(password);
            Err(AuthError::InvalidCredentials.into())
        }
    }
}

/// Spend the same work as a real verification, then fail
///
/// Used when the account lookup misses.
pub fn reject_unknown_account(password: &str) -> AppError {
    burn_dummy_verification(password);
    AuthError::InvalidCredentials.into()
}

/// Compute the dummy hash up front so the first unknown-account login is
/// not slower than the rest.
pub fn prepare_dummy_hash() {
    lazy_static::initialize(&DUMMY_HASH);
}

/// Returns whether a bcrypt round was actually run
fn burn_dummy_verification(password: &str) -> bool {
    match DUMMY_HASH.as_deref() {
        Some(dummy) => {
            let _ = verify(password, dummy);
            true
        }
        None => false,
    }
}
