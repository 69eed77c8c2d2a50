/// Authentication module
///
/// Password hashing, access token (JWT) issuing and validation, refresh
/// token lifecycle and Authorization header parsing.

mod claims;
mod credentials;
mod jwt;
mod password;
mod refresh_token;

pub use claims::{Claims, TOKEN_ISSUER};
pub use credentials::{extract_api_key, extract_bearer_token};
pub use jwt::{issue_access_token, validate_access_token, SessionTokenIssuer};
pub use password::{
    hash_password, prepare_dummy_hash, reject_unknown_account, verify_password,
    PASSWORD_HASH_COST,
};
pub use refresh_token::{
    generate_refresh_token, RefreshTokenManager, DEFAULT_REFRESH_TOKEN_TTL_DAYS,
    REFRESH_TOKEN_BYTES,
};
