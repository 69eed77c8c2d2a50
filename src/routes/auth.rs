/// Authentication Routes
///
/// Login, access token refresh, refresh token revocation and the current
/// user lookup.

use actix_web::{web, HttpRequest, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::{
    extract_bearer_token, reject_unknown_account, verify_password, RefreshTokenManager,
    SessionTokenIssuer,
};
use crate::error::{AppError, ErrorContext, ValidationError};
use crate::middleware::AuthenticatedUser;
use crate::store::UserStore;

/// User login request
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Logged-in user with a fresh token pair
#[derive(Serialize, Deserialize, Debug)]
pub struct LoginResponse {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub email: String,
    pub token: String,
    pub refresh_token: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct TokenResponse {
    pub token: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct CurrentUserResponse {
    pub id: Uuid,
}

/// POST /api/login
///
/// Authenticate with email and password; returns an access token and a
/// refresh token.
///
/// # Errors
/// - 400: Empty email
/// - 401: Unknown email or wrong password (same response for both)
/// - 500: Internal server error
///
/// # Security Notes
/// An unknown email still pays for a bcrypt verification, so response
/// timing does not reveal whether the account exists.
pub async fn login(
    form: web::Json<LoginRequest>,
    users: web::Data<dyn UserStore>,
    session_tokens: web::Data<SessionTokenIssuer>,
    refresh_tokens: web::Data<RefreshTokenManager>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("user_login");
    let LoginRequest { email, password } = form.into_inner();

    let email = email.trim().to_string();
    if email.is_empty() {
        return Err(ValidationError::EmptyField("email".to_string()).into());
    }

    let account = users.find_by_email(&email).await?;

    // A cost-12 bcrypt round takes hundreds of milliseconds; keep it off the async workers
    let user = web::block(move || match account {
        Some(user) => verify_password(&password, &user.hashed_password).map(|_| user),
        None => Err(reject_unknown_account(&password)),
    })
    .await??;

    let token = session_tokens.issue(user.id)?;
    let refresh_token = refresh_tokens.issue(user.id).await?;

    let context = context.with_user_id(user.id);
    tracing::info!(
        request_id = %context.request_id,
        operation = %context.operation,
        user_id = ?context.user_id,
        "User logged in successfully"
    );

    Ok(HttpResponse::Ok().json(LoginResponse {
        id: user.id,
        created_at: user.created_at,
        updated_at: user.updated_at,
        email: user.email,
        token,
        refresh_token,
    }))
}

/// POST /api/refresh
///
/// Exchange `Authorization: Bearer <refresh token>` for a new access token.
/// The refresh token itself is left unchanged and stays usable.
///
/// # Errors
/// - 401: Missing header, or unknown, revoked or expired refresh token
/// - 500: Internal server error
pub async fn refresh(
    req: HttpRequest,
    session_tokens: web::Data<SessionTokenIssuer>,
    refresh_tokens: web::Data<RefreshTokenManager>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("token_refresh");

    let refresh_token = extract_bearer_token(req.headers())?;
    let user_id = refresh_tokens.validate(&refresh_token).await?;
    let token = session_tokens.issue(user_id)?;

    let context = context.with_user_id(user_id);
    tracing::info!(
        request_id = %context.request_id,
        operation = %context.operation,
        user_id = ?context.user_id,
        "Access token refreshed"
    );

    Ok(HttpResponse::Ok().json(TokenResponse { token }))
}

/// POST /api/revoke
///
/// Revoke `Authorization: Bearer <refresh token>`. Answers 204 whether or
/// not the token existed or was already revoked.
///
/// # Errors
/// - 401: Missing or malformed Authorization header
/// - 500: Internal server error
pub async fn revoke(
    req: HttpRequest,
    refresh_tokens: web::Data<RefreshTokenManager>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("token_revoke");

    let refresh_token = extract_bearer_token(req.headers())?;
    let outcome = refresh_tokens.revoke(&refresh_token).await?;

    tracing::info!(
        request_id = %context.request_id,
        operation = %context.operation,
        outcome = ?outcome,
        "Revoke request handled"
    );

    Ok(HttpResponse::NoContent().finish())
}

/// GET /api/me
///
/// **Requires a valid access token**; the identity is injected by
/// `JwtMiddleware`.
pub async fn current_user(user: web::ReqData<AuthenticatedUser>) -> HttpResponse {
    HttpResponse::Ok().json(CurrentUserResponse { id: user.user_id })
}
