/// Admin Routes
///
/// Guarded by `Authorization: ApiKey <key>`; the key comes from
/// `auth.admin_api_key`. With no key configured every admin call is refused.

use actix_web::{web, HttpRequest, HttpResponse};
use constant_time_eq::constant_time_eq;
use secrecy::{ExposeSecret, Secret};

use crate::auth::extract_api_key;
use crate::configuration::Platform;
use crate::error::{AppError, AuthError};
use crate::middleware::HitCounter;

pub struct AdminSettings {
    pub api_key: Option<Secret<String>>,
    pub platform: Platform,
}

fn authorize(req: &HttpRequest, admin: &AdminSettings) -> Result<(), AppError> {
    let provided = extract_api_key(req.headers())?;
    let expected = admin.api_key.as_ref().ok_or(AuthError::InvalidApiKey)?;

    if constant_time_eq(provided.as_bytes(), expected.expose_secret().as_bytes()) {
        Ok(())
    } else {
        Err(AuthError::InvalidApiKey.into())
    }
}

/// GET /admin/metrics
pub async fn metrics(
    req: HttpRequest,
    admin: web::Data<AdminSettings>,
    hit_counter: web::Data<HitCounter>,
) -> Result<HttpResponse, AppError> {
    authorize(&req, &admin)?;

    Ok(HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(format!(
            "<html>\n<body>\n<h1>Welcome, Chirpy Admin</h1>\n<p>Chirpy has been visited {} times!</p>\n</body>\n</html>\n",
            hit_counter.hits()
        )))
}

/// POST /admin/reset
///
/// Only available on the `dev` platform.
pub async fn reset(
    req: HttpRequest,
    admin: web::Data<AdminSettings>,
    hit_counter: web::Data<HitCounter>,
) -> Result<HttpResponse, AppError> {
    authorize(&req, &admin)?;

    if admin.platform != Platform::Dev {
        return Err(AuthError::Forbidden.into());
    }

    hit_counter.reset();
    tracing::info!("Hit counter reset");

    Ok(HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .body("Hits reset to 0\n"))
}
