use actix_web::dev::Server;
use actix_web::{middleware::Logger, web, App, HttpServer};
use std::net::TcpListener;
use std::sync::Arc;

use crate::auth::{prepare_dummy_hash, RefreshTokenManager, SessionTokenIssuer};
use crate::configuration::{AuthSettings, Platform};
use crate::error::{AppError, ValidationError};
use crate::middleware::{HitCounter, HitCounterMiddleware, JwtMiddleware, RequestLogger};
use crate::routes::{
    current_user, health_check, login, metrics, refresh, reset, revoke, AdminSettings,
};
use crate::store::{RefreshTokenStore, UserStore};

/// Everything the HTTP layer shares across workers
pub struct ApplicationState {
    pub users: Arc<dyn UserStore>,
    pub session_tokens: SessionTokenIssuer,
    pub refresh_tokens: RefreshTokenManager,
    pub hit_counter: HitCounter,
    pub admin: AdminSettings,
}

impl ApplicationState {
    /// Build the auth components from settings; the signing secret is exposed
    /// only here, to derive the HMAC keys. Also computes the bcrypt hash used
    /// for unknown-account logins, so this costs one bcrypt round.
    pub fn new(
        auth: AuthSettings,
        platform: Platform,
        users: Arc<dyn UserStore>,
        refresh_token_store: Arc<dyn RefreshTokenStore>,
    ) -> Self {
        let session_tokens = SessionTokenIssuer::new(&auth.token_secret, auth.access_token_ttl());
        let refresh_tokens = RefreshTokenManager::new(refresh_token_store, auth.refresh_token_ttl());
        prepare_dummy_hash();

        Self {
            users,
            session_tokens,
            refresh_tokens,
            hit_counter: HitCounter::new(),
            admin: AdminSettings {
                api_key: auth.admin_api_key,
                platform,
            },
        }
    }
}

pub fn run(listener: TcpListener, state: ApplicationState) -> Result<Server, std::io::Error> {
    let users: web::Data<dyn UserStore> = web::Data::from(state.users);
    let session_tokens = web::Data::new(state.session_tokens);
    let refresh_tokens = web::Data::new(state.refresh_tokens);
    let hit_counter = web::Data::new(state.hit_counter);
    let admin = web::Data::new(state.admin);

    let server = HttpServer::new(move || {
        let json_config = web::JsonConfig::default().error_handler(|err, _req| {
            tracing::warn!(error = %err, "Rejected request body");
            AppError::from(ValidationError::InvalidFormat("request body".to_string())).into()
        });

        App::new()
            // Global middleware
            .wrap(Logger::default())
            .wrap(RequestLogger)

            // Shared state
            .app_data(json_config)
            .app_data(users.clone())
            .app_data(session_tokens.clone())
            .app_data(refresh_tokens.clone())
            .app_data(hit_counter.clone())
            .app_data(admin.clone())

            .service(
                web::scope("/api")
                    .wrap(HitCounterMiddleware::new(hit_counter.clone()))
                    .route("/healthz", web::get().to(health_check))
                    .route("/login", web::post().to(login))
                    .route("/refresh", web::post().to(refresh))
                    .route("/revoke", web::post().to(revoke))
                    // Protected routes (require a valid access token)
                    .service(
                        web::resource("/me")
                            .wrap(JwtMiddleware::new(session_tokens.clone()))
                            .route(web::get().to(current_user)),
                    ),
            )
            .service(
                web::scope("/admin")
                    .route("/metrics", web::get().to(metrics))
                    .route("/reset", web::post().to(reset)),
            )
    })
    .listen(listener)?
    .run();

    Ok(server)
}
