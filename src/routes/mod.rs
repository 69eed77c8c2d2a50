mod admin;
mod auth;
mod health_check;

pub use admin::{metrics, reset, AdminSettings};
pub use auth::{current_user, login, refresh, revoke};
pub use health_check::health_check;
