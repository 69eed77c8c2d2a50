/// Middleware module
///
/// Custom middleware for authentication, request counting and logging.

mod hit_counter;
mod jwt_middleware;
mod request_logger;

pub use hit_counter::{HitCounter, HitCounterMiddleware};
pub use jwt_middleware::{AuthenticatedUser, JwtMiddleware};
pub use request_logger::RequestLogger;
