use tracing::Subscriber;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

/// JSON-formatted subscriber filtered by `RUST_LOG`, falling back to `default_filter`.
pub fn get_subscriber(default_filter: &str) -> impl Subscriber + Send + Sync {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let formatting_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stdout)
        .json();

    Registry::default().with(env_filter).with(formatting_layer)
}

/// Install structured JSON logging for the process.
/// `log` records (actix's access logger) are bridged into tracing.
pub fn init_telemetry() {
    get_subscriber("info").init();
}

/// Like `init_telemetry` but tolerates an already-installed subscriber,
/// for tests that spin up several servers in one process.
pub fn try_init_telemetry(default_filter: &str) {
    let _ = get_subscriber(default_filter).try_init();
}
