use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "info,wxnorm=debug";

/// Initialize logging.
/// - JSON logs
/// - RUST_LOG respected; default to "info,wxnorm=debug"
pub fn init(service_name: &str) {
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_FILTER.to_string());
    init_with_filter(service_name, &env_filter);
}

/// Initialize logging with an explicit filter directive, e.g. "warn".
///
/// Does nothing if a global subscriber is already installed.
pub fn init_with_filter(service_name: &str, filter: &str) {
    let installed = tracing_subscriber::registry()
        .with(EnvFilter::new(filter))
        .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
        .try_init();

    if installed.is_ok() {
        tracing::info!(service = %service_name, "Logging initialized");
    }
}
