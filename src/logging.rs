pub use tracing_subscriber;
use tracing_subscriber::{filter::Directive, prelude::*, EnvFilter};

/// Install a stdout subscriber.
///
/// Events are filtered by `default_directive` unless overridden by
/// `RUST_LOG`. Event targets are shown unless `LOG_TARGET=0`.
pub fn init(default_directive: Directive) {
    let with_target = std::env::var("LOG_TARGET")
        .map(|val| val != "0")
        .unwrap_or(true);

    let filter = EnvFilter::builder()
        .with_default_directive(default_directive)
        .from_env_lossy();

    let layer = tracing_subscriber::fmt::layer()
        .with_ansi(true)
        .with_target(with_target)
        .with_filter(filter);

    // A subscriber may already be set (e.g. by a test harness)
    let _ = tracing_subscriber::registry().with(layer).try_init();
}
