use anyhow::Result;
use tracing_subscriber::{
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use crate::config::LoggingConfig;

/// Set up the global tracing subscriber based on configuration
///
/// Supports two formats:
/// - "json": Structured JSON output for production. Span fields are included,
///   so correlation ids of in-flight outbound calls appear on every line.
/// - "pretty": Human-readable format for development
///
/// Records go to stderr so command output on stdout stays machine-readable.
/// `RUST_LOG` overrides the configured level when set.
pub fn init_subscriber(config: &LoggingConfig) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.level));

    match config.format.as_str() {
        "json" => {
            let json_layer = tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(true)
                .with_span_list(true)
                .with_target(true)
                .with_thread_names(true)
                .with_file(false)
                .with_line_number(false)
                .with_writer(std::io::stderr);

            tracing_subscriber::registry()
                .with(env_filter)
                .with(json_layer)
                .try_init()?;
        }
        "pretty" => {
            let pretty_layer = tracing_subscriber::fmt::layer()
                .pretty()
                .with_target(true)
                .with_thread_names(true)
                .with_writer(std::io::stderr);

            tracing_subscriber::registry()
                .with(env_filter)
                .with(pretty_layer)
                .try_init()?;
        }
        _ => {
            return Err(anyhow::anyhow!(
                "Unsupported log format: {}. Use 'json' or 'pretty'",
                config.format
            ));
        }
    }

    Ok(())
}

/// Log panics through tracing, then defer to the previously installed hook.
///
/// The process is not terminated here: the panic keeps unwinding, so an
/// in-flight correlated call still records `EXTERNAL_API_ERROR` before the
/// panic reaches the top of its task.
pub fn install_panic_hook() {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        tracing::error!(?panic_info, "FATAL: Panic occurred");
        previous(panic_info);
    }));
}
