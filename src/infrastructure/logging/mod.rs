// Logging module - Logging infrastructure
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use std::io;

/// Initialize logging system
///
/// `RUST_LOG` takes precedence; otherwise `debug` selects between debug and
/// info level for this crate. Logs always go to stderr so they never mix
/// with rendered output.
pub fn init_logging(debug: bool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let default_directive = if debug { "jsonext=debug,warn" } else { "jsonext=info,warn" };
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_target(true)
                .with_level(true)
                .with_file(debug)
                .with_line_number(debug)
        )
        .try_init()?;

    tracing::debug!("jsonext logging system initialized");
    Ok(())
}
