//! Log output.
//!
//! Events go to stderr so that command output on stdout (minted IDs, lease
//! listings) stays machine-readable. Verbosity is controlled with `RUST_LOG`
//! and defaults to `info`:
//!
//! ```bash
//! RUST_LOG=slotflake=debug slotflake hold
//! ```

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use super::config::LogFormat;

pub fn init_telemetry(format: LogFormat) -> anyhow::Result<()> {
    let registry = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()));

    match format {
        LogFormat::Pretty => registry
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_thread_ids(true)
                    .with_line_number(true)
                    .with_target(false)
                    .with_timer(fmt::time::ChronoLocal::rfc_3339())
                    .with_file(true)
                    .pretty(),
            )
            .try_init()?,
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_thread_names(true)
                    .with_timer(fmt::time::ChronoUtc::rfc_3339())
                    .json()
                    .flatten_event(true),
            )
            .try_init()?,
    }
    Ok(())
}
