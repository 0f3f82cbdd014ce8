//! Diagnostic logging for rewriter.
//!
//! Logs go to standard error so they never mix with printed results.
//! `RUST_LOG` takes precedence; otherwise verbosity picks the level.

use tracing_subscriber::{EnvFilter, fmt, prelude::*, registry};

/// Maps a `-v` count to a filter directive.
pub fn level_for(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "rewriter=warn",
        1 => "rewriter=info",
        _ => "rewriter=debug",
    }
}

/// Initialize the logging system.
///
/// Warnings are always shown, so a skipped dictionary or a failed file is
/// never silent.
pub fn init_logging(verbosity: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level_for(verbosity)));

    let subscriber = registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .without_time(),
        )
        .with(filter);

    // A second initialization (e.g. in tests) keeps the first subscriber.
    let _ = tracing::subscriber::set_global_default(subscriber);
}
