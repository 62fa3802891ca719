use std::fs;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub const LOG_DIR: &str = "logs";
pub const LOG_FILE: &str = "probate_scraper.log";

/// Always-on directive for this crate's own events, added on top of `RUST_LOG`.
pub const CRATE_DIRECTIVE: &str = "probate_scraper=info";

/// `RUST_LOG` (empty when unset) plus the crate directive.
pub fn env_filter() -> EnvFilter {
    let filter = EnvFilter::from_default_env();
    match CRATE_DIRECTIVE.parse::<Directive>() {
        Ok(directive) => filter.add_directive(directive),
        Err(_) => filter,
    }
}

/// Initializes the logging system with both console and file output.
///
/// Hold the returned guard for the life of the process; dropping it flushes
/// and stops the file writer.
pub fn init_logging() -> WorkerGuard {
    // Ensure logs directory exists
    let _ = fs::create_dir_all(LOG_DIR);

    // Daily-rotated file, written off the async workers
    let file_appender = tracing_appender::rolling::daily(LOG_DIR, LOG_FILE);
    let (non_blocking_writer, guard) = tracing_appender::non_blocking(file_appender);

    // JSON lines in the file
    let file_layer = fmt::layer().json().with_writer(non_blocking_writer);

    // Human-readable console output, with the emitting module
    let console_layer = fmt::layer().with_target(true).with_writer(std::io::stdout);

    tracing_subscriber::registry()
        .with(env_filter())
        .with(file_layer)
        .with(console_layer)
        .init();

    guard
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crate_directive_parses() {
        assert!(CRATE_DIRECTIVE.parse::<Directive>().is_ok());
        assert!(env_filter().to_string().contains(CRATE_DIRECTIVE));
    }
}
