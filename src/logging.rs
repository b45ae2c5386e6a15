use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::utils::{self, Profile};

/// Where log lines go
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTarget {
    Stderr,
    /// Daily rolling file in the profile's data directory.
    /// Used while the terminal is in the alternate screen.
    File,
}

fn default_directive(verbose: bool) -> &'static str {
    if verbose { "dueline=debug" } else { "dueline=info" }
}

fn build_filter(verbose: bool) -> EnvFilter {
    // RUST_LOG wins when set and valid
    std::env::var("RUST_LOG")
        .ok()
        .and_then(|raw| {
            let raw = raw.trim();
            if raw.is_empty() {
                return None;
            }
            EnvFilter::try_new(raw).ok()
        })
        .unwrap_or_else(|| EnvFilter::new(default_directive(verbose)))
}

/// Install the global subscriber.
///
/// The returned guard flushes the file writer on drop and must be held until
/// exit. Calling this twice leaves the first subscriber in place.
pub fn init(profile: Profile, target: LogTarget, verbose: bool) -> Option<WorkerGuard> {
    let filter = build_filter(verbose);

    match target {
        LogTarget::Stderr => {
            let _ = tracing_subscriber::registry()
                .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
                .with(filter)
                .try_init();
            None
        }
        LogTarget::File => {
            let log_dir = utils::get_data_dir(profile)?.join("logs");
            if std::fs::create_dir_all(&log_dir).is_err() {
                return None;
            }
            let appender = tracing_appender::rolling::daily(log_dir, "dueline.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let _ = tracing_subscriber::registry()
                .with(fmt::layer().with_writer(writer).with_ansi(false))
                .with(filter)
                .try_init();
            Some(guard)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbose_raises_default_level() {
        assert_eq!(default_directive(false), "dueline=info");
        assert_eq!(default_directive(true), "dueline=debug");
    }
}
