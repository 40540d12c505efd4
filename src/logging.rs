//! Console backend for the `log` facade.
//!
//! ```text
//! log_progress!(..)  --target "progress"-->  stdout  "Rollback: <message>"
//! log::info!(..)     ----------------------> stderr  "<time> INFO  <message>"
//! ```
//!
//! Progress lines are the human-readable step reports of the pipelines and are
//! always shown; diagnostics follow the configured level.

use chrono::Local;
use log::{LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::io::Write;

/// Log target used for user-facing step reports.
pub const PROGRESS_TARGET: &str = "progress";

/// Prefix printed before progress lines.
pub const PROGRESS_PREFIX: &str = "Rollback";

/// Report a pipeline step to the user.
#[macro_export]
macro_rules! log_progress {
    ($($arg:tt)*) => {{
        $crate::log::info!(target: $crate::logging::PROGRESS_TARGET, $($arg)*);
    }}
}

/// Map `-v` repetitions onto a diagnostic level.
pub fn level_for_verbosity(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

pub struct ConsoleLogger {
    level: LevelFilter,
}

impl ConsoleLogger {
    pub fn new(level: LevelFilter) -> Self {
        ConsoleLogger { level }
    }

    /// Render a record the way it is written to the terminal.
    pub fn format_record(record: &Record) -> String {
        if record.target() == PROGRESS_TARGET {
            format!("{}: {}", PROGRESS_PREFIX, record.args())
        } else {
            format!(
                "{} {:<5} {}",
                Local::now().format("%H:%M:%S%.3f"),
                record.level(),
                record.args()
            )
        }
    }
}

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.target() == PROGRESS_TARGET || metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let line = Self::format_record(record);
        // A closed terminal must not abort a rollback.
        if record.target() == PROGRESS_TARGET {
            let _ = writeln!(std::io::stdout().lock(), "{}", line);
        } else {
            let _ = writeln!(std::io::stderr().lock(), "{}", line);
        }
    }

    fn flush(&self) {
        let _ = std::io::stdout().flush();
        let _ = std::io::stderr().flush();
    }
}

/// Install `ConsoleLogger` as the global logger.
pub fn init_logging(verbosity: u8) -> Result<(), SetLoggerError> {
    let level = level_for_verbosity(verbosity);
    log::set_boxed_logger(Box::new(ConsoleLogger::new(level)))?;
    // Progress records are info-level and must pass the global filter.
    log::set_max_level(level.max(LevelFilter::Info));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::Level;

    #[test]
    fn test_level_for_verbosity() {
        assert_eq!(level_for_verbosity(0), LevelFilter::Warn);
        assert_eq!(level_for_verbosity(2), LevelFilter::Debug);
        assert_eq!(level_for_verbosity(9), LevelFilter::Trace);
    }

    #[test]
    fn test_progress_always_enabled() {
        let logger = ConsoleLogger::new(LevelFilter::Error);
        let progress = Metadata::builder()
            .target(PROGRESS_TARGET)
            .level(Level::Info)
            .build();
        let other = Metadata::builder()
            .target("function_rollback")
            .level(Level::Info)
            .build();
        assert!(logger.enabled(&progress));
        assert!(!logger.enabled(&other));
    }

    #[test]
    fn test_format_progress_record() {
        let line = ConsoleLogger::format_record(
            &Record::builder()
                .target(PROGRESS_TARGET)
                .level(Level::Info)
                .args(format_args!("Publish the new version: {}", 7))
                .build(),
        );
        assert_eq!(line, "Rollback: Publish the new version: 7");
    }

    #[test]
    fn test_format_diagnostic_record() {
        let line = ConsoleLogger::format_record(
            &Record::builder()
                .target("function_rollback")
                .level(Level::Warn)
                .args(format_args!("size mismatch"))
                .build(),
        );
        assert!(line.ends_with("WARN  size mismatch"));
    }
}
