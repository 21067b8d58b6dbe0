use std::fs;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const DEFAULT_FILTER: &str = "sensor_analytics=info,warn";
const LOG_FILE_PREFIX: &str = "sensor-analytics.log";

/// Initializes logging to the console and to a daily JSON log in `log_dir`.
///
/// When `log_dir` cannot be created or written, logs go to the console only
/// and no guard is returned. Otherwise keep the guard alive for the
/// lifetime of the process; it flushes the file writer when dropped.
pub fn init_logging(log_dir: &str) -> Option<WorkerGuard> {
    let (file_layer, guard) = match file_appender(log_dir) {
        Ok(appender) => {
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(fmt::layer().json().with_writer(writer)), Some(guard))
        }
        Err(reason) => {
            eprintln!("⚠️  File logging disabled ({log_dir}): {reason}");
            (None, None)
        }
    };

    // Console goes to stderr so stdout stays clean for `show --json`
    let console_layer = fmt::layer().with_target(true).with_writer(std::io::stderr);

    // Respect RUST_LOG if set
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(console_layer)
        .try_init();

    guard
}

fn file_appender(log_dir: &str) -> Result<RollingFileAppender, String> {
    fs::create_dir_all(log_dir).map_err(|e| e.to_string())?;
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE_PREFIX)
        .build(log_dir)
        .map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_appender_creates_log_dir() {
        let dir = tempfile::tempdir().unwrap();
        let log_dir = dir.path().join("nested/logs");
        assert!(file_appender(log_dir.to_str().unwrap()).is_ok());
        assert!(log_dir.is_dir());
    }

    #[test]
    fn test_unusable_log_dir_is_an_error_not_a_panic() {
        // A regular file cannot hold a log directory
        let file = tempfile::NamedTempFile::new().unwrap();
        let log_dir = file.path().join("logs");
        assert!(file_appender(log_dir.to_str().unwrap()).is_err());
    }
}
