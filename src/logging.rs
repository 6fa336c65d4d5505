use crate::config::LogConfig;
use crate::{Error, ErrorType};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub struct LoggingGuard {
    // keeps the file writer flushing until the process exits
    _guard: WorkerGuard,
}

/// Console and append-only file sinks with the same record format. `log`
/// records from the library are forwarded through the `tracing-log` bridge.
pub fn init_logger(settings: &LogConfig) -> Result<LoggingGuard, Error> {
    let filter = level_filter(&settings.level)?;

    let console_layer = if settings.console {
        Some(
            fmt::layer()
                .with_writer(std::io::stdout)
                .with_target(true)
                .with_ansi(settings.ansi),
        )
    } else {
        None
    };

    std::fs::create_dir_all(&settings.directory)?;
    let file_appender = tracing_appender::rolling::never(&settings.directory, &settings.file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_target(true)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|err| {
            Error::new(
                "Logging already initialized",
                err.to_string(),
                ErrorType::Config,
            )
        })?;

    log::info!(
        "Logging to {}",
        settings.directory.join(&settings.file_name).display()
    );

    Ok(LoggingGuard { _guard: guard })
}

/// `RUST_LOG` when set, otherwise the configured level. A configured level
/// that does not parse is an error even when `RUST_LOG` overrides it.
fn level_filter(level: &str) -> Result<EnvFilter, Error> {
    let configured = EnvFilter::try_new(level).map_err(|err| {
        Error::new(
            format!("Invalid log level '{}'", level),
            err.to_string(),
            ErrorType::Config,
        )
    })?;
    Ok(EnvFilter::try_from_default_env().unwrap_or(configured))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_level_is_config_error() {
        let err = level_filter("gardener=loud").unwrap_err();
        assert_eq!(err.kind, ErrorType::Config);
        assert!(err.to_string().contains("gardener=loud"));

        assert!(level_filter("info").is_ok());
        assert!(level_filter("warn,gardener=trace").is_ok());
    }

    #[test]
    fn creates_log_file_and_refuses_second_init() {
        let dir = tempfile::tempdir().unwrap();
        let settings = LogConfig {
            directory: dir.path().join("logs"),
            console: false,
            ..LogConfig::default()
        };

        let guard = init_logger(&settings).unwrap();
        assert!(settings.directory.join("gardener.log").exists());

        let err = init_logger(&settings).err().unwrap();
        assert_eq!(err.kind, ErrorType::Config);
        drop(guard);
    }
}
