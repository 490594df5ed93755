//! Structured logging.
//!
//! # Responsibilities
//! - Install a default `tracing` subscriber before anything else logs
//! - Reconfigure it in place from the `[logging]` section
//! - Select pretty, compact or JSON output
//!
//! # Design Decisions
//! - One subscriber per process; filter and output sit behind reload handles
//! - A bad level or directive is a bootstrap failure
//! - A subscriber installed by an embedding program is left alone

use std::io::IsTerminal;
use std::sync::OnceLock;

use thiserror::Error;
use tracing_subscriber::filter::{Directive, LevelFilter};
use tracing_subscriber::layer::Layered;
use tracing_subscriber::{
    fmt, layer::SubscriberExt, reload, util::SubscriberInitExt, EnvFilter, Layer, Registry,
};

use crate::config::{LogFormat, LoggingConfig};

type FilteredRegistry = Layered<reload::Layer<EnvFilter, Registry>, Registry>;
type OutputLayer = Box<dyn Layer<FilteredRegistry> + Send + Sync>;

/// Error type for logging initialization.
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("invalid log level `{level}`")]
    Level { level: String },

    #[error("invalid filter directive `{directive}`: {reason}")]
    Directive { directive: String, reason: String },

    #[error("cannot reconfigure logging: {0}")]
    Reload(#[from] reload::Error),
}

struct ReloadHandles {
    filter: reload::Handle<EnvFilter, Registry>,
    output: reload::Handle<OutputLayer, FilteredRegistry>,
}

/// `None` when another subscriber was already the global default.
static HANDLES: OnceLock<Option<ReloadHandles>> = OnceLock::new();

fn handles() -> Option<&'static ReloadHandles> {
    HANDLES
        .get_or_init(|| {
            let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
            let (filter, filter_handle) = reload::Layer::new(filter);

            let output: OutputLayer = fmt::layer()
                .with_ansi(std::io::stdout().is_terminal())
                .boxed();
            let (output, output_handle) = reload::Layer::new(output);

            tracing_subscriber::registry()
                .with(filter)
                .with(output)
                .try_init()
                .ok()
                .map(|()| ReloadHandles {
                    filter: filter_handle,
                    output: output_handle,
                })
        })
        .as_ref()
}

/// Install the process subscriber with defaults (`RUST_LOG` or `info`).
///
/// Call first thing in `main` so registration and config loading are
/// logged. Returns `false` if another subscriber owns the process.
pub fn install_default() -> bool {
    handles().is_some()
}

/// Build the event filter described by `config`.
pub fn build_filter(config: &LoggingConfig) -> Result<EnvFilter, LoggingError> {
    let level: LevelFilter = config.level.trim().parse().map_err(|_| LoggingError::Level {
        level: config.level.clone(),
    })?;

    let mut filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .parse_lossy("");
    for raw in &config.directives {
        let directive: Directive = raw.parse().map_err(|e: tracing_subscriber::filter::ParseError| {
            LoggingError::Directive {
                directive: raw.clone(),
                reason: e.to_string(),
            }
        })?;
        filter = filter.add_directive(directive);
    }
    Ok(filter)
}

fn build_output(config: &LoggingConfig) -> OutputLayer {
    match config.format {
        LogFormat::Pretty => fmt::layer().with_ansi(config.ansi).boxed(),
        LogFormat::Compact => fmt::layer().compact().with_ansi(config.ansi).boxed(),
        LogFormat::Json => fmt::layer().json().with_ansi(false).boxed(),
    }
}

/// Apply `config` to the process subscriber, installing it if needed.
///
/// Returns `Ok(false)` when a foreign subscriber owns the process.
pub fn init_logging(config: &LoggingConfig) -> Result<bool, LoggingError> {
    let filter = build_filter(config)?;

    let Some(handles) = handles() else {
        tracing::debug!("Foreign subscriber installed, leaving it in place");
        return Ok(false);
    };

    handles.filter.reload(filter)?;
    handles.output.reload(build_output(config))?;
    tracing::debug!(level = %config.level, format = ?config.format, "Logging configured");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(level: &str, directives: &[&str]) -> LoggingConfig {
        LoggingConfig {
            level: level.to_string(),
            directives: directives.iter().map(|d| d.to_string()).collect(),
            ..LoggingConfig::default()
        }
    }

    #[test]
    fn test_valid_filter() {
        assert!(build_filter(&config("debug", &["mesh_host::agent=trace", "hyper=warn"])).is_ok());
        assert!(build_filter(&config("OFF", &[])).is_ok());
    }

    #[test]
    fn test_invalid_level() {
        let err = build_filter(&config("verbose", &[])).unwrap_err();
        assert!(matches!(err, LoggingError::Level { .. }));
    }

    #[test]
    fn test_invalid_directive() {
        let err = build_filter(&config("info", &["mesh_host=loud"])).unwrap_err();
        assert!(matches!(err, LoggingError::Directive { .. }));
    }

    #[test]
    fn test_default_then_reconfigure() {
        assert!(install_default());
        assert!(install_default());
        assert!(tracing::dispatcher::has_been_set());

        // The installed subscriber is reconfigured, never replaced.
        assert!(init_logging(&config("debug", &["mesh_host::agent=trace"])).unwrap());
        let json = LoggingConfig {
            format: LogFormat::Json,
            ..config("info", &[])
        };
        assert!(init_logging(&json).unwrap());
    }

    #[test]
    fn test_bad_config_leaves_subscriber_untouched() {
        assert!(install_default());
        assert!(matches!(
            init_logging(&config("verbose", &[])),
            Err(LoggingError::Level { .. })
        ));
        assert!(init_logging(&config("info", &[])).unwrap());
    }
}
