//! Diagnostics go to stderr through `tracing`; stdout stays reserved for
//! command output so it can be piped.

use crate::consts::{ENV_LOG, ENV_LOG_FORMAT};
use crate::exceptions::BenchError;
use std::env;
use std::io::{self, IsTerminal};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

fn map_init_err<E: std::fmt::Display>(err: E) -> BenchError {
    BenchError::Configuration(format!("Failed to initialize logging: {}", err))
}

/// Installs the global subscriber.
///
/// `-v` flags pick the level (`info`, `debug`, `trace`); without them
/// `BENCHTRAIL_LOG` is used as an `EnvFilter` directive, defaulting to `warn`.
/// `BENCHTRAIL_LOG_FORMAT` selects `compact` (default), `pretty` or `json`.
/// Returns false when a subscriber was already installed.
pub fn init_logging(verbosity: u8) -> Result<bool, BenchError> {
    if tracing::dispatcher::has_been_set() {
        return Ok(false);
    }

    let directives = match verbosity {
        0 => env::var(ENV_LOG).unwrap_or_else(|_| "warn".to_string()),
        1 => "info".to_string(),
        2 => "debug".to_string(),
        _ => "trace".to_string(),
    };
    let filter = EnvFilter::try_new(&directives)
        .map_err(|err| BenchError::Configuration(format!("Invalid {} filter: {}", ENV_LOG, err)))?;

    let format = env::var(ENV_LOG_FORMAT).unwrap_or_else(|_| "compact".to_string());
    let ansi = io::stderr().is_terminal();
    let registry = tracing_subscriber::registry().with(filter);

    if format.eq_ignore_ascii_case("json") {
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(io::stderr)
            .json();
        registry.with(layer).try_init().map_err(map_init_err)?;
    } else if format.eq_ignore_ascii_case("pretty") {
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(io::stderr)
            .with_ansi(ansi)
            .pretty();
        registry.with(layer).try_init().map_err(map_init_err)?;
    } else if format.eq_ignore_ascii_case("compact") {
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(io::stderr)
            .with_ansi(ansi)
            .with_target(false)
            .compact();
        registry.with(layer).try_init().map_err(map_init_err)?;
    } else {
        return Err(BenchError::Configuration(format!(
            "Invalid {} '{}' (expected 'compact', 'pretty' or 'json')",
            ENV_LOG_FORMAT, format
        )));
    }

    Ok(true)
}
