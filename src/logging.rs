//! tracing subscriber setup.
//!
//! `logging.level` from station.toml is the default directive; `RUST_LOG`
//! directives are layered on top of it. a `RUST_LOG` that does not parse is
//! dropped with a warning, the configured level still applies.

use crate::config::LoggingConfig;

use tracing_subscriber::filter::{Directive, ParseError};
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// build the filter for `level` plus the extra `RUST_LOG` directives.
///
/// a bad `level` is an error. bad extra directives are not: the filter falls
/// back to `level` alone and the parse error is handed back for reporting.
pub fn filter(level: &str, extra: &str) -> Result<(EnvFilter, Option<ParseError>), ParseError> {
    let level: Directive = level.parse()?;

    match EnvFilter::builder().with_default_directive(level.clone()).parse(extra) {
        Ok(filter) => Ok((filter, None)),
        Err(e) => {
            let filter = EnvFilter::builder().with_default_directive(level).parse("")?;
            Ok((filter, Some(e)))
        }
    }
}

pub fn init(config: &LoggingConfig) -> anyhow::Result<()> {
    let extra = std::env::var("RUST_LOG").unwrap_or_default();
    let (filter, rejected) = filter(&config.level, &extra)?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(filter)
        .try_init()?;

    if let Some(e) = rejected {
        tracing::warn!("[LOGGING] ⚠ Ignoring RUST_LOG={:?}: {}", extra, e);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bad_level_is_rejected() {
        assert!(filter("station=chatty", "").is_err());
    }

    #[test]
    fn extra_directives_are_layered() {
        let (_, rejected) = filter("info", "weather_station=debug").unwrap();
        assert!(rejected.is_none());
    }

    #[test]
    fn bad_rust_log_falls_back_to_configured_level() {
        let (_, rejected) = filter("info", "weather_station=chatty").unwrap();
        assert!(rejected.is_some());
    }
}
