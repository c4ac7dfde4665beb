use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::config::{LogFormat, LoggingConfig};

/// Directives applied on top of the configured level to keep noisy
/// dependencies quiet unless asked for.
const DEFAULT_DIRECTIVES: &[&str] = &["sqlx=warn", "sea_orm=warn", "hyper=warn", "reqwest=warn"];

/// Build the filter: `RUST_LOG` wins when set, otherwise the configured level,
/// the default directives and then the configured extra directives.
#[must_use]
pub fn build_filter(cfg: &LoggingConfig) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }

    let mut directives = vec![cfg.level.clone()];
    directives.extend(DEFAULT_DIRECTIVES.iter().map(|d| (*d).to_owned()));
    if let Some(extra) = cfg.filter.as_deref().filter(|f| !f.trim().is_empty()) {
        directives.push(extra.to_owned());
    }

    EnvFilter::try_new(directives.join(",")).unwrap_or_else(|e| {
        eprintln!("invalid log filter '{}': {e}; falling back to info", directives.join(","));
        EnvFilter::new("info")
    })
}

/// Install the global subscriber. Calling it twice is a no-op.
pub fn init_logging(cfg: &LoggingConfig) {
    let filter = build_filter(cfg);

    let result = match cfg.format {
        LogFormat::Text => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true))
            .try_init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(false),
            )
            .try_init(),
    };

    if result.is_err() {
        tracing::debug!("global tracing subscriber already installed");
    }
}
