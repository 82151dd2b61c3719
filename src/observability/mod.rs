// Observability infrastructure using tracing crate
// Structured logging for request handling and shop decisions

use anyhow::Result;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default filter when RUST_LOG is unset
const DEFAULT_FILTER: &str = "secure_shop=info,tower_http=info";

/// Log line layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per event, for machine parsing
    Json,

    /// Human readable output for local runs
    Pretty,
}

impl LogFormat {
    /// `--verbose` always wins over the configured format
    pub fn select(configured: &str, verbose: bool) -> Self {
        if verbose || configured == "pretty" {
            LogFormat::Pretty
        } else {
            LogFormat::Json
        }
    }
}

/// Initialize the observability system
pub fn init(format: LogFormat) -> Result<()> {
    // Example: RUST_LOG=secure_shop=debug,tower_http=debug
    let filter_layer = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(DEFAULT_FILTER))?;

    let registry = tracing_subscriber::registry().with(filter_layer);

    match format {
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_current_span(true)
                    .with_thread_ids(true),
            )
            .try_init()?,
        LogFormat::Pretty => registry.with(fmt::layer().with_target(true)).try_init()?,
    }

    Ok(())
}

/// Span wrapping a single shop request
#[inline]
pub fn request_span(variant: &str, route: &str) -> tracing::Span {
    tracing::info_span!(
        "shop_request",
        variant = variant,
        route = route,
        request_id = %uuid::Uuid::new_v4(),
    )
}
