use std::sync::Once;

use metrics::{Unit, describe_counter};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install the global tracing subscriber. `RUST_LOG` refines the configured level.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_writer(std::io::stderr)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_target(true)
            .with_writer(std::io::stderr)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(ErrorLayer::default())
        .with(fmt_layer)
        .try_init()
        .map_err(|err| {
            InfraError::telemetry(format!("failed to install tracing subscriber: {err}"))
        })
}

/// Register descriptions for every counter the crate emits.
pub fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            "taggable_cache_hit_total",
            Unit::Count,
            "Cache lookups answered from the tag cache."
        );
        describe_counter!(
            "taggable_cache_miss_total",
            Unit::Count,
            "Cache lookups that fell through to storage."
        );
        describe_counter!(
            "taggable_cache_error_total",
            Unit::Count,
            "Cache operations that failed and were degraded, labelled by `op`."
        );
        describe_counter!(
            "taggable_tags_created_total",
            Unit::Count,
            "Tag rows created while saving bindings."
        );
        describe_counter!(
            "taggable_saves_total",
            Unit::Count,
            "Tag-set saves, labelled by `outcome` (written or skipped)."
        );
    });
}
