use std::sync::Once;

use metrics::{Unit, describe_counter, describe_histogram};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install a global tracing subscriber using the provided logging settings.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => fmt::layer().compact().with_target(true).boxed(),
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

fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            "hollow_cache_hit_total",
            Unit::Count,
            "Total number of content cache hits."
        );
        describe_counter!(
            "hollow_cache_miss_total",
            Unit::Count,
            "Total number of content cache misses."
        );
        describe_counter!(
            "hollow_cache_shared_fetch_total",
            Unit::Count,
            "Cache misses served by joining a fetch already in flight."
        );
        describe_counter!(
            "hollow_cache_invalidate_total",
            Unit::Count,
            "Total number of tag invalidations."
        );
        describe_histogram!(
            "hollow_upstream_fetch_ms",
            Unit::Milliseconds,
            "Upstream fetch latency on cache misses in milliseconds."
        );
        describe_counter!(
            "hollow_search_index_degraded_total",
            Unit::Count,
            "Search index responses served as the empty fallback payload."
        );
        describe_counter!(
            "hollow_revalidate_path_failures_total",
            Unit::Count,
            "Paths the revalidation webhook failed to invalidate."
        );
    });
}
