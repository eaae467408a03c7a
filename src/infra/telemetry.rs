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

pub const HTTP_INTERNAL_ERRORS_TOTAL: &str = "withrisk_http_internal_errors_total";
pub const HTTP_PANICS_TOTAL: &str = "withrisk_http_panics_total";
pub const STARTUP_SEED_TOTAL: &str = "withrisk_startup_seed_total";

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
            HTTP_INTERNAL_ERRORS_TOTAL,
            Unit::Count,
            "Responses replaced by the opaque internal-error body."
        );
        describe_counter!(
            HTTP_PANICS_TOTAL,
            Unit::Count,
            "Handler panics caught by the error boundary."
        );
        describe_counter!(
            STARTUP_SEED_TOTAL,
            Unit::Count,
            "Startup schema and seed runs, labelled by outcome."
        );
    });
}
