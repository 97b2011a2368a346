// Error tracking with Sentry
use tracing::info;

use crate::common::config::AppConfig;

/// Sample rate for performance traces when Sentry is enabled
const TRACES_SAMPLE_RATE: f32 = 0.1;

/// Initialize the Sentry client when `SENTRY_DSN` is configured.
///
/// The returned guard flushes pending events on drop and must be held for the
/// lifetime of the process.
pub fn init_sentry(config: &AppConfig) -> Option<sentry::ClientInitGuard> {
    let Some(dsn) = config.sentry_dsn.as_deref().filter(|d| !d.is_empty()) else {
        info!("Sentry DSN not configured");
        return None;
    };

    let guard = sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: Some(config.environment.clone().into()),
            traces_sample_rate: if config.debug { 0.0 } else { TRACES_SAMPLE_RATE },
            ..Default::default()
        },
    ));

    info!(environment = %config.environment, "Sentry initialized successfully");
    Some(guard)
}
