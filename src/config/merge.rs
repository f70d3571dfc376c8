//! Merge rules: defaults and override order.
//!
//! Sources are added lowest precedence first; later sources win key by key.

use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

/// Create a Config builder with merge policy defaults applied.
pub fn builder_with_defaults() -> Result<ConfigBuilder<config::builder::DefaultState>, ConfigError>
{
    Config::builder()
        .set_default("api.base_url", crate::transport::DEFAULT_BASE_URL)?
        .set_default("pacing.min_interval_ms", 2500)?
        .set_default("retry.max_retry_attempts", 3)?
        .set_default("retry.backoff_ms", 5000)
}
