//! Environment source: JIKAN_RELAY__<SECTION>__<KEY>, e.g. JIKAN_RELAY__PACING__MIN_INTERVAL_MS=0

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::Environment;

pub const ENV_PREFIX: &str = "JIKAN_RELAY";

pub fn add_to_builder(builder: ConfigBuilder<DefaultState>) -> ConfigBuilder<DefaultState> {
    builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true),
    )
}
