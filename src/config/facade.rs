//! Config loading facade: the one entry point callers use to build a [`RelayConfig`].

use super::merge::builder_with_defaults;
use super::sources::{environment, global_file, workspace_file};
use super::RelayConfig;
use config::{ConfigError, File};
use std::path::Path;
use tracing::debug;

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with layered precedence:
    /// defaults, global file, workspace `config/config.toml`,
    /// workspace `config/{JIKAN_RELAY_ENV}.toml`, then `JIKAN_RELAY__*` env vars.
    pub fn load(workspace_root: &Path) -> Result<RelayConfig, ConfigError> {
        let builder = builder_with_defaults()?;
        let builder = global_file::add_to_builder(builder)?;
        let builder = workspace_file::add_to_builder(builder, workspace_root)?;
        let builder = environment::add_to_builder(builder);

        let config: RelayConfig = builder.build()?.try_deserialize()?;
        debug!(
            workspace_root = %workspace_root.display(),
            base_url = %config.api.base_url,
            min_interval_ms = config.pacing.min_interval_ms,
            "Configuration loaded"
        );
        Ok(config)
    }

    /// Load configuration from a single file on top of defaults, ignoring other sources.
    pub fn load_from_file(path: &Path) -> Result<RelayConfig, ConfigError> {
        builder_with_defaults()?
            .add_source(File::from(path.to_path_buf()))
            .build()?
            .try_deserialize()
    }

    /// Built-in defaults only.
    pub fn default() -> RelayConfig {
        RelayConfig::default()
    }
}
