//! CLI route: single route table and run context. Dispatches to the API client and presentation.

use crate::api::JikanClient;
use crate::cancel::CancellationToken;
use crate::config::{ConfigLoader, RelayConfig};
use crate::error::ApiError;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, info};

use crate::cli::command_name;
use crate::cli::parse::Commands;
use crate::cli::presentation::{
    format_detail_json, format_detail_text, format_search_json, format_search_text,
};

/// Runtime context for CLI execution: loaded config and the shared API client.
/// Built from workspace path and optional config path using ConfigLoader only.
pub struct RunContext {
    client: JikanClient,
    config: RelayConfig,
    workspace_root: PathBuf,
    config_path: Option<PathBuf>,
}

impl RunContext {
    /// Create run context from workspace root and optional config path. Uses ConfigLoader only.
    pub fn new(workspace_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, ApiError> {
        let config = if let Some(ref cfg_path) = config_path {
            ConfigLoader::load_from_file(cfg_path)?
        } else {
            ConfigLoader::load(&workspace_root)?
        };
        let client = JikanClient::from_config(&config)?;
        Self::with_client(client, config, workspace_root, config_path)
    }

    /// Create run context around an existing client (e.g. one with a scripted transport).
    pub fn with_client(
        client: JikanClient,
        config: RelayConfig,
        workspace_root: PathBuf,
        config_path: Option<PathBuf>,
    ) -> Result<Self, ApiError> {
        config.validate().map_err(|errors| {
            let error_msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            ApiError::Config(format!(
                "Configuration validation failed:\n{}",
                error_msgs.join("\n")
            ))
        })?;

        Ok(Self {
            client,
            config,
            workspace_root,
            config_path,
        })
    }

    pub fn client(&self) -> &JikanClient {
        &self.client
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// Execute a CLI command via the single route table.
    ///
    /// `cancel` is wired to Ctrl-C by the binary; a cancelled command returns
    /// `ApiError::Cancelled`.
    pub async fn execute(
        &self,
        command: &Commands,
        cancel: &CancellationToken,
    ) -> Result<String, ApiError> {
        let started = Instant::now();
        let name = command_name(command);
        debug!(
            command = name,
            workspace = %self.workspace_root.display(),
            config_path = ?self.config_path,
            "Executing command"
        );

        let result = self.execute_inner(command, cancel).await;

        info!(
            command = name,
            ok = result.is_ok(),
            duration_ms = started.elapsed().as_millis() as u64,
            "Command finished"
        );
        result
    }

    async fn execute_inner(
        &self,
        command: &Commands,
        cancel: &CancellationToken,
    ) -> Result<String, ApiError> {
        match command {
            Commands::Search {
                term,
                letter,
                page,
                limit,
                format,
            } => {
                let query = match (letter, term) {
                    (Some(letter), _) => {
                        if !letter.is_ascii_alphabetic() {
                            return Err(ApiError::Config(format!(
                                "Invalid letter '{}' (expected A-Z)",
                                letter
                            )));
                        }
                        letter.to_ascii_uppercase().to_string()
                    }
                    (None, Some(term)) => term.trim().to_string(),
                    (None, None) => String::new(),
                };
                if query.is_empty() {
                    return Ok("Nothing to search for. Pass a term or --letter.".to_string());
                }
                let format = parse_format(format)?;
                let page_size = limit.unwrap_or(self.config.search.default_page_size);

                let response = self
                    .client
                    .search(&query, *page, page_size, Some(cancel))
                    .await?;

                Ok(match format {
                    OutputFormat::Text => format_search_text(&query, &response),
                    OutputFormat::Json => format_search_json(&response),
                })
            }
            Commands::Show { id, format } => {
                let format = parse_format(format)?;
                let response = self.client.get_by_id_with_cancel(*id, Some(cancel)).await?;
                Ok(match format {
                    OutputFormat::Text => format_detail_text(&response),
                    OutputFormat::Json => format_detail_json(&response),
                })
            }
            Commands::Config => toml::to_string_pretty(&self.config)
                .map_err(|e| ApiError::Config(format!("Failed to render configuration: {}", e))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Text,
    Json,
}

fn parse_format(format: &str) -> Result<OutputFormat, ApiError> {
    match format {
        "text" => Ok(OutputFormat::Text),
        "json" => Ok(OutputFormat::Json),
        other => Err(ApiError::Config(format!(
            "Invalid format: {} (must be 'text' or 'json')",
            other
        ))),
    }
}
