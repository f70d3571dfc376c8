//! CLI help: stable command names for logs.

use crate::cli::parse::Commands;

/// Stable name of a command, used as a log field.
pub fn command_name(command: &Commands) -> &'static str {
    match command {
        Commands::Search { .. } => "search",
        Commands::Show { .. } => "show",
        Commands::Config => "config",
    }
}
