//! CLI domain: parse, route, help, output, and presentation only.
//! No request orchestration; the route table dispatches to the API client.

mod help;
mod output;
mod parse;
mod presentation;
mod route;

pub use help::command_name;
pub use output::{exit_code, map_error};
pub use parse::{Cli, Commands};
pub use presentation::{
    format_detail_json, format_detail_text, format_search_json, format_search_text,
};
pub use route::RunContext;
