//! CLI presentation: text and json formatters per command family.

mod detail;
mod search;
mod shared;

pub use detail::{format_detail_json, format_detail_text};
pub use search::{format_search_json, format_search_text};
