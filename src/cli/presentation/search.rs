//! Search command presentation: result table with pagination footer, or the raw envelope.

use super::shared::{format_score, format_section_heading, or_dash, to_pretty_json};
use crate::types::SearchResponse;
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;

pub fn format_search_text(query: &str, response: &SearchResponse) -> String {
    if response.data.is_empty() {
        return format!(
            "No results found for \"{}\".\nTry a different search or spelling.",
            query
        );
    }

    let mut out = format!("{}\n\n", format_section_heading(&format!("Results for: {}", query)));

    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["ID", "Title", "Type", "Episodes", "Score"]);
    for anime in &response.data {
        table.add_row(vec![
            anime.mal_id.to_string(),
            anime.title.clone(),
            or_dash(anime.media_type.as_deref()),
            or_dash(anime.episodes),
            format_score(anime.score),
        ]);
    }
    out.push_str(&format!("{}\n", table));

    if let Some(ref pagination) = response.pagination {
        out.push_str(&format!(
            "\nPage {} of {} ({} total)",
            pagination.current_page, pagination.last_visible_page, pagination.items.total
        ));
        if pagination.has_next_page {
            out.push_str(&format!(
                ", next: --page {}",
                pagination.current_page + 1
            ));
        }
        out.push('\n');
    }
    out
}

pub fn format_search_json(response: &SearchResponse) -> String {
    to_pretty_json(response)
}
