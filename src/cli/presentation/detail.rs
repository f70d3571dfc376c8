//! Show command presentation: detail view text and json.

use super::shared::{format_score, format_section_heading, or_dash, to_pretty_json};
use crate::types::{Anime, DetailResponse, RelatedEntity};

fn join_names(entities: &[RelatedEntity]) -> Option<String> {
    if entities.is_empty() {
        None
    } else {
        Some(
            entities
                .iter()
                .map(|e| e.name.as_str())
                .collect::<Vec<_>>()
                .join(", "),
        )
    }
}

pub fn format_detail_text(response: &DetailResponse) -> String {
    let anime: &Anime = &response.data;
    let mut out = format!("{}\n\n", format_section_heading(&anime.title));

    let aired = anime.aired.as_ref().and_then(|a| a.display.clone());
    let fields: [(&str, String); 10] = [
        ("ID", anime.mal_id.to_string()),
        ("Type", or_dash(anime.media_type.as_deref())),
        ("Episodes", or_dash(anime.episodes)),
        ("Status", or_dash(anime.status.as_deref())),
        ("Aired", or_dash(aired)),
        ("Score", format_score(anime.score)),
        ("Rating", or_dash(anime.rating.as_deref())),
        ("Source", or_dash(anime.source.as_deref())),
        ("Genres", or_dash(join_names(&anime.genres))),
        ("Studios", or_dash(join_names(&anime.studios))),
    ];
    for (label, value) in fields {
        out.push_str(&format!("  {:<10} {}\n", format!("{}:", label), value));
    }
    if !anime.url.is_empty() {
        out.push_str(&format!("  {:<10} {}\n", "URL:", anime.url));
    }
    if let Some(image) = anime.thumbnail_url() {
        out.push_str(&format!("  {:<10} {}\n", "Image:", image));
    }

    if let Some(ref synopsis) = anime.synopsis {
        out.push_str(&format!("\n{}\n\n{}\n", format_section_heading("Synopsis"), synopsis));
    }
    out
}

pub fn format_detail_json(response: &DetailResponse) -> String {
    to_pretty_json(response)
}
