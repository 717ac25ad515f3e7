//! Search over recent history

use crate::i18n::Language;
use crate::recipe::RecentRecipeEntry;
use crate::text::Text;

/// Entries whose name or any ingredient matches `query`
///
/// Matching is a case-insensitive substring test against the English text and
/// the text in `language`. An empty query matches every entry. Order is kept.
pub fn search_recent<'a>(
    entries: &'a [RecentRecipeEntry],
    query: &str,
    language: Language,
) -> Vec<&'a RecentRecipeEntry> {
    let query = query.trim().to_lowercase();
    entries
        .iter()
        .filter(|entry| {
            let recipe = &entry.recipe;
            let name_matches = recipe
                .recipe_name
                .as_ref()
                .map(|name| text_matches(name, &query, language))
                .unwrap_or(false);
            name_matches
                || recipe
                    .ingredients
                    .iter()
                    .any(|ing| text_matches(&ing.name, &query, language))
        })
        .collect()
}

fn text_matches(text: &Text, query: &str, language: Language) -> bool {
    [Language::En, language]
        .iter()
        .any(|lang| text.select(*lang).to_lowercase().contains(query))
}
