use nextbook_core::MAX_GENRES;

use crate::xml::Element;

/// Shelf names containing any of these are reading-status or ownership tags,
/// not genres. Matching is case-sensitive.
const EXCLUDED_SHELF_PATTERNS: [&str; 12] = [
    "audiobook",
    "to-read",
    "default",
    "ebook",
    "read-in",
    "favorites",
    "on-hold",
    "book",
    "currently",
    "buy",
    "favourite",
    "owned",
];

pub fn is_genre_shelf(name: &str) -> bool {
    !EXCLUDED_SHELF_PATTERNS
        .iter()
        .any(|pattern| name.contains(pattern))
}

/// The first `MAX_GENRES` genre shelves under `popular_shelves`, in document order.
pub fn select_genres(popular_shelves: &Element) -> Vec<String> {
    popular_shelves
        .descendants_named("shelf")
        .into_iter()
        .map(|shelf| shelf.attr("name").unwrap_or_default())
        .filter(|name| is_genre_shelf(name))
        .take(MAX_GENRES)
        .map(str::to_string)
        .collect()
}
