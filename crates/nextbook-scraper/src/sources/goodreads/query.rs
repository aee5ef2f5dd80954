use nextbook_core::Book;

/// Build the book-by-title query URL for a partial book.
///
/// Only spaces are rewritten (to `+`); every other character is passed through
/// as-is, so callers must not feed titles or names that need further escaping.
pub fn build_query_url(book: &Book, api_key: &str, base_url: &str) -> String {
    let author = book.author_name.replace(' ', "+");
    let title = query_title(&book.title).replace(' ', "+");

    format!("{base_url}?author={author}&key={api_key}&title={title}")
}

/// The title up to its first `(`, minus one space directly before it.
fn query_title(title: &str) -> &str {
    match title.find('(') {
        Some(paren) => {
            let head = &title[..paren];
            head.strip_suffix(' ').unwrap_or(head)
        }
        None => title,
    }
}
