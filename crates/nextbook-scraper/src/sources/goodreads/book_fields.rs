use std::str::FromStr;

use nextbook_core::{Book, UNKNOWN_ISBN};

use super::shelves::select_genres;
use crate::error::{Result, ScrapeError};
use crate::xml::{Document, Element};

/// Text of the first `tag` under `parent`; `None` when the element is absent
/// or blank.
pub(super) fn read_text(parent: &Element, tag: &str) -> Option<String> {
    parent
        .first(tag)
        .map(Element::text)
        .filter(|text| !text.is_empty())
}

/// Like [`read_text`], parsed. Text that does not parse is an error, not `None`.
pub(super) fn read_parsed<T: FromStr>(parent: &Element, tag: &'static str) -> Result<Option<T>> {
    read_text(parent, tag)
        .map(|text| {
            text.parse::<T>().map_err(|_| ScrapeError::MalformedField {
                field: tag,
                value: text,
            })
        })
        .transpose()
}

/// A rating: like [`read_parsed`] for `f64`, but `NaN` and infinities are
/// malformed too.
pub(super) fn read_rating(parent: &Element, tag: &'static str) -> Result<Option<f64>> {
    match read_parsed::<f64>(parent, tag)? {
        Some(rating) if !rating.is_finite() => Err(ScrapeError::MalformedField {
            field: tag,
            value: read_text(parent, tag).unwrap_or_default(),
        }),
        rating => Ok(rating),
    }
}

/// Fill id, isbn, rating, counts and genres from the first `<book>` element.
///
/// Fields whose source element is absent or blank keep their prior value,
/// except `isbn` (set to [`UNKNOWN_ISBN`]) and `genres` (emptied).
pub fn fill_book_fields(document: &Document, book: &mut Book) -> Result<()> {
    let book_el = document
        .first("book")
        .ok_or(ScrapeError::MissingElement("book"))?;

    if let Some(id) = read_text(book_el, "id") {
        book.goodreads_id = Some(id);
    }

    book.isbn = Some(read_text(book_el, "isbn").unwrap_or_else(|| UNKNOWN_ISBN.to_string()));

    if let Some(rating) = read_rating(book_el, "average_rating")? {
        book.rating = Some(rating);
    }
    if let Some(count) = read_parsed::<u32>(book_el, "ratings_count")? {
        book.number_of_ratings = Some(count);
    }
    if let Some(count) = read_parsed::<u32>(book_el, "text_reviews_count")? {
        book.number_of_reviews = Some(count);
    }

    book.genres = book_el
        .first("popular_shelves")
        .map(select_genres)
        .unwrap_or_default();

    Ok(())
}
