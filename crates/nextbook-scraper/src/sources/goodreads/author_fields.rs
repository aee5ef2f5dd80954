use nextbook_core::Author;

use super::book_fields::read_rating;
use crate::error::{Result, ScrapeError};
use crate::xml::Document;

/// Split a free-text "First Middle Last" name on whitespace.
///
/// The first token is the first name. The last name starts with the final
/// token, followed by each remaining token walking backwards and stopping
/// before the first: "Ann B C Lee" gives `("Ann", "Lee, C, B")`.
pub fn split_author_name(full_name: &str) -> (String, String) {
    let tokens: Vec<&str> = full_name.split_whitespace().collect();
    let Some((&first, rest)) = tokens.split_first() else {
        return (String::new(), String::new());
    };
    let Some((&last, middle)) = rest.split_last() else {
        return (first.to_string(), first.to_string());
    };

    let mut last_name = last.to_string();
    for token in middle.iter().rev() {
        last_name.push_str(", ");
        last_name.push_str(token);
    }
    (first.to_string(), last_name)
}

/// Build a fresh author from the book's author name and the first
/// `average_rating` found under the first `<author>` element.
pub fn extract_author(author_name: &str, document: &Document) -> Result<Author> {
    let (first_name, last_name) = split_author_name(author_name);
    let mut author = Author::new(first_name, last_name);

    let author_el = document
        .first("author")
        .ok_or(ScrapeError::MissingElement("author"))?;
    if let Some(rating) = read_rating(author_el, "average_rating")? {
        author.average_rating = Some(rating);
    }

    Ok(author)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn split(name: &str) -> (String, String) {
        split_author_name(name)
    }

    #[test]
    fn two_tokens() {
        assert_eq!(split("Ann Lee"), ("Ann".into(), "Lee".into()));
    }

    #[test]
    fn three_tokens() {
        assert_eq!(split("Ann Marie Lee"), ("Ann".into(), "Lee, Marie".into()));
    }

    #[test]
    fn four_tokens_reverse_the_middle() {
        assert_eq!(split("Ann B C Lee"), ("Ann".into(), "Lee, C, B".into()));
    }

    #[test]
    fn single_token_is_both_names() {
        assert_eq!(split("Plato"), ("Plato".into(), "Plato".into()));
    }

    #[test]
    fn empty_name() {
        assert_eq!(split("   "), (String::new(), String::new()));
    }

    #[test]
    fn repeated_whitespace_is_one_separator() {
        assert_eq!(split("Ann   Lee"), ("Ann".into(), "Lee".into()));
    }

    #[test]
    fn reads_rating_under_first_author() {
        let document = Document::parse(
            "<r><book><average_rating>4.25</average_rating>\
             <authors><author><name>A</name><average_rating>4.13</average_rating></author>\
             <author><average_rating>1.0</average_rating></author></authors></book></r>",
        )
        .unwrap();

        let author = extract_author("Ann Lee", &document).unwrap();
        assert_eq!(author.first_name, "Ann");
        assert_eq!(author.last_name, "Lee");
        assert_eq!(author.average_rating, Some(4.13));
        assert!(author.id.is_none());
    }

    #[test]
    fn blank_rating_is_left_unset() {
        let document = Document::parse("<r><author><average_rating/></author></r>").unwrap();
        let author = extract_author("Ann Lee", &document).unwrap();
        assert_eq!(author.average_rating, None);
    }

    #[test]
    fn malformed_rating_is_an_error() {
        let document =
            Document::parse("<r><author><average_rating>high</average_rating></author></r>")
                .unwrap();
        assert!(matches!(
            extract_author("Ann Lee", &document),
            Err(ScrapeError::MalformedField { field: "average_rating", .. })
        ));
    }

    #[test]
    fn infinite_rating_is_an_error() {
        let document =
            Document::parse("<r><author><average_rating>inf</average_rating></author></r>")
                .unwrap();
        assert!(matches!(
            extract_author("Ann Lee", &document),
            Err(ScrapeError::MalformedField { field: "average_rating", .. })
        ));
    }

    #[test]
    fn missing_author_element_is_an_error() {
        let document = Document::parse("<r><book/></r>").unwrap();
        assert!(matches!(
            extract_author("Ann Lee", &document),
            Err(ScrapeError::MissingElement("author"))
        ));
    }
}
