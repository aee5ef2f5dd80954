use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Author;

/// ISBN recorded when the metadata source returns no ISBN text.
pub const UNKNOWN_ISBN: &str = "0000000000";

/// Maximum number of genre labels kept per book.
pub const MAX_GENRES: usize = 3;

/// A book record. Starts out partial (title + author name) and is completed
/// by a metadata source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,

    pub title: String,

    /// Free-text author name in "First Last" form.
    pub author_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goodreads_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub isbn: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_of_ratings: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_of_reviews: Option<u32>,

    #[serde(default)]
    pub genres: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<Author>,

    pub updated_at: DateTime<Utc>,
}

impl Book {
    /// A partial book: only title and author name are known.
    pub fn partial(title: impl Into<String>, author_name: impl Into<String>) -> Self {
        Self {
            id: None,
            title: title.into(),
            author_name: author_name.into(),
            goodreads_id: None,
            isbn: None,
            rating: None,
            number_of_ratings: None,
            number_of_reviews: None,
            genres: Vec::new(),
            author: None,
            updated_at: Utc::now(),
        }
    }

    /// Complete once an author has been linked, which only happens after the
    /// book fields were extracted. A blank source id does not matter.
    pub fn is_complete(&self) -> bool {
        self.author.is_some()
    }

    pub fn link_author(&mut self, author: Author) {
        self.author = Some(author);
        self.updated_at = Utc::now();
    }

    pub fn author_id(&self) -> Option<i64> {
        self.author.as_ref().and_then(|a| a.id)
    }
}
