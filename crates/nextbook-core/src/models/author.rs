use serde::{Deserialize, Serialize};

/// An author as stored in the `authors` table.
///
/// `id` is assigned by the repository on insert; freshly extracted authors
/// carry `None` until they are persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Author {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,

    pub first_name: String,

    pub last_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_rating: Option<f64>,

    #[serde(default)]
    pub genres: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub book_reviews: Option<String>,
}

impl Author {
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            ..Default::default()
        }
    }

    pub fn with_rating(mut self, rating: f64) -> Self {
        self.average_rating = Some(rating);
        self
    }

    pub fn with_genres(mut self, genres: Vec<String>) -> Self {
        self.genres = genres;
        self
    }

    pub fn with_book_reviews(mut self, reviews: impl Into<String>) -> Self {
        self.book_reviews = Some(reviews.into());
        self
    }

    /// "First Last" display form.
    pub fn display_name(&self) -> String {
        match (self.first_name.is_empty(), self.last_name.is_empty()) {
            (false, false) => format!("{} {}", self.first_name, self.last_name),
            (false, true) => self.first_name.clone(),
            _ => self.last_name.clone(),
        }
    }
}
