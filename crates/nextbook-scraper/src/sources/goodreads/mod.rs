//! GoodReads `book/title.xml` source: fills a partial book (title + author
//! name) from a single XML response.

mod author_fields;
mod book_fields;
mod page;
mod query;
mod shelves;

pub use author_fields::{extract_author, split_author_name};
pub use book_fields::fill_book_fields;
pub use page::ResponsePage;
pub use query::build_query_url;
pub use shelves::{is_genre_shelf, select_genres};

use std::time::Duration;

use async_trait::async_trait;
use nextbook_core::{Book, GoodReadsConfig};
use tracing::{debug, info};

use crate::error::{Result, ScrapeError};
use crate::http::PoliteClient;
use crate::sources::ExternalSource;

const USER_AGENT: &str = "nextbook/0.1";

pub struct GoodReadsSource {
    client: PoliteClient,
    api_key: String,
    base_url: String,
}

impl GoodReadsSource {
    pub fn new(api_key: &str, base_url: &str, min_interval: Duration) -> Result<Self> {
        Ok(Self {
            client: PoliteClient::new(min_interval, USER_AGENT)?,
            api_key: api_key.to_string(),
            base_url: base_url.to_string(),
        })
    }

    pub fn from_config(config: &GoodReadsConfig) -> Result<Self> {
        let api_key = config
            .resolve_api_key()
            .map_err(|e| ScrapeError::Config(e.to_string()))?;
        Self::new(
            &api_key,
            &config.base_url,
            Duration::from_millis(config.min_interval_ms),
        )
    }

    pub fn query_url(&self, book: &Book) -> String {
        build_query_url(book, &self.api_key, &self.base_url)
    }

    /// Look `partial` up and return a filled copy with its author linked.
    ///
    /// - `Ok(Some(book))`: the response was fetched, parsed and extracted.
    /// - `Ok(None)`: the page could not be fetched or parsed (already logged).
    /// - `Err(_)`: the page parsed but its content is unusable, e.g. a numeric
    ///   field that does not parse. Nothing is partially applied.
    ///
    /// `partial` itself is never modified.
    pub async fn fill_in_book(&self, partial: &Book) -> Result<Option<Book>> {
        let url = self.query_url(partial);
        let page = ResponsePage::visit(&self.client, &url).await;
        let Some(document) = page.document() else {
            info!(title = %partial.title, "did not add book");
            return Ok(None);
        };

        let mut book = partial.clone();
        fill_book_fields(document, &mut book)?;
        let author = extract_author(&book.author_name, document)?;
        debug!(
            first_name = %author.first_name,
            last_name = %author.last_name,
            "extracted author"
        );
        book.link_author(author);

        info!(
            title = %book.title,
            goodreads_id = book.goodreads_id.as_deref().unwrap_or_default(),
            genres = book.genres.len(),
            "filled book"
        );
        Ok(Some(book))
    }
}

#[async_trait]
impl ExternalSource for GoodReadsSource {
    fn name(&self) -> &'static str {
        "goodreads"
    }

    async fn fill_in_book(&self, partial: &Book) -> Result<Option<Book>> {
        GoodReadsSource::fill_in_book(self, partial).await
    }
}
