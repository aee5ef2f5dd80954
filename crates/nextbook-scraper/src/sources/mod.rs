use async_trait::async_trait;
use nextbook_core::Book;

use crate::error::Result;

pub mod goodreads;

/// A remote catalogue that can complete a partial book (title + author name).
#[async_trait]
pub trait ExternalSource: Send + Sync {
    fn name(&self) -> &'static str;

    /// `Ok(None)` when the lookup could not be performed; the failure has
    /// already been logged. `Err` when the response was unusable.
    async fn fill_in_book(&self, partial: &Book) -> Result<Option<Book>>;
}
