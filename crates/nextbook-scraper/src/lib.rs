//! Nextbook scraper: completes partial book records from GoodReads XML.

pub mod error;
pub mod http;
pub mod sources;
pub mod xml;

pub use error::{Result, ScrapeError};
pub use http::PoliteClient;
pub use sources::goodreads::GoodReadsSource;
pub use sources::ExternalSource;
pub use xml::{Document, Element};
