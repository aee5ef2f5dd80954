use tracing::{debug, warn};

use crate::error::Result;
use crate::http::PoliteClient;
use crate::xml::Document;

/// One fetched-and-parsed response. Invalid when either step failed.
#[derive(Debug)]
pub struct ResponsePage {
    document: Option<Document>,
}

impl ResponsePage {
    /// Fetch `url` once and parse the body as XML.
    ///
    /// Transport, status and parse failures are logged and leave the page
    /// invalid; they are never returned to the caller. The response body is
    /// owned by this call and dropped before it returns.
    pub async fn visit(client: &PoliteClient, url: &str) -> Self {
        match fetch_document(client, url).await {
            Ok(document) => {
                debug!(url, "parsed XML response");
                Self {
                    document: Some(document),
                }
            }
            Err(e) => {
                warn!(url, error = %e, "could not load XML response");
                Self { document: None }
            }
        }
    }

    pub fn is_valid(&self) -> bool {
        self.document.is_some()
    }

    pub fn document(&self) -> Option<&Document> {
        self.document.as_ref()
    }
}

async fn fetch_document(client: &PoliteClient, url: &str) -> Result<Document> {
    let body = client.get_text(url).await?;
    Document::parse(&body)
}
