use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("parse error: {0}")]
    Parse(String),

    #[error("malformed <{field}> value: {value:?}")]
    MalformedField { field: &'static str, value: String },

    #[error("response has no <{0}> element")]
    MissingElement(&'static str),

    #[error("config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, ScrapeError>;
