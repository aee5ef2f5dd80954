pub mod config;
pub mod error;
pub mod models;
pub mod storage;

pub use config::{AppConfig, GoodReadsConfig};
pub use error::{ExitCode, NextbookError, Result};
pub use models::*;

pub use storage::database::{ConnectionPool, Database, open_database, open_in_memory};

pub use storage::repositories::{
    AuthorRepository, BookRepository, Repository, SqliteAuthorRepository, SqliteBookRepository,
};
