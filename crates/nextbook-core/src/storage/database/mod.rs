mod connection;
mod migrations;
mod schema;

pub use connection::ConnectionPool;
pub use migrations::{Migration, get_applied_versions, run_migrations};
pub use schema::{SCHEMA_VERSION, init_schema};

use std::path::Path;
use std::sync::MutexGuard;

use rusqlite::Connection;

use crate::error::{NextbookError, Result};
use crate::models::{Author, Book};

use super::repositories::{
    AuthorRepository, BookRepository, Repository, SqliteAuthorRepository, SqliteBookRepository,
};

pub fn open_database(path: &Path) -> Result<ConnectionPool> {
    let pool = ConnectionPool::open(path)?;
    run_migrations(&pool.get_connection())?;
    Ok(pool)
}

pub fn open_in_memory() -> Result<ConnectionPool> {
    let pool = ConnectionPool::open_in_memory()?;
    run_migrations(&pool.get_connection())?;
    Ok(pool)
}

/// Entry point for persistence: each call borrows the connection for one
/// repository operation.
pub struct Database {
    pool: ConnectionPool,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let pool = open_database(path)?;
        Ok(Self { pool })
    }

    pub fn open_in_memory() -> Result<Self> {
        let pool = open_in_memory()?;
        Ok(Self { pool })
    }

    fn authors(&self) -> SqliteAuthorRepository<MutexGuard<'_, Connection>> {
        SqliteAuthorRepository::new(self.pool.get_connection())
    }

    fn books(&self) -> SqliteBookRepository<MutexGuard<'_, Connection>> {
        SqliteBookRepository::new(self.pool.get_connection())
    }

    // ─── Authors ───────────────────────────────────────────

    pub fn add_author(&self, author: &Author) -> Result<i64> {
        self.authors().insert(author)
    }

    pub fn get_author(&self, id: i64) -> Result<Author> {
        self.authors()
            .find_by_id(&id)?
            .ok_or_else(|| NextbookError::AuthorNotFound(id.to_string()))
    }

    pub fn update_author(&self, author: &Author) -> Result<bool> {
        self.authors().update(author)
    }

    pub fn delete_author(&self, author: &Author) -> Result<Option<i64>> {
        self.authors().delete_author(author)
    }

    pub fn delete_author_by_id(&self, id: i64) -> Result<()> {
        if !self.authors().delete(&id)? {
            return Err(NextbookError::AuthorNotFound(id.to_string()));
        }
        Ok(())
    }

    pub fn safe_add_author(&self, author: &Author) -> Result<Option<i64>> {
        self.authors().safe_insert(author)
    }

    pub fn safe_update_author(&self, author: &Author) -> Result<bool> {
        self.authors().safe_update(author)
    }

    pub fn safe_delete_author(&self, author: &Author) -> Result<Option<i64>> {
        self.authors().safe_delete(author)
    }

    pub fn find_author_by_name(&self, first_name: &str, last_name: &str) -> Result<Option<Author>> {
        self.authors().find_by_name(first_name, last_name)
    }

    pub fn list_authors(&self, limit: usize, offset: usize) -> Result<Vec<Author>> {
        self.authors().list(limit, offset)
    }

    pub fn count_authors(&self) -> Result<usize> {
        self.authors().count()
    }

    // ─── Books ─────────────────────────────────────────────

    pub fn add_book(&self, book: &Book) -> Result<i64> {
        self.books().insert(book)
    }

    pub fn get_book(&self, id: i64) -> Result<Book> {
        self.books()
            .find_by_id(&id)?
            .ok_or_else(|| NextbookError::BookNotFound(id.to_string()))
    }

    pub fn find_book_by_goodreads_id(&self, goodreads_id: &str) -> Result<Option<Book>> {
        self.books().find_by_goodreads_id(goodreads_id)
    }

    pub fn update_book(&self, book: &Book) -> Result<bool> {
        self.books().update(book)
    }

    pub fn delete_book(&self, id: i64) -> Result<()> {
        if !self.books().delete(&id)? {
            return Err(NextbookError::BookNotFound(id.to_string()));
        }
        Ok(())
    }

    pub fn list_books(&self, limit: usize, offset: usize) -> Result<Vec<Book>> {
        self.books().list(limit, offset)
    }

    pub fn count_books(&self) -> Result<usize> {
        self.books().count()
    }

    /// Persist a book filled by a metadata source together with its author.
    ///
    /// The author is safe-added; when an author with the same name already
    /// exists the book is linked to that row instead. Both writes share one
    /// transaction, so a failed book insert leaves no new author behind.
    /// Returns the new book id.
    pub fn save_completed_book(&self, book: &Book) -> Result<i64> {
        let mut conn = self.pool.get_connection();
        let tx = conn.transaction()?;
        let mut book = book.clone();

        if let Some(author) = book.author.as_mut() {
            let authors = SqliteAuthorRepository::new(&*tx);
            let id = match authors.safe_insert(author)? {
                Some(id) => id,
                None => authors
                    .find_by_name(&author.first_name, &author.last_name)?
                    .and_then(|existing| existing.id)
                    .ok_or_else(|| NextbookError::AuthorNotFound(author.display_name()))?,
            };
            author.id = Some(id);
        }

        let id = SqliteBookRepository::new(&*tx).insert(&book)?;
        tx.commit()?;
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn completed_book(title: &str) -> Book {
        let mut book = Book::partial(title, "Ann Marie Lee");
        book.goodreads_id = Some(format!("gr-{title}"));
        book.isbn = Some("0000000000".to_string());
        book.link_author(Author::new("Ann", "Lee, Marie").with_rating(3.9));
        book
    }

    #[test]
    fn test_open_in_memory_applies_schema() {
        let db = Database::open_in_memory().unwrap();
        assert_eq!(db.count_authors().unwrap(), 0);
        assert_eq!(db.count_books().unwrap(), 0);
    }

    #[test]
    fn test_open_on_disk_creates_parent_dirs() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("nested").join("nextbook.db");

        let db = Database::open(&path).unwrap();
        db.add_author(&Author::new("Ann", "Lee")).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_get_missing_author_is_not_found() {
        let db = Database::open_in_memory().unwrap();
        assert!(matches!(db.get_author(9), Err(NextbookError::AuthorNotFound(_))));
        assert!(matches!(db.delete_author_by_id(9), Err(NextbookError::AuthorNotFound(_))));
    }

    #[test]
    fn test_save_completed_book_reuses_existing_author() {
        let db = Database::open_in_memory().unwrap();

        let first = db.save_completed_book(&completed_book("Foo")).unwrap();
        let second = db.save_completed_book(&completed_book("Bar")).unwrap();

        assert_eq!(db.count_authors().unwrap(), 1);
        let a = db.get_book(first).unwrap();
        let b = db.get_book(second).unwrap();
        assert!(a.author_id().is_some());
        assert_eq!(a.author_id(), b.author_id());
        assert_eq!(a.author.unwrap().average_rating, Some(3.9));
    }

    #[test]
    fn test_save_book_without_author() {
        let db = Database::open_in_memory().unwrap();
        let id = db.save_completed_book(&Book::partial("Foo", "Ann Lee")).unwrap();

        let loaded = db.get_book(id).unwrap();
        assert!(loaded.author.is_none());
        assert_eq!(
            db.find_book_by_goodreads_id("missing").unwrap().map(|b| b.id),
            None
        );
    }

    #[test]
    fn test_failed_book_insert_rolls_back_new_author() {
        let db = Database::open_in_memory().unwrap();
        db.pool
            .get_connection()
            .execute_batch(
                "CREATE TRIGGER reject_books BEFORE INSERT ON books
                 BEGIN SELECT RAISE(ABORT, 'books are read-only'); END;",
            )
            .unwrap();

        let result = db.save_completed_book(&completed_book("Foo"));

        assert!(matches!(result, Err(NextbookError::Database(_))));
        assert_eq!(db.count_authors().unwrap(), 0);
        assert_eq!(db.count_books().unwrap(), 0);
    }
}
