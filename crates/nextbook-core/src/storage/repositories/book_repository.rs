use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::ops::Deref;

use crate::error::{NextbookError, Result};
use crate::models::Book;

use super::Repository;
use super::author_repository::row_to_author;

const BOOK_SELECT: &str = "
    SELECT b.id, b.title, b.author_name, b.goodreads_id, b.isbn, b.rating,
           b.number_of_ratings, b.number_of_reviews, b.genres, b.updated_at,
           a.id, a.first_name, a.last_name, a.average_rating, a.genres, a.book_reviews
    FROM books b
    LEFT JOIN authors a ON a.id = b.author_id";

const AUTHOR_OFFSET: usize = 10;

pub trait BookRepository: Repository<Entity = Book, Id = i64> {
    fn find_by_goodreads_id(&self, goodreads_id: &str) -> Result<Option<Book>>;
    fn list(&self, limit: usize, offset: usize) -> Result<Vec<Book>>;
    fn count(&self) -> Result<usize>;
}

pub struct SqliteBookRepository<C> {
    conn: C,
}

impl<C: Deref<Target = Connection>> SqliteBookRepository<C> {
    pub fn new(conn: C) -> Self {
        Self { conn }
    }

    fn row_to_book(row: &Row) -> rusqlite::Result<Book> {
        let genres_str: Option<String> = row.get(8)?;
        let updated_at: String = row.get(9)?;
        let author_id: Option<i64> = row.get(AUTHOR_OFFSET)?;
        let author = match author_id {
            Some(_) => Some(row_to_author(row, AUTHOR_OFFSET)?),
            None => None,
        };

        Ok(Book {
            id: Some(row.get(0)?),
            title: row.get(1)?,
            author_name: row.get(2)?,
            goodreads_id: row.get(3)?,
            isbn: row.get(4)?,
            rating: row.get(5)?,
            number_of_ratings: row.get(6)?,
            number_of_reviews: row.get(7)?,
            genres: genres_str
                .and_then(|s| serde_json::from_str(&s).ok())
                .unwrap_or_default(),
            author,
            updated_at: DateTime::parse_from_rfc3339(&updated_at)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_default(),
        })
    }
}

impl<C: Deref<Target = Connection>> Repository for SqliteBookRepository<C> {
    type Entity = Book;
    type Id = i64;

    fn insert(&self, book: &Self::Entity) -> Result<Self::Id> {
        let genres_json = serde_json::to_string(&book.genres)?;
        self.conn.execute(
            "INSERT INTO books
                (title, author_name, goodreads_id, isbn, rating, number_of_ratings,
                 number_of_reviews, genres, author_id, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                book.title,
                book.author_name,
                book.goodreads_id.as_deref(),
                book.isbn.as_deref(),
                book.rating,
                book.number_of_ratings,
                book.number_of_reviews,
                genres_json,
                book.author_id(),
                book.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn find_by_id(&self, id: &Self::Id) -> Result<Option<Self::Entity>> {
        let sql = format!("{BOOK_SELECT} WHERE b.id = ?1");
        let book = self
            .conn
            .query_row(&sql, params![id], Self::row_to_book)
            .optional()?;
        Ok(book)
    }

    fn update(&self, book: &Self::Entity) -> Result<bool> {
        let id = book
            .id
            .ok_or_else(|| NextbookError::ValidationError(format!("book '{}' has no id", book.title)))?;
        let genres_json = serde_json::to_string(&book.genres)?;
        let changed = self.conn.execute(
            "UPDATE books
             SET title = ?1, author_name = ?2, goodreads_id = ?3, isbn = ?4, rating = ?5,
                 number_of_ratings = ?6, number_of_reviews = ?7, genres = ?8,
                 author_id = ?9, updated_at = ?10
             WHERE id = ?11",
            params![
                book.title,
                book.author_name,
                book.goodreads_id.as_deref(),
                book.isbn.as_deref(),
                book.rating,
                book.number_of_ratings,
                book.number_of_reviews,
                genres_json,
                book.author_id(),
                Utc::now().to_rfc3339(),
                id,
            ],
        )?;
        Ok(changed > 0)
    }

    fn delete(&self, id: &Self::Id) -> Result<bool> {
        let deleted = self.conn.execute("DELETE FROM books WHERE id = ?1", params![id])?;
        Ok(deleted > 0)
    }
}

impl<C: Deref<Target = Connection>> BookRepository for SqliteBookRepository<C> {
    fn find_by_goodreads_id(&self, goodreads_id: &str) -> Result<Option<Book>> {
        let sql = format!("{BOOK_SELECT} WHERE b.goodreads_id = ?1 ORDER BY b.id LIMIT 1");
        let book = self
            .conn
            .query_row(&sql, params![goodreads_id], Self::row_to_book)
            .optional()?;
        Ok(book)
    }

    fn list(&self, limit: usize, offset: usize) -> Result<Vec<Book>> {
        let sql = format!("{BOOK_SELECT} ORDER BY b.updated_at DESC, b.id DESC LIMIT ?1 OFFSET ?2");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![limit as i64, offset as i64], Self::row_to_book)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn count(&self) -> Result<usize> {
        let count: i64 = self.conn.query_row("SELECT COUNT(*) FROM books", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}
