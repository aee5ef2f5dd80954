use rusqlite::Connection;

use crate::error::Result;

pub const SCHEMA_VERSION: u32 = 1;

pub fn apply_pragmas(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA foreign_keys = ON;
        ",
    )?;
    Ok(())
}

pub fn create_tables(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS schema_migrations (
            version    INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS authors (
            id             INTEGER PRIMARY KEY AUTOINCREMENT,
            first_name     TEXT NOT NULL,
            last_name      TEXT NOT NULL,
            average_rating REAL,
            genres         TEXT DEFAULT '[]',
            book_reviews   TEXT
        );

        CREATE TABLE IF NOT EXISTS books (
            id                INTEGER PRIMARY KEY AUTOINCREMENT,
            title             TEXT NOT NULL,
            author_name       TEXT NOT NULL,
            goodreads_id      TEXT,
            isbn              TEXT,
            rating            REAL,
            number_of_ratings INTEGER,
            number_of_reviews INTEGER,
            genres            TEXT DEFAULT '[]',
            author_id         INTEGER REFERENCES authors(id) ON DELETE SET NULL,
            updated_at        TEXT NOT NULL
        );
        ",
    )?;
    Ok(())
}

pub fn create_indexes(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE INDEX IF NOT EXISTS idx_authors_name       ON authors(first_name, last_name);
        CREATE INDEX IF NOT EXISTS idx_books_goodreads_id ON books(goodreads_id);
        CREATE INDEX IF NOT EXISTS idx_books_author       ON books(author_id);
        ",
    )?;
    Ok(())
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    create_tables(conn)?;
    create_indexes(conn)?;
    Ok(())
}
