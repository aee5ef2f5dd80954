use rusqlite::{Connection, OptionalExtension, Row, params};
use std::ops::Deref;

use crate::error::{NextbookError, Result};
use crate::models::Author;

use super::Repository;

pub(super) const AUTHOR_COLUMNS: &str =
    "id, first_name, last_name, average_rating, genres, book_reviews";

/// Author persistence. The `safe_*` variants check for an existing row first
/// and never insert a second author with the same first and last name.
pub trait AuthorRepository: Repository<Entity = Author, Id = i64> {
    fn find_by_name(&self, first_name: &str, last_name: &str) -> Result<Option<Author>>;
    fn list(&self, limit: usize, offset: usize) -> Result<Vec<Author>>;
    fn count(&self) -> Result<usize>;

    /// Delete the row identified by `author.id`; returns that id when a row was removed.
    fn delete_author(&self, author: &Author) -> Result<Option<i64>>;

    /// Insert unless an author with the same name exists. `None` on duplicate.
    fn safe_insert(&self, author: &Author) -> Result<Option<i64>>;

    /// Update the matching row. `false` when no row matches, or when the new
    /// name already belongs to a different author.
    fn safe_update(&self, author: &Author) -> Result<bool>;

    /// Delete the matching row. `None` when no row matches.
    fn safe_delete(&self, author: &Author) -> Result<Option<i64>>;
}

/// Map author columns starting at `offset` (see `AUTHOR_COLUMNS`).
pub(super) fn row_to_author(row: &Row, offset: usize) -> rusqlite::Result<Author> {
    let genres_str: Option<String> = row.get(offset + 4)?;
    Ok(Author {
        id: Some(row.get(offset)?),
        first_name: row.get(offset + 1)?,
        last_name: row.get(offset + 2)?,
        average_rating: row.get(offset + 3)?,
        genres: genres_str
            .and_then(|s| serde_json::from_str(&s).ok())
            .unwrap_or_default(),
        book_reviews: row.get(offset + 5)?,
    })
}

/// Runs over anything that derefs to a connection: a pooled guard for single
/// operations, or a `Transaction` when several must commit together.
pub struct SqliteAuthorRepository<C> {
    conn: C,
}

impl<C: Deref<Target = Connection>> SqliteAuthorRepository<C> {
    pub fn new(conn: C) -> Self {
        Self { conn }
    }

    /// The row an author refers to: by id when it has one, otherwise by name.
    fn resolve_id(&self, author: &Author) -> Result<Option<i64>> {
        match author.id {
            Some(id) => {
                let exists = self
                    .conn
                    .prepare("SELECT 1 FROM authors WHERE id = ?1")?
                    .exists(params![id])?;
                Ok(exists.then_some(id))
            }
            None => Ok(self
                .find_by_name(&author.first_name, &author.last_name)?
                .and_then(|a| a.id)),
        }
    }

    fn update_row(&self, id: i64, author: &Author) -> Result<bool> {
        let genres_json = serde_json::to_string(&author.genres)?;
        let changed = self.conn.execute(
            "UPDATE authors
             SET first_name = ?1, last_name = ?2, average_rating = ?3, genres = ?4, book_reviews = ?5
             WHERE id = ?6",
            params![
                author.first_name,
                author.last_name,
                author.average_rating,
                genres_json,
                author.book_reviews.as_deref(),
                id,
            ],
        )?;
        Ok(changed > 0)
    }
}

impl<C: Deref<Target = Connection>> Repository for SqliteAuthorRepository<C> {
    type Entity = Author;
    type Id = i64;

    fn insert(&self, author: &Self::Entity) -> Result<Self::Id> {
        let genres_json = serde_json::to_string(&author.genres)?;
        self.conn.execute(
            "INSERT INTO authors (first_name, last_name, average_rating, genres, book_reviews)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                author.first_name,
                author.last_name,
                author.average_rating,
                genres_json,
                author.book_reviews.as_deref(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn find_by_id(&self, id: &Self::Id) -> Result<Option<Self::Entity>> {
        let sql = format!("SELECT {AUTHOR_COLUMNS} FROM authors WHERE id = ?1");
        let author = self
            .conn
            .query_row(&sql, params![id], |row| row_to_author(row, 0))
            .optional()?;
        Ok(author)
    }

    fn update(&self, author: &Self::Entity) -> Result<bool> {
        let id = author.id.ok_or_else(|| {
            NextbookError::ValidationError(format!(
                "cannot update author '{}' without an id",
                author.display_name()
            ))
        })?;
        self.update_row(id, author)
    }

    fn delete(&self, id: &Self::Id) -> Result<bool> {
        let deleted = self.conn.execute("DELETE FROM authors WHERE id = ?1", params![id])?;
        Ok(deleted > 0)
    }
}

impl<C: Deref<Target = Connection>> AuthorRepository for SqliteAuthorRepository<C> {
    fn find_by_name(&self, first_name: &str, last_name: &str) -> Result<Option<Author>> {
        let sql = format!(
            "SELECT {AUTHOR_COLUMNS} FROM authors
             WHERE first_name = ?1 AND last_name = ?2
             ORDER BY id LIMIT 1"
        );
        let author = self
            .conn
            .query_row(&sql, params![first_name, last_name], |row| {
                row_to_author(row, 0)
            })
            .optional()?;
        Ok(author)
    }

    fn list(&self, limit: usize, offset: usize) -> Result<Vec<Author>> {
        let sql = format!("SELECT {AUTHOR_COLUMNS} FROM authors ORDER BY id LIMIT ?1 OFFSET ?2");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![limit as i64, offset as i64], |row| {
                row_to_author(row, 0)
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM authors", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn delete_author(&self, author: &Author) -> Result<Option<i64>> {
        let id = author.id.ok_or_else(|| {
            NextbookError::ValidationError(format!(
                "cannot delete author '{}' without an id",
                author.display_name()
            ))
        })?;
        Ok(self.delete(&id)?.then_some(id))
    }

    fn safe_insert(&self, author: &Author) -> Result<Option<i64>> {
        if self
            .find_by_name(&author.first_name, &author.last_name)?
            .is_some()
        {
            return Ok(None);
        }
        self.insert(author).map(Some)
    }

    fn safe_update(&self, author: &Author) -> Result<bool> {
        let Some(id) = self.resolve_id(author)? else {
            return Ok(false);
        };

        if let Some(other) = self.find_by_name(&author.first_name, &author.last_name)?
            && other.id != Some(id)
        {
            return Ok(false);
        }

        self.update_row(id, author)
    }

    fn safe_delete(&self, author: &Author) -> Result<Option<i64>> {
        let Some(id) = self.resolve_id(author)? else {
            return Ok(None);
        };
        Ok(self.delete(&id)?.then_some(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::database::ConnectionPool;
    use crate::storage::database::run_migrations;

    fn pool() -> ConnectionPool {
        let pool = ConnectionPool::open_in_memory().unwrap();
        run_migrations(&pool.get_connection()).unwrap();
        pool
    }

    #[test]
    fn test_insert_returns_positive_id() {
        let pool = pool();
        let repo = SqliteAuthorRepository::new(pool.get_connection());

        let id = repo.insert(&Author::new("Billy", "Bob").with_rating(3.0)).unwrap();
        assert!(id > 0);
        assert_eq!(repo.count().unwrap(), 1);
    }

    #[test]
    fn test_find_by_id_roundtrips_all_fields() {
        let pool = pool();
        let repo = SqliteAuthorRepository::new(pool.get_connection());

        let author = Author::new("Rick", "Sanchez")
            .with_rating(5.0)
            .with_genres(vec!["Dark".to_string(), "Fantasy".to_string()])
            .with_book_reviews("None");
        let id = repo.insert(&author).unwrap();

        let loaded = repo.find_by_id(&id).unwrap().unwrap();
        assert_eq!(loaded.id, Some(id));
        assert_eq!(loaded.first_name, author.first_name);
        assert_eq!(loaded.last_name, author.last_name);
        assert_eq!(loaded.average_rating, author.average_rating);
        assert_eq!(loaded.genres, author.genres);
        assert_eq!(loaded.book_reviews, author.book_reviews);
    }

    #[test]
    fn test_find_missing_author_is_none() {
        let pool = pool();
        let repo = SqliteAuthorRepository::new(pool.get_connection());
        assert!(repo.find_by_id(&42).unwrap().is_none());
    }

    #[test]
    fn test_delete_author_returns_its_id() {
        let pool = pool();
        let repo = SqliteAuthorRepository::new(pool.get_connection());

        let mut author = Author::new("Jake", "Gambz").with_rating(5.0);
        let id = repo.insert(&author).unwrap();
        author.id = Some(id);

        assert_eq!(repo.delete_author(&author).unwrap(), Some(id));
        assert_eq!(repo.delete_author(&author).unwrap(), None);
    }

    #[test]
    fn test_update_changes_existing_row() {
        let pool = pool();
        let repo = SqliteAuthorRepository::new(pool.get_connection());

        let mut author = Author::new("updateNew", "Added").with_rating(10.0);
        author.id = Some(repo.insert(&author).unwrap());
        author.last_name = "Each Time".to_string();
        author.average_rating = Some(567.0);

        assert!(repo.update(&author).unwrap());
        let loaded = repo.find_by_id(&author.id.unwrap()).unwrap().unwrap();
        assert_eq!(loaded.last_name, "Each Time");
        assert_eq!(loaded.average_rating, Some(567.0));
    }

    #[test]
    fn test_update_without_id_is_validation_error() {
        let pool = pool();
        let repo = SqliteAuthorRepository::new(pool.get_connection());

        let result = repo.update(&Author::new("No", "Id"));
        assert!(matches!(result, Err(NextbookError::ValidationError(_))));
    }

    #[test]
    fn test_safe_insert_rejects_duplicate_name() {
        let pool = pool();
        let repo = SqliteAuthorRepository::new(pool.get_connection());

        let author = Author::new("My nane", "Is not needed").with_rating(5.0);
        let first = repo.safe_insert(&author).unwrap();
        assert!(first.is_some_and(|id| id > 0));
        assert_eq!(repo.safe_insert(&author).unwrap(), None);
        assert_eq!(repo.count().unwrap(), 1);
    }

    #[test]
    fn test_safe_update_fails_after_safe_delete() {
        let pool = pool();
        let repo = SqliteAuthorRepository::new(pool.get_connection());

        let mut author = Author::new("Safe", "Update").with_rating(1.0);
        let id = repo.safe_insert(&author).unwrap().unwrap();

        author.average_rating = Some(55.0);
        assert!(repo.safe_update(&author).unwrap());
        assert_eq!(
            repo.find_by_id(&id).unwrap().unwrap().average_rating,
            Some(55.0)
        );

        assert_eq!(repo.safe_delete(&author).unwrap(), Some(id));
        assert!(!repo.safe_update(&author).unwrap());
    }

    #[test]
    fn test_safe_delete_matches_inserted_id() {
        let pool = pool();
        let repo = SqliteAuthorRepository::new(pool.get_connection());

        let author = Author::new("For", "Safe Delete").with_rating(2.0);
        let id = repo.safe_insert(&author).unwrap().unwrap();

        assert_eq!(repo.safe_delete(&author).unwrap(), Some(id));
        assert_eq!(repo.safe_delete(&author).unwrap(), None);
    }

    #[test]
    fn test_safe_update_refuses_name_collision() {
        let pool = pool();
        let repo = SqliteAuthorRepository::new(pool.get_connection());

        repo.insert(&Author::new("Ann", "Lee")).unwrap();
        let mut other = Author::new("Ann", "Leigh");
        other.id = Some(repo.insert(&other).unwrap());

        other.last_name = "Lee".to_string();
        assert!(!repo.safe_update(&other).unwrap());
    }

    #[test]
    fn test_list_is_ordered_and_paged() {
        let pool = pool();
        let repo = SqliteAuthorRepository::new(pool.get_connection());

        for last in ["A", "B", "C"] {
            repo.insert(&Author::new("X", last)).unwrap();
        }

        let page = repo.list(2, 1).unwrap();
        let names: Vec<_> = page.iter().map(|a| a.last_name.as_str()).collect();
        assert_eq!(names, vec!["B", "C"]);
    }
}
