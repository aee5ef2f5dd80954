mod author_repository;
mod book_repository;

pub use author_repository::{AuthorRepository, SqliteAuthorRepository};
pub use book_repository::{BookRepository, SqliteBookRepository};

use crate::error::Result;

/// Basic CRUD over one table. Identities are assigned by the store on insert.
pub trait Repository {
    type Entity;
    type Id;

    fn insert(&self, entity: &Self::Entity) -> Result<Self::Id>;
    fn find_by_id(&self, id: &Self::Id) -> Result<Option<Self::Entity>>;
    fn update(&self, entity: &Self::Entity) -> Result<bool>;
    fn delete(&self, id: &Self::Id) -> Result<bool>;
}
