use async_trait::async_trait;
use derive_new::new;
use kernel::{
    model::{book::Book, id::BookId},
    repository::book::BookRepository,
};
use shared::error::{AppError, AppResult};

use crate::database::{model::book::BookRow, ConnectionPool};

#[derive(new)]
pub struct BookRepositoryImpl {
    db: ConnectionPool,
}

#[async_trait]
impl BookRepository for BookRepositoryImpl {
    async fn find_by_id(&self, book_id: BookId) -> AppResult<Option<Book>> {
        sqlx::query_as::<_, BookRow>(
            r#"
                SELECT book_id, title, stock, fee
                FROM books
                WHERE book_id = $1
                ;
            "#,
        )
        .bind(book_id)
        .fetch_optional(self.db.inner_ref())
        .await
        .map(|row| row.map(Book::from))
        .map_err(AppError::SpecificOperationError)
    }
}
