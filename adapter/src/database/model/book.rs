use kernel::model::{book::Book, id::BookId};

#[derive(sqlx::FromRow)]
pub struct BookRow {
    pub book_id: BookId,
    pub title: String,
    pub stock: i32,
    pub fee: i64,
}

impl From<BookRow> for Book {
    fn from(value: BookRow) -> Self {
        let BookRow {
            book_id,
            title,
            stock,
            fee,
        } = value;
        Book {
            id: book_id,
            title,
            stock,
            fee,
        }
    }
}
